//! Reading collector module.
//!
//! Sensor values are normalized into one canonical unit per category at
//! insertion time, so a [`ReadingSet`] never holds a raw value:
//!
//! - temperature in degrees Celsius
//! - concentration in parts per million
//! - ratio clamped into `[0, 1]`

use std::collections::BTreeMap;

use tracing::debug;

/// Unit of a temperature reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TempUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

/// Unit of a gas concentration reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcentrationUnit {
    /// Parts per million
    #[default]
    Ppm,
    /// Parts per billion
    Ppb,
}

/// A single sensor value tagged with its category and unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Temperature { value: f64, unit: TempUnit },
    Concentration { value: f64, unit: ConcentrationUnit },
    Ratio(f64),
}

impl Reading {
    /// Convert the value into the canonical unit of its category.
    pub fn normalized(&self) -> f64 {
        match *self {
            Reading::Temperature { value, unit } => match unit {
                TempUnit::Celsius => value,
                TempUnit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
            },
            Reading::Concentration { value, unit } => match unit {
                ConcentrationUnit::Ppm => value,
                ConcentrationUnit::Ppb => value / 1000.0,
            },
            // NaN passes through clamp unchanged
            Reading::Ratio(value) => value.clamp(0.0, 1.0),
        }
    }

    /// Category name, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Reading::Temperature { .. } => "temperature",
            Reading::Concentration { .. } => "concentration",
            Reading::Ratio(_) => "ratio",
        }
    }
}

/// Geolocation attached to a reading set.
///
/// `(0, 0, 0)` means "unset". No range validation is performed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub alt: f64,
}

/// The readings and location for one request.
///
/// Readings are keyed by id; adding a reading under an existing id
/// replaces the previous value.
///
/// # Example
///
/// ```
/// use breezo_client::reading::{ReadingSet, TempUnit, ConcentrationUnit};
///
/// let mut set = ReadingSet::new();
/// set.add_temperature("outdoor", 212.0, TempUnit::Fahrenheit);
/// set.add_concentration("no2", 40.0, ConcentrationUnit::Ppb);
/// set.add_ratio("humidity", 1.3);
///
/// assert_eq!(set.readings()["outdoor"], 100.0);
/// assert_eq!(set.readings()["no2"], 0.04);
/// assert_eq!(set.readings()["humidity"], 1.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingSet {
    readings: BTreeMap<String, f64>,
    location: Location,
}

impl ReadingSet {
    /// Create an empty reading set with an unset location.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the location triple.
    pub fn set_location(&mut self, lat: f64, lng: f64, alt: f64) {
        self.location = Location { lat, lng, alt };
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Store a reading under `id`, normalizing it first.
    pub fn add(&mut self, id: impl Into<String>, reading: Reading) {
        let id = id.into();
        let value = reading.normalized();

        if !value.is_finite() {
            debug!(id = %id, kind = reading.kind(), value, "Storing non-finite reading");
        }

        self.readings.insert(id, value);
    }

    /// Add a temperature reading, converting Fahrenheit to Celsius.
    pub fn add_temperature(&mut self, id: impl Into<String>, value: f64, unit: TempUnit) {
        self.add(id, Reading::Temperature { value, unit });
    }

    /// Add a gas concentration reading, converting PPB to PPM.
    pub fn add_concentration(
        &mut self,
        id: impl Into<String>,
        value: f64,
        unit: ConcentrationUnit,
    ) {
        self.add(id, Reading::Concentration { value, unit });
    }

    /// Add a ratio reading, clamped into `[0, 1]`.
    pub fn add_ratio(&mut self, id: impl Into<String>, value: f64) {
        self.add(id, Reading::Ratio(value));
    }

    /// Normalized readings keyed by id.
    pub fn readings(&self) -> &BTreeMap<String, f64> {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}
