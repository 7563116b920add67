//! Simulated station sensors.
//!
//! Produces plausible raw values in each sensor's native unit so the
//! station binary can exercise the full normalization and transport path
//! without hardware attached.

use rand::Rng;

use crate::reading::{ConcentrationUnit, Reading, ReadingSet, TempUnit};

/// Sensors fitted to the simulated station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// Outdoor probe reporting Fahrenheit
    OutdoorTemperature,
    /// Enclosure thermistor reporting Celsius
    IndoorTemperature,
    /// Electrochemical NO2 cell reporting PPB
    NitrogenDioxide,
    /// CO cell reporting PPM
    CarbonMonoxide,
    /// Relative humidity as a 0-1 ratio
    Humidity,
}

impl SensorKind {
    pub fn all() -> &'static [SensorKind] {
        &[
            SensorKind::OutdoorTemperature,
            SensorKind::IndoorTemperature,
            SensorKind::NitrogenDioxide,
            SensorKind::CarbonMonoxide,
            SensorKind::Humidity,
        ]
    }

    /// Reading id sent to the server.
    pub fn id(&self) -> &'static str {
        match self {
            SensorKind::OutdoorTemperature => "temp_outdoor",
            SensorKind::IndoorTemperature => "temp_indoor",
            SensorKind::NitrogenDioxide => "no2",
            SensorKind::CarbonMonoxide => "co",
            SensorKind::Humidity => "humidity",
        }
    }
}

/// Configuration for the sensor simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Probability (0.0 - 1.0) that a sensor reports a value outside its
    /// physical range, as a glitching sensor would
    pub glitch_rate: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self { glitch_rate: 0.02 }
    }
}

/// Random sensor source for the station binary.
#[derive(Debug, Clone, Default)]
pub struct SensorSimulator {
    config: SimulatorConfig,
}

impl SensorSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(SimulatorConfig::default())
    }

    /// Glitch rate clamped to a valid probability. NaN and infinities disable glitches.
    fn glitch_probability(&self) -> f64 {
        let rate = self.config.glitch_rate;
        if rate.is_finite() {
            rate.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Sample one raw reading from `kind`.
    pub fn sample(&self, rng: &mut impl Rng, kind: SensorKind) -> Reading {
        let glitch = rng.gen_bool(self.glitch_probability());

        match kind {
            SensorKind::OutdoorTemperature => Reading::Temperature {
                value: rng.gen_range(23.0..95.0),
                unit: TempUnit::Fahrenheit,
            },
            SensorKind::IndoorTemperature => Reading::Temperature {
                value: rng.gen_range(18.0..26.0),
                unit: TempUnit::Celsius,
            },
            SensorKind::NitrogenDioxide => Reading::Concentration {
                value: rng.gen_range(5.0..120.0),
                unit: ConcentrationUnit::Ppb,
            },
            SensorKind::CarbonMonoxide => Reading::Concentration {
                value: rng.gen_range(0.1..9.0),
                unit: ConcentrationUnit::Ppm,
            },
            SensorKind::Humidity => {
                let value = if glitch {
                    if rng.gen_bool(0.5) {
                        rng.gen_range(-0.2..0.0)
                    } else {
                        rng.gen_range(1.0..1.3)
                    }
                } else {
                    rng.gen_range(0.2..0.9)
                };
                Reading::Ratio(value)
            }
        }
    }

    /// Sample every sensor into a fresh reading set.
    pub fn collect(&self) -> ReadingSet {
        let mut rng = rand::thread_rng();
        let mut set = ReadingSet::new();

        for kind in SensorKind::all() {
            set.add(kind.id(), self.sample(&mut rng, *kind));
        }

        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_covers_every_sensor() {
        let set = SensorSimulator::with_defaults().collect();

        assert_eq!(set.len(), SensorKind::all().len());
        for kind in SensorKind::all() {
            assert!(set.readings().contains_key(kind.id()));
        }
    }

    #[test]
    fn test_collected_values_are_normalized() {
        let simulator = SensorSimulator::new(SimulatorConfig { glitch_rate: 1.0 });

        for _ in 0..50 {
            let set = simulator.collect();
            let readings = set.readings();

            // 23-95 F is -5-35 C
            assert!((-5.0..=35.0).contains(&readings["temp_outdoor"]));
            assert!(readings["no2"] <= 0.12);
            assert!((0.0..=1.0).contains(&readings["humidity"]));
        }
    }

    #[test]
    fn test_glitch_free_humidity_in_range() {
        let simulator = SensorSimulator::new(SimulatorConfig { glitch_rate: 0.0 });
        let mut rng = rand::thread_rng();

        for _ in 0..50 {
            match simulator.sample(&mut rng, SensorKind::Humidity) {
                Reading::Ratio(value) => assert!((0.2..0.9).contains(&value)),
                other => panic!("unexpected reading {:?}", other),
            }
        }
    }

    #[test]
    fn test_non_finite_glitch_rate_disables_glitches() {
        let mut rng = rand::thread_rng();

        for rate in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let simulator = SensorSimulator::new(SimulatorConfig { glitch_rate: rate });
            assert_eq!(simulator.glitch_probability(), 0.0);

            for _ in 0..20 {
                match simulator.sample(&mut rng, SensorKind::Humidity) {
                    Reading::Ratio(value) => assert!((0.2..0.9).contains(&value)),
                    other => panic!("unexpected reading {:?}", other),
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_glitch_rate_is_clamped() {
        let high = SensorSimulator::new(SimulatorConfig { glitch_rate: 3.0 });
        let low = SensorSimulator::new(SimulatorConfig { glitch_rate: -1.0 });

        assert_eq!(high.glitch_probability(), 1.0);
        assert_eq!(low.glitch_probability(), 0.0);
    }

    #[test]
    fn test_sensor_ids_are_unique() {
        let mut ids: Vec<&str> = SensorKind::all().iter().map(|k| k.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), SensorKind::all().len());
    }
}
