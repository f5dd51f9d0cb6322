// Simulated probe for bench runs and tests
//
// Produces either a scripted sequence of voltages (cycled) or a centre
// voltage with uniform noise.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SensorError;
use crate::sampling::VoltageSource;

enum Pattern {
    Noisy { centre: f64, noise: f64 },
    Sequence { values: Vec<f64>, position: usize },
}

pub struct SimulatedVoltageSource {
    pattern: Pattern,
    rng: StdRng,
}

impl SimulatedVoltageSource {
    /// Centre voltage plus uniform noise in `[-noise, +noise]`
    pub fn new(centre: f64, noise: f64) -> Self {
        Self {
            pattern: Pattern::Noisy {
                centre,
                noise: noise.abs(),
            },
            rng: StdRng::from_entropy(),
        }
    }

    /// Same as [`new`](Self::new) with a reproducible noise stream
    pub fn seeded(centre: f64, noise: f64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new(centre, noise)
        }
    }

    pub fn constant(volts: f64) -> Self {
        Self::new(volts, 0.0)
    }

    /// Cycles through `values`; an empty list behaves like 0 V
    pub fn sequence(values: Vec<f64>) -> Self {
        Self {
            pattern: Pattern::Sequence {
                values,
                position: 0,
            },
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Move the centre voltage, e.g. when the probe changes buffer
    pub fn set_centre(&mut self, volts: f64) {
        match &mut self.pattern {
            Pattern::Noisy { centre, .. } => *centre = volts,
            Pattern::Sequence { .. } => {
                self.pattern = Pattern::Noisy {
                    centre: volts,
                    noise: 0.0,
                }
            }
        }
    }
}

impl VoltageSource for SimulatedVoltageSource {
    fn read_voltage(&mut self) -> Result<f64, SensorError> {
        match &mut self.pattern {
            Pattern::Noisy { centre, noise } => {
                if *noise > 0.0 {
                    Ok(*centre + self.rng.gen_range(-*noise..=*noise))
                } else {
                    Ok(*centre)
                }
            }
            Pattern::Sequence { values, position } => {
                if values.is_empty() {
                    return Ok(0.0);
                }
                let value = values[*position % values.len()];
                *position += 1;
                Ok(value)
            }
        }
    }

    fn describe(&self) -> String {
        match &self.pattern {
            Pattern::Noisy { centre, noise } => {
                format!("simulated probe ({:.3} V ± {:.3} V)", centre, noise)
            }
            Pattern::Sequence { values, .. } => {
                format!("simulated probe ({} scripted values)", values.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_stays_in_band() {
        let mut source = SimulatedVoltageSource::seeded(2.8, 0.01, 42);
        for _ in 0..1000 {
            let v = source.read_voltage().unwrap();
            assert!((2.789..=2.811).contains(&v), "{} out of band", v);
        }
    }

    #[test]
    fn test_sequence_cycles() {
        let mut source = SimulatedVoltageSource::sequence(vec![1.0, 2.0, 3.0]);
        let read: Vec<f64> = (0..5).map(|_| source.read_voltage().unwrap()).collect();
        assert_eq!(read, vec![1.0, 2.0, 3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_set_centre() {
        let mut source = SimulatedVoltageSource::constant(3.2);
        assert_eq!(source.read_voltage().unwrap(), 3.2);
        source.set_centre(2.8);
        assert_eq!(source.read_voltage().unwrap(), 2.8);
    }
}
