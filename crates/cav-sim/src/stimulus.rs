//! Drive and beam input sequences.

use cav_core::{Complex, ZERO, ensure_finite};

use crate::error::{SimError, SimResult};

/// Forward drive sample per step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DriveWaveform {
    /// No drive.
    Off,
    /// Constant complex amplitude for the whole run.
    Constant(Complex),
    /// Rectangular pulse: `amplitude` for steps `[start, start + len)`, zero elsewhere.
    Pulse {
        amplitude: Complex,
        start: usize,
        len: usize,
    },
}

impl DriveWaveform {
    /// Drive sample at step `n`.
    #[inline]
    pub fn sample(&self, n: usize) -> Complex {
        match *self {
            Self::Off => ZERO,
            Self::Constant(a) => a,
            Self::Pulse {
                amplitude,
                start,
                len,
            } => {
                if n >= start && n - start < len {
                    amplitude
                } else {
                    ZERO
                }
            }
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        let a = match *self {
            Self::Off => return Ok(()),
            Self::Constant(a) => a,
            Self::Pulse { amplitude, .. } => amplitude,
        };
        ensure_finite(a.re, "drive amplitude")?;
        ensure_finite(a.im, "drive amplitude")?;
        Ok(())
    }
}

/// Beam charge (pC) per step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BeamPattern {
    /// No beam.
    None,
    /// One bunch at step `step`.
    Single { step: usize, charge_pc: f64 },
    /// One bunch every `period` steps starting at `start`.
    Train {
        start: usize,
        period: usize,
        charge_pc: f64,
    },
}

impl BeamPattern {
    /// Bunch charge at step `n`.
    #[inline]
    pub fn sample(&self, n: usize) -> f64 {
        match *self {
            Self::None => 0.0,
            Self::Single { step, charge_pc } => {
                if n == step {
                    charge_pc
                } else {
                    0.0
                }
            }
            Self::Train {
                start,
                period,
                charge_pc,
            } => {
                // A zero period never fires
                if n.checked_sub(start).and_then(|d| d.checked_rem(period)) == Some(0) {
                    charge_pc
                } else {
                    0.0
                }
            }
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        match *self {
            Self::None => Ok(()),
            Self::Single { charge_pc, .. } => {
                ensure_finite(charge_pc, "bunch charge")?;
                Ok(())
            }
            Self::Train {
                period, charge_pc, ..
            } => {
                if period == 0 {
                    return Err(SimError::InvalidArg {
                        what: "bunch train period must be positive",
                    });
                }
                ensure_finite(charge_pc, "bunch charge")?;
                Ok(())
            }
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn pulse_is_on_exactly_inside_its_window(
            start in 0usize..500,
            len in 0usize..500,
            n in 0usize..1500,
        ) {
            let amplitude = Complex::new(0.7, -0.2);
            let drive = DriveWaveform::Pulse { amplitude, start, len };
            let inside = n >= start && n < start + len;
            prop_assert_eq!(drive.sample(n), if inside { amplitude } else { ZERO });
        }

        #[test]
        fn train_fires_once_per_period(
            start in 0usize..100,
            period in 1usize..50,
            window in 0usize..1000,
        ) {
            let beam = BeamPattern::Train { start, period, charge_pc: 1.0 };
            // Any `period` consecutive steps after the start hold one bunch
            let from = start + window;
            let bunches = (from..from + period).filter(|&n| beam.sample(n) != 0.0).count();
            prop_assert_eq!(bunches, 1);
            if start > 0 {
                prop_assert!((0..start).all(|n| beam.sample(n) == 0.0));
            }
        }
    }
}
