//! Transmission path between the directional coupler and the cavity coupler.

use std::fmt;

use cav_core::{Complex, ensure_finite, phasor};

use crate::error::{ModelError, ModelResult};

/// Propagates the drive signal on the forward and reverse paths.
///
/// Implementations are stateless so one path can be shared by every run of a
/// cavity.
pub trait TransmissionPath: fmt::Debug + Send + Sync {
    /// Drive sample arriving at the cavity coupler.
    fn forward(&self, drive: Complex) -> Complex;

    /// Drive sample seen back at the directional coupler on the reverse path.
    fn reverse(&self, drive: Complex) -> Complex;
}

/// Lossless, instantaneous waveguide.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IdealWaveguide;

impl TransmissionPath for IdealWaveguide {
    #[inline]
    fn forward(&self, drive: Complex) -> Complex {
        drive
    }

    #[inline]
    fn reverse(&self, drive: Complex) -> Complex {
        drive
    }
}

/// Waveguide with attenuation and a fixed electrical length.
///
/// The delay is applied as a carrier phase rotation `e^{-i·ω_LO·τ}`, which is
/// exact for the narrowband baseband signals the cavity consumes. Each
/// direction applies one transit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LossyWaveguide {
    gain: Complex,
}

impl LossyWaveguide {
    /// # Arguments
    ///
    /// * `attenuation_db` - one-way power loss (dB), must be non-negative
    /// * `delay_s` - one-way group delay (s), must be non-negative
    /// * `lo_w0_rad_s` - carrier angular frequency (rad/s)
    pub fn new(attenuation_db: f64, delay_s: f64, lo_w0_rad_s: f64) -> ModelResult<Self> {
        let attenuation_db = ensure_finite(attenuation_db, "waveguide attenuation")?;
        let delay_s = ensure_finite(delay_s, "waveguide delay")?;
        let lo_w0 = ensure_finite(lo_w0_rad_s, "waveguide carrier frequency")?;
        if attenuation_db < 0.0 {
            return Err(ModelError::InvalidArg {
                what: "waveguide attenuation cannot be negative",
            });
        }
        if delay_s < 0.0 {
            return Err(ModelError::InvalidArg {
                what: "waveguide delay cannot be negative",
            });
        }
        let magnitude = 10f64.powf(-attenuation_db / 20.0);
        Ok(Self {
            gain: magnitude * phasor(-lo_w0 * delay_s),
        })
    }

    /// Complex one-way transfer factor.
    pub fn gain(&self) -> Complex {
        self.gain
    }
}

impl TransmissionPath for LossyWaveguide {
    #[inline]
    fn forward(&self, drive: Complex) -> Complex {
        drive * self.gain
    }

    #[inline]
    fn reverse(&self, drive: Complex) -> Complex {
        drive * self.gain
    }
}
