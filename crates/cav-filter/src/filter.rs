//! Pole-bank filter description and its runtime state.

use cav_core::{CavError, Complex, ZERO, ensure_positive, is_finite_c};

use crate::error::{FilterError, FilterResult};

/// One first-order section discretized with forward Euler.
///
/// Continuous form: `dx/dt = p·x − p·u`, i.e. a pole at `p` with unity gain at DC.
/// Discrete form: `x[n+1] = (1 + p·dt)·x[n] − p·dt·u[n]`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Section {
    pole: Complex,
    /// State transition `1 + p·dt`.
    a: Complex,
    /// Input gain `−p·dt`.
    b: Complex,
}

/// Linear time-invariant filter made of parallel first-order sections.
///
/// The output is the sum of the section outputs.
///
/// # Example
///
/// ```
/// use cav_core::Complex;
/// use cav_filter::Filter;
///
/// let mut fil = Filter::with_capacity(1);
/// fil.append_poles(&[Complex::new(-100.0, 0.0)], 1e-4).unwrap();
/// let mut state = fil.new_state();
///
/// let mut y = Complex::new(0.0, 0.0);
/// for _ in 0..2000 {
///     y = fil.step(Complex::new(1.0, 0.0), &mut state);
/// }
/// assert!((y.re - 1.0).abs() < 1e-6);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    sections: Vec<Section>,
    capacity: usize,
}

impl Filter {
    /// Create an empty filter sized for `capacity` poles.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sections: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append poles (rad/s) discretized at time step `dt` (s).
    ///
    /// # Errors
    ///
    /// Returns an error if `dt` is not positive, a pole is non-finite, or the
    /// filter would grow past its capacity. Nothing is appended on error.
    pub fn append_poles(&mut self, poles: &[Complex], dt: f64) -> FilterResult<()> {
        ensure_positive(dt, "filter time step")?;

        let requested = self.sections.len() + poles.len();
        if requested > self.capacity {
            return Err(FilterError::CapacityExceeded {
                requested,
                capacity: self.capacity,
            });
        }
        if let Some(bad) = poles.iter().find(|p| !is_finite_c(**p)) {
            return Err(CavError::NonFinite {
                what: "filter pole",
                value: if bad.re.is_finite() { bad.im } else { bad.re },
            }
            .into());
        }

        self.sections.extend(poles.iter().map(|&pole| Section {
            pole,
            a: 1.0 + pole * dt,
            b: -pole * dt,
        }));
        Ok(())
    }

    /// Number of poles appended so far.
    pub fn n_poles(&self) -> usize {
        self.sections.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Continuous-time poles in append order.
    pub fn poles(&self) -> impl Iterator<Item = Complex> + '_ {
        self.sections.iter().map(|s| s.pole)
    }

    /// Steady-state gain for a constant input.
    pub fn dc_gain(&self) -> Complex {
        self.sections.iter().map(|s| s.b / (1.0 - s.a)).sum()
    }

    /// Allocate a zeroed state sized for the poles appended so far.
    ///
    /// Append every pole before allocating states.
    pub fn new_state(&self) -> FilterState {
        FilterState {
            x: vec![ZERO; self.sections.len()],
        }
    }

    /// Zero every section of `state`.
    pub fn clear_state(&self, state: &mut FilterState) {
        debug_assert_eq!(state.x.len(), self.sections.len());
        state.x.iter_mut().for_each(|x| *x = ZERO);
    }

    /// Advance the filter one step and return the summed output.
    ///
    /// Does not allocate.
    #[inline]
    pub fn step(&self, input: Complex, state: &mut FilterState) -> Complex {
        debug_assert_eq!(state.x.len(), self.sections.len());
        let mut out = ZERO;
        for (s, x) in self.sections.iter().zip(state.x.iter_mut()) {
            *x = s.a * *x + s.b * input;
            out += *x;
        }
        out
    }
}

/// Runtime memory of a [`Filter`], one complex value per section.
///
/// Only [`Filter::new_state`] creates one, so a state always matches the
/// section count of the filter that allocated it.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterState {
    x: Vec<Complex>,
}

impl FilterState {
    /// Per-section values.
    pub fn sections(&self) -> &[Complex] {
        &self.x
    }

    pub fn is_zero(&self) -> bool {
        self.x.iter().all(|x| *x == ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cav_core::{Tolerances, nearly_equal, nearly_equal_c};

    fn real_pole(p: f64, dt: f64) -> (Filter, FilterState) {
        let mut fil = Filter::with_capacity(1);
        fil.append_poles(&[Complex::new(p, 0.0)], dt).unwrap();
        let state = fil.new_state();
        (fil, state)
    }

    #[test]
    fn unity_dc_gain_per_section() {
        let mut fil = Filter::with_capacity(2);
        fil.append_poles(&[Complex::new(-50.0, 0.0), Complex::new(-5.0, 20.0)], 1e-3)
            .unwrap();
        let tol = Tolerances::default();
        assert!(nearly_equal_c(fil.dc_gain(), Complex::new(2.0, 0.0), tol));
    }

    #[test]
    fn first_step_matches_euler() {
        let (fil, mut state) = real_pole(-100.0, 1e-3);
        let y = fil.step(Complex::new(1.0, 0.0), &mut state);
        // x1 = 0.9 * 0 + 0.1 * 1
        assert!(nearly_equal(y.re, 0.1, Tolerances::default()));
        assert_eq!(y.im, 0.0);
    }

    #[test]
    fn impulse_decays_geometrically() {
        let (fil, mut state) = real_pole(-100.0, 1e-3);
        let y0 = fil.step(Complex::new(1.0, 0.0), &mut state);
        let y1 = fil.step(ZERO, &mut state);
        let y2 = fil.step(ZERO, &mut state);
        let tol = Tolerances::default();
        assert!(nearly_equal(y1.re / y0.re, 0.9, tol));
        assert!(nearly_equal(y2.re / y1.re, 0.9, tol));
    }

    #[test]
    fn step_response_is_monotonic_for_real_pole() {
        let (fil, mut state) = real_pole(-10.0, 1e-3);
        let mut prev = 0.0;
        for _ in 0..1000 {
            let y = fil.step(Complex::new(1.0, 0.0), &mut state).re;
            assert!(y > prev);
            assert!(y < 1.0);
            prev = y;
        }
    }

    #[test]
    fn new_state_has_one_slot_per_pole() {
        let mut fil = Filter::with_capacity(3);
        fil.append_poles(&[Complex::new(-1.0, 0.0), Complex::new(-2.0, 5.0)], 1e-3)
            .unwrap();
        let state = fil.new_state();
        assert_eq!(state.sections().len(), fil.n_poles());
        assert!(state.is_zero());
    }

    #[test]
    fn clear_state_zeroes_sections() {
        let (fil, mut state) = real_pole(-10.0, 1e-3);
        fil.step(Complex::new(3.0, -1.0), &mut state);
        assert!(!state.is_zero());
        fil.clear_state(&mut state);
        assert!(state.is_zero());
    }

    #[test]
    fn capacity_is_enforced() {
        let mut fil = Filter::with_capacity(1);
        fil.append_poles(&[Complex::new(-1.0, 0.0)], 1e-3).unwrap();
        let err = fil
            .append_poles(&[Complex::new(-2.0, 0.0)], 1e-3)
            .unwrap_err();
        assert_eq!(
            err,
            FilterError::CapacityExceeded {
                requested: 2,
                capacity: 1
            }
        );
        assert_eq!(fil.n_poles(), 1);
    }

    #[test]
    fn invalid_append_arguments() {
        let mut fil = Filter::with_capacity(4);
        assert!(fil.append_poles(&[Complex::new(-1.0, 0.0)], 0.0).is_err());
        assert!(fil.append_poles(&[Complex::new(-1.0, 0.0)], -1e-3).is_err());
        assert!(
            fil.append_poles(&[Complex::new(f64::NAN, 0.0)], 1e-3)
                .is_err()
        );
        assert_eq!(fil.n_poles(), 0);
    }

    #[test]
    fn unstable_pole_grows_without_clamping() {
        let (fil, mut state) = real_pole(10.0, 1e-2);
        let mut y = ZERO;
        for _ in 0..200 {
            y = fil.step(Complex::new(1.0, 0.0), &mut state);
        }
        assert!(y.norm() > 1e6);
    }
}
