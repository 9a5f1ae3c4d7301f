use crate::CavError;

/// Floating point type used throughout system
pub type Real = f64;

/// Complex baseband sample type.
pub type Complex = num_complex::Complex64;

pub const ZERO: Complex = Complex::new(0.0, 0.0);

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// Complex comparison on the modulus of the difference.
pub fn nearly_equal_c(a: Complex, b: Complex, tol: Tolerances) -> bool {
    let diff = (a - b).norm();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.norm().max(b.norm())
}

/// Unit-magnitude rotation `e^{iθ}`.
#[inline]
pub fn phasor(theta: Real) -> Complex {
    Complex::from_polar(1.0, theta)
}

#[inline]
pub fn is_finite_c(v: Complex) -> bool {
    v.re.is_finite() && v.im.is_finite()
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CavError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CavError::NonFinite { what, value: v })
    }
}

/// Both parts finite; reports the first offending part.
pub fn ensure_finite_c(v: Complex, what: &'static str) -> Result<Complex, CavError> {
    ensure_finite(v.re, what)?;
    ensure_finite(v.im, what)?;
    Ok(v)
}

/// Finite and strictly greater than zero.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, CavError> {
    ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(CavError::NotPositive { what, value: v })
    }
}
