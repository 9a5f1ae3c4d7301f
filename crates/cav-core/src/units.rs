// cav-core/src/units.rs

use uom::si::f64::{
    AngularVelocity as UomAngularVelocity, ElectricCharge as UomElectricCharge,
    ElectricField as UomElectricField, ElectricPotential as UomElectricPotential,
    Frequency as UomFrequency, Length as UomLength, Time as UomTime,
};

// Public canonical unit types (SI, f64)
pub type AngularVelocity = UomAngularVelocity;
pub type Charge = UomElectricCharge;
pub type Field = UomElectricField;
pub type Voltage = UomElectricPotential;
pub type Frequency = UomFrequency;
pub type Length = UomLength;
pub type Time = UomTime;

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn hz(v: f64) -> Frequency {
    use uom::si::frequency::hertz;
    Frequency::new::<hertz>(v)
}

#[inline]
pub fn rad_per_s(v: f64) -> AngularVelocity {
    use uom::si::angular_velocity::radian_per_second;
    AngularVelocity::new::<radian_per_second>(v)
}

#[inline]
pub fn volts(v: f64) -> Voltage {
    use uom::si::electric_potential::volt;
    Voltage::new::<volt>(v)
}

#[inline]
pub fn v_per_m(v: f64) -> Field {
    use uom::si::electric_field::volt_per_meter;
    Field::new::<volt_per_meter>(v)
}

#[inline]
pub fn pc(v: f64) -> Charge {
    use uom::si::electric_charge::picocoulomb;
    Charge::new::<picocoulomb>(v)
}

/// Beam charge in the picocoulomb scale the mode coupling expects.
#[inline]
pub fn charge_in_pc(q: Charge) -> f64 {
    use uom::si::electric_charge::picocoulomb;
    q.get::<picocoulomb>()
}

pub mod constants {
    use std::f64::consts::PI;

    /// Scales beam charge (pC) against voltage in the beam coupling impedance.
    pub const PICO: f64 = 1e-12;

    pub const TWO_PI: f64 = 2.0 * PI;

    /// L-band LO used by TESLA-type cavities (rad/s).
    pub const LO_W0_1300MHZ: f64 = TWO_PI * 1.3e9;
}
