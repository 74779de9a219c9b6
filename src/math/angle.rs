use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use super::fixed::Fixed;
use super::trig::{fine_cosine, fine_sine};

pub const ANGLETOFINESHIFT: u32 = 19;
pub const FINEANGLES: usize = 8192;
pub const FINEMASK: usize = FINEANGLES - 1;

/// Binary angle: the full turn maps onto the whole `u32` range, so
/// overflow is rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Angle(pub u32);

pub const ANG45: Angle = Angle(0x2000_0000);
pub const ANG90: Angle = Angle(0x4000_0000);
pub const ANG180: Angle = Angle(0x8000_0000);
pub const ANG270: Angle = Angle(0xC000_0000);

impl Angle {
    /// Index into the fine trig tables.
    #[inline(always)]
    pub const fn fine(self) -> usize {
        (self.0 >> ANGLETOFINESHIFT) as usize
    }

    #[inline(always)]
    pub fn sin(self) -> Fixed {
        fine_sine(self.fine())
    }

    #[inline(always)]
    pub fn cos(self) -> Fixed {
        fine_cosine(self.fine())
    }

    pub fn from_degrees(deg: f64) -> Self {
        let turns = deg.rem_euclid(360.0) / 360.0;
        Angle((turns * 4_294_967_296.0) as u64 as u32)
    }

    /// Radians counter-clockwise from east.
    pub fn from_radians(rad: f32) -> Self {
        Self::from_degrees((rad as f64).to_degrees())
    }

    pub fn to_radians(self) -> f32 {
        (self.0 as f64 / 4_294_967_296.0 * std::f64::consts::TAU) as f32
    }
}

impl Add for Angle {
    type Output = Angle;
    #[inline(always)]
    fn add(self, rhs: Angle) -> Angle {
        Angle(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Angle {
    type Output = Angle;
    #[inline(always)]
    fn sub(self, rhs: Angle) -> Angle {
        Angle(self.0.wrapping_sub(rhs.0))
    }
}

impl AddAssign for Angle {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Angle) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl SubAssign for Angle {
    #[inline(always)]
    fn sub_assign(&mut self, rhs: Angle) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

impl Neg for Angle {
    type Output = Angle;
    #[inline(always)]
    fn neg(self) -> Angle {
        Angle(self.0.wrapping_neg())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_wraps_around_the_circle() {
        assert_eq!(ANG270 + ANG180, ANG90);
        assert_eq!(ANG90 - ANG180, ANG270);
        assert_eq!(-ANG90, ANG270);
    }

    #[test]
    fn degrees_round_trip_close() {
        assert_eq!(Angle::from_degrees(90.0), ANG90);
        assert_eq!(Angle::from_degrees(-90.0), ANG270);
        assert!((Angle::from_degrees(30.0).to_radians() - 30f32.to_radians()).abs() < 1e-6);
    }
}
