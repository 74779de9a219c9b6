//! Fine-angle lookup tables, generated once on first use.

use std::f64::consts::TAU;

use once_cell::sync::Lazy;

use super::angle::{ANG90, ANG180, ANG270, Angle, FINEANGLES};
use super::fixed::{FRACBITS, FRACUNIT, Fixed};

pub const SLOPERANGE: usize = 2048;
const SLOPEBITS: u32 = 11;
pub const DBITS: u32 = FRACBITS - SLOPEBITS;

/// One and a quarter periods so cosine is a plain offset lookup.
static FINE_SINE: Lazy<Vec<Fixed>> = Lazy::new(|| {
    (0..5 * FINEANGLES / 4)
        .map(|i| {
            let a = (i as f64 + 0.5) * TAU / FINEANGLES as f64;
            Fixed((FRACUNIT as f64 * a.sin()) as i32)
        })
        .collect()
});

/// Covers -90°..+90° in `FINEANGLES / 2` steps.
static FINE_TANGENT: Lazy<Vec<Fixed>> = Lazy::new(|| {
    (0..FINEANGLES / 2)
        .map(|i| {
            let a = (i as f64 - (FINEANGLES / 4) as f64 + 0.5) * TAU / FINEANGLES as f64;
            Fixed((FRACUNIT as f64 * a.tan()) as i32)
        })
        .collect()
});

/// atan(i / SLOPERANGE) as a binary angle, i in 0..=SLOPERANGE.
static TAN_TO_ANGLE: Lazy<Vec<Angle>> = Lazy::new(|| {
    (0..=SLOPERANGE)
        .map(|i| {
            let turns = (i as f64 / SLOPERANGE as f64).atan() / TAU;
            Angle((turns * u32::MAX as f64) as u32)
        })
        .collect()
});

#[inline(always)]
pub fn fine_sine(i: usize) -> Fixed {
    FINE_SINE[i]
}

#[inline(always)]
pub fn fine_cosine(i: usize) -> Fixed {
    FINE_SINE[i + FINEANGLES / 4]
}

#[inline(always)]
pub fn fine_tangent(i: usize) -> Fixed {
    FINE_TANGENT[i]
}

#[inline(always)]
pub fn tan_to_angle(i: usize) -> Angle {
    TAN_TO_ANGLE[i]
}

/// `num / den` scaled into a `TAN_TO_ANGLE` index.
#[inline]
pub fn slope_div(num: u32, den: u32) -> usize {
    if den < 512 {
        return SLOPERANGE;
    }
    ((num << 3) / (den >> 8)).min(SLOPERANGE as u32) as usize
}

/// Binary angle of the vector (`dx`, `dy`), counter-clockwise from east.
pub fn point_to_angle(dx: Fixed, dy: Fixed) -> Angle {
    let (mut x, mut y) = (dx.0, dy.0);
    if x == 0 && y == 0 {
        return Angle(0);
    }

    if x >= 0 {
        if y >= 0 {
            if x > y {
                // octant 0
                tan_to_angle(slope_div(y as u32, x as u32))
            } else {
                // octant 1
                Angle(ANG90.0 - 1) - tan_to_angle(slope_div(x as u32, y as u32))
            }
        } else {
            y = y.wrapping_neg();
            if x > y {
                // octant 8
                -tan_to_angle(slope_div(y as u32, x as u32))
            } else {
                // octant 7
                ANG270 + tan_to_angle(slope_div(x as u32, y as u32))
            }
        }
    } else {
        x = x.wrapping_neg();
        if y >= 0 {
            if x > y {
                // octant 3
                Angle(ANG180.0 - 1) - tan_to_angle(slope_div(y as u32, x as u32))
            } else {
                // octant 2
                ANG90 + tan_to_angle(slope_div(x as u32, y as u32))
            }
        } else {
            y = y.wrapping_neg();
            if x > y {
                // octant 4
                ANG180 + tan_to_angle(slope_div(y as u32, x as u32))
            } else {
                // octant 5
                Angle(ANG270.0 - 1) - tan_to_angle(slope_div(x as u32, y as u32))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ANG45;

    fn near(a: Angle, b: Angle) -> bool {
        (a.0.wrapping_sub(b.0) as i32).unsigned_abs() < 0x0010_0000
    }

    #[test]
    fn sine_and_cosine_quadrants() {
        assert!((fine_sine(FINEANGLES / 4).0 - FRACUNIT).abs() <= 1);
        assert!(fine_cosine(0).0 > FRACUNIT - 2);
        assert!(fine_sine(3 * FINEANGLES / 4).0 < -FRACUNIT + 2);
    }

    #[test]
    fn tangent_is_one_at_45_degrees() {
        let t = fine_tangent(FINEANGLES / 4 + FINEANGLES / 8);
        assert!((t.0 - FRACUNIT).abs() < 128, "tan 45° = {:#x}", t.0);
    }

    #[test]
    fn point_to_angle_cardinal_directions() {
        let one = Fixed::ONE;
        assert_eq!(point_to_angle(one, Fixed::ZERO), Angle(0));
        assert!(near(point_to_angle(Fixed::ZERO, one), ANG90));
        assert!(near(point_to_angle(-one, Fixed::ZERO), ANG180));
        assert!(near(point_to_angle(Fixed::ZERO, -one), ANG270));
        assert!(near(point_to_angle(one, one), ANG45));
        assert!(near(point_to_angle(-one, -one), ANG180 + ANG45));
    }
}
