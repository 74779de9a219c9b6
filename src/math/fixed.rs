use std::ops::{Add, AddAssign, Div, Mul, Neg, Shl, Shr, Sub, SubAssign};

pub const FRACBITS: u32 = 16;
pub const FRACUNIT: i32 = 1 << FRACBITS;

/// 16.16 fixed-point scalar.
///
/// Arithmetic wraps like the 32-bit integers it is made of; `*` and `/`
/// are the classic `FixedMul` / `FixedDiv` (division saturates instead of
/// overflowing).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(FRACUNIT);
    pub const MAX: Fixed = Fixed(i32::MAX);
    pub const MIN: Fixed = Fixed(i32::MIN);

    #[inline(always)]
    pub const fn from_int(v: i32) -> Self {
        Fixed(v << FRACBITS)
    }

    #[inline]
    pub fn from_f32(v: f32) -> Self {
        Fixed((v * FRACUNIT as f32).round() as i32)
    }

    /// Integer part, rounded towards negative infinity.
    #[inline(always)]
    pub const fn to_int(self) -> i32 {
        self.0 >> FRACBITS
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / FRACUNIT as f32
    }

    #[inline(always)]
    pub const fn abs(self) -> Self {
        Fixed(self.0.wrapping_abs())
    }

    #[inline(always)]
    pub const fn fixed_mul(self, rhs: Fixed) -> Fixed {
        Fixed(((self.0 as i64 * rhs.0 as i64) >> FRACBITS) as i32)
    }

    #[inline]
    pub const fn fixed_div(self, rhs: Fixed) -> Fixed {
        if rhs.0 == 0 || (self.0.wrapping_abs() >> 14) >= rhs.0.wrapping_abs() {
            if (self.0 ^ rhs.0) < 0 {
                Fixed::MIN
            } else {
                Fixed::MAX
            }
        } else {
            Fixed((((self.0 as i64) << FRACBITS) / rhs.0 as i64) as i32)
        }
    }
}

impl Add for Fixed {
    type Output = Fixed;
    #[inline(always)]
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    #[inline(always)]
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_sub(rhs.0))
    }
}

impl AddAssign for Fixed {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Fixed) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl SubAssign for Fixed {
    #[inline(always)]
    fn sub_assign(&mut self, rhs: Fixed) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    #[inline(always)]
    fn neg(self) -> Fixed {
        Fixed(self.0.wrapping_neg())
    }
}

impl Mul for Fixed {
    type Output = Fixed;
    #[inline(always)]
    fn mul(self, rhs: Fixed) -> Fixed {
        self.fixed_mul(rhs)
    }
}

impl Div for Fixed {
    type Output = Fixed;
    #[inline(always)]
    fn div(self, rhs: Fixed) -> Fixed {
        self.fixed_div(rhs)
    }
}

impl Shr<u32> for Fixed {
    type Output = Fixed;
    #[inline(always)]
    fn shr(self, rhs: u32) -> Fixed {
        Fixed(self.0 >> rhs)
    }
}

impl Shl<u32> for Fixed {
    type Output = Fixed;
    #[inline(always)]
    fn shl(self, rhs: u32) -> Fixed {
        Fixed(self.0.wrapping_shl(rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_and_div_match_reals() {
        let a = Fixed::from_int(3);
        let b = Fixed(FRACUNIT / 2);
        assert_eq!(a * b, Fixed(3 * FRACUNIT / 2));
        assert_eq!(a / b, Fixed::from_int(6));
        assert_eq!((-a) * b, Fixed(-3 * FRACUNIT / 2));
    }

    #[test]
    fn division_saturates() {
        assert_eq!(Fixed::from_int(1) / Fixed(1), Fixed::MAX);
        assert_eq!(Fixed::from_int(-1) / Fixed(1), Fixed::MIN);
        assert_eq!(Fixed::from_int(5) / Fixed::ZERO, Fixed::MAX);
        assert_eq!(Fixed::MIN / Fixed::ZERO, Fixed::MIN);
    }

    #[test]
    fn to_int_floors() {
        assert_eq!(Fixed(-1).to_int(), -1);
        assert_eq!(Fixed(FRACUNIT - 1).to_int(), 0);
        assert_eq!(Fixed::from_f32(2.5), Fixed(FRACUNIT * 5 / 2));
    }
}
