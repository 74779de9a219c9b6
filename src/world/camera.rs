use glam::{Vec2, Vec3};
use smallvec::SmallVec;

use crate::math::{Angle, Fixed};
use crate::world::texture::SpriteId;

/// One screen-fixed overlay sprite (weapon, muzzle flash).
///
/// `sx`/`sy` are in 320×200 reference coordinates; the renderer scales
/// them to the view window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerSprite {
    pub sprite: SpriteId,
    /// Frame index plus `FF_FULLBRIGHT`.
    pub frame: u16,
    pub sx: Fixed,
    pub sy: Fixed,
}

/// Player view-point in world space.
///
/// * Only **yaw** (heading) is simulated – the view never tilts up/down.
/// * `z` is the absolute eye height, not height above the floor.
#[derive(Clone, Debug)]
pub struct Camera {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
    pub angle: Angle,
    /// Added to every light level (gun flashes).
    pub extra_light: i32,
    /// Overrides all lighting with one colormap (invulnerability, light amp).
    pub fixed_colormap: Option<u8>,
    /// Weapon overlay drawn with the fuzz effect.
    pub shadow_weapon: bool,
    pub psprites: SmallVec<[PlayerSprite; 2]>,
}

impl Camera {
    /// Create a camera at `pos` (map units, z = absolute eye height) facing
    /// `yaw` radians counter-clockwise from east.
    pub fn new(pos: Vec3, yaw: f32) -> Self {
        Self {
            x: Fixed::from_f32(pos.x),
            y: Fixed::from_f32(pos.y),
            z: Fixed::from_f32(pos.z),
            angle: Angle::from_radians(yaw),
            extra_light: 0,
            fixed_colormap: None,
            shadow_weapon: false,
            psprites: SmallVec::new(),
        }
    }

    /// World-space eye position in map units.
    #[inline]
    pub fn pos(&self) -> Vec3 {
        Vec3::new(self.x.to_f32(), self.y.to_f32(), self.z.to_f32())
    }

    #[inline]
    pub fn yaw(&self) -> f32 {
        self.angle.to_radians()
    }

    /*──────────────────────── derived vectors ───────────────────────*/

    /// Unit vector pointing where the camera looks on the X-Y plane.
    #[inline(always)]
    pub fn forward(&self) -> Vec2 {
        let (s, c) = self.yaw().sin_cos();
        Vec2::new(c, s) // 0 rad = +X (east), CCW positive
    }

    /// Unit vector pointing to the camera's right on the X-Y plane.
    #[inline(always)]
    pub fn right(&self) -> Vec2 {
        -self.forward().perp()
    }

    /*──────────────────────── movement helpers ──────────────────────*/

    /// Move by `forward` units and `side` (strafe right), preserving eye-height.
    pub fn step(&mut self, forward: f32, side: f32) {
        let delta = self.forward() * forward + self.right() * side;
        self.x += Fixed::from_f32(delta.x);
        self.y += Fixed::from_f32(delta.y);
    }

    /// Rotate around Z-axis (positive = turn left).
    pub fn turn(&mut self, delta_yaw: f32) {
        self.angle += Angle::from_radians(delta_yaw);
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ANG90;
    use std::f32::consts::FRAC_PI_2;

    fn close(a: Angle, b: Angle) -> bool {
        (a.0.wrapping_sub(b.0) as i32).unsigned_abs() < 1 << 12
    }

    #[test]
    fn forward_and_right_are_orthonormal() {
        let cam = Camera::new(Vec3::ZERO, 0.3);
        let f = cam.forward();
        let r = cam.right();
        assert!((f.length() - 1.0).abs() < 1e-5);
        assert!((r.length() - 1.0).abs() < 1e-5);
        assert!((f.dot(r)).abs() < 1e-5);
    }

    #[test]
    fn right_is_clockwise_of_forward() {
        let cam = Camera::new(Vec3::ZERO, 0.0);
        assert!((cam.right() - Vec2::new(0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn new_converts_to_fixed() {
        let cam = Camera::new(Vec3::new(64.0, -32.5, 41.0), FRAC_PI_2);
        assert_eq!(cam.x, Fixed::from_int(64));
        assert_eq!(cam.y, Fixed::from_f32(-32.5));
        assert_eq!(cam.z, Fixed::from_int(41));
        assert!(close(cam.angle, ANG90));
    }

    #[test]
    fn step_and_turn() {
        let mut cam = Camera::new(Vec3::ZERO, 0.0);
        cam.step(10.0, 0.0);
        assert_eq!(cam.x, Fixed::from_int(10));
        cam.turn(FRAC_PI_2);
        assert!(close(cam.angle, ANG90));
        cam.step(0.0, 4.0);
        assert_eq!(cam.x, Fixed::from_int(14));
    }
}
