//! Camera-relative geometry: view point, distances, projected scale.

use crate::math::{ANG90, Angle, DBITS, FRACUNIT, Fixed, SLOPERANGE, fine_sine, point_to_angle, tan_to_angle};
use crate::world::Camera;

use super::tables::ViewTables;

/// Nearest distance at which a sprite is still projected.
pub const MINZ: Fixed = Fixed(FRACUNIT * 4);

/// Projected scale is kept inside these bounds.
const MIN_SCALE: i32 = 256;
const MAX_SCALE: i32 = 64 * FRACUNIT;

/// Camera state frozen for one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct ViewPoint {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
    pub angle: Angle,
    pub sin: Fixed,
    pub cos: Fixed,
    pub extra_light: i32,
    pub fixed_colormap: Option<u8>,
}

impl ViewPoint {
    pub fn from_camera(cam: &Camera) -> Self {
        Self {
            x: cam.x,
            y: cam.y,
            z: cam.z,
            angle: cam.angle,
            sin: cam.angle.sin(),
            cos: cam.angle.cos(),
            extra_light: cam.extra_light,
            fixed_colormap: cam.fixed_colormap,
        }
    }

    /// Absolute angle from the eye to a map point.
    #[inline]
    pub fn angle_to(&self, x: Fixed, y: Fixed) -> Angle {
        point_to_angle(x - self.x, y - self.y)
    }

    /// Euclidean distance from the eye to a map point, via the tables.
    pub fn distance_to(&self, x: Fixed, y: Fixed) -> Fixed {
        let mut dx = (x - self.x).abs();
        let mut dy = (y - self.y).abs();
        if dy > dx {
            std::mem::swap(&mut dx, &mut dy);
        }
        if dx.0 == 0 {
            return Fixed::ZERO;
        }
        let slope = (((dy / dx).0 >> DBITS) as usize).min(SLOPERANGE);
        let angle = tan_to_angle(slope) + ANG90;
        dx / fine_sine(angle.fine())
    }
}

/// Projected scale of the point seen along `visangle` on a wall with
/// normal `normal` at perpendicular distance `distance`.
pub fn scale_from_global_angle(
    tables: &ViewTables,
    view_angle: Angle,
    visangle: Angle,
    normal: Angle,
    distance: Fixed,
) -> Fixed {
    let anglea = ANG90 + (visangle - view_angle);
    let angleb = ANG90 + (visangle - normal);
    let sinea = anglea.sin();
    let sineb = angleb.sin();
    let num = tables.projection * sineb;
    let den = distance * sinea;

    if den.0 > num.0 >> 16 {
        Fixed((num / den).0.clamp(MIN_SCALE, MAX_SCALE))
    } else {
        Fixed(MAX_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn eye() -> ViewPoint {
        ViewPoint::from_camera(&Camera::new(Vec3::new(0.0, 0.0, 41.0), 0.0))
    }

    #[test]
    fn distance_matches_pythagoras() {
        let v = eye();
        let d = v.distance_to(Fixed::from_int(300), Fixed::from_int(400));
        assert!((d.to_f32() - 500.0).abs() < 1.0, "{}", d.to_f32());
        let d = v.distance_to(Fixed::from_int(-128), Fixed::ZERO);
        assert!((d.to_f32() - 128.0).abs() < 0.5);
        assert_eq!(v.distance_to(Fixed::ZERO, Fixed::ZERO), Fixed::ZERO);
    }

    #[test]
    fn facing_wall_scale_is_projection_over_distance() {
        let t = ViewTables::build(320, 200);
        let v = eye();
        // wall straight ahead, its normal along the view direction
        let s = scale_from_global_angle(&t, v.angle, v.angle, v.angle, Fixed::from_int(160));
        assert!((s.to_f32() - 1.0).abs() < 0.01, "{}", s.to_f32());
    }

    #[test]
    fn scale_is_clamped() {
        let t = ViewTables::build(320, 200);
        let near = scale_from_global_angle(&t, Angle(0), Angle(0), Angle(0), Fixed(16));
        assert_eq!(near, Fixed(64 * FRACUNIT));
        let narrow = ViewTables::build(64, 40);
        let far = scale_from_global_angle(&narrow, Angle(0), Angle(0), Angle(0), Fixed::from_int(30000));
        assert_eq!(far, Fixed(256));
    }
}
