//! Size-dependent projection tables.
//!
//! Everything here depends only on the viewport size and is rebuilt when
//! `begin_frame` sees a new width or height.

use crate::math::{
    ANG90, ANGLETOFINESHIFT, Angle, FINEANGLES, FRACBITS, FRACUNIT, Fixed, fine_tangent,
};

/// Horizontal field of view in fine angles (90°).
pub const FIELDOFVIEW: usize = 2048;

/// Weapon sprites and the sky are authored against this width.
pub const BASE_WIDTH: i32 = 320;

#[derive(Clone, Debug)]
pub struct ViewTables {
    pub width: i32,
    pub height: i32,
    pub centerx: i32,
    pub centery: i32,
    pub centerxfrac: Fixed,
    pub centeryfrac: Fixed,
    pub projection: Fixed,
    /// Half the field of view; anything beyond is outside the screen.
    pub clip_angle: Angle,
    /// Fine angle (+90°) of a view-relative direction → screen column.
    pub viewangletox: Vec<i32>,
    /// Screen column → view-relative angle, `width + 1` entries.
    pub xtoviewangle: Vec<Angle>,
    /// Row → distance of a unit-height plane seen on that row.
    pub yslope: Vec<Fixed>,
    /// Column → 1 / cos(column angle).
    pub distscale: Vec<Fixed>,
    pub pspritescale: Fixed,
    pub pspriteiscale: Fixed,
}

impl ViewTables {
    pub fn build(width: usize, height: usize) -> Self {
        let width = width.max(1) as i32;
        let height = height.max(1) as i32;
        // a single column still needs a non-zero focal length
        let centerx = (width / 2).max(1);
        let centery = height / 2;
        let centerxfrac = Fixed::from_int(centerx);
        let centeryfrac = Fixed::from_int(centery);

        /* angle → column ------------------------------------------------*/
        let focal = centerxfrac / fine_tangent(FINEANGLES / 4 + FIELDOFVIEW / 2);
        let mut viewangletox: Vec<i32> = (0..FINEANGLES / 2)
            .map(|i| {
                let tan = fine_tangent(i);
                if tan.0 > FRACUNIT * 2 {
                    -1
                } else if tan.0 < -FRACUNIT * 2 {
                    width + 1
                } else {
                    let t = (centerxfrac - tan * focal).0 + FRACUNIT - 1;
                    (t >> FRACBITS).clamp(-1, width + 1)
                }
            })
            .collect();

        /* column → angle: lowest angle that maps to the column ---------*/
        let xtoviewangle: Vec<Angle> = (0..=width)
            .map(|x| {
                let i = viewangletox.iter().position(|&t| t <= x).unwrap_or(FINEANGLES / 2);
                Angle((i as u32) << ANGLETOFINESHIFT) - ANG90
            })
            .collect();

        for t in viewangletox.iter_mut() {
            if *t == -1 {
                *t = 0;
            } else if *t == width + 1 {
                *t = width;
            }
        }

        /* planes --------------------------------------------------------*/
        let yslope = (0..height)
            .map(|y| {
                let dy = Fixed(((y - centery) << FRACBITS) + FRACUNIT / 2).abs();
                centerxfrac / dy
            })
            .collect();
        let distscale = xtoviewangle[..width as usize]
            .iter()
            .map(|a| Fixed::ONE / a.cos().abs())
            .collect();

        let pspritescale = Fixed(FRACUNIT * width / BASE_WIDTH);
        let pspriteiscale = Fixed(FRACUNIT * BASE_WIDTH / width);

        Self {
            width,
            height,
            centerx,
            centery,
            centerxfrac,
            centeryfrac,
            projection: centerxfrac,
            clip_angle: xtoviewangle[0],
            viewangletox,
            xtoviewangle,
            yslope,
            distscale,
            pspritescale,
            pspriteiscale,
        }
    }

    /// Clip a view-relative angular span (`angle1` left, `angle2` right)
    /// to the field of view and convert it to inclusive screen columns.
    ///
    /// `None` when the span is outside the view or narrower than a column.
    pub fn angles_to_columns(&self, mut angle1: Angle, mut angle2: Angle) -> Option<(i32, i32)> {
        let clip = self.clip_angle;
        let double_clip = Angle(clip.0.wrapping_mul(2));
        let span = angle1 - angle2;

        let mut tspan = angle1 + clip;
        if tspan.0 > double_clip.0 {
            tspan -= double_clip;
            if tspan.0 >= span.0 {
                return None;
            }
            angle1 = clip;
        }
        let mut tspan = clip - angle2;
        if tspan.0 > double_clip.0 {
            tspan -= double_clip;
            if tspan.0 >= span.0 {
                return None;
            }
            angle2 = -clip;
        }

        let x1 = self.viewangletox[(angle1 + ANG90).fine()];
        let x2 = self.viewangletox[(angle2 + ANG90).fine()];
        (x1 != x2).then_some((x1, x2 - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ANG45;

    #[test]
    fn field_of_view_is_ninety_degrees() {
        let t = ViewTables::build(320, 200);
        let err = t.clip_angle.0 as i64 - ANG45.0 as i64;
        assert!(err.abs() < (1 << 24), "clip angle {:#x}", t.clip_angle.0);
        assert_eq!(t.xtoviewangle.len(), 321);
        assert_eq!(t.centerx, 160);
        assert_eq!(t.centery, 100);
    }

    #[test]
    fn column_angles_decrease_left_to_right() {
        let t = ViewTables::build(320, 200);
        for pair in t.xtoviewangle.windows(2) {
            assert!((pair[0].0 as i32) >= (pair[1].0 as i32));
        }
        // the middle of the screen looks straight ahead
        let mid = t.xtoviewangle[160].0 as i32;
        assert!(mid.abs() < (1 << 22));
    }

    #[test]
    fn angle_span_maps_to_columns() {
        let t = ViewTables::build(320, 200);
        // wider than the field of view
        let wide = ANG90 - Angle(1 << 20);
        assert_eq!(t.angles_to_columns(wide, -wide), Some((0, 319)));
        // entirely behind the left edge
        assert_eq!(t.angles_to_columns(ANG90 + ANG45, ANG90), None);
        // straddling the centre
        let (x1, x2) = t.angles_to_columns(Angle(1 << 26), -Angle(1 << 26)).unwrap();
        assert!(x1 < 160 && x2 >= 159);
    }

    #[test]
    fn single_column_view_keeps_a_sane_clip_angle() {
        let t = ViewTables::build(1, 200);
        assert!(t.clip_angle.0 > 0 && t.clip_angle.0 < ANG90.0, "{:#x}", t.clip_angle.0);
        assert!(t.viewangletox.iter().all(|&x| (0..=1).contains(&x)));
        // any span, however wide, lands on column 0 or nowhere
        for a in 0..64u32 {
            let angle1 = Angle(a << 26);
            if let Some((x1, x2)) = t.angles_to_columns(angle1, angle1 - ANG90) {
                assert_eq!((x1, x2), (0, 0));
            }
        }
    }

    #[test]
    fn weapon_scale_tracks_width() {
        let t = ViewTables::build(640, 400);
        assert_eq!(t.pspritescale, Fixed::from_int(2));
        assert_eq!(t.pspriteiscale, Fixed(FRACUNIT / 2));
    }
}
