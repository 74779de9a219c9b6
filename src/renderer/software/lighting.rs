//! Light diminishing: sector light + distance → colormap index.
//!
//! Walls and sprites shade by projected *scale*, floors and ceilings by
//! *distance*. Both tables are indexed by a light row derived from the
//! sector light level.

use crate::math::{FRACUNIT, Fixed};
use crate::world::texture::NUMCOLORMAPS;

use super::tables::BASE_WIDTH;

pub const LIGHTLEVELS: usize = 16;
pub const LIGHTSEGSHIFT: u32 = 4;
pub const MAXLIGHTSCALE: usize = 48;
pub const LIGHTSCALESHIFT: u32 = 12;
pub const MAXLIGHTZ: usize = 128;
pub const LIGHTZSHIFT: u32 = 20;
/// Sector light drops one colormap every `DISTMAP` steps.
const DISTMAP: i32 = 2;

/// Colormap used for shadow (fuzz) sprites.
pub const FUZZ_COLORMAP: usize = 6;

#[derive(Clone, Debug)]
pub struct LightTables {
    scale: Vec<[u8; MAXLIGHTSCALE]>,
    z: Vec<[u8; MAXLIGHTZ]>,
}

/// How one surface resolves its colormap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightSource {
    /// Every texel uses the same map.
    Fixed(u8),
    /// Row of the diminishing tables.
    Diminished(usize),
}

#[inline]
fn start_map(level: usize) -> i32 {
    (((LIGHTLEVELS - 1 - level) * 2 * NUMCOLORMAPS) / LIGHTLEVELS) as i32
}

impl LightTables {
    pub fn build(view_width: usize) -> Self {
        let view_width = view_width.max(1) as i32;
        let scale = (0..LIGHTLEVELS)
            .map(|level| {
                let start = start_map(level);
                std::array::from_fn(|j| {
                    let m = start - j as i32 * BASE_WIDTH / view_width / DISTMAP;
                    m.clamp(0, NUMCOLORMAPS as i32 - 1) as u8
                })
            })
            .collect();

        let z = (0..LIGHTLEVELS)
            .map(|level| {
                let start = start_map(level);
                std::array::from_fn(|j| {
                    let dist = Fixed(((j + 1) << LIGHTZSHIFT) as i32);
                    let scale = (Fixed(BASE_WIDTH / 2 * FRACUNIT) / dist).0 >> LIGHTSCALESHIFT;
                    (start - scale / DISTMAP).clamp(0, NUMCOLORMAPS as i32 - 1) as u8
                })
            })
            .collect();

        Self { scale, z }
    }

    /// Light row for a sector light level plus the camera's extra light
    /// and the axis-aligned wall bias (-1 / 0 / +1).
    #[inline]
    pub fn row(sector_light: i16, extra: i32, bias: i32) -> usize {
        ((sector_light as i32 >> LIGHTSEGSHIFT) + extra + bias).clamp(0, LIGHTLEVELS as i32 - 1)
            as usize
    }

    #[inline]
    pub fn at_scale(&self, row: usize, scale: Fixed) -> u8 {
        let i = (scale.0 >> LIGHTSCALESHIFT).clamp(0, MAXLIGHTSCALE as i32 - 1);
        self.scale[row][i as usize]
    }

    #[inline]
    pub fn at_distance(&self, row: usize, distance: Fixed) -> u8 {
        let i = (distance.0 >> LIGHTZSHIFT).clamp(0, MAXLIGHTZ as i32 - 1);
        self.z[row][i as usize]
    }
}

impl LightSource {
    /// Resolve the surface light: a fixed colormap wins over diminishing.
    pub fn new(fixed: Option<u8>, sector_light: i16, extra: i32, bias: i32) -> Self {
        match fixed {
            Some(map) => LightSource::Fixed(map),
            None => LightSource::Diminished(LightTables::row(sector_light, extra, bias)),
        }
    }

    #[inline(always)]
    pub fn at_scale(self, tables: &LightTables, scale: Fixed) -> u8 {
        match self {
            LightSource::Fixed(map) => map,
            LightSource::Diminished(row) => tables.at_scale(row, scale),
        }
    }

    #[inline(always)]
    pub fn at_distance(self, tables: &LightTables, distance: Fixed) -> u8 {
        match self {
            LightSource::Fixed(map) => map,
            LightSource::Diminished(row) => tables.at_distance(row, distance),
        }
    }
}
