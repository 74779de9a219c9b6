//! Visplanes: floor and ceiling regions marked column by column during the
//! wall pass, rasterized afterwards as horizontal spans.
//!
//! Each row caches the distance and texture steps of the last plane height
//! drawn on it, so stacked spans of one plane reuse them.

use std::collections::HashMap;

use crate::{
    math::{ANG90, FRACUNIT, Fixed, fine_cosine, fine_sine},
    world::texture::{Colormap, Flat, FlatId, Texture},
};

use super::{
    Limits, Scene, Software,
    draw::{Blend, ColumnJob, SpanJob, Viewport, draw_column, draw_span},
    lighting::{LightSource, LightTables},
    projection::ViewPoint,
    tables::ViewTables,
};

pub type PlaneId = u16;

/// Column not covered by the plane.
const UNSET: u16 = u16::MAX;

/// Sky columns repeat four times around the view.
const ANGLETOSKYSHIFT: u32 = 22;
/// Texture row shown at the horizon.
const SKY_TEXTURE_MID: Fixed = Fixed(100 * FRACUNIT);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PlaneKey {
    height: Fixed,
    flat: FlatId,
    light: i16,
}

pub struct VisPlane {
    key: PlaneKey,
    /// Inclusive horizontal range that the plane touches.
    pub min_x: i32,
    pub max_x: i32,
    /// Rows `top..=bottom` per column, indexed `x + 1` so the spans pass
    /// can look one column past either end.
    top: Vec<u16>,
    bottom: Vec<u16>,
}

impl VisPlane {
    fn new(key: PlaneKey, width: usize) -> Self {
        let mut pl = VisPlane {
            key,
            min_x: 0,
            max_x: 0,
            top: Vec::new(),
            bottom: Vec::new(),
        };
        pl.reset(key, width);
        pl
    }

    fn reset(&mut self, key: PlaneKey, width: usize) {
        self.key = key;
        self.min_x = width as i32;
        self.max_x = -1;
        self.top.clear();
        self.top.resize(width + 2, UNSET);
        self.bottom.clear();
        self.bottom.resize(width + 2, 0);
    }

    #[inline(always)]
    pub fn height(&self) -> Fixed {
        self.key.height
    }

    #[inline(always)]
    pub fn flat(&self) -> FlatId {
        self.key.flat
    }

    #[inline(always)]
    pub fn top(&self, x: i32) -> u16 {
        self.top[(x + 1) as usize]
    }

    #[inline(always)]
    pub fn bottom(&self, x: i32) -> u16 {
        self.bottom[(x + 1) as usize]
    }

    /// Mark rows `top..=bottom` of column `x`.
    #[inline(always)]
    pub fn set(&mut self, x: i32, top: i32, bottom: i32) {
        self.top[(x + 1) as usize] = top as u16;
        self.bottom[(x + 1) as usize] = bottom as u16;
    }

    fn unset(&mut self, x: i32) {
        self.top[(x + 1) as usize] = UNSET;
    }
}

#[derive(Clone, Copy, Default)]
struct CachedRow {
    height: Fixed,
    distance: Fixed,
    xstep: Fixed,
    ystep: Fixed,
}

#[derive(Default)]
pub struct PlaneMap {
    /// First plane created for each key.
    map: HashMap<PlaneKey, PlaneId>,
    planes: Vec<VisPlane>,
    live: usize,
    width: usize,
    limit: Option<usize>,
    dropped: usize,
    rows: Vec<CachedRow>,
    span_start: Vec<i32>,
    base_xscale: Fixed,
    base_yscale: Fixed,
}

impl PlaneMap {
    pub fn reset(&mut self, width: usize, height: usize, limit: Option<usize>) {
        self.map.clear();
        self.live = 0;
        self.width = width;
        self.limit = limit;
        self.dropped = 0;
        self.rows.clear();
        self.rows.resize(height, CachedRow::default());
        self.span_start.clear();
        self.span_start.resize(height, 0);
    }

    /// Texture-space step per screen column at unit distance.
    pub fn set_view(&mut self, view: &ViewPoint, tables: &ViewTables) {
        let angle = (view.angle - ANG90).fine();
        self.base_xscale = fine_cosine(angle) / tables.centerxfrac;
        self.base_yscale = -(fine_sine(angle) / tables.centerxfrac);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Planes refused because the limit was reached.
    #[inline]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    #[cfg(test)]
    pub fn get(&self, id: PlaneId) -> &VisPlane {
        &self.planes[id as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: PlaneId) -> &mut VisPlane {
        &mut self.planes[id as usize]
    }

    fn push(&mut self, key: PlaneKey) -> Option<PlaneId> {
        if Limits::reached(self.limit, self.live) {
            self.dropped += 1;
            return None;
        }
        if self.live < self.planes.len() {
            self.planes[self.live].reset(key, self.width);
        } else {
            self.planes.push(VisPlane::new(key, self.width));
        }
        self.live += 1;
        Some((self.live - 1) as PlaneId)
    }

    /// Plane for a floor or ceiling surface. All sky surfaces share one key.
    pub fn find(&mut self, height: Fixed, flat: FlatId, light: i16, sky_flat: FlatId) -> Option<PlaneId> {
        let key = if flat == sky_flat {
            PlaneKey {
                height: Fixed::ZERO,
                flat,
                light: 0,
            }
        } else {
            PlaneKey { height, flat, light }
        };
        if let Some(&id) = self.map.get(&key) {
            return Some(id);
        }
        let id = self.push(key)?;
        self.map.insert(key, id);
        Some(id)
    }

    /// Extend plane `id` over `start..=stop`, or start a new plane with the
    /// same key when any of those columns is already marked.
    pub fn check(&mut self, id: PlaneId, start: i32, stop: i32) -> Option<PlaneId> {
        let pl = &mut self.planes[id as usize];
        let (intrl, unionl) = if start < pl.min_x {
            (pl.min_x, start)
        } else {
            (start, pl.min_x)
        };
        let (intrh, unionh) = if stop > pl.max_x {
            (pl.max_x, stop)
        } else {
            (stop, pl.max_x)
        };

        if (intrl..=intrh).all(|x| pl.top(x) == UNSET) {
            pl.min_x = unionl;
            pl.max_x = unionh;
            return Some(id);
        }

        let key = pl.key;
        let new = self.push(key)?;
        let pl = &mut self.planes[new as usize];
        pl.min_x = start;
        pl.max_x = stop;
        Some(new)
    }
}

/*──────────────────────── span rasterizer ────────────────────────────*/

/// Everything a plane's spans share.
struct SpanCtx<'a> {
    tables: &'a ViewTables,
    lights: &'a LightTables,
    view: &'a ViewPoint,
    colormaps: &'a Colormap,
    flat: &'a Flat,
    light: LightSource,
    height: Fixed,
    base_xscale: Fixed,
    base_yscale: Fixed,
}

fn map_plane(vp: &mut Viewport, ctx: &SpanCtx, rows: &mut [CachedRow], y: i32, x1: i32, x2: i32) {
    if x2 < x1 || y < 0 || y as usize >= rows.len() {
        return;
    }
    let row = &mut rows[y as usize];
    if row.height != ctx.height {
        let distance = ctx.height * ctx.tables.yslope[y as usize];
        *row = CachedRow {
            height: ctx.height,
            distance,
            xstep: distance * ctx.base_xscale,
            ystep: distance * ctx.base_yscale,
        };
    }

    let length = row.distance * ctx.tables.distscale[x1 as usize];
    let angle = (ctx.view.angle + ctx.tables.xtoviewangle[x1 as usize]).fine();
    let xfrac = ctx.view.x + fine_cosine(angle) * length;
    let yfrac = -ctx.view.y - fine_sine(angle) * length;
    let map = ctx.light.at_distance(ctx.lights, row.distance);

    let job = SpanJob {
        y,
        x1,
        x2,
        xfrac,
        yfrac,
        xstep: row.xstep,
        ystep: row.ystep,
        flat: ctx.flat,
        colormap: &ctx.colormaps[map as usize],
    };
    draw_span(vp, &job);
}

/// Turn the column runs of two neighbouring columns into finished spans
/// (rows that end at `x - 1`) and newly started ones (rows that begin at
/// `x`).
#[allow(clippy::too_many_arguments)]
fn make_spans(
    vp: &mut Viewport,
    ctx: &SpanCtx,
    rows: &mut [CachedRow],
    span_start: &mut [i32],
    x: i32,
    mut t1: i32,
    mut b1: i32,
    mut t2: i32,
    mut b2: i32,
) {
    while t1 < t2 && t1 <= b1 {
        map_plane(vp, ctx, rows, t1, span_start[t1 as usize], x - 1);
        t1 += 1;
    }
    while b1 > b2 && b1 >= t1 {
        map_plane(vp, ctx, rows, b1, span_start[b1 as usize], x - 1);
        b1 -= 1;
    }
    while t2 < t1 && t2 <= b2 {
        span_start[t2 as usize] = x;
        t2 += 1;
    }
    while b2 > b1 && b2 >= t2 {
        span_start[b2 as usize] = x;
        b2 -= 1;
    }
}

fn draw_sky(vp: &mut Viewport, tables: &ViewTables, view: &ViewPoint, pl: &VisPlane, sky: &Texture, colormap: &[u8; 256]) {
    let blend = Blend::Opaque {
        colormap,
        translation: None,
    };
    for x in pl.min_x..=pl.max_x {
        let (yl, yh) = (pl.top(x), pl.bottom(x));
        if yl == UNSET || yl > yh {
            continue;
        }
        let angle = (view.angle + tables.xtoviewangle[x as usize]).0 >> ANGLETOSKYSHIFT;
        let job = ColumnJob {
            x,
            yl: yl as i32,
            yh: yh as i32,
            iscale: tables.pspriteiscale,
            texture_mid: SKY_TEXTURE_MID,
            source: sky.column(angle as i32),
            wrap: true,
        };
        draw_column(vp, tables.centery, &job, blend, &mut 0);
    }
}

impl Software {
    /// Rasterize every visplane collected this frame.
    pub(super) fn draw_planes(&mut self, scene: &Scene) {
        let level = scene.level;
        let colormaps = scene.bank.colormap();
        let sky = scene.bank.texture_or_missing(level.sky_texture);
        let mut vp = Viewport::new(&mut self.screen, &self.window);

        let PlaneMap {
            planes,
            live,
            rows,
            span_start,
            base_xscale,
            base_yscale,
            ..
        } = &mut self.planes;

        for pl in planes[..*live].iter_mut() {
            if pl.min_x > pl.max_x {
                continue;
            }

            // sky is unlit and ignores plane height
            if pl.flat() == level.sky_flat {
                draw_sky(&mut vp, &self.tables, &self.view, pl, sky, &colormaps[0]);
                continue;
            }

            let ctx = SpanCtx {
                tables: &self.tables,
                lights: &self.lights,
                view: &self.view,
                colormaps,
                flat: scene.bank.flat_or_missing(pl.flat()),
                light: LightSource::new(self.view.fixed_colormap, pl.key.light, self.view.extra_light, 0),
                height: (pl.height() - self.view.z).abs(),
                base_xscale: *base_xscale,
                base_yscale: *base_yscale,
            };

            let (min_x, max_x) = (pl.min_x, pl.max_x);
            pl.unset(min_x - 1);
            pl.unset(max_x + 1);
            for x in min_x..=max_x + 1 {
                make_spans(
                    &mut vp,
                    &ctx,
                    rows,
                    span_start,
                    x,
                    pl.top(x - 1) as i32,
                    pl.bottom(x - 1) as i32,
                    pl.top(x) as i32,
                    pl.bottom(x) as i32,
                );
            }
        }
    }
}
