//! Walls: classification, the per-column wall loop and the wall records
//! later used to clip sprites and draw masked mid-textures.

use bitflags::bitflags;

use crate::{
    math::{ANG90, ANG180, Angle, FINEANGLES, Fixed, fine_tangent},
    world::{
        LinedefFlags, Sector, SegmentId, Sidedef, Vertex,
        texture::{NO_TEXTURE, TextureBank, TextureId},
    },
};

use super::{
    Limits, Scene, Software,
    draw::{Blend, ColumnJob, MaskedJob, Viewport, draw_column, draw_masked_column},
    lighting::LightSource,
    openings::{FrameScratch, ScratchSpan},
    projection::{ViewPoint, scale_from_global_angle},
};

/// Wall heights are stepped with 4 extra bits of precision.
const HEIGHTBITS: u32 = 12;
const HEIGHTUNIT: i32 = 1 << HEIGHTBITS;

/// Masked column already drawn.
const COLUMN_DONE: i16 = i16::MAX;

bitflags! {
    /// Which vertical sides of a wall record occlude sprites.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Silhouette: u8 {
        const BOTTOM = 0x1;
        const TOP    = 0x2;
        const BOTH   = 0x3;
    }
}

/// Saved sprite clip of one side of a wall record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SilClip {
    /// Nothing saved; the side does not clip.
    #[default]
    Open,
    /// Every row of every column is hidden.
    Full,
    /// Per-column clip rows copied from the clip bands.
    Saved(ScratchSpan),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WallClass {
    /// One-sided line or closed door: blocks everything behind it.
    Solid,
    /// Two-sided line with a height or surface change.
    Portal,
    /// Two-sided line with nothing to draw.
    Invisible,
}

impl WallClass {
    pub fn classify(front: &Sector, back: Option<&Sector>, side: &Sidedef) -> Self {
        let Some(back) = back else {
            return WallClass::Solid;
        };
        if back.ceil_h <= front.floor_h || back.floor_h >= front.ceil_h {
            return WallClass::Solid;
        }
        if back.ceil_h != front.ceil_h || back.floor_h != front.floor_h {
            return WallClass::Portal;
        }
        if back.ceil_tex == front.ceil_tex
            && back.floor_tex == front.floor_tex
            && back.light == front.light
            && side.middle == NO_TEXTURE
        {
            return WallClass::Invisible;
        }
        WallClass::Portal
    }
}

/// Record of one drawn wall fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawSeg {
    pub seg: SegmentId,
    pub class: WallClass,
    pub x1: i32,
    pub x2: i32,
    pub scale1: Fixed,
    pub scale2: Fixed,
    pub scale_step: Fixed,
    pub silhouette: Silhouette,
    /// Sprites with feet at or above this height are not clipped below.
    pub bsil_height: Fixed,
    /// Sprites with heads at or below this height are not clipped above.
    pub tsil_height: Fixed,
    pub top_clip: SilClip,
    pub bottom_clip: SilClip,
    /// Texture columns of a masked mid-texture, `COLUMN_DONE` once drawn.
    pub masked_cols: Option<ScratchSpan>,
}

impl DrawSeg {
    /// Interpolated scale at column `x`.
    #[inline]
    pub fn scale_at(&self, x: i32) -> Fixed {
        self.scale1 + Fixed(self.scale_step.0.wrapping_mul(x - self.x1))
    }

    /// Last row hidden from above at column `x`.
    pub(super) fn top_clip_at(&self, scratch: &FrameScratch, x: i32, view_height: i16) -> i16 {
        match self.top_clip {
            SilClip::Open => -1,
            SilClip::Full => view_height,
            SilClip::Saved(span) => scratch.get(span)[(x - self.x1) as usize],
        }
    }

    /// First row hidden from below at column `x`.
    pub(super) fn bottom_clip_at(&self, scratch: &FrameScratch, x: i32, view_height: i16) -> i16 {
        match self.bottom_clip {
            SilClip::Open => view_height,
            SilClip::Full => -1,
            SilClip::Saved(span) => scratch.get(span)[(x - self.x1) as usize],
        }
    }
}

/// The seg being clipped and drawn.
pub(super) struct WallCtx {
    pub seg: SegmentId,
    /// Absolute angle from the eye to the seg's first vertex.
    pub angle1: Angle,
    pub class: WallClass,
}

#[derive(Clone, Copy)]
struct Tier {
    texture: TextureId,
    mid: Fixed,
}

/// Per-column state stepped across one wall fragment.
struct WallRun {
    start: i32,
    stop: i32,
    scale: Fixed,
    scale_step: Fixed,
    center_angle: Angle,
    offset: Fixed,
    distance: Fixed,
    light: LightSource,
    textured: bool,
    mid: Option<Tier>,
    top: Option<Tier>,
    bottom: Option<Tier>,
    masked: Option<ScratchSpan>,
    mark_floor: bool,
    mark_ceiling: bool,
    top_frac: Fixed,
    top_step: Fixed,
    bottom_frac: Fixed,
    bottom_step: Fixed,
    pix_high: Fixed,
    pix_high_step: Fixed,
    pix_low: Fixed,
    pix_low_step: Fixed,
}

/// Angle between the wall normal and the direction to its first vertex,
/// folded into 0‥90°.
fn offset_angle(normal: Angle, angle1: Angle) -> Angle {
    let mut a = normal - angle1;
    if a.0 > ANG180.0 {
        a = -a;
    }
    if a.0 > ANG90.0 { ANG90 } else { a }
}

/// Perpendicular distance from the eye to the wall's line.
pub(super) fn wall_distance(view: &ViewPoint, v1: Vertex, normal: Angle, angle1: Angle) -> Fixed {
    let hyp = view.distance_to(v1.x, v1.y);
    hyp * (ANG90 - offset_angle(normal, angle1)).sin()
}

/// Light bias of axis-aligned walls: east-west walls darker, north-south
/// lighter.
fn axis_bias(v1: Vertex, v2: Vertex) -> i32 {
    if v1.y == v2.y {
        -1
    } else if v1.x == v2.x {
        1
    } else {
        0
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_tier(
    vp: &mut Viewport,
    bank: &TextureBank,
    centery: i32,
    x: i32,
    yl: i32,
    yh: i32,
    tier: Tier,
    column: i32,
    iscale: Fixed,
    blend: Blend,
) {
    let job = ColumnJob {
        x,
        yl,
        yh,
        iscale,
        texture_mid: tier.mid,
        source: bank.texture_or_missing(tier.texture).column(column),
        wrap: true,
    };
    draw_column(vp, centery, &job, blend, &mut 0);
}

impl Software {
    /// Draw columns `start..=stop` of a wall and store its record.
    pub(super) fn store_wall_range(&mut self, scene: &Scene, wall: &WallCtx, start: i32, stop: i32) {
        let limits = self.config.limits;
        if Limits::reached(limits.draw_segs, self.draw_segs.len()) {
            self.stats.dropped_draw_segs += 1;
            return;
        }
        let cells = 3 * (stop - start + 1) as usize;
        if limits.openings.is_some_and(|max| self.scratch.len() + cells > max) {
            self.stats.dropped_openings += 1;
            return;
        }

        let level = scene.level;
        let bank = scene.bank;
        let seg = &level.segs[wall.seg as usize];
        let line = &level.linedefs[seg.linedef as usize];
        let side = &level.sidedefs[seg.sidedef as usize];
        let front = &level.sectors[seg.front_sector as usize];
        let back = seg.back_sector.map(|s| &level.sectors[s as usize]);
        let v1 = level.vertices[seg.v1 as usize];
        let v2 = level.vertices[seg.v2 as usize];
        let view = self.view;
        let sky = level.sky_flat;

        self.mark_line_seen(seg.linedef);

        /* scale at both ends ---------------------------------------------*/
        let normal = seg.angle + ANG90;
        let distance = wall_distance(&view, v1, normal, wall.angle1);
        let at = |x: i32| view.angle + self.tables.xtoviewangle[x as usize];
        let scale1 = scale_from_global_angle(&self.tables, view.angle, at(start), normal, distance);
        let (scale2, scale_step) = if stop > start {
            let s2 = scale_from_global_angle(&self.tables, view.angle, at(stop), normal, distance);
            (s2, Fixed((s2.0 - scale1.0) / (stop - start)))
        } else {
            (scale1, Fixed::ZERO)
        };

        let mut ds = DrawSeg {
            seg: wall.seg,
            class: wall.class,
            x1: start,
            x2: stop,
            scale1,
            scale2,
            scale_step,
            silhouette: Silhouette::empty(),
            bsil_height: Fixed::ZERO,
            tsil_height: Fixed::ZERO,
            top_clip: SilClip::Open,
            bottom_clip: SilClip::Open,
            masked_cols: None,
        };

        /* vertical extents, relative to the eye ----------------------------*/
        let mut world_top = front.ceil_h - view.z;
        let mut world_bottom = front.floor_h - view.z;
        let mut world_high = Fixed::ZERO;
        let mut world_low = Fixed::ZERO;

        let (mut mid, mut top, mut bottom) = (None, None, None);
        let mut masked = false;
        let mut mark_floor = true;
        let mut mark_ceiling = true;

        match back {
            None => {
                // single sided line
                let tex = bank.texture_or_missing(side.middle);
                let v_top = if line.flags.contains(LinedefFlags::LOWER_UNPEGGED) {
                    front.floor_h + tex.height_fixed() - view.z
                } else {
                    world_top
                };
                mid = Some(Tier {
                    texture: side.middle,
                    mid: v_top + side.y_off,
                });
                ds.silhouette = Silhouette::BOTH;
                ds.top_clip = SilClip::Full;
                ds.bottom_clip = SilClip::Full;
                ds.bsil_height = Fixed::MAX;
                ds.tsil_height = Fixed::MIN;
            }
            Some(back) => {
                if front.floor_h > back.floor_h {
                    ds.silhouette = Silhouette::BOTTOM;
                    ds.bsil_height = front.floor_h;
                } else if back.floor_h > view.z {
                    ds.silhouette = Silhouette::BOTTOM;
                    ds.bsil_height = Fixed::MAX;
                }
                if front.ceil_h < back.ceil_h {
                    ds.silhouette |= Silhouette::TOP;
                    ds.tsil_height = front.ceil_h;
                } else if back.ceil_h < view.z {
                    ds.silhouette |= Silhouette::TOP;
                    ds.tsil_height = Fixed::MIN;
                }
                if back.ceil_h <= front.floor_h {
                    ds.bottom_clip = SilClip::Full;
                    ds.bsil_height = Fixed::MAX;
                    ds.silhouette |= Silhouette::BOTTOM;
                }
                if back.floor_h >= front.ceil_h {
                    ds.top_clip = SilClip::Full;
                    ds.tsil_height = Fixed::MIN;
                    ds.silhouette |= Silhouette::TOP;
                }

                world_high = back.ceil_h - view.z;
                world_low = back.floor_h - view.z;

                // outdoor areas: no upper wall between two skies
                if front.ceil_tex == sky && back.ceil_tex == sky {
                    world_top = world_high;
                }

                mark_floor = world_low != world_bottom
                    || back.floor_tex != front.floor_tex
                    || back.light != front.light;
                mark_ceiling = world_high != world_top
                    || back.ceil_tex != front.ceil_tex
                    || back.light != front.light;
                if back.ceil_h <= front.floor_h || back.floor_h >= front.ceil_h {
                    // closed door
                    mark_floor = true;
                    mark_ceiling = true;
                }

                if world_high < world_top && side.upper != NO_TEXTURE {
                    let v_top = if line.flags.contains(LinedefFlags::UPPER_UNPEGGED) {
                        world_top
                    } else {
                        let tex = bank.texture_or_missing(side.upper);
                        back.ceil_h + tex.height_fixed() - view.z
                    };
                    top = Some(Tier {
                        texture: side.upper,
                        mid: v_top + side.y_off,
                    });
                }
                if world_low > world_bottom && side.lower != NO_TEXTURE {
                    let v_mid = if line.flags.contains(LinedefFlags::LOWER_UNPEGGED) {
                        world_top
                    } else {
                        world_low
                    };
                    bottom = Some(Tier {
                        texture: side.lower,
                        mid: v_mid + side.y_off,
                    });
                }
                masked = side.middle != NO_TEXTURE;
            }
        }

        let textured = mid.is_some() || top.is_some() || bottom.is_some() || masked;
        let (mut offset, mut center_angle, mut light) = (Fixed::ZERO, Angle(0), LightSource::Fixed(0));
        if textured {
            let hyp = view.distance_to(v1.x, v1.y);
            offset = hyp * offset_angle(normal, wall.angle1).sin();
            if (normal - wall.angle1).0 < ANG180.0 {
                offset = -offset;
            }
            offset += side.x_off + seg.offset;
            center_angle = ANG90 + view.angle - normal;
            light = LightSource::new(
                view.fixed_colormap,
                front.light,
                view.extra_light,
                axis_bias(v1, v2),
            );
        }

        // planes on the far side of the eye are never visible
        if front.floor_h >= view.z {
            mark_floor = false;
        }
        if front.ceil_h <= view.z && front.ceil_tex != sky {
            mark_ceiling = false;
        }

        /* screen-space stepping ------------------------------------------*/
        world_top = world_top >> 4;
        world_bottom = world_bottom >> 4;
        let centery4 = self.tables.centeryfrac >> 4;
        let mut run = WallRun {
            start,
            stop,
            scale: scale1,
            scale_step,
            center_angle,
            offset,
            distance,
            light,
            textured,
            mid,
            top,
            bottom,
            masked: None,
            mark_floor,
            mark_ceiling,
            top_frac: centery4 - world_top * scale1,
            top_step: -(scale_step * world_top),
            bottom_frac: centery4 - world_bottom * scale1,
            bottom_step: -(scale_step * world_bottom),
            pix_high: Fixed::ZERO,
            pix_high_step: Fixed::ZERO,
            pix_low: Fixed::ZERO,
            pix_low_step: Fixed::ZERO,
        };
        if back.is_some() {
            world_high = world_high >> 4;
            world_low = world_low >> 4;
            if world_high < world_top {
                run.pix_high = centery4 - world_high * scale1;
                run.pix_high_step = -(scale_step * world_high);
            }
            if world_low > world_bottom {
                run.pix_low = centery4 - world_low * scale1;
                run.pix_low_step = -(scale_step * world_low);
            }
        }

        if run.mark_ceiling {
            match self.ceiling_plane.and_then(|id| self.planes.check(id, start, stop)) {
                Some(id) => self.ceiling_plane = Some(id),
                None => run.mark_ceiling = false,
            }
        }
        if run.mark_floor {
            match self.floor_plane.and_then(|id| self.planes.check(id, start, stop)) {
                Some(id) => self.floor_plane = Some(id),
                None => run.mark_floor = false,
            }
        }
        if masked {
            let span = self.scratch.alloc((stop - start + 1) as usize, COLUMN_DONE);
            run.masked = Some(span);
            ds.masked_cols = Some(span);
        }

        self.render_seg_loop(bank, &mut run);

        /* save sprite clipping info --------------------------------------*/
        let cols = start as usize..=stop as usize;
        if (ds.silhouette.contains(Silhouette::TOP) || masked) && ds.top_clip == SilClip::Open {
            ds.top_clip = SilClip::Saved(self.scratch.alloc_copy(&self.clip_bands.ceil[cols.clone()]));
        }
        if (ds.silhouette.contains(Silhouette::BOTTOM) || masked) && ds.bottom_clip == SilClip::Open {
            ds.bottom_clip = SilClip::Saved(self.scratch.alloc_copy(&self.clip_bands.floor[cols]));
        }
        if masked && !ds.silhouette.contains(Silhouette::TOP) {
            ds.silhouette |= Silhouette::TOP;
            ds.tsil_height = Fixed::MIN;
        }
        if masked && !ds.silhouette.contains(Silhouette::BOTTOM) {
            ds.silhouette |= Silhouette::BOTTOM;
            ds.bsil_height = Fixed::MAX;
        }
        self.draw_segs.push(ds);
    }

    fn render_seg_loop(&mut self, bank: &TextureBank, run: &mut WallRun) {
        let colormaps = bank.colormap();
        let view_height = self.window.height as i32;
        let centery = self.tables.centery;
        let clamp_row = |y: i32| y.clamp(-1, view_height) as i16;
        let mut vp = Viewport::new(&mut self.screen, &self.window);

        for x in run.start..=run.stop {
            let xi = x as usize;
            let ceil_clip = self.clip_bands.ceil[xi] as i32;
            let floor_clip = self.clip_bands.floor[xi] as i32;

            /* mark floor and ceiling areas -------------------------------*/
            let yl = ((run.top_frac.0 + HEIGHTUNIT - 1) >> HEIGHTBITS).max(ceil_clip + 1);
            if run.mark_ceiling {
                let top = ceil_clip + 1;
                let bottom = (yl - 1).min(floor_clip - 1);
                if let Some(id) = self.ceiling_plane.filter(|_| top <= bottom) {
                    self.planes.get_mut(id).set(x, top, bottom);
                }
            }

            let yh = (run.bottom_frac.0 >> HEIGHTBITS).min(floor_clip - 1);
            if run.mark_floor {
                let top = (yh + 1).max(ceil_clip + 1);
                let bottom = floor_clip - 1;
                if let Some(id) = self.floor_plane.filter(|_| top <= bottom) {
                    self.planes.get_mut(id).set(x, top, bottom);
                }
            }

            /* texture column and light are shared by every tier ----------*/
            let (mut column, mut iscale, mut map) = (0, Fixed::ZERO, 0u8);
            if run.textured {
                let angle = (run.center_angle + self.tables.xtoviewangle[xi]).fine() & (FINEANGLES / 2 - 1);
                column = (run.offset - fine_tangent(angle) * run.distance).to_int();
                map = run.light.at_scale(&self.lights, run.scale);
                iscale = Fixed((0xffff_ffffu32 / run.scale.0.max(1) as u32) as i32);
            }
            let blend = Blend::Opaque {
                colormap: &colormaps[map as usize],
                translation: None,
            };

            /* draw the wall tiers ----------------------------------------*/
            if let Some(mid) = run.mid {
                draw_tier(&mut vp, bank, centery, x, yl, yh, mid, column, iscale, blend);
                self.clip_bands.ceil[xi] = view_height as i16;
                self.clip_bands.floor[xi] = -1;
            } else {
                if let Some(top) = run.top {
                    let mid = (run.pix_high.0 >> HEIGHTBITS).min(floor_clip - 1);
                    run.pix_high += run.pix_high_step;
                    if mid >= yl {
                        draw_tier(&mut vp, bank, centery, x, yl, mid, top, column, iscale, blend);
                        self.clip_bands.ceil[xi] = clamp_row(mid);
                    } else {
                        self.clip_bands.ceil[xi] = clamp_row(yl - 1);
                    }
                } else if run.mark_ceiling {
                    self.clip_bands.ceil[xi] = clamp_row(yl - 1);
                }

                if let Some(bottom) = run.bottom {
                    let ceil_now = self.clip_bands.ceil[xi] as i32;
                    let mid = ((run.pix_low.0 + HEIGHTUNIT - 1) >> HEIGHTBITS).max(ceil_now + 1);
                    run.pix_low += run.pix_low_step;
                    if mid <= yh {
                        draw_tier(&mut vp, bank, centery, x, mid, yh, bottom, column, iscale, blend);
                        self.clip_bands.floor[xi] = clamp_row(mid);
                    } else {
                        self.clip_bands.floor[xi] = clamp_row(yh + 1);
                    }
                } else if run.mark_floor {
                    self.clip_bands.floor[xi] = clamp_row(yh + 1);
                }

                if let Some(span) = run.masked {
                    self.scratch.get_mut(span)[(x - run.start) as usize] = column as i16;
                }
            }

            run.scale += run.scale_step;
            run.top_frac += run.top_step;
            run.bottom_frac += run.bottom_step;
        }
    }

    /// Draw the still pending masked mid-texture columns `x1..=x2` of wall
    /// record `index`.
    pub(super) fn render_masked_seg_range(&mut self, scene: &Scene, index: usize, x1: i32, x2: i32) {
        let ds = self.draw_segs[index];
        let Some(cols) = ds.masked_cols else {
            return;
        };
        let level = scene.level;
        let seg = &level.segs[ds.seg as usize];
        let Some(back) = seg.back_sector.map(|s| &level.sectors[s as usize]) else {
            return;
        };
        let front = &level.sectors[seg.front_sector as usize];
        let side = &level.sidedefs[seg.sidedef as usize];
        let line = &level.linedefs[seg.linedef as usize];
        let tex = scene.bank.texture_or_missing(side.middle);
        let colormaps = scene.bank.colormap();
        let view = self.view;

        let v1 = level.vertices[seg.v1 as usize];
        let v2 = level.vertices[seg.v2 as usize];
        let light = LightSource::new(
            view.fixed_colormap,
            front.light,
            view.extra_light,
            axis_bias(v1, v2),
        );

        let pegged_top = if line.flags.contains(LinedefFlags::LOWER_UNPEGGED) {
            front.floor_h.max(back.floor_h) + tex.height_fixed()
        } else {
            front.ceil_h.min(back.ceil_h)
        };
        let texture_mid = pegged_top - view.z + side.y_off;

        let view_height = self.window.height as i16;
        let centery = self.tables.centery;
        let mut vp = Viewport::new(&mut self.screen, &self.window);
        let mut scale = ds.scale_at(x1);

        for x in x1..=x2 {
            let i = (x - ds.x1) as usize;
            let column = self.scratch.get(cols)[i];
            if column != COLUMN_DONE {
                let map = light.at_scale(&self.lights, scale);
                let job = MaskedJob {
                    x,
                    texture: tex,
                    column: column as i32,
                    top_screen: self.tables.centeryfrac - texture_mid * scale,
                    scale,
                    iscale: Fixed((0xffff_ffffu32 / scale.0.max(1) as u32) as i32),
                    texture_mid,
                    clip_top: ds.top_clip_at(&self.scratch, x, view_height),
                    clip_bottom: ds.bottom_clip_at(&self.scratch, x, view_height),
                };
                let blend = Blend::Opaque {
                    colormap: &colormaps[map as usize],
                    translation: None,
                };
                draw_masked_column(&mut vp, centery, &job, blend, &mut self.fuzz_pos);
                self.scratch.get_mut(cols)[i] = COLUMN_DONE;
            }
            scale += ds.scale_step;
        }
    }
}
