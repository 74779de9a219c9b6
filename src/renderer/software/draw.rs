//! Pixel primitives: textured columns, flat spans, fuzz and masked posts.
//!
//! All coordinates are viewport-relative; the [`Viewport`] maps them into
//! the larger frame-buffer.

use crate::math::{FRACBITS, FRACUNIT, Fixed};
use crate::renderer::{FrameBuffer, Pixel, ViewWindow};
use crate::world::texture::{Flat, Texture};

/// Row offsets (±1) used to smear shadow sprites.
pub const FUZZ_TABLE: [i8; 50] = [
    1, -1, 1, -1, 1, 1, -1, 1, 1, -1, 1, 1, 1, -1, 1, 1, 1, -1, -1, -1, -1, 1, -1, -1, 1, 1, 1, 1,
    -1, 1, -1, 1, 1, -1, -1, 1, 1, -1, -1, -1, -1, 1, 1, 1, 1, -1, 1, 1, -1, 1,
];

/// Mutable view of the viewport rectangle inside the frame-buffer.
pub struct Viewport<'a> {
    pixels: &'a mut [Pixel],
    pitch: usize,
    origin: usize,
    pub width: i32,
    pub height: i32,
}

impl<'a> Viewport<'a> {
    pub fn new(fb: &'a mut FrameBuffer, win: &ViewWindow) -> Self {
        Self {
            origin: win.y * fb.width + win.x,
            pitch: fb.width,
            width: win.width as i32,
            height: win.height as i32,
            pixels: &mut fb.pixels,
        }
    }

    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> usize {
        self.origin + y as usize * self.pitch + x as usize
    }

    pub fn fill(&mut self, value: Pixel) {
        for y in 0..self.height {
            let start = self.index(0, y);
            self.pixels[start..start + self.width as usize].fill(value);
        }
    }
}

/// How texels reach the screen.
#[derive(Clone, Copy)]
pub enum Blend<'a> {
    Opaque {
        colormap: &'a [u8; 256],
        translation: Option<&'a [u8; 256]>,
    },
    /// Darken what is already on screen, ignoring the texels.
    Fuzz { colormap: &'a [u8; 256] },
}

/// One vertical run of texels.
pub struct ColumnJob<'a> {
    pub x: i32,
    pub yl: i32,
    pub yh: i32,
    pub iscale: Fixed,
    pub texture_mid: Fixed,
    pub source: &'a [u8],
    /// Wall columns repeat vertically; sprite posts clamp.
    pub wrap: bool,
}

/// Draw rows `yl..=yh` of column `x`, stepping through `source` by
/// `iscale` per row.
pub fn draw_column(vp: &mut Viewport, centery: i32, job: &ColumnJob, blend: Blend, fuzz_pos: &mut usize) {
    if job.x < 0 || job.x >= vp.width || job.source.is_empty() {
        return;
    }
    let (colormap, translation) = match blend {
        Blend::Opaque {
            colormap,
            translation,
        } => (colormap, translation),
        Blend::Fuzz { colormap } => {
            draw_fuzz_column(vp, job.x, job.yl, job.yh, colormap, fuzz_pos);
            return;
        }
    };

    let yl = job.yl.max(0);
    let yh = job.yh.min(vp.height - 1);
    if yl > yh {
        return;
    }

    let h = job.source.len() as i32;
    let pow2 = h & (h - 1) == 0;
    let mut frac = job.texture_mid + Fixed((yl - centery).wrapping_mul(job.iscale.0));

    for y in yl..=yh {
        let t = frac.0 >> FRACBITS;
        let row = if !job.wrap {
            t.clamp(0, h - 1)
        } else if pow2 {
            t & (h - 1)
        } else {
            t.rem_euclid(h)
        };
        let mut texel = job.source[row as usize];
        if let Some(tr) = translation {
            texel = tr[texel as usize];
        }
        let i = vp.index(job.x, y);
        vp.pixels[i] = colormap[texel as usize];
        frac += job.iscale;
    }
}

/// Shadow effect: every pixel becomes a darkened copy of a neighbour one
/// row up or down. The first and last viewport rows are never sampled
/// across.
pub fn draw_fuzz_column(
    vp: &mut Viewport,
    x: i32,
    yl: i32,
    yh: i32,
    colormap: &[u8; 256],
    fuzz_pos: &mut usize,
) {
    let yl = yl.max(1);
    let yh = yh.min(vp.height - 2);
    if yl > yh || x < 0 || x >= vp.width {
        return;
    }
    for y in yl..=yh {
        let src = vp.index(x, y + FUZZ_TABLE[*fuzz_pos] as i32);
        let dst = vp.index(x, y);
        vp.pixels[dst] = colormap[vp.pixels[src] as usize];
        *fuzz_pos = (*fuzz_pos + 1) % FUZZ_TABLE.len();
    }
}

/// One horizontal run of a flat.
pub struct SpanJob<'a> {
    pub y: i32,
    pub x1: i32,
    pub x2: i32,
    pub xfrac: Fixed,
    pub yfrac: Fixed,
    pub xstep: Fixed,
    pub ystep: Fixed,
    pub flat: &'a Flat,
    pub colormap: &'a [u8; 256],
}

pub fn draw_span(vp: &mut Viewport, job: &SpanJob) {
    if job.y < 0 || job.y >= vp.height {
        return;
    }
    let x1 = job.x1.max(0);
    let x2 = job.x2.min(vp.width - 1);
    let mut xfrac = job.xfrac + Fixed(job.xstep.0.wrapping_mul(x1 - job.x1));
    let mut yfrac = job.yfrac + Fixed(job.ystep.0.wrapping_mul(x1 - job.x1));
    for x in x1..=x2 {
        let spot = ((yfrac.0 >> (FRACBITS - 6)) & (63 * 64)) + ((xfrac.0 >> FRACBITS) & 63);
        let i = vp.index(x, job.y);
        vp.pixels[i] = job.colormap[job.flat.spot(spot as usize) as usize];
        xfrac += job.xstep;
        yfrac += job.ystep;
    }
}

/// A texture column drawn post by post (holes stay untouched), clipped
/// against the rows hidden above `clip_top` and below `clip_bottom`.
pub struct MaskedJob<'a> {
    pub x: i32,
    pub texture: &'a Texture,
    pub column: i32,
    /// Screen y (fixed) of texture row 0.
    pub top_screen: Fixed,
    pub scale: Fixed,
    pub iscale: Fixed,
    pub texture_mid: Fixed,
    pub clip_top: i16,
    pub clip_bottom: i16,
}

pub fn draw_masked_column(
    vp: &mut Viewport,
    centery: i32,
    job: &MaskedJob,
    blend: Blend,
    fuzz_pos: &mut usize,
) {
    for &post in job.texture.posts(job.column) {
        let top = job.top_screen + Fixed(job.scale.0.wrapping_mul(post.top as i32));
        let bottom = top + Fixed(job.scale.0.wrapping_mul(post.len as i32));

        let mut yl = (top.0 + FRACUNIT - 1) >> FRACBITS;
        let mut yh = (bottom.0 - 1) >> FRACBITS;
        if yh >= job.clip_bottom as i32 {
            yh = job.clip_bottom as i32 - 1;
        }
        if yl <= job.clip_top as i32 {
            yl = job.clip_top as i32 + 1;
        }
        if yl > yh {
            continue;
        }

        let column = ColumnJob {
            x: job.x,
            yl,
            yh,
            iscale: job.iscale,
            texture_mid: job.texture_mid - Fixed::from_int(post.top as i32),
            source: job.texture.post_pixels(job.column, post),
            wrap: false,
        };
        draw_column(vp, centery, &column, blend, fuzz_pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::texture::{Colormap, TRANSPARENT};

    fn identity() -> Colormap {
        Colormap::identity()
    }

    #[test]
    fn column_samples_rows_at_unit_scale() {
        let mut fb = FrameBuffer::new(4, 8);
        let win = ViewWindow::full(4, 8);
        let tex: Vec<u8> = (10..18).collect();
        let cm = identity();
        let mut vp = Viewport::new(&mut fb, &win);
        let job = ColumnJob {
            x: 1,
            yl: 0,
            yh: 7,
            iscale: Fixed::ONE,
            texture_mid: Fixed::from_int(4),
            source: &tex,
            wrap: true,
        };
        let blend = Blend::Opaque {
            colormap: &cm[0],
            translation: None,
        };
        draw_column(&mut vp, 4, &job, blend, &mut 0);
        let col: Vec<u8> = (0..8).map(|y| fb.pixel(1, y)).collect();
        assert_eq!(col, (10..18).collect::<Vec<u8>>());
        assert_eq!(fb.pixel(0, 0), 0);
    }

    #[test]
    fn viewport_offsets_into_the_buffer() {
        let mut fb = FrameBuffer::new(10, 10);
        let win = ViewWindow {
            screen_width: 10,
            screen_height: 10,
            x: 2,
            y: 3,
            width: 4,
            height: 4,
        };
        Viewport::new(&mut fb, &win).fill(9);
        assert_eq!(fb.pixel(2, 3), 9);
        assert_eq!(fb.pixel(5, 6), 9);
        assert_eq!(fb.pixel(1, 3), 0);
        assert_eq!(fb.pixel(6, 3), 0);
        assert_eq!(fb.pixel(2, 7), 0);
    }

    #[test]
    fn masked_column_skips_holes() {
        let tex = Texture::from_fn("HOLE", 1, 8, |_, y| if (2..4).contains(&y) { TRANSPARENT } else { 50 });
        let mut fb = FrameBuffer::new(1, 8);
        fb.pixels.fill(1);
        let win = ViewWindow::full(1, 8);
        let cm = identity();
        let job = MaskedJob {
            x: 0,
            texture: &tex,
            column: 0,
            top_screen: Fixed::ZERO,
            scale: Fixed::ONE,
            iscale: Fixed::ONE,
            texture_mid: Fixed::from_int(4),
            clip_top: -1,
            clip_bottom: 8,
        };
        let blend = Blend::Opaque {
            colormap: &cm[0],
            translation: None,
        };
        draw_masked_column(&mut Viewport::new(&mut fb, &win), 4, &job, blend, &mut 0);
        let col: Vec<u8> = (0..8).map(|y| fb.pixel(0, y)).collect();
        assert_eq!(col, vec![50, 50, 1, 1, 50, 50, 50, 50]);
    }

    #[test]
    fn fuzz_stays_inside_the_viewport() {
        let mut fb = FrameBuffer::new(1, 6);
        fb.pixels.copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        let win = ViewWindow::full(1, 6);
        let cm = identity();
        let mut pos = 0;
        draw_fuzz_column(&mut Viewport::new(&mut fb, &win), 0, 0, 5, &cm[0], &mut pos);
        // rows 0 and 5 untouched
        assert_eq!(fb.pixel(0, 0), 1);
        assert_eq!(fb.pixel(0, 5), 6);
        assert_eq!(pos, 4);
    }

    #[test]
    fn span_tiles_the_flat() {
        let flat = Flat::from_fn("GRID", |x, y| (x + y * 2) as u8);
        let mut fb = FrameBuffer::new(4, 1);
        let win = ViewWindow::full(4, 1);
        let cm = identity();
        let job = SpanJob {
            y: 0,
            x1: 0,
            x2: 3,
            xfrac: Fixed::from_int(62),
            yfrac: Fixed::from_int(1),
            xstep: Fixed::ONE,
            ystep: Fixed::ZERO,
            flat: &flat,
            colormap: &cm[0],
        };
        draw_span(&mut Viewport::new(&mut fb, &win), &job);
        assert_eq!(fb.row(0), &[64, 65, 2, 3]);
    }
}
