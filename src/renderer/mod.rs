//! Rendering abstraction layer.
//!
//! *The rest of the engine never touches a pixel buffer directly.*
//! It hands a [`Level`], a [`Camera`] and a [`TextureBank`] to a type that
//! implements [`Renderer`] and receives the finished frame in a closure.
//!
//! * Frames are palette-indexed ([`Pixel`] = one byte); converting to RGB
//!   is the presenter's job.
//! * Only the [`ViewWindow`] sub-rectangle is written; the border around it
//!   belongs to whoever draws the status bar.
//! * A helper blanket‐impl [`RendererExt`] adds `draw_frame` so call-sites
//!   stay short.

use crate::world::{Camera, Level, TextureBank};

/// Palette index.
pub type Pixel = u8;

/// Linear, row-major frame-buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Pixel>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Pixel {
        self.pixels[y * self.width + x]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[Pixel] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }
}

/// Output buffer size plus the viewport drawn into it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewWindow {
    pub screen_width: usize,
    pub screen_height: usize,
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl ViewWindow {
    /// Viewport covering the whole buffer.
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            screen_width: width,
            screen_height: height,
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Classic screen-size steps: `blocks` 11 is full screen, 10 keeps the
    /// status bar, 3‥9 shrink the view and centre it above the bar.
    pub fn from_blocks(
        screen_width: usize,
        screen_height: usize,
        blocks: u8,
        status_bar: usize,
    ) -> Self {
        let blocks = blocks.clamp(3, 11) as usize;
        if blocks == 11 {
            return Self::full(screen_width, screen_height);
        }
        let avail = screen_height.saturating_sub(status_bar);
        let width = blocks * screen_width / 10;
        let height = (blocks * avail / 10) & !7;
        let x = (screen_width - width) / 2;
        let y = if width == screen_width {
            0
        } else {
            (avail - height) / 2
        };
        Self {
            screen_width,
            screen_height,
            x,
            y,
            width,
            height,
        }
        .clamped()
    }

    /// Force the viewport inside the buffer and at least one pixel big.
    pub fn clamped(mut self) -> Self {
        self.screen_width = self.screen_width.max(1);
        self.screen_height = self.screen_height.max(1);
        self.x = self.x.min(self.screen_width - 1);
        self.y = self.y.min(self.screen_height - 1);
        self.width = self.width.clamp(1, self.screen_width - self.x);
        self.height = self.height.clamp(1, self.screen_height - self.y);
        self
    }
}

/// A renderer that owns its frame-buffer for the whole frame.
///
/// `end_frame` hands the finished buffer to a user-supplied closure.
pub trait Renderer {
    /// Adopt `window`, rebuilding size-dependent tables only when its size
    /// changed.
    fn begin_frame(&mut self, window: ViewWindow);

    /// Draw the player view of `level` as seen from `camera`. Every call
    /// starts from empty per-frame state, so repeated calls are independent.
    fn draw_level(&mut self, level: &Level, camera: &Camera, bank: &TextureBank);

    /// Finish the frame and **loan** the finished buffer to `submit`.
    ///
    /// * `submit(&FrameBuffer)` is run exactly once per frame.
    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&FrameBuffer);
}

/// Convenience blanket-impl with a one-liner `draw_frame` adaptor.
pub trait RendererExt: Renderer {
    fn draw_frame<F>(
        &mut self,
        window: ViewWindow,
        level: &Level,
        camera: &Camera,
        bank: &TextureBank,
        submit: F,
    ) where
        F: FnOnce(&FrameBuffer),
    {
        self.begin_frame(window);
        self.draw_level(level, camera, bank);
        self.end_frame(submit);
    }
}
impl<T: Renderer + ?Sized> RendererExt for T {}

pub mod software;

pub use software::{FrameStats, Limits, RenderConfig, Software};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_keep_status_bar_free() {
        let w = ViewWindow::from_blocks(320, 200, 10, 32);
        assert_eq!((w.x, w.y, w.width, w.height), (0, 0, 320, 168));

        let w = ViewWindow::from_blocks(320, 200, 7, 32);
        assert_eq!(w.width, 224);
        assert_eq!(w.height, 112);
        assert_eq!(w.x, 48);
        assert_eq!(w.y, 28);

        assert_eq!(ViewWindow::from_blocks(320, 200, 11, 32), ViewWindow::full(320, 200));
    }

    #[test]
    fn clamped_window_fits_the_buffer() {
        let w = ViewWindow {
            screen_width: 100,
            screen_height: 50,
            x: 90,
            y: 10,
            width: 40,
            height: 0,
        }
        .clamped();
        assert_eq!((w.x, w.width), (90, 10));
        assert_eq!(w.height, 1);
    }
}
