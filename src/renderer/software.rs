//! ---------------------------------------------------------------------------
//! Classic software (CPU) column renderer
//!
//! * Fills a palette-indexed [`FrameBuffer`]; every pixel goes through a
//!   colormap so lighting is a table lookup.
//! * Walls are drawn front to back while the BSP is walked; the clip-range
//!   list and per-column clip bands replace a depth buffer.
//! * Floors and ceilings are collected as visplanes and drawn as spans
//!   afterwards; sprites and masked mid-textures are composited last,
//!   clipped against the silhouettes the walls left behind.
//!
//! All state lives in [`Software`]; nothing is global apart from the
//! constant trig tables.
//! ---------------------------------------------------------------------------

mod bsp;
mod clip;
mod draw;
mod lighting;
mod openings;
mod planes;
mod projection;
mod segs;
mod sprites;
mod tables;

pub use clip::ClipRange;
pub use lighting::{LightSource, LightTables};
pub use openings::ScratchSpan;
pub use projection::{ViewPoint, scale_from_global_angle};
pub use segs::{DrawSeg, SilClip, Silhouette, WallClass};
pub use sprites::{SpriteShade, VisSprite};
pub use tables::ViewTables;

use crate::{
    renderer::{FrameBuffer, Renderer, ViewWindow},
    world::{Camera, Level, LinedefId, TextureBank},
};

use self::{
    clip::{ClipBands, SolidSegs},
    draw::Viewport,
    openings::FrameScratch,
    planes::{PlaneId, PlaneMap},
};

/*───────────────────────────────────────────────────────────────────────*/
/*                             Configuration                            */
/*───────────────────────────────────────────────────────────────────────*/

/// Optional caps on per-frame records. `None` means grow as needed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Limits {
    pub draw_segs: Option<usize>,
    pub vis_sprites: Option<usize>,
    pub visplanes: Option<usize>,
    /// Cells of the saved-clip arena.
    pub openings: Option<usize>,
}

impl Limits {
    pub const fn unlimited() -> Self {
        Self {
            draw_segs: None,
            vis_sprites: None,
            visplanes: None,
            openings: None,
        }
    }

    /// The fixed array sizes of the classic engine.
    pub const fn vanilla() -> Self {
        Self {
            draw_segs: Some(256),
            vis_sprites: Some(128),
            visplanes: Some(128),
            openings: Some(320 * 64),
        }
    }

    #[inline]
    fn reached(limit: Option<usize>, used: usize) -> bool {
        limit.is_some_and(|max| used >= max)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    pub window: ViewWindow,
    pub limits: Limits,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window: ViewWindow::full(320, 200),
            limits: Limits::unlimited(),
        }
    }
}

/// Counters for the last frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub subsectors: usize,
    pub draw_segs: usize,
    pub vis_sprites: usize,
    pub visplanes: usize,
    pub openings: usize,
    pub dropped_draw_segs: usize,
    pub dropped_vis_sprites: usize,
    pub dropped_visplanes: usize,
    pub dropped_openings: usize,
}

impl FrameStats {
    pub fn dropped(&self) -> usize {
        self.dropped_draw_segs
            + self.dropped_vis_sprites
            + self.dropped_visplanes
            + self.dropped_openings
    }
}

/*───────────────────────────────────────────────────────────────────────*/
/*                                Backend                               */
/*───────────────────────────────────────────────────────────────────────*/

/// What one frame reads from the outside world.
#[derive(Clone, Copy)]
struct Scene<'a> {
    level: &'a Level,
    bank: &'a TextureBank,
}

/// Doom-style column renderer.
pub struct Software {
    config: RenderConfig,
    screen: FrameBuffer,
    window: ViewWindow,
    tables: ViewTables,
    lights: LightTables,
    view: ViewPoint,

    /* occlusion */
    solid_segs: SolidSegs,
    clip_bands: ClipBands,
    draw_segs: Vec<DrawSeg>,
    scratch: FrameScratch,

    /* planes of the subsector being walked */
    planes: PlaneMap,
    floor_plane: Option<PlaneId>,
    ceiling_plane: Option<PlaneId>,

    /* sprites */
    sprites: Vec<VisSprite>,
    sprite_order: Vec<usize>,
    sprite_clip: ClipBands,
    sectors_seen: Vec<bool>,
    fuzz_pos: usize,

    lines_seen: Vec<LinedefId>,
    line_mask: Vec<bool>,
    stats: FrameStats,
}

impl Default for Software {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl Software {
    pub fn new(config: RenderConfig) -> Self {
        let window = config.window.clamped();
        let mut sw = Self {
            config,
            screen: FrameBuffer::new(window.screen_width, window.screen_height),
            window,
            tables: ViewTables::build(window.width, window.height),
            lights: LightTables::build(window.width),
            view: ViewPoint::default(),
            solid_segs: SolidSegs::default(),
            clip_bands: ClipBands::default(),
            draw_segs: Vec::new(),
            scratch: FrameScratch::default(),
            planes: PlaneMap::default(),
            floor_plane: None,
            ceiling_plane: None,
            sprites: Vec::new(),
            sprite_order: Vec::new(),
            sprite_clip: ClipBands::default(),
            sectors_seen: Vec::new(),
            fuzz_pos: 0,
            lines_seen: Vec::new(),
            line_mask: Vec::new(),
            stats: FrameStats::default(),
        };
        sw.reset_frame();
        sw
    }

    /* accessors -------------------------------------------------------*/

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn window(&self) -> ViewWindow {
        self.window
    }

    pub fn tables(&self) -> &ViewTables {
        &self.tables
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.screen
    }

    /// For collaborators drawing around the viewport (status bar, border).
    pub fn frame_mut(&mut self) -> &mut FrameBuffer {
        &mut self.screen
    }

    /// Wall records of the last frame in creation (front-to-back) order.
    pub fn draw_segs(&self) -> &[DrawSeg] {
        &self.draw_segs
    }

    /// Sprite records of the last frame in compositing order.
    pub fn vis_sprites(&self) -> impl Iterator<Item = &VisSprite> + '_ {
        self.sprite_order.iter().map(|&i| &self.sprites[i])
    }

    /// Columns covered by solid walls, including off-screen sentinels.
    pub fn solid_ranges(&self) -> &[ClipRange] {
        self.solid_segs.ranges()
    }

    /// Linedefs that produced at least one wall column this frame.
    pub fn lines_seen(&self) -> &[LinedefId] {
        &self.lines_seen
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /* frame state -----------------------------------------------------*/

    fn reset_frame(&mut self) {
        let (w, h) = (self.window.width, self.window.height);
        Viewport::new(&mut self.screen, &self.window).fill(0);

        self.solid_segs.reset(w as i32);
        self.clip_bands.reset(w, h);
        self.draw_segs.clear();
        self.scratch.reset();
        self.planes.reset(w, h, self.config.limits.visplanes);
        self.floor_plane = None;
        self.ceiling_plane = None;

        self.sprites.clear();
        self.sprite_order.clear();
        self.sprite_clip.reset(w, h);
        self.fuzz_pos = 0;
        self.lines_seen.clear();
        self.stats = FrameStats::default();
    }

    fn mark_line_seen(&mut self, line: LinedefId) {
        if let Some(seen) = self.line_mask.get_mut(line as usize) {
            if !*seen {
                *seen = true;
                self.lines_seen.push(line);
            }
        }
    }

    fn finish_stats(&mut self) {
        self.stats.draw_segs = self.draw_segs.len();
        self.stats.vis_sprites = self.sprites.len();
        self.stats.visplanes = self.planes.len();
        self.stats.openings = self.scratch.len();
        self.stats.dropped_visplanes = self.planes.dropped();

        if self.stats.dropped() > 0 {
            log::warn!(
                "frame over capacity: dropped {} wall records, {} sprites, {} visplanes, {} clip spans",
                self.stats.dropped_draw_segs,
                self.stats.dropped_vis_sprites,
                self.stats.dropped_visplanes,
                self.stats.dropped_openings,
            );
        }
        log::trace!("{:?}", self.stats);
    }
}

/*──────────────────────── Renderer trait impl ────────────────────────*/
impl Renderer for Software {
    fn begin_frame(&mut self, window: ViewWindow) {
        let window = window.clamped();
        if window.screen_width != self.screen.width || window.screen_height != self.screen.height {
            self.screen = FrameBuffer::new(window.screen_width, window.screen_height);
        }
        if window.width != self.window.width || window.height != self.window.height {
            log::debug!(
                "rebuilding view tables for {}x{} (was {}x{})",
                window.width,
                window.height,
                self.window.width,
                self.window.height
            );
            self.tables = ViewTables::build(window.width, window.height);
            self.lights = LightTables::build(window.width);
        }
        self.window = window;
    }

    fn draw_level(&mut self, level: &Level, camera: &Camera, bank: &TextureBank) {
        self.reset_frame();
        self.view = ViewPoint::from_camera(camera);
        self.planes.set_view(&self.view, &self.tables);

        self.sectors_seen.clear();
        self.sectors_seen.resize(level.sectors.len(), false);
        self.line_mask.clear();
        self.line_mask.resize(level.linedefs.len(), false);

        let scene = Scene { level, bank };
        if !level.subsectors.is_empty() {
            self.render_bsp_node(&scene, level.bsp_root());
        }
        self.draw_planes(&scene);
        self.draw_masked(&scene);
        self.draw_player_sprites(&scene, camera);

        self.finish_stats();
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&FrameBuffer),
    {
        submit(&self.screen);
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RendererExt;
    use crate::world::sample;

    #[test]
    fn border_outside_the_viewport_is_untouched() {
        let scene = sample::single_room().unwrap();
        let mut sw = Software::default();
        let win = ViewWindow::from_blocks(320, 200, 8, 32);
        sw.frame_mut().pixels.fill(0xEE);
        sw.begin_frame(win);
        sw.draw_level(&scene.level, &scene.camera, &scene.bank);

        let fb = sw.frame();
        assert_eq!(fb.pixel(0, 0), 0xEE);
        assert_eq!(fb.pixel(319, 199), 0xEE);
        assert_eq!(fb.pixel(win.x - 1, win.y + 10), 0xEE);
    }

    #[test]
    fn tight_limits_drop_and_count() {
        let scene = sample::demo().unwrap();
        let mut sw = Software::new(RenderConfig {
            limits: Limits {
                draw_segs: Some(1),
                vis_sprites: Some(0),
                visplanes: Some(1),
                openings: None,
            },
            ..RenderConfig::default()
        });
        sw.draw_frame(ViewWindow::full(320, 200), &scene.level, &scene.camera, &scene.bank, |_| {});

        let stats = sw.stats();
        assert_eq!(stats.draw_segs, 1);
        assert_eq!(stats.vis_sprites, 0);
        assert!(stats.visplanes <= 1);
        assert!(stats.dropped_draw_segs > 0);
        assert!(stats.dropped() > 0);
    }

    #[test]
    fn seen_lines_are_reported_once() {
        let mut scene = sample::two_rooms().unwrap();
        let mut sw = Software::default();
        sw.draw_frame(ViewWindow::full(320, 200), &scene.level, &scene.camera, &scene.bank, |_| {});

        let seen = sw.lines_seen().to_vec();
        assert!(!seen.is_empty());
        let mut dedup = seen.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), seen.len());

        scene.level.mark_mapped(&seen);
        for &l in &seen {
            assert!(scene.level.linedefs[l as usize].flags.contains(crate::world::LinedefFlags::MAPPED));
        }
    }

    #[test]
    fn repeated_draws_start_from_scratch() {
        let scene = sample::demo().unwrap();
        let mut sw = Software::default();
        sw.begin_frame(ViewWindow::full(320, 200));
        sw.draw_level(&scene.level, &scene.camera, &scene.bank);
        let (segs, sprites, first) = (sw.draw_segs().len(), sw.vis_sprites().count(), sw.frame().clone());

        sw.draw_level(&scene.level, &scene.camera, &scene.bank);
        assert_eq!(sw.draw_segs().len(), segs);
        assert_eq!(sw.vis_sprites().count(), sprites);
        assert_eq!(sw.stats().draw_segs, segs);
        assert_eq!(sw.frame(), &first);
    }
}
