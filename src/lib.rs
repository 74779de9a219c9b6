//! Fixed-point column/span software renderer for BSP levels.
//!
//! * [`world`] holds the level data, art and camera the renderer reads.
//! * [`renderer`] draws one first-person frame into a palette-indexed
//!   frame-buffer.

pub mod defs;
pub mod math;
pub mod renderer;
pub mod world;
