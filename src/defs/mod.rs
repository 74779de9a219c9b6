//! Numeric flag definitions shared by the world model and the renderer.

pub mod flags;

pub use self::flags::{FF_FRAMEMASK, FF_FULLBRIGHT, MF_TRANSSHIFT, MobjFlags};
