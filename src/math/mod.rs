//! Integer math shared by the world model and the renderer.
//!
//! Everything on the render path is 16.16 fixed point and 32-bit binary
//! angles. Floating point only appears while generating the lookup tables
//! and at the authoring boundary (level builder, camera helpers).

mod angle;
mod fixed;
mod trig;

pub use angle::{ANG45, ANG90, ANG180, ANG270, ANGLETOFINESHIFT, Angle, FINEANGLES, FINEMASK};
pub use fixed::{FRACBITS, FRACUNIT, Fixed};
pub use trig::{
    DBITS, SLOPERANGE, fine_cosine, fine_sine, fine_tangent, point_to_angle, slope_div,
    tan_to_angle,
};
