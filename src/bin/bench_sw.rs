//! Render a sample scene off-screen for a number of frames and report the
//! average frame time and per-frame counters.

use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use yadoom_sw::{
    math::Angle,
    renderer::{Limits, RenderConfig, RendererExt, Software, ViewWindow},
    world::sample::{self, SampleScene},
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SceneArg {
    Room,
    TwoRooms,
    Courtyard,
    Demo,
}

#[derive(Parser, Debug)]
#[command(version, about = "Software renderer benchmark")]
struct Args {
    #[arg(long, short = 'W', default_value_t = 320)]
    width: usize,

    #[arg(long, short = 'H', default_value_t = 200)]
    height: usize,

    /// Screen size in blocks (3‥11, 11 = full screen without status bar).
    #[arg(long, default_value_t = 11, value_parser = clap::value_parser!(u8).range(3..=11))]
    blocks: u8,

    #[arg(long, default_value_t = 500)]
    frames: usize,

    #[arg(long, value_enum, default_value_t = SceneArg::Demo)]
    scene: SceneArg,

    /// Enforce the classic fixed capacities.
    #[arg(long)]
    vanilla_limits: bool,

    /// Degrees to turn between frames.
    #[arg(long, default_value_t = 0.5)]
    spin: f64,
}

fn load(scene: SceneArg) -> anyhow::Result<SampleScene> {
    Ok(match scene {
        SceneArg::Room => sample::single_room()?,
        SceneArg::TwoRooms => sample::two_rooms()?,
        SceneArg::Courtyard => sample::courtyard()?,
        SceneArg::Demo => sample::demo()?,
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    anyhow::ensure!(args.frames > 0, "need at least one frame");

    let mut scene = load(args.scene)?;
    let window = ViewWindow::from_blocks(args.width, args.height, args.blocks, args.height * 32 / 200);
    let limits = if args.vanilla_limits {
        Limits::vanilla()
    } else {
        Limits::unlimited()
    };
    let mut renderer = Software::new(RenderConfig { window, limits });
    log::info!(
        "{:?} at {}x{} (view {}x{}), {} frames",
        args.scene,
        args.width,
        args.height,
        window.width,
        window.height,
        args.frames
    );

    let spin = Angle::from_degrees(args.spin);
    let mut total = Duration::ZERO;
    let mut checksum = 0u64;
    let mut dropped = 0usize;
    for _ in 0..args.frames {
        let t0 = Instant::now();
        renderer.draw_frame(window, &scene.level, &scene.camera, &scene.bank, |fb| {
            checksum = fb
                .pixels
                .iter()
                .fold(checksum, |acc, &p| acc.rotate_left(5) ^ u64::from(p));
        });
        total += t0.elapsed();
        dropped += renderer.stats().dropped();
        scene.camera.angle += spin;
    }

    let stats = renderer.stats();
    let avg_ms = total.as_secs_f64() * 1000.0 / args.frames as f64;
    println!("avg render: {avg_ms:.3} ms  ({:.1} FPS)", 1000.0 / avg_ms);
    println!(
        "last frame: {} subsectors, {} wall records, {} sprites, {} visplanes, {} clip cells",
        stats.subsectors, stats.draw_segs, stats.vis_sprites, stats.visplanes, stats.openings
    );
    if dropped > 0 {
        log::warn!("{dropped} items dropped over all frames");
    }
    log::debug!("frame checksum {checksum:016x}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_flag_is_range_checked() {
        let args = Args::try_parse_from(["bench_sw", "--blocks", "7"]).unwrap();
        let win = ViewWindow::from_blocks(args.width, args.height, args.blocks, 32);
        assert_eq!((win.width, win.height), (224, 112));
        assert!(Args::try_parse_from(["bench_sw", "--blocks", "12"]).is_err());
        assert!(Args::try_parse_from(["bench_sw", "--blocks", "2"]).is_err());
    }
}
