use std::time::{Duration, Instant};

use clap::Parser;
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use yadoom_sw::{
    renderer::{RendererExt, Software, ViewWindow},
    world::{Camera, Palette, sample},
};

const STATUS_BAR: usize = 32;

#[derive(Parser, Debug)]
#[command(version, about = "Walk around the demo scene")]
struct Args {
    #[arg(long, short = 'W', default_value_t = 640)]
    width: usize,

    #[arg(long, short = 'H', default_value_t = 400)]
    height: usize,
}

fn to_rgb(palette: &Palette, indexed: &[u8], out: &mut [u32]) {
    for (dst, &p) in out.iter_mut().zip(indexed) {
        *dst = palette[p as usize];
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let (w, h) = (args.width, args.height);

    let mut scene = sample::demo()?;
    let mut renderer = Software::default();
    let mut blocks = 11u8;
    let mut rgb = vec![0u32; w * h];

    let mut win = Window::new("Software Render", w, h, WindowOptions::default())?;
    win.set_target_fps(35);

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let t0 = Instant::now();

        /* movement --------------------------------------------------------- */
        let speed = if win.is_key_down(Key::LeftShift) { 8.0 } else { 4.0 };
        step(&win, &mut scene.camera, speed);

        /* screen size ------------------------------------------------------ */
        if win.is_key_pressed(Key::Minus, KeyRepeat::No) {
            blocks = blocks.saturating_sub(1).max(3);
        }
        if win.is_key_pressed(Key::Equal, KeyRepeat::No) {
            blocks = (blocks + 1).min(11);
        }
        if win.is_key_pressed(Key::L, KeyRepeat::No) {
            scene.camera.extra_light = (scene.camera.extra_light + 1) % 3;
        }
        let window = ViewWindow::from_blocks(w, h, blocks, STATUS_BAR * h / 200);

        /* draw ------------------------------------------------------------- */
        let palette = scene.bank.palette();
        renderer.draw_frame(window, &scene.level, &scene.camera, &scene.bank, |fb| {
            to_rgb(palette, &fb.pixels, &mut rgb);
            acc_time += t0.elapsed();
            acc_frames += 1;
        });
        win.update_with_buffer(&rgb, w, h)?;

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames.max(1) as f64;
            log::info!("avg render: {:.2} ms  ({:.1} FPS)", avg_ms, 1000.0 / avg_ms);
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}

fn step(win: &Window, camera: &mut Camera, speed: f32) {
    let mut forward = 0.0;
    let mut side = 0.0;
    if win.is_key_down(Key::Up) || win.is_key_down(Key::W) {
        forward += speed;
    }
    if win.is_key_down(Key::Down) || win.is_key_down(Key::S) {
        forward -= speed;
    }
    let alt = win.is_key_down(Key::LeftAlt) || win.is_key_down(Key::RightAlt);
    if alt {
        /* Alt + ←/→  = strafe */
        if win.is_key_down(Key::Left) {
            side -= speed;
        }
        if win.is_key_down(Key::Right) {
            side += speed;
        }
    } else {
        /* plain ←/→   = turn   */
        if win.is_key_down(Key::Left) {
            camera.turn(0.05);
        }
        if win.is_key_down(Key::Right) {
            camera.turn(-0.05);
        }
    }
    if win.is_key_down(Key::A) {
        side -= speed;
    }
    if win.is_key_down(Key::D) {
        side += speed;
    }
    camera.step(forward, side);
}
