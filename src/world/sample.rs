//! Small hand-built scenes with synthetic art.
//!
//! Used by the scenario tests and the demo binaries. Every picture uses its
//! own band of palette indices (see the `*_IDX` constants) so tests running
//! with identity colormaps can tell surfaces apart by pixel value.

use glam::{Vec2, Vec3, vec2};

use crate::defs::MobjFlags;
use crate::defs::MF_TRANSSHIFT;
use crate::math::{Angle, Fixed};
use crate::world::builder::{Child, LevelBuilder, LevelError};
use crate::world::camera::{Camera, PlayerSprite};
use crate::world::geometry::{Level, LinedefId, SectorId, Thing};
use crate::world::texture::{
    Colormap, Flat, FlatId, NO_TEXTURE, Palette, SpriteDef, SpriteFrame, SpriteId, Texture,
    TextureBank, TextureError, TextureId,
};

pub const STONE_IDX: [u8; 2] = [0x22, 0x2A];
pub const BRICK_IDX: [u8; 2] = [0x32, 0x3A];
pub const LINTEL_IDX: u8 = 0x48;
pub const SILL_IDX: u8 = 0x58;
pub const GRATE_IDX: u8 = 0xA8;
pub const FLOOR_A_IDX: [u8; 2] = [0x60, 0x62];
pub const CEIL_A_IDX: u8 = 0x64;
pub const FLOOR_B_IDX: [u8; 2] = [0x68, 0x6A];
pub const CEIL_B_IDX: u8 = 0x6C;
/// Sky columns cycle through 0x90‥0x9F every 16 texels.
pub const SKY_BASE_IDX: u8 = 0x90;
pub const COLUMN_IDX: u8 = 0xC2;
/// Imp rotations use 0x71‥0x75 (inside the translatable green ramp).
pub const IMP_BASE_IDX: u8 = 0x70;
pub const WEAPON_IDX: u8 = 0xD4;

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// A level, its art and a starting camera.
pub struct SampleScene {
    pub level: Level,
    pub bank: TextureBank,
    pub camera: Camera,
}

impl SampleScene {
    /// Replace the generated light maps with pass-through maps so pixels
    /// carry raw texture indices.
    pub fn with_identity_lighting(mut self) -> Self {
        self.bank.set_colormap(Colormap::identity());
        self
    }

    pub fn sprite(&self, name: &str) -> SpriteId {
        self.bank.sprite_id(name).unwrap_or(0)
    }
}

/// Ids of the sample art inside the bank.
struct Art {
    stone: TextureId,
    brick: TextureId,
    lintel: TextureId,
    sill: TextureId,
    grate: TextureId,
    sky: TextureId,
    floor_a: FlatId,
    ceil_a: FlatId,
    floor_b: FlatId,
    ceil_b: FlatId,
    sky_flat: FlatId,
}

fn sample_palette() -> Palette {
    const HUES: [[u32; 3]; 16] = [
        [255, 255, 255],
        [255, 160, 96],
        [200, 200, 200],
        [180, 90, 60],
        [220, 180, 120],
        [140, 180, 255],
        [120, 200, 120],
        [96, 255, 96],
        [255, 96, 96],
        [96, 160, 255],
        [200, 120, 255],
        [255, 230, 80],
        [160, 160, 140],
        [255, 120, 200],
        [90, 230, 230],
        [255, 200, 160],
    ];
    let mut pal = Palette::default();
    for i in 0..256 {
        let [r, g, b] = HUES[i >> 4];
        let v = (i as u32 & 15) * 16 + 15;
        pal[i] = (r * v / 255) << 16 | (g * v / 255) << 8 | (b * v / 255);
    }
    pal
}

fn bank() -> Result<(TextureBank, Art), TextureError> {
    let mut bank = TextureBank::default_with_checker();
    let palette = sample_palette();
    bank.set_colormap(Colormap::from_palette(&palette));
    bank.set_palette(palette);

    let stone = bank.insert(
        "STONE",
        Texture::from_fn("STONE", 64, 128, |x, y| {
            STONE_IDX[((x / 16) + (y / 16)) & 1]
        }),
    )?;
    let brick = bank.insert(
        "BRICK",
        Texture::from_fn("BRICK", 64, 128, |x, y| {
            let shift = if (y / 8) & 1 == 0 { 0 } else { 8 };
            BRICK_IDX[((x + shift) / 16 + y / 8) & 1]
        }),
    )?;
    let lintel = bank.insert("LINTEL", Texture::from_fn("LINTEL", 64, 64, |_, _| LINTEL_IDX))?;
    let sill = bank.insert("SILL", Texture::from_fn("SILL", 64, 64, |_, _| SILL_IDX))?;
    let grate = bank.insert(
        "GRATE",
        Texture::from_fn("GRATE", 64, 64, |x, y| {
            if x % 16 < 4 || y % 16 < 4 { GRATE_IDX } else { 0 }
        }),
    )?;
    let sky = bank.insert(
        "SKY1",
        Texture::from_fn("SKY1", 256, 128, |x, y| {
            SKY_BASE_IDX + ((x / 16 + y / 64) & 15) as u8
        }),
    )?;

    let checker = |name: &str, idx: [u8; 2]| {
        Flat::from_fn(name, move |x, y| idx[((x >> 3) ^ (y >> 3)) & 1])
    };
    let floor_a = bank.insert_flat(checker("FLOOR_A", FLOOR_A_IDX))?;
    let ceil_a = bank.insert_flat(Flat::from_fn("CEIL_A", |_, _| CEIL_A_IDX))?;
    let floor_b = bank.insert_flat(checker("FLOOR_B", FLOOR_B_IDX))?;
    let ceil_b = bank.insert_flat(Flat::from_fn("CEIL_B", |_, _| CEIL_B_IDX))?;
    let sky_flat = bank.insert_flat(Flat::from_fn("F_SKY1", |_, _| SKY_BASE_IDX))?;

    let column = bank.insert(
        "COLUA0",
        Texture::from_fn("COLUA0", 16, 48, |_, _| COLUMN_IDX).with_offsets(8, 48),
    )?;
    bank.insert_sprite(SpriteDef {
        name: "COLU".into(),
        frames: vec![SpriteFrame::single(column)],
    })?;

    // Five drawn rotations; 6‥8 mirror 4‥2. The left half of each patch is
    // brighter so mirroring is visible.
    let mut rot = [0; 5];
    for (r, id) in rot.iter_mut().enumerate() {
        let name = format!("TROOA{}", r + 1);
        let color = IMP_BASE_IDX + r as u8 + 1;
        let tex = Texture::from_fn(name.as_str(), 32, 56, move |x, y| {
            if y < 4 && !(8..24).contains(&x) { 0 } else if x < 16 { color + 8 } else { color }
        })
        .with_offsets(16, 56);
        *id = bank.insert(name, tex)?;
    }
    bank.insert_sprite(SpriteDef {
        name: "TROO".into(),
        frames: vec![SpriteFrame::rotated(
            [rot[0], rot[1], rot[2], rot[3], rot[4], rot[3], rot[2], rot[1]],
            [false, false, false, false, false, true, true, true],
        )],
    })?;

    let weapon = bank.insert(
        "PISGA0",
        Texture::from_fn("PISGA0", 64, 48, |x, _| {
            if (24..40).contains(&x) { WEAPON_IDX } else { 0 }
        })
        .with_offsets(-128, -120),
    )?;
    bank.insert_sprite(SpriteDef {
        name: "PISG".into(),
        frames: vec![SpriteFrame::single(weapon)],
    })?;

    let art = Art {
        stone,
        brick,
        lintel,
        sill,
        grate,
        sky,
        floor_a,
        ceil_a,
        floor_b,
        ceil_b,
        sky_flat,
    };
    Ok((bank, art))
}

/// Closed loop of one-sided walls; corners are given clockwise so the
/// interior is on every line's right.
fn room_walls(b: &mut LevelBuilder, corners: &[Vec2], sector: SectorId, wall: TextureId) -> Vec<LinedefId> {
    let v: Vec<_> = corners.iter().map(|&c| b.vertex(c)).collect();
    (0..v.len())
        .map(|i| {
            let side = b.side(sector, NO_TEXTURE, wall, NO_TEXTURE);
            b.line(v[i], v[(i + 1) % v.len()], side, None)
        })
        .collect()
}

fn whole(lines: &[LinedefId]) -> Vec<(LinedefId, usize)> {
    lines.iter().map(|&l| (l, 0)).collect()
}

fn scene(level: Level, bank: TextureBank, eye: Vec3) -> SampleScene {
    SampleScene {
        level,
        bank,
        camera: Camera::new(eye, 0.0),
    }
}

/// 512×512 closed room without nodes.
pub fn single_room() -> Result<SampleScene, SampleError> {
    let (bank, art) = bank()?;
    let mut b = LevelBuilder::new("ROOM");
    let sector = b.sector(0.0, 128.0, art.floor_a, art.ceil_a, 160);
    let corners = [
        vec2(-256.0, 256.0),
        vec2(256.0, 256.0),
        vec2(256.0, -256.0),
        vec2(-256.0, -256.0),
    ];
    let lines = room_walls(&mut b, &corners, sector, art.stone);
    b.subsector(&whole(&lines));
    Ok(scene(b.build()?, bank, Vec3::new(0.0, 0.0, 41.0)))
}

/// Two rooms split at x = 0 by a wall with a window (|y| < 64).
///
/// Room A (x < 0): floor 0, ceiling 128. Room B (x > 0): floor 32,
/// ceiling 96, so the window shows a sill below and a lintel above.
pub fn two_rooms() -> Result<SampleScene, SampleError> {
    rooms(false)
}

/// [`two_rooms`] with a see-through grate hung in the window.
pub fn grate_window() -> Result<SampleScene, SampleError> {
    rooms(true)
}

fn rooms(grate: bool) -> Result<SampleScene, SampleError> {
    let (bank, art) = bank()?;
    let mut b = LevelBuilder::new("TWOROOMS");
    let sec_a = b.sector(0.0, 128.0, art.floor_a, art.ceil_a, 160);
    let sec_b = b.sector(32.0, 96.0, art.floor_b, art.ceil_b, 208);

    let nw = b.vertex(vec2(-256.0, 256.0));
    let n0 = b.vertex(vec2(0.0, 256.0));
    let ne = b.vertex(vec2(256.0, 256.0));
    let w_top = b.vertex(vec2(0.0, 64.0));
    let w_bot = b.vertex(vec2(0.0, -64.0));
    let sw = b.vertex(vec2(-256.0, -256.0));
    let s0 = b.vertex(vec2(0.0, -256.0));
    let se = b.vertex(vec2(256.0, -256.0));

    let wall = |b: &mut LevelBuilder, v1, v2, sector, tex| {
        let s = b.side(sector, NO_TEXTURE, tex, NO_TEXTURE);
        b.line(v1, v2, s, None)
    };
    // room A
    let a_north = wall(&mut b, nw, n0, sec_a, art.stone);
    let a_div_top = wall(&mut b, n0, w_top, sec_a, art.stone);
    let a_div_bot = wall(&mut b, w_bot, s0, sec_a, art.stone);
    let a_south = wall(&mut b, s0, sw, sec_a, art.stone);
    let a_west = wall(&mut b, sw, nw, sec_a, art.stone);
    // room B
    let b_north = wall(&mut b, n0, ne, sec_b, art.brick);
    let b_east = wall(&mut b, ne, se, sec_b, art.brick);
    let b_south = wall(&mut b, se, s0, sec_b, art.brick);
    let b_div_bot = wall(&mut b, s0, w_bot, sec_b, art.brick);
    let b_div_top = wall(&mut b, w_top, n0, sec_b, art.brick);

    let mid = if grate { art.grate } else { NO_TEXTURE };
    let win_a = b.side(sec_a, art.lintel, mid, art.sill);
    let win_b = b.side(sec_b, art.lintel, mid, art.sill);
    let window = b.line(w_top, w_bot, win_a, Some(win_b));

    let room_b = b.subsector(&[
        (b_north, 0),
        (b_east, 0),
        (b_south, 0),
        (b_div_bot, 0),
        (window, 1),
        (b_div_top, 0),
    ]);
    let room_a = b.subsector(&[
        (a_north, 0),
        (a_div_top, 0),
        (window, 0),
        (a_div_bot, 0),
        (a_south, 0),
        (a_west, 0),
    ]);
    b.node(
        vec2(0.0, -256.0),
        vec2(0.0, 512.0),
        Child::Subsector(room_b),
        Child::Subsector(room_a),
    );
    Ok(scene(b.build()?, bank, Vec3::new(-128.0, 0.0, 41.0)))
}

/// 1024×1024 yard open to the sky, walls 96 high.
pub fn courtyard() -> Result<SampleScene, SampleError> {
    let (bank, art) = bank()?;
    let mut b = LevelBuilder::new("YARD");
    b.sky(art.sky_flat, art.sky);
    let sector = b.sector(0.0, 96.0, art.floor_a, art.sky_flat, 224);
    let corners = [
        vec2(-512.0, 512.0),
        vec2(512.0, 512.0),
        vec2(512.0, -512.0),
        vec2(-512.0, -512.0),
    ];
    let lines = room_walls(&mut b, &corners, sector, art.stone);
    b.subsector(&whole(&lines));
    Ok(scene(b.build()?, bank, Vec3::new(0.0, 0.0, 41.0)))
}

/// Two rooms with a grate in the window, a few things and a weapon.
pub fn demo() -> Result<SampleScene, SampleError> {
    let mut s = rooms(true)?;
    let column = s.sprite("COLU");
    let imp = s.sprite("TROO");
    let gun = s.sprite("PISG");
    let place = |x: f32, y: f32, angle: f64, sprite: SpriteId, flags: MobjFlags| Thing {
        x: Fixed::from_f32(x),
        y: Fixed::from_f32(y),
        z: Fixed::ZERO,
        angle: Angle::from_degrees(angle),
        sprite,
        frame: 0,
        flags,
        sector: 0,
    };
    for mut thing in [
        place(-64.0, 128.0, 0.0, column, MobjFlags::empty()),
        place(160.0, 0.0, 180.0, imp, MobjFlags::from_bits_retain(1 << MF_TRANSSHIFT)),
        place(-96.0, -128.0, 90.0, imp, MobjFlags::SHADOW),
        place(192.0, 160.0, 225.0, imp, MobjFlags::empty()),
    ] {
        thing.z = s.level.sectors[s.level.sector_at(thing.x, thing.y) as usize].floor_h;
        s.level.add_thing(thing);
    }
    s.camera.psprites.push(PlayerSprite {
        sprite: gun,
        frame: 0,
        sx: Fixed::from_int(1),
        sy: Fixed::from_int(32),
    });
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_build() {
        assert_eq!(single_room().unwrap().level.subsectors.len(), 1);
        let two = two_rooms().unwrap();
        assert_eq!(two.level.nodes.len(), 1);
        assert_eq!(two.level.sector_at(Fixed::from_int(-10), Fixed::ZERO), 0);
        assert_eq!(two.level.sector_at(Fixed::from_int(10), Fixed::ZERO), 1);
        let grate = grate_window().unwrap();
        assert!(grate.level.sidedefs.iter().any(|s| s.middle == grate.bank.id("GRATE").unwrap()));
        let yard = courtyard().unwrap();
        assert_eq!(yard.level.sky_texture, yard.bank.id("SKY1").unwrap());
        let demo = demo().unwrap();
        assert_eq!(demo.level.things.len(), 4);
        assert_eq!(demo.level.things[1].z, Fixed::from_int(32));
        assert_eq!(demo.level.sectors[1].things.len(), 2);
    }
}
