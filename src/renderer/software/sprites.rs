//! Things and the weapon overlay.
//!
//! Things are projected while their sector is first reached by the BSP
//! walk, then composited far to near after all walls and planes. There is
//! no depth buffer: every sprite column is clipped against the silhouettes
//! of the wall records that are nearer than the sprite, and masked
//! mid-textures behind a sprite are drawn before it.

use crate::{
    defs::{FF_FRAMEMASK, FF_FULLBRIGHT, MobjFlags},
    math::{ANG45, Angle, FRACUNIT, Fixed},
    world::{Camera, PlayerSprite, SectorId, ThingId, texture::TextureId},
};

use super::{
    Limits, Scene, Software,
    draw::{Blend, MaskedJob, Viewport, draw_masked_column},
    lighting::{FUZZ_COLORMAP, LIGHTSCALESHIFT, LightTables, MAXLIGHTSCALE},
    projection::MINZ,
    segs::Silhouette,
    tables::BASE_WIDTH,
};

/// Sprite column not clipped yet by any wall record.
const UNCLIPPED: i16 = -2;

/// Screen row (320×200 reference) the weapon is anchored to.
const BASEYCENTER: i32 = 100;

/// How a sprite is shaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpriteShade {
    /// Fuzz effect over whatever is behind.
    Shadow,
    Colormap(u8),
}

/// A projected sprite, ready to be clipped and drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisSprite {
    /// On-screen columns, inclusive.
    pub x1: i32,
    pub x2: i32,
    /// Map position, for the side-of-wall test.
    pub gx: Fixed,
    pub gy: Fixed,
    /// Bottom and top in world z.
    pub gz: Fixed,
    pub gzt: Fixed,
    /// Texture column (fixed) at `x1`.
    pub start_frac: Fixed,
    pub scale: Fixed,
    /// Texture columns per screen column; negative when mirrored.
    pub x_iscale: Fixed,
    pub texture_mid: Fixed,
    pub patch: TextureId,
    pub shade: SpriteShade,
    pub translation: Option<usize>,
    pub thing: Option<ThingId>,
}

/// Rotation (0‥7) of an object facing `facing`, seen along `view`.
#[inline]
pub fn rotation(view: Angle, facing: Angle) -> usize {
    ((view - facing + Angle((ANG45.0 / 2).wrapping_mul(9))).0 >> 29) as usize
}

impl Software {
    /// Project every thing in `sector` once per frame.
    pub(super) fn add_sprites(&mut self, scene: &Scene, sector: SectorId) {
        let Some(seen) = self.sectors_seen.get_mut(sector as usize) else {
            return;
        };
        if *seen {
            return;
        }
        *seen = true;

        let sec = &scene.level.sectors[sector as usize];
        let row = LightTables::row(sec.light, self.view.extra_light, 0);
        for &thing in &sec.things {
            self.project_sprite(scene, thing, row);
        }
    }

    fn project_sprite(&mut self, scene: &Scene, id: ThingId, light_row: usize) {
        let Some(thing) = scene.level.things.get(id as usize) else {
            return;
        };
        let view = self.view;
        let tables = &self.tables;

        /* transform to view space ----------------------------------------*/
        let tr_x = thing.x - view.x;
        let tr_y = thing.y - view.y;
        let tz = tr_x * view.cos - -(tr_y * view.sin);
        if tz < MINZ {
            return;
        }
        let xscale = tables.projection / tz;
        let mut tx = -((tr_y * view.cos) + -(tr_x * view.sin));
        if tx.abs() > tz << 2 {
            return;
        }

        /* pick the patch -------------------------------------------------*/
        let Ok(def) = scene.bank.sprite(thing.sprite) else {
            return;
        };
        let Some(frame) = def.frames.get((thing.frame & FF_FRAMEMASK) as usize) else {
            return;
        };
        let rot = if frame.rotate {
            rotation(view.angle_to(thing.x, thing.y), thing.angle)
        } else {
            0
        };
        let (patch, flip) = (frame.patches[rot], frame.flip[rot]);
        let tex = scene.bank.texture_or_missing(patch);

        /* horizontal extent ----------------------------------------------*/
        tx -= Fixed::from_int(tex.left_offset);
        let x1 = (tables.centerxfrac + tx * xscale).to_int();
        if x1 > tables.width {
            return;
        }
        tx += Fixed::from_int(tex.w as i32);
        let x2 = (tables.centerxfrac + tx * xscale).to_int() - 1;
        if x2 < 0 {
            return;
        }

        if Limits::reached(self.config.limits.vis_sprites, self.sprites.len()) {
            self.stats.dropped_vis_sprites += 1;
            return;
        }

        let gzt = thing.z + Fixed::from_int(tex.top_offset);
        let vx1 = x1.max(0);
        let vx2 = x2.min(tables.width - 1);
        let iscale = Fixed::ONE / xscale;
        let (mut start_frac, x_iscale) = if flip {
            (Fixed::from_int(tex.w as i32) - Fixed(1), -iscale)
        } else {
            (Fixed::ZERO, iscale)
        };
        if vx1 > x1 {
            start_frac += Fixed(x_iscale.0.wrapping_mul(vx1 - x1));
        }

        let shade = if thing.flags.contains(MobjFlags::SHADOW) {
            SpriteShade::Shadow
        } else if let Some(map) = view.fixed_colormap {
            SpriteShade::Colormap(map)
        } else if thing.frame & FF_FULLBRIGHT != 0 {
            SpriteShade::Colormap(0)
        } else {
            SpriteShade::Colormap(self.lights.at_scale(light_row, xscale))
        };

        self.sprites.push(VisSprite {
            x1: vx1,
            x2: vx2,
            gx: thing.x,
            gy: thing.y,
            gz: thing.z,
            gzt,
            start_frac,
            scale: xscale,
            x_iscale,
            texture_mid: gzt - view.z,
            patch,
            shade,
            translation: thing.flags.translation(),
            thing: Some(id),
        });
    }

    /// Far to near; equal scales keep registration order.
    fn sort_sprites(&mut self) {
        self.sprite_order.clear();
        self.sprite_order.extend(0..self.sprites.len());
        self.sprite_order.sort_by_key(|&i| (self.sprites[i].scale, i));
    }

    /// Sprites and masked mid-textures, after walls and planes.
    pub(super) fn draw_masked(&mut self, scene: &Scene) {
        self.sort_sprites();
        let order = std::mem::take(&mut self.sprite_order);
        for &i in &order {
            self.draw_sprite(scene, i);
        }
        self.sprite_order = order;

        // masked mid-textures nobody drew yet, far to near
        for index in (0..self.draw_segs.len()).rev() {
            let ds = self.draw_segs[index];
            if ds.masked_cols.is_some() {
                self.render_masked_seg_range(scene, index, ds.x1, ds.x2);
            }
        }
    }

    /// Clip one sprite against the wall records in front of it and draw it.
    fn draw_sprite(&mut self, scene: &Scene, index: usize) {
        let spr = self.sprites[index];
        let view_height = self.window.height as i16;
        let range = spr.x1 as usize..=spr.x2 as usize;
        self.sprite_clip.ceil[range.clone()].fill(UNCLIPPED);
        self.sprite_clip.floor[range.clone()].fill(UNCLIPPED);

        // nearest records first, so the first one to clip a column wins
        for di in (0..self.draw_segs.len()).rev() {
            let ds = self.draw_segs[di];
            if ds.x1 > spr.x2
                || ds.x2 < spr.x1
                || (ds.silhouette.is_empty() && ds.masked_cols.is_none())
            {
                continue;
            }
            let r1 = ds.x1.max(spr.x1);
            let r2 = ds.x2.min(spr.x2);

            let (low_scale, scale) = if ds.scale1 > ds.scale2 {
                (ds.scale2, ds.scale1)
            } else {
                (ds.scale1, ds.scale2)
            };
            let seg = &scene.level.segs[ds.seg as usize];
            if scale < spr.scale
                || (low_scale < spr.scale && scene.level.point_on_seg_side(spr.gx, spr.gy, seg) == 0)
            {
                // wall is behind the sprite; its masked texture goes first
                if ds.masked_cols.is_some() {
                    self.render_masked_seg_range(scene, di, r1, r2);
                }
                continue;
            }

            let mut sil = ds.silhouette;
            if spr.gz >= ds.bsil_height {
                sil.remove(Silhouette::BOTTOM);
            }
            if spr.gzt <= ds.tsil_height {
                sil.remove(Silhouette::TOP);
            }
            for x in r1..=r2 {
                let xi = x as usize;
                if sil.contains(Silhouette::BOTTOM) && self.sprite_clip.floor[xi] == UNCLIPPED {
                    self.sprite_clip.floor[xi] = ds.bottom_clip_at(&self.scratch, x, view_height);
                }
                if sil.contains(Silhouette::TOP) && self.sprite_clip.ceil[xi] == UNCLIPPED {
                    self.sprite_clip.ceil[xi] = ds.top_clip_at(&self.scratch, x, view_height);
                }
            }
        }

        for x in range {
            if self.sprite_clip.floor[x] == UNCLIPPED {
                self.sprite_clip.floor[x] = view_height;
            }
            if self.sprite_clip.ceil[x] == UNCLIPPED {
                self.sprite_clip.ceil[x] = -1;
            }
        }

        self.draw_vis_sprite(scene, &spr);
    }

    /// Column-by-column compositing using the current sprite clip arrays.
    fn draw_vis_sprite(&mut self, scene: &Scene, spr: &VisSprite) {
        let bank = scene.bank;
        let tex = bank.texture_or_missing(spr.patch);
        let colormaps = bank.colormap();
        let blend = match spr.shade {
            SpriteShade::Shadow => Blend::Fuzz {
                colormap: &colormaps[FUZZ_COLORMAP],
            },
            SpriteShade::Colormap(map) => Blend::Opaque {
                colormap: &colormaps[map as usize],
                translation: spr.translation.map(|n| bank.translations().table(n)),
            },
        };

        let centery = self.tables.centery;
        let top_screen = self.tables.centeryfrac - spr.texture_mid * spr.scale;
        let iscale = spr.x_iscale.abs();
        let mut frac = spr.start_frac;
        let mut vp = Viewport::new(&mut self.screen, &self.window);

        for x in spr.x1..=spr.x2 {
            let column = frac.to_int();
            if (0..tex.w as i32).contains(&column) {
                let job = MaskedJob {
                    x,
                    texture: tex,
                    column,
                    top_screen,
                    scale: spr.scale,
                    iscale,
                    texture_mid: spr.texture_mid,
                    clip_top: self.sprite_clip.ceil[x as usize],
                    clip_bottom: self.sprite_clip.floor[x as usize],
                };
                draw_masked_column(&mut vp, centery, &job, blend, &mut self.fuzz_pos);
            }
            frac += spr.x_iscale;
        }
    }

    /* weapon overlay -----------------------------------------------------*/

    /// Screen-fixed sprites, drawn over everything and never clipped.
    pub(super) fn draw_player_sprites(&mut self, scene: &Scene, camera: &Camera) {
        if camera.psprites.is_empty() || scene.level.subsectors.is_empty() {
            return;
        }
        let sector = &scene.level.sectors[scene.level.sector_at(self.view.x, self.view.y) as usize];
        let row = LightTables::row(sector.light, self.view.extra_light, 0);

        let width = self.window.width;
        self.sprite_clip.ceil[..width].fill(-1);
        self.sprite_clip.floor[..width].fill(self.window.height as i16);

        for psp in &camera.psprites {
            if let Some(spr) = self.project_player_sprite(scene, camera, psp, row) {
                self.draw_vis_sprite(scene, &spr);
            }
        }
    }

    fn project_player_sprite(
        &self,
        scene: &Scene,
        camera: &Camera,
        psp: &PlayerSprite,
        light_row: usize,
    ) -> Option<VisSprite> {
        let tables = &self.tables;
        let def = scene.bank.sprite(psp.sprite).ok()?;
        let frame = def.frames.get((psp.frame & FF_FRAMEMASK) as usize)?;
        let (patch, flip) = (frame.patches[0], frame.flip[0]);
        let tex = scene.bank.texture_or_missing(patch);

        let mut tx = psp.sx - Fixed::from_int(BASE_WIDTH / 2);
        tx -= Fixed::from_int(tex.left_offset);
        let x1 = (tables.centerxfrac + tx * tables.pspritescale).to_int();
        if x1 > tables.width {
            return None;
        }
        tx += Fixed::from_int(tex.w as i32);
        let x2 = (tables.centerxfrac + tx * tables.pspritescale).to_int() - 1;
        if x2 < 0 {
            return None;
        }

        let texture_mid =
            Fixed::from_int(BASEYCENTER) + Fixed(FRACUNIT / 2) - (psp.sy - Fixed::from_int(tex.top_offset));
        let vx1 = x1.max(0);
        let vx2 = x2.min(tables.width - 1);
        let (mut start_frac, x_iscale) = if flip {
            (Fixed::from_int(tex.w as i32) - Fixed(1), -tables.pspriteiscale)
        } else {
            (Fixed::ZERO, tables.pspriteiscale)
        };
        if vx1 > x1 {
            start_frac += Fixed(x_iscale.0.wrapping_mul(vx1 - x1));
        }

        let shade = if camera.shadow_weapon {
            SpriteShade::Shadow
        } else if let Some(map) = self.view.fixed_colormap {
            SpriteShade::Colormap(map)
        } else if psp.frame & FF_FULLBRIGHT != 0 {
            SpriteShade::Colormap(0)
        } else {
            // brightest scale bucket of the player's sector
            let nearest = Fixed(((MAXLIGHTSCALE - 1) << LIGHTSCALESHIFT) as i32);
            SpriteShade::Colormap(self.lights.at_scale(light_row, nearest))
        };

        Some(VisSprite {
            x1: vx1,
            x2: vx2,
            gx: self.view.x,
            gy: self.view.y,
            gz: Fixed::ZERO,
            gzt: Fixed::ZERO,
            start_frac,
            scale: tables.pspritescale,
            x_iscale,
            texture_mid,
            patch,
            shade,
            translation: None,
            thing: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{ANG90, ANG180};
    use crate::renderer::{Renderer, ViewWindow};
    use crate::world::sample;

    #[test]
    fn rotation_octants() {
        // looking at the front of the thing
        assert_eq!(rotation(ANG180, Angle(0)), 0);
        assert_eq!(rotation(ANG180 + ANG45, Angle(0)), 1);
        assert_eq!(rotation(Angle(0), Angle(0)), 4);
        assert_eq!(rotation(ANG90, Angle(0)), 6);
        // just inside the half-octant boundary
        assert_eq!(rotation(ANG180 + Angle(ANG45.0 / 2 - 1), Angle(0)), 0);
        assert_eq!(rotation(ANG180 + Angle(ANG45.0 / 2), Angle(0)), 1);
    }

    #[test]
    fn sprite_behind_the_eye_is_not_projected() {
        let mut scene = sample::single_room().unwrap();
        let imp = scene.sprite("TROO");
        scene.level.add_thing(crate::world::Thing {
            x: Fixed::from_int(-100),
            y: Fixed::ZERO,
            z: Fixed::ZERO,
            angle: Angle(0),
            sprite: imp,
            frame: 0,
            flags: MobjFlags::empty(),
            sector: 0,
        });
        let mut sw = Software::default();
        sw.begin_frame(ViewWindow::full(320, 200));
        sw.draw_level(&scene.level, &scene.camera, &scene.bank);
        assert_eq!(sw.vis_sprites().count(), 0);
    }

    #[test]
    fn fullbright_and_fixed_colormap_override_light() {
        let mut scene = sample::single_room().unwrap();
        let imp = scene.sprite("TROO");
        let thing = |frame| crate::world::Thing {
            x: Fixed::from_int(200),
            y: Fixed::ZERO,
            z: Fixed::ZERO,
            angle: ANG180,
            sprite: imp,
            frame,
            flags: MobjFlags::empty(),
            sector: 0,
        };
        scene.level.add_thing(thing(FF_FULLBRIGHT));
        let mut sw = Software::default();
        sw.begin_frame(ViewWindow::full(320, 200));
        sw.draw_level(&scene.level, &scene.camera, &scene.bank);
        assert_eq!(sw.vis_sprites().next().unwrap().shade, SpriteShade::Colormap(0));

        let mut scene = sample::single_room().unwrap();
        scene.level.add_thing(thing(0));
        scene.camera.fixed_colormap = Some(32);
        sw.begin_frame(ViewWindow::full(320, 200));
        sw.draw_level(&scene.level, &scene.camera, &scene.bank);
        assert_eq!(sw.vis_sprites().next().unwrap().shade, SpriteShade::Colormap(32));
    }

    #[test]
    fn weapon_sits_on_the_bottom_of_the_view() {
        let scene = sample::demo().unwrap();
        let mut sw = Software::default();
        sw.begin_frame(ViewWindow::full(320, 200));
        let sprite_scene = Scene {
            level: &scene.level,
            bank: &scene.bank,
        };
        let spr = sw
            .project_player_sprite(&sprite_scene, &scene.camera, &scene.camera.psprites[0], 10)
            .unwrap();
        // 64 wide, centred a little right of the middle
        assert_eq!(spr.x2 - spr.x1 + 1, 64);
        let top = sw.tables.centeryfrac - spr.texture_mid * spr.scale;
        let bottom = top + Fixed::from_int(48);
        assert!(bottom.to_int() <= 200);
        assert!(top.to_int() >= 140);
    }
}
