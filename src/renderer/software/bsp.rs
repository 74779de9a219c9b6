//! Front-to-back BSP walk feeding the wall pass.

use crate::{
    math::ANG180,
    world::{
        Aabb, SegmentId, SubsectorId,
        bsp::{CHILD_MASK, SUBSECTOR_BIT},
    },
};

use super::{
    Scene, Software,
    segs::{WallClass, WallCtx},
};

/// Box corners spanning the widest angle, by eye position relative to the
/// box (3×3 grid, row = above/inside/below, column = left/inside/right).
/// Entries index `[top, bottom, left, right]` as `x1, y1, x2, y2`.
const CHECK_COORD: [[usize; 4]; 12] = [
    [3, 0, 2, 1],
    [3, 0, 2, 0],
    [3, 1, 2, 0],
    [0; 4],
    [2, 0, 2, 1],
    [0; 4],
    [3, 1, 3, 0],
    [0; 4],
    [2, 0, 3, 1],
    [2, 1, 3, 1],
    [2, 1, 3, 0],
    [0; 4],
];

impl Software {
    /// Walk the subtree `child`, nearest side first.
    pub(super) fn render_bsp_node(&mut self, scene: &Scene, child: u16) {
        if child & SUBSECTOR_BIT != 0 {
            self.render_subsector(scene, child & CHILD_MASK);
            return;
        }

        let node = &scene.level.nodes[child as usize];
        let side = node.point_side(self.view.x, self.view.y);

        self.render_bsp_node(scene, node.child[side]);

        // the far side is tested only now that the near side has filled
        // the clip list
        if self.check_bbox(&node.bbox[side ^ 1]) {
            self.render_bsp_node(scene, node.child[side ^ 1]);
        }
    }

    /// True when some part of `bbox` may still be visible.
    fn check_bbox(&self, bbox: &Aabb) -> bool {
        let view = &self.view;
        let box_x = if view.x <= bbox.left {
            0
        } else if view.x < bbox.right {
            1
        } else {
            2
        };
        let box_y = if view.y >= bbox.top {
            0
        } else if view.y > bbox.bottom {
            1
        } else {
            2
        };
        let pos = (box_y << 2) + box_x;
        if pos == 5 {
            return true;
        }

        let coords = [bbox.top, bbox.bottom, bbox.left, bbox.right];
        let [x1, y1, x2, y2] = CHECK_COORD[pos].map(|i| coords[i]);

        let angle1 = view.angle_to(x1, y1) - view.angle;
        let angle2 = view.angle_to(x2, y2) - view.angle;
        if (angle1 - angle2).0 >= ANG180.0 {
            return true;
        }

        match self.tables.angles_to_columns(angle1, angle2) {
            Some((sx1, sx2)) => !self.solid_segs.is_covered(sx1, sx2),
            None => false,
        }
    }

    fn render_subsector(&mut self, scene: &Scene, id: SubsectorId) {
        let level = scene.level;
        let Some(ss) = level.subsectors.get(id as usize) else {
            return;
        };
        self.stats.subsectors += 1;

        let sector = &level.sectors[ss.sector as usize];
        self.floor_plane = if sector.floor_h < self.view.z {
            self.planes.find(sector.floor_h, sector.floor_tex, sector.light, level.sky_flat)
        } else {
            None
        };
        self.ceiling_plane = if sector.ceil_h > self.view.z || sector.ceil_tex == level.sky_flat {
            self.planes.find(sector.ceil_h, sector.ceil_tex, sector.light, level.sky_flat)
        } else {
            None
        };

        self.add_sprites(scene, ss.sector);

        for seg in ss.segs() {
            self.add_line(scene, seg as SegmentId);
        }
    }

    /// Clip one seg against the view and the clip list and draw what is
    /// left of it.
    fn add_line(&mut self, scene: &Scene, id: SegmentId) {
        let level = scene.level;
        let seg = &level.segs[id as usize];
        let v1 = level.vertices[seg.v1 as usize];
        let v2 = level.vertices[seg.v2 as usize];

        let angle1 = self.view.angle_to(v1.x, v1.y);
        let angle2 = self.view.angle_to(v2.x, v2.y);

        // back side
        if (angle1 - angle2).0 >= ANG180.0 {
            return;
        }

        let Some((x1, x2)) = self
            .tables
            .angles_to_columns(angle1 - self.view.angle, angle2 - self.view.angle)
        else {
            return;
        };

        let front = &level.sectors[seg.front_sector as usize];
        let back = seg.back_sector.map(|s| &level.sectors[s as usize]);
        let side = &level.sidedefs[seg.sidedef as usize];

        let class = WallClass::classify(front, back, side);
        let fragments = match class {
            WallClass::Invisible => return,
            WallClass::Solid => self.solid_segs.clip_solid(x1, x2),
            WallClass::Portal => self.solid_segs.clip_pass(x1, x2),
        };

        let wall = WallCtx {
            seg: id,
            angle1,
            class,
        };
        for (start, stop) in fragments {
            self.store_wall_range(scene, &wall, start, stop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Fixed;
    use crate::renderer::{Renderer, ViewWindow};
    use crate::world::sample;

    fn boxed(left: i32, right: i32, bottom: i32, top: i32) -> Aabb {
        Aabb {
            top: Fixed::from_int(top),
            bottom: Fixed::from_int(bottom),
            left: Fixed::from_int(left),
            right: Fixed::from_int(right),
        }
    }

    fn fresh() -> Software {
        let scene = sample::single_room().unwrap();
        let mut sw = Software::default();
        sw.begin_frame(ViewWindow::full(320, 200));
        sw.view = crate::renderer::software::ViewPoint::from_camera(&scene.camera);
        sw
    }

    #[test]
    fn box_around_the_eye_is_visible() {
        let sw = fresh();
        assert!(sw.check_bbox(&boxed(-10, 10, -10, 10)));
    }

    #[test]
    fn box_behind_the_eye_is_culled() {
        let sw = fresh();
        // camera looks east from the origin
        assert!(!sw.check_bbox(&boxed(-300, -100, -50, 50)));
        assert!(sw.check_bbox(&boxed(100, 300, -50, 50)));
    }

    #[test]
    fn box_behind_solid_columns_is_culled() {
        let mut sw = fresh();
        sw.solid_segs.clip_solid(0, 319);
        assert!(!sw.check_bbox(&boxed(100, 300, -50, 50)));
    }

    #[test]
    fn back_facing_segs_are_skipped() {
        let scene = sample::two_rooms().unwrap();
        let mut sw = Software::default();
        sw.begin_frame(ViewWindow::full(320, 200));
        sw.draw_level(&scene.level, &scene.camera, &scene.bank);
        for ds in sw.draw_segs() {
            let seg = &scene.level.segs[ds.seg as usize];
            let v1 = scene.level.vertices[seg.v1 as usize];
            let v2 = scene.level.vertices[seg.v2 as usize];
            let a1 = sw.view.angle_to(v1.x, v1.y);
            let a2 = sw.view.angle_to(v2.x, v2.y);
            assert!((a1 - a2).0 < ANG180.0);
        }
    }
}
