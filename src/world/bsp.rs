use crate::defs::MobjFlags;
use crate::math::Fixed;
use crate::world::geometry::{
    Level, LinedefFlags, LinedefId, Node, SectorId, Seg, SubsectorId, Thing, ThingId,
};

pub const CHILD_MASK: u16 = 0x7FFF;

pub const SUBSECTOR_BIT: u16 = 0x8000;

// ──────────────────────────────────────────────────────────────────────────
//                       Level – public helpers
// ──────────────────────────────────────────────────────────────────────────
impl Level {
    /// Child reference of the BSP root (`nodes.len()-1` in Doom).
    ///
    /// A level without nodes is a single subsector.
    #[inline(always)]
    pub fn bsp_root(&self) -> u16 {
        if self.nodes.is_empty() {
            SUBSECTOR_BIT
        } else {
            (self.nodes.len() - 1) as u16
        }
    }

    /// Walk the BSP and return the subsector id containing (`x`, `y`).
    pub fn locate_subsector(&self, x: Fixed, y: Fixed) -> SubsectorId {
        let mut idx = self.bsp_root();
        while idx & SUBSECTOR_BIT == 0 {
            let node = &self.nodes[idx as usize];
            idx = node.child[node.point_side(x, y)];
        }
        idx & CHILD_MASK
    }

    pub fn sector_at(&self, x: Fixed, y: Fixed) -> SectorId {
        self.subsectors[self.locate_subsector(x, y) as usize].sector
    }

    /// Insert `thing` and link it into the sector under its position.
    pub fn add_thing(&mut self, mut thing: Thing) -> ThingId {
        let id = self.things.len() as ThingId;
        thing.sector = self.sector_at(thing.x, thing.y);
        if !thing.flags.contains(MobjFlags::NOSECTOR) {
            self.sectors[thing.sector as usize].things.push(id);
        }
        self.things.push(thing);
        id
    }

    /// Flag lines reported by the renderer as seen (automap feed).
    pub fn mark_mapped(&mut self, lines: &[LinedefId]) {
        for &line in lines {
            if let Some(ld) = self.linedefs.get_mut(line as usize) {
                ld.flags.insert(LinedefFlags::MAPPED);
            }
        }
    }

    /// 0 = front (right) side of the seg, 1 = back.
    #[inline]
    pub fn point_on_seg_side(&self, x: Fixed, y: Fixed, seg: &Seg) -> usize {
        let v1 = self.vertices[seg.v1 as usize];
        let v2 = self.vertices[seg.v2 as usize];
        point_on_line_side(x, y, v1.x, v1.y, v2.x - v1.x, v2.y - v1.y)
    }
}

// ──────────────────────────────────────────────────────────────────────────
//                       Node geometry helpers
// ──────────────────────────────────────────────────────────────────────────
impl Node {
    /// 0 = *front* of splitter, 1 = *back*.
    #[inline(always)]
    pub fn point_side(&self, x: Fixed, y: Fixed) -> usize {
        point_on_line_side(x, y, self.x, self.y, self.dx, self.dy)
    }
}

/// Side of the directed line through (`lx`, `ly`) with delta (`ldx`, `ldy`).
/// Points exactly on the line count as front.
pub fn point_on_line_side(x: Fixed, y: Fixed, lx: Fixed, ly: Fixed, ldx: Fixed, ldy: Fixed) -> usize {
    if ldx.0 == 0 {
        return if x <= lx {
            (ldy.0 > 0) as usize
        } else {
            (ldy.0 < 0) as usize
        };
    }
    if ldy.0 == 0 {
        return if y <= ly {
            (ldx.0 < 0) as usize
        } else {
            (ldx.0 > 0) as usize
        };
    }

    let dx = x - lx;
    let dy = y - ly;

    // Sign check first: saves the multiplies for most points.
    if (ldy.0 ^ ldx.0 ^ dx.0 ^ dy.0) < 0 {
        return ((ldy.0 ^ dx.0) < 0) as usize;
    }

    let left = Fixed(ldy.0 >> 16) * dx;
    let right = dy * Fixed(ldx.0 >> 16);
    if right < left { 0 } else { 1 }
}

// ──────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::sample;

    fn f(v: i32) -> Fixed {
        Fixed::from_int(v)
    }

    #[test]
    fn line_side_for_axis_aligned_and_diagonal_lines() {
        // Line heading north through the origin: east is the front.
        assert_eq!(point_on_line_side(f(5), f(0), f(0), f(0), f(0), f(10)), 0);
        assert_eq!(point_on_line_side(f(-5), f(0), f(0), f(0), f(0), f(10)), 1);
        // Heading east: south is the front.
        assert_eq!(point_on_line_side(f(0), f(-5), f(0), f(0), f(10), f(0)), 0);
        assert_eq!(point_on_line_side(f(0), f(5), f(0), f(0), f(10), f(0)), 1);
        // Diagonal heading north-east.
        assert_eq!(point_on_line_side(f(10), f(0), f(0), f(0), f(10), f(10)), 0);
        assert_eq!(point_on_line_side(f(0), f(10), f(0), f(0), f(10), f(10)), 1);
    }

    #[test]
    fn point_side_matches_bbox() {
        let scene = sample::two_rooms().unwrap();
        let root = &scene.level.nodes[scene.level.bsp_root() as usize];

        for side in 0..=1 {
            let bb = &root.bbox[side];
            let mid_x = Fixed((bb.left.0 + bb.right.0) / 2);
            let mid_y = Fixed((bb.top.0 + bb.bottom.0) / 2);
            assert_eq!(root.point_side(mid_x, mid_y), side);
        }
    }

    #[test]
    fn nodeless_level_is_one_subsector() {
        let scene = sample::single_room().unwrap();
        assert_eq!(scene.level.bsp_root(), SUBSECTOR_BIT);
        assert_eq!(scene.level.locate_subsector(f(10), f(-20)), 0);
    }
}
