//! Hand assembly of runtime levels.
//!
//! The builder does no BSP partitioning of its own: callers describe the
//! subsectors (as ordered `(line, side)` lists) and the nodes that split
//! them. Everything derivable is filled in here: seg angles and sector
//! links, node bounding boxes, thing sectors and heights.

use glam::Vec2;
use thiserror::Error;

use crate::defs::MobjFlags;
use crate::math::{Angle, Fixed, point_to_angle};
use crate::world::bsp::SUBSECTOR_BIT;
use crate::world::geometry::{
    Aabb, Level, Linedef, LinedefFlags, LinedefId, Node, NodeId, Sector, SectorId, Seg,
    SegmentId, Sidedef, SidedefId, Subsector, SubsectorId, Thing, Vertex, VertexId,
};
use crate::world::texture::{FlatId, NO_FLAT, NO_TEXTURE, SpriteId, TextureId};

/// Structural problems found while assembling a level.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("linedef {0} has no right sidedef")]
    MissingSidedef(LinedefId),

    #[error("linedef {0} is two-sided but has no left sidedef")]
    MissingBackSide(LinedefId),

    #[error("{kind} {id} does not exist")]
    BadReference { kind: &'static str, id: usize },

    #[error("node {node} references missing child {child:#06x}")]
    BadChild { node: NodeId, child: u16 },

    #[error("subsector {0} has no segs")]
    EmptySubsector(SubsectorId),

    #[error("level has no subsectors")]
    NoSubsectors,
}

/// Reference to a BSP child while building.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Child {
    Node(NodeId),
    Subsector(SubsectorId),
}

impl Child {
    fn encode(self) -> u16 {
        match self {
            Child::Node(n) => n,
            Child::Subsector(s) => s | SUBSECTOR_BIT,
        }
    }
}

/// Side of a linedef a seg runs along: 0 = right (v1→v2), 1 = left.
pub type LineSide = usize;

struct PendingNode {
    x: Fixed,
    y: Fixed,
    dx: Fixed,
    dy: Fixed,
    child: [Child; 2],
}

pub struct LevelBuilder {
    level: Level,
    subsectors: Vec<Vec<(LinedefId, LineSide)>>,
    nodes: Vec<PendingNode>,
    things: Vec<Thing>,
}

fn fixed(v: f32) -> Fixed {
    Fixed::from_f32(v)
}

impl LevelBuilder {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            level: Level {
                name: name.into(),
                things: Vec::new(),
                linedefs: Vec::new(),
                sidedefs: Vec::new(),
                vertices: Vec::new(),
                segs: Vec::new(),
                subsectors: Vec::new(),
                nodes: Vec::new(),
                sectors: Vec::new(),
                sky_flat: NO_FLAT,
                sky_texture: NO_TEXTURE,
            },
            subsectors: Vec::new(),
            nodes: Vec::new(),
            things: Vec::new(),
        }
    }

    /// Ceilings/floors using `flat` show `texture` as sky.
    pub fn sky(&mut self, flat: FlatId, texture: TextureId) -> &mut Self {
        self.level.sky_flat = flat;
        self.level.sky_texture = texture;
        self
    }

    pub fn vertex(&mut self, p: Vec2) -> VertexId {
        self.level.vertices.push(Vertex {
            x: fixed(p.x),
            y: fixed(p.y),
        });
        (self.level.vertices.len() - 1) as VertexId
    }

    pub fn sector(
        &mut self,
        floor: f32,
        ceil: f32,
        floor_tex: FlatId,
        ceil_tex: FlatId,
        light: i16,
    ) -> SectorId {
        self.level.sectors.push(Sector {
            floor_h: fixed(floor),
            ceil_h: fixed(ceil),
            floor_tex,
            ceil_tex,
            light,
            things: Vec::new(),
        });
        (self.level.sectors.len() - 1) as SectorId
    }

    pub fn side(
        &mut self,
        sector: SectorId,
        upper: TextureId,
        middle: TextureId,
        lower: TextureId,
    ) -> SidedefId {
        self.level.sidedefs.push(Sidedef {
            x_off: Fixed::ZERO,
            y_off: Fixed::ZERO,
            upper,
            lower,
            middle,
            sector,
        });
        (self.level.sidedefs.len() - 1) as SidedefId
    }

    pub fn side_offsets(&mut self, side: SidedefId, x: f32, y: f32) -> &mut Self {
        if let Some(sd) = self.level.sidedefs.get_mut(side as usize) {
            sd.x_off = fixed(x);
            sd.y_off = fixed(y);
        }
        self
    }

    /// A line is two-sided exactly when it has a left sidedef.
    pub fn line(
        &mut self,
        v1: VertexId,
        v2: VertexId,
        right: SidedefId,
        left: Option<SidedefId>,
    ) -> LinedefId {
        let mut flags = LinedefFlags::empty();
        if left.is_some() {
            flags |= LinedefFlags::TWO_SIDED;
        } else {
            flags |= LinedefFlags::IMPASSABLE;
        }
        self.level.linedefs.push(Linedef {
            v1,
            v2,
            flags,
            right_sidedef: Some(right),
            left_sidedef: left,
        });
        (self.level.linedefs.len() - 1) as LinedefId
    }

    pub fn line_flags(&mut self, line: LinedefId, flags: LinedefFlags) -> &mut Self {
        if let Some(ld) = self.level.linedefs.get_mut(line as usize) {
            ld.flags |= flags;
        }
        self
    }

    /// Convex leaf made of whole-line segs, in drawing order.
    pub fn subsector(&mut self, segs: &[(LinedefId, LineSide)]) -> SubsectorId {
        self.subsectors.push(segs.to_vec());
        (self.subsectors.len() - 1) as SubsectorId
    }

    /// Splitter through `origin` along `delta`; the front child lies on
    /// its right. The last node added is the root.
    pub fn node(&mut self, origin: Vec2, delta: Vec2, front: Child, back: Child) -> NodeId {
        self.nodes.push(PendingNode {
            x: fixed(origin.x),
            y: fixed(origin.y),
            dx: fixed(delta.x),
            dy: fixed(delta.y),
            child: [front, back],
        });
        (self.nodes.len() - 1) as NodeId
    }

    /// Thing standing on the floor of whatever sector contains (`x`, `y`).
    pub fn thing(
        &mut self,
        pos: Vec2,
        angle_deg: f64,
        sprite: SpriteId,
        frame: u16,
        flags: MobjFlags,
    ) -> &mut Self {
        self.things.push(Thing {
            x: fixed(pos.x),
            y: fixed(pos.y),
            z: Fixed::ZERO,
            angle: Angle::from_degrees(angle_deg),
            sprite,
            frame,
            flags,
            sector: 0,
        });
        self
    }

    pub fn build(self) -> Result<Level, LevelError> {
        let LevelBuilder {
            mut level,
            subsectors,
            nodes,
            things,
        } = self;

        check_lines(&level)?;
        if subsectors.is_empty() {
            return Err(LevelError::NoSubsectors);
        }

        for (ss_id, segs) in subsectors.iter().enumerate() {
            if segs.is_empty() {
                return Err(LevelError::EmptySubsector(ss_id as SubsectorId));
            }
            let first_seg = level.segs.len() as SegmentId;
            for &(line, side) in segs {
                let seg = make_seg(&level, line, side)?;
                level.segs.push(seg);
            }
            let sector = level.segs[first_seg as usize].front_sector;
            level.subsectors.push(Subsector {
                sector,
                first_seg,
                seg_count: segs.len() as u16,
            });
        }

        for (id, pending) in nodes.iter().enumerate() {
            for child in pending.child {
                let ok = match child {
                    Child::Node(n) => (n as usize) < id,
                    Child::Subsector(s) => (s as usize) < level.subsectors.len(),
                };
                if !ok {
                    return Err(LevelError::BadChild {
                        node: id as NodeId,
                        child: child.encode(),
                    });
                }
            }
            let bbox = [
                child_bbox(&level, pending.child[0].encode()),
                child_bbox(&level, pending.child[1].encode()),
            ];
            level.nodes.push(Node {
                x: pending.x,
                y: pending.y,
                dx: pending.dx,
                dy: pending.dy,
                bbox,
                child: [pending.child[0].encode(), pending.child[1].encode()],
            });
        }

        for mut thing in things {
            let sector = level.sector_at(thing.x, thing.y);
            thing.z = level.sectors[sector as usize].floor_h;
            level.add_thing(thing);
        }

        log::debug!(
            "built level {}: {} sectors, {} segs, {} subsectors, {} nodes",
            level.name,
            level.sectors.len(),
            level.segs.len(),
            level.subsectors.len(),
            level.nodes.len()
        );
        Ok(level)
    }
}

fn check_lines(level: &Level) -> Result<(), LevelError> {
    let bad = |kind, id: usize| LevelError::BadReference { kind, id };
    for (id, ld) in level.linedefs.iter().enumerate() {
        for v in [ld.v1, ld.v2] {
            if v as usize >= level.vertices.len() {
                return Err(bad("vertex", v as usize));
            }
        }
        let right = ld.right_sidedef.ok_or(LevelError::MissingSidedef(id as LinedefId))?;
        if ld.flags.contains(LinedefFlags::TWO_SIDED) && ld.left_sidedef.is_none() {
            return Err(LevelError::MissingBackSide(id as LinedefId));
        }
        for side in std::iter::once(right).chain(ld.left_sidedef) {
            let sd = level
                .sidedefs
                .get(side as usize)
                .ok_or(bad("sidedef", side as usize))?;
            if sd.sector as usize >= level.sectors.len() {
                return Err(bad("sector", sd.sector as usize));
            }
        }
    }
    Ok(())
}

fn make_seg(level: &Level, line: LinedefId, side: LineSide) -> Result<Seg, LevelError> {
    let ld = level
        .linedefs
        .get(line as usize)
        .ok_or(LevelError::BadReference {
            kind: "linedef",
            id: line as usize,
        })?;
    let (v1, v2, front, back) = if side == 0 {
        (ld.v1, ld.v2, ld.right_sidedef, ld.left_sidedef)
    } else {
        (ld.v2, ld.v1, ld.left_sidedef, ld.right_sidedef)
    };
    let sidedef = front.ok_or(LevelError::MissingBackSide(line))?;
    let a = level.vertices[v1 as usize];
    let b = level.vertices[v2 as usize];
    Ok(Seg {
        v1,
        v2,
        offset: Fixed::ZERO,
        angle: point_to_angle(b.x - a.x, b.y - a.y),
        linedef: line,
        sidedef,
        front_sector: level.sidedefs[sidedef as usize].sector,
        back_sector: back.map(|s| level.sidedefs[s as usize].sector),
    })
}

fn child_bbox(level: &Level, child: u16) -> Aabb {
    if child & SUBSECTOR_BIT != 0 {
        let ss = &level.subsectors[(child & !SUBSECTOR_BIT) as usize];
        let mut bb = Aabb::EMPTY;
        for seg in &level.segs[ss.segs()] {
            for v in [seg.v1, seg.v2] {
                let v = level.vertices[v as usize];
                bb.add_point(v.x, v.y);
            }
        }
        bb
    } else {
        let node = &level.nodes[child as usize];
        node.bbox[0].union(&node.bbox[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    fn square(b: &mut LevelBuilder, sector: SectorId) -> Vec<LinedefId> {
        let corners = [
            vec2(-64.0, 64.0),
            vec2(64.0, 64.0),
            vec2(64.0, -64.0),
            vec2(-64.0, -64.0),
        ];
        let v: Vec<_> = corners.iter().map(|&c| b.vertex(c)).collect();
        (0..4)
            .map(|i| {
                let s = b.side(sector, NO_TEXTURE, 1, NO_TEXTURE);
                b.line(v[i], v[(i + 1) % 4], s, None)
            })
            .collect()
    }

    #[test]
    fn segs_inherit_angles_and_sectors() {
        let mut b = LevelBuilder::new("BOX");
        let sector = b.sector(0.0, 128.0, 1, 1, 160);
        let lines = square(&mut b, sector);
        b.subsector(&lines.iter().map(|&l| (l, 0)).collect::<Vec<_>>());
        let level = b.build().unwrap();

        assert_eq!(level.segs.len(), 4);
        assert_eq!(level.segs[0].angle, Angle(0));
        assert_eq!(level.segs[0].front_sector, sector);
        assert_eq!(level.segs[0].back_sector, None);
        assert_eq!(level.subsectors[0].sector, sector);
    }

    #[test]
    fn two_sided_line_needs_left_side() {
        let mut b = LevelBuilder::new("BAD");
        let sector = b.sector(0.0, 128.0, 1, 1, 160);
        let lines = square(&mut b, sector);
        b.line_flags(lines[0], LinedefFlags::TWO_SIDED);
        b.subsector(&[(lines[0], 0)]);
        assert_eq!(b.build().unwrap_err(), LevelError::MissingBackSide(lines[0]));
    }

    #[test]
    fn node_children_must_exist() {
        let mut b = LevelBuilder::new("BAD");
        let sector = b.sector(0.0, 128.0, 1, 1, 160);
        let lines = square(&mut b, sector);
        b.subsector(&[(lines[0], 0)]);
        b.node(Vec2::ZERO, Vec2::Y, Child::Subsector(0), Child::Subsector(7));
        assert!(matches!(b.build(), Err(LevelError::BadChild { node: 0, .. })));
    }

    #[test]
    fn empty_level_rejected() {
        assert_eq!(
            LevelBuilder::new("NONE").build().unwrap_err(),
            LevelError::NoSubsectors
        );
    }

    #[test]
    fn things_take_floor_height() {
        let mut b = LevelBuilder::new("BOX");
        let sector = b.sector(24.0, 128.0, 1, 1, 160);
        let lines = square(&mut b, sector);
        b.subsector(&lines.iter().map(|&l| (l, 0)).collect::<Vec<_>>());
        b.thing(vec2(8.0, 8.0), 90.0, 0, 0, MobjFlags::empty());
        let level = b.build().unwrap();
        assert_eq!(level.things[0].z, Fixed::from_int(24));
        assert_eq!(level.sectors[sector as usize].things, vec![0]);
    }
}
