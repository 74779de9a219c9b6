use std::ops::Range;

use bitflags::bitflags;

use crate::defs::MobjFlags;
use crate::math::{Angle, Fixed};
use crate::world::texture::{FlatId, SpriteId, TextureId};

pub type SubsectorId = u16;
pub type LinedefId = u16;
pub type SegmentId = u16;
pub type VertexId = u16;
pub type SidedefId = u16;
pub type SectorId = u16;
pub type NodeId = u16;
pub type ThingId = u16;

/// Runtime snapshot of one map.
///
/// Geometry and the BSP are fixed once built. Sector heights, light levels
/// and things may be changed by the simulation between frames; the
/// renderer only ever borrows the level immutably.
#[derive(Debug, Clone)]
pub struct Level {
    pub name: String,
    pub things: Vec<Thing>,
    pub linedefs: Vec<Linedef>,
    pub sidedefs: Vec<Sidedef>,
    pub vertices: Vec<Vertex>,
    pub segs: Vec<Seg>,
    pub subsectors: Vec<Subsector>,
    pub nodes: Vec<Node>,
    pub sectors: Vec<Sector>,
    /// Floors and ceilings using this flat are drawn as open sky.
    pub sky_flat: FlatId,
    pub sky_texture: TextureId,
}

/*------------------------- game objects -----------------------------*/

/// A movable object as far as rendering is concerned.
#[derive(Clone, Debug)]
pub struct Thing {
    pub x: Fixed,
    pub y: Fixed,
    /// Absolute z of the object's feet.
    pub z: Fixed,
    pub angle: Angle,
    pub sprite: SpriteId,
    /// Frame index plus `FF_FULLBRIGHT`.
    pub frame: u16,
    pub flags: MobjFlags,
    /// Sector whose thing list holds this object.
    pub sector: SectorId,
}

/*--------------------------- linedefs -------------------------------*/

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LinedefFlags: u16 {
        const IMPASSABLE      = 0x0001;
        const BLOCK_MONSTERS  = 0x0002;
        const TWO_SIDED       = 0x0004;
        const UPPER_UNPEGGED  = 0x0008;
        const LOWER_UNPEGGED  = 0x0010;
        const SECRET          = 0x0020;
        const BLOCK_SOUND     = 0x0040;
        const NOT_ON_MAP      = 0x0080;
        /// Set once the line has been seen by the player.
        const MAPPED          = 0x0100;
    }
}

#[derive(Clone, Debug)]
pub struct Linedef {
    pub v1: VertexId,
    pub v2: VertexId,
    pub flags: LinedefFlags,
    pub right_sidedef: Option<SidedefId>,
    pub left_sidedef: Option<SidedefId>,
}

/*--------------------------- sidedefs -------------------------------*/

#[derive(Clone, Debug)]
pub struct Sidedef {
    pub x_off: Fixed,
    pub y_off: Fixed,
    pub upper: TextureId,
    pub lower: TextureId,
    pub middle: TextureId,
    pub sector: SectorId,
}

/*----------------------- simple primitives --------------------------*/

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vertex {
    pub x: Fixed,
    pub y: Fixed,
}

/// One side of a linedef (or a piece of it) inside a single subsector.
///
/// Sector references are resolved at build time so the wall pass never
/// has to chase sidedefs.
#[derive(Clone, Debug)]
pub struct Seg {
    pub v1: VertexId,
    pub v2: VertexId,
    /// Distance along the linedef from its first vertex to `v1`.
    pub offset: Fixed,
    pub angle: Angle,
    pub linedef: LinedefId,
    pub sidedef: SidedefId,
    pub front_sector: SectorId,
    pub back_sector: Option<SectorId>,
}

#[derive(Clone, Debug)]
pub struct Subsector {
    pub sector: SectorId,
    pub first_seg: SegmentId,
    pub seg_count: u16,
}

impl Subsector {
    #[inline]
    pub fn segs(&self) -> Range<usize> {
        let first = self.first_seg as usize;
        first..first + self.seg_count as usize
    }
}

/// Axis-aligned box in map space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Aabb {
    pub top: Fixed,
    pub bottom: Fixed,
    pub left: Fixed,
    pub right: Fixed,
}

impl Aabb {
    /// An inverted box that any `add_point` will snap to.
    pub const EMPTY: Aabb = Aabb {
        top: Fixed::MIN,
        bottom: Fixed::MAX,
        left: Fixed::MAX,
        right: Fixed::MIN,
    };

    pub fn add_point(&mut self, x: Fixed, y: Fixed) {
        self.left = self.left.min(x);
        self.right = self.right.max(x);
        self.bottom = self.bottom.min(y);
        self.top = self.top.max(y);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            top: self.top.max(other.top),
            bottom: self.bottom.min(other.bottom),
            left: self.left.min(other.left),
            right: self.right.max(other.right),
        }
    }

    pub fn contains(&self, x: Fixed, y: Fixed) -> bool {
        x >= self.left && x <= self.right && y >= self.bottom && y <= self.top
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub x: Fixed,
    pub y: Fixed,
    pub dx: Fixed,
    pub dy: Fixed,
    /// `[front, back]` bounding boxes.
    pub bbox: [Aabb; 2],
    /// `[front, back]`; `SUBSECTOR_BIT` marks a leaf.
    pub child: [u16; 2],
}

#[derive(Clone, Debug)]
pub struct Sector {
    pub floor_h: Fixed,
    pub ceil_h: Fixed,
    pub floor_tex: FlatId,
    pub ceil_tex: FlatId,
    /// 0‥255
    pub light: i16,
    pub things: Vec<ThingId>,
}
