pub mod bsp;
pub mod builder;
pub mod camera;
pub mod geometry;
pub mod sample;
pub mod texture;

pub use geometry::{
    Aabb, Level, Linedef, LinedefFlags, LinedefId, Node, NodeId, Sector, SectorId, Seg,
    SegmentId, Sidedef, SidedefId, Subsector, SubsectorId, Thing, ThingId, Vertex, VertexId,
};

pub use builder::{Child, LevelBuilder, LevelError};

pub use camera::{Camera, PlayerSprite};

pub use texture::{
    Colormap, Flat, FlatId, NO_FLAT, NO_TEXTURE, Palette, Post, SpriteDef, SpriteFrame, SpriteId,
    Texture, TextureBank, TextureError, TextureId, Translations,
};
