#![warn(missing_docs)]

//! Core of a tile-grid level editor: cordon/selection rectangles with drag
//! handles, nested map objects flattened for drawing and collision, and the
//! binary map file format.

mod bounds;
mod catalog;
mod config;
mod editor;
mod error;
mod grid;
/// Binary map files and instance directories.
pub mod loader {
    pub mod map_file;
}
mod map;
/// Macroquad drawing of editor state.
pub mod render {
    pub mod draw;
}
mod scene;

pub use bounds::{BoundedRectangle, Handle, Projection};
pub use catalog::{
    load_sprite_catalog, parse_sprite_catalog, CatalogEntry, CatalogRef, Catalogs, GraphicRef,
    InstanceDef, ObjectKind, Sprite, ENTITY_LAYER, LAYER_COUNT, MAX_PROP_LAYER,
};
pub use config::EditorConfig;
pub use editor::Editor;
pub use error::{MapError, SceneError};
pub use grid::{GridExtent, TileColor, TileGrid, DEFAULT_GRID_SIZE};
pub use loader::map_file::{
    decode, decode_crop, encode, load_instance_dir, load_map_file, save_map_file, CropBounds,
    DecodedMap, InstanceBatch, MapFile,
};
pub use map::{Map, MapChange};
pub use scene::{
    resolve_collision, resolve_for_render, CollisionTile, LayerBuckets, Placement, PlacementList,
    ResolvedObject,
};
