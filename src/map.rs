use std::fmt;
use std::path::Path;

use macroquad::math::IVec2;

use crate::bounds::BoundedRectangle;
use crate::catalog::Catalogs;
use crate::error::{MapError, SceneError};
use crate::grid::{GridExtent, TileColor, TileGrid};
use crate::loader::map_file::{self, DecodedMap};
use crate::scene::{self, Placement, PlacementList, ResolvedObject};

/// What part of the document a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapChange {
    /// Collision tiles changed.
    Tiles,
    /// Placements were added, removed or reordered.
    Placements,
    /// Everything was replaced by a load.
    Replaced,
}

type Listener = Box<dyn FnMut(MapChange)>;

/// The edited document: collision grid, placed objects and the save cordon.
pub struct Map {
    extent: GridExtent,
    tiles: TileGrid,
    placements: PlacementList,
    cordon: BoundedRectangle,
    listeners: Vec<Listener>,
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("extent", &self.extent)
            .field("placements", &self.placements.len())
            .field("cordon", &self.cordon)
            .finish_non_exhaustive()
    }
}

impl Map {
    /// An empty map whose cordon covers the whole extent.
    pub fn new(extent: GridExtent) -> Self {
        Self::with_cordon(BoundedRectangle::covering(extent))
    }

    /// An empty map on the cordon's extent.
    pub fn with_cordon(cordon: BoundedRectangle) -> Self {
        let extent = cordon.extent();
        Self {
            extent,
            tiles: TileGrid::with_extent(extent),
            placements: PlacementList::new(),
            cordon,
            listeners: Vec::new(),
        }
    }

    /// Grid size.
    pub fn extent(&self) -> GridExtent {
        self.extent
    }

    /// Base collision tiles, without instance tiles.
    pub fn tiles(&self) -> &TileGrid {
        &self.tiles
    }

    /// Top-level placements in draw order.
    pub fn placements(&self) -> &PlacementList {
        &self.placements
    }

    /// Region written on save.
    pub fn cordon(&self) -> &BoundedRectangle {
        &self.cordon
    }

    /// Cordon for the active drag gesture. Moving it is not a document change.
    pub fn cordon_mut(&mut self) -> &mut BoundedRectangle {
        &mut self.cordon
    }

    /// Registers `f` to run after every tile or placement mutation.
    pub fn subscribe(&mut self, f: impl FnMut(MapChange) + 'static) {
        self.listeners.push(Box::new(f));
    }

    fn notify(&mut self, change: MapChange) {
        for listener in &mut self.listeners {
            listener(change);
        }
    }

    fn notify_if(&mut self, changed: bool, change: MapChange) -> bool {
        if changed {
            self.notify(change);
        }
        changed
    }

    /// Sets the tile at `p`. Returns `false` if it already had `color`.
    pub fn paint(&mut self, p: IVec2, color: TileColor) -> bool {
        let changed = self.tiles.set(p, color);
        self.notify_if(changed, MapChange::Tiles)
    }

    /// Paints `p` black.
    pub fn erase(&mut self, p: IVec2) -> bool {
        self.paint(p, TileColor::BLACK)
    }

    /// Flood fills from `p`. Returns the number of cells changed.
    pub fn flood_fill(&mut self, p: IVec2, color: TileColor) -> usize {
        let n = self.tiles.flood_fill(p, color);
        self.notify_if(n > 0, MapChange::Tiles);
        n
    }

    /// Erases every tile under `region`.
    pub fn clear_region(&mut self, region: &BoundedRectangle) -> usize {
        let n = self.tiles.clear_region(region);
        self.notify_if(n > 0, MapChange::Tiles);
        n
    }

    /// Places an object on top of everything else. Returns its index.
    pub fn place(&mut self, placement: Placement) -> usize {
        let idx = self.placements.push(placement);
        self.notify(MapChange::Placements);
        idx
    }

    /// Removes the placement at `index`.
    pub fn remove_placement(&mut self, index: usize) -> Option<Placement> {
        let removed = self.placements.remove(index);
        self.notify_if(removed.is_some(), MapChange::Placements);
        removed
    }

    /// Moves the placement at `index` to the back of the draw order.
    pub fn send_to_back(&mut self, index: usize) -> bool {
        let moved = self.placements.send_to_back(index);
        self.notify_if(moved, MapChange::Placements)
    }

    /// Moves the placement at `index` to the front of the draw order.
    pub fn bring_to_front(&mut self, index: usize) -> bool {
        let moved = self.placements.bring_to_front(index);
        self.notify_if(moved, MapChange::Placements)
    }

    /// Removes every placement whose footprint lies fully inside `region`.
    pub fn remove_placements_in(&mut self, catalogs: &Catalogs, region: &BoundedRectangle) -> usize {
        let n = self
            .placements
            .retain(|p| !region.contains_box(p.position, catalogs.entry(p.reference).size()));
        self.notify_if(n > 0, MapChange::Placements);
        n
    }

    /// Swaps in freshly decoded contents; the cordon becomes the stored crop.
    pub fn replace_contents(&mut self, decoded: DecodedMap) {
        self.cordon = decoded.crop.to_bounds(self.extent);
        self.tiles = decoded.tiles;
        self.placements = decoded.placements;
        self.notify(MapChange::Replaced);
    }

    /// Writes the cordon crop and every placement to `path`.
    pub fn save(&self, path: &Path) -> Result<(), MapError> {
        map_file::save_map_file(path, &self.cordon, &self.tiles, self.placements.as_slice())
    }

    /// Leaf objects at absolute positions, in draw order before layering.
    pub fn resolve_objects(&self, catalogs: &Catalogs) -> Result<Vec<ResolvedObject>, SceneError> {
        scene::resolve_for_render(catalogs, self.placements.as_slice(), IVec2::ZERO)
    }

    /// The map's own tiles with every placed instance's collision overlaid.
    pub fn collision_grid(&self, catalogs: &Catalogs) -> Result<TileGrid, SceneError> {
        let mut grid = self.tiles.clone();
        for tile in scene::resolve_collision(catalogs, self.placements.as_slice(), IVec2::ZERO)? {
            grid.set(tile.position, tile.color);
        }
        Ok(grid)
    }
}
