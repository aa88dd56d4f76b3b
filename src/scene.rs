//! Placed objects and flattening of nested instances.
//!
//! Placement order is draw order: later entries draw above earlier ones within a
//! layer. Resolution walks instances depth-first in list order, so that order holds
//! no matter how deep an object is nested.

use macroquad::math::IVec2;

use crate::catalog::{CatalogEntry, CatalogRef, Catalogs, LAYER_COUNT};
use crate::error::SceneError;
use crate::grid::TileColor;

/// One object placed at a grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    /// What is placed.
    pub reference: CatalogRef,
    /// Top-left grid cell, relative to the containing map or instance.
    pub position: IVec2,
}

impl Placement {
    /// Creates a placement.
    pub const fn new(reference: CatalogRef, position: IVec2) -> Self {
        Self {
            reference,
            position,
        }
    }
}

/// A leaf object (entity or prop) at its absolute grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedObject {
    /// Entity or prop reference.
    pub reference: CatalogRef,
    /// Absolute grid position.
    pub position: IVec2,
    /// Draw layer of the referenced kind.
    pub layer: u8,
}

/// One collision cell contributed by an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionTile {
    /// Absolute grid position.
    pub position: IVec2,
    /// Non-black collision color.
    pub color: TileColor,
}

/// Ordered list of top-level placements owned by a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementList {
    items: Vec<Placement>,
}

impl PlacementList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of placements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` if nothing is placed.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Placement at `index` in draw order.
    pub fn get(&self, index: usize) -> Option<&Placement> {
        self.items.get(index)
    }

    /// Iterates back to front.
    pub fn iter(&self) -> std::slice::Iter<'_, Placement> {
        self.items.iter()
    }

    /// The placements as a slice, in draw order.
    pub fn as_slice(&self) -> &[Placement] {
        &self.items
    }

    /// Appends on top of everything else. Returns its index.
    pub fn push(&mut self, placement: Placement) -> usize {
        self.items.push(placement);
        self.items.len() - 1
    }

    /// Removes the placement at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Placement> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Moves the placement at `index` to the head of the list (drawn first).
    pub fn send_to_back(&mut self, index: usize) -> bool {
        match self.remove(index) {
            Some(p) => {
                self.items.insert(0, p);
                true
            }
            None => false,
        }
    }

    /// Moves the placement at `index` to the tail of the list (drawn last).
    pub fn bring_to_front(&mut self, index: usize) -> bool {
        match self.remove(index) {
            Some(p) => {
                self.items.push(p);
                true
            }
            None => false,
        }
    }

    /// Keeps only placements matching `keep`. Returns the number removed.
    pub fn retain(&mut self, keep: impl FnMut(&Placement) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(keep);
        before - self.items.len()
    }

    /// Index of the top-most placement whose footprint contains `point`.
    ///
    /// Only top-level placements are considered; objects nested in an instance are
    /// selected through their instance.
    pub fn pick(&self, catalogs: &Catalogs, point: IVec2) -> Option<usize> {
        self.items.iter().rposition(|p| {
            let size = catalogs.entry(p.reference).size();
            point.x >= p.position.x
                && point.y >= p.position.y
                && point.x < p.position.x + size.x
                && point.y < p.position.y + size.y
        })
    }
}

impl FromIterator<Placement> for PlacementList {
    fn from_iter<T: IntoIterator<Item = Placement>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PlacementList {
    type Item = &'a Placement;
    type IntoIter = std::slice::Iter<'a, Placement>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl From<Vec<Placement>> for PlacementList {
    fn from(items: Vec<Placement>) -> Self {
        Self { items }
    }
}

/// Flattens `placements` into leaf objects at absolute positions, depth-first in
/// list order. Instances contribute their descendants, never themselves.
///
/// # Panics
///
/// Panics on a reference outside its catalog.
pub fn resolve_for_render(
    catalogs: &Catalogs,
    placements: &[Placement],
    offset: IVec2,
) -> Result<Vec<ResolvedObject>, SceneError> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    walk_render(catalogs, placements, offset, &mut path, &mut out)?;
    Ok(out)
}

fn walk_render(
    catalogs: &Catalogs,
    placements: &[Placement],
    offset: IVec2,
    path: &mut Vec<usize>,
    out: &mut Vec<ResolvedObject>,
) -> Result<(), SceneError> {
    for p in placements {
        let position = offset.wrapping_add(p.position);
        match catalogs.entry(p.reference) {
            CatalogEntry::Instance(def) => {
                enter(path, p.reference)?;
                walk_render(catalogs, &def.placements, position, path, out)?;
                path.pop();
            }
            entry => out.push(ResolvedObject {
                reference: p.reference,
                position,
                layer: entry.layer(),
            }),
        }
    }
    Ok(())
}

/// Collision cells contributed by instances in `placements`: each instance's own
/// non-black tiles at its offset, followed by those of its nested instances.
///
/// Apply in order; later cells overwrite earlier ones.
///
/// # Panics
///
/// Panics on a reference outside its catalog.
pub fn resolve_collision(
    catalogs: &Catalogs,
    placements: &[Placement],
    offset: IVec2,
) -> Result<Vec<CollisionTile>, SceneError> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    walk_collision(catalogs, placements, offset, &mut path, &mut out)?;
    Ok(out)
}

fn walk_collision(
    catalogs: &Catalogs,
    placements: &[Placement],
    offset: IVec2,
    path: &mut Vec<usize>,
    out: &mut Vec<CollisionTile>,
) -> Result<(), SceneError> {
    for p in placements {
        let CatalogEntry::Instance(def) = catalogs.entry(p.reference) else {
            continue;
        };
        let position = offset.wrapping_add(p.position);
        enter(path, p.reference)?;
        if let Some(tiles) = &def.tiles {
            out.extend(tiles.occupied().map(|(local, color)| CollisionTile {
                position: position.wrapping_add(local),
                color,
            }));
        }
        walk_collision(catalogs, &def.placements, position, path, out)?;
        path.pop();
    }
    Ok(())
}

fn enter(path: &mut Vec<usize>, reference: CatalogRef) -> Result<(), SceneError> {
    if path.contains(&reference.index) {
        return Err(SceneError::Cycle { reference });
    }
    path.push(reference.index);
    Ok(())
}

/// Resolved objects bucketed by layer, keeping relative order inside a bucket.
#[derive(Debug, Clone, Default)]
pub struct LayerBuckets {
    buckets: [Vec<ResolvedObject>; LAYER_COUNT],
}

impl LayerBuckets {
    /// Buckets `resolved` by layer.
    pub fn from_resolved(resolved: impl IntoIterator<Item = ResolvedObject>) -> Self {
        let mut out = Self::default();
        for obj in resolved {
            let layer = (obj.layer as usize).min(LAYER_COUNT - 1);
            out.buckets[layer].push(obj);
        }
        out
    }

    /// Objects on `layer`.
    pub fn layer(&self, layer: u8) -> &[ResolvedObject] {
        self.buckets
            .get(layer as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every object in draw order: layer 0 first, layer 9 last.
    pub fn draw_order(&self) -> impl Iterator<Item = &ResolvedObject> + '_ {
        self.buckets.iter().flatten()
    }
}
