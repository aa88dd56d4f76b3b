//! The owning context for one editing session.
//!
//! `Editor` holds the catalogs snapshot, the document, the ad-hoc selection and
//! the drag gesture in progress. The host calls into it once per tick with pointer
//! positions already converted to grid cells (and a [`Projection`] for handle picking).

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use macroquad::math::{IVec2, Vec2};

use crate::bounds::{BoundedRectangle, Handle, Projection};
use crate::catalog::{load_sprite_catalog, CatalogRef, Catalogs, ObjectKind};
use crate::config::EditorConfig;
use crate::error::{MapError, SceneError};
use crate::loader::map_file::{self, InstanceBatch, MAP_FILE_EXTENSION};
use crate::map::{Map, MapChange};
use crate::scene::{LayerBuckets, Placement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragTarget {
    Selection,
    Cordon,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    target: DragTarget,
    handle: Handle,
}

/// One editing session.
pub struct Editor {
    config: EditorConfig,
    catalogs: Catalogs,
    map: Map,
    selection: Option<BoundedRectangle>,
    // Cleared by the map whenever placements change underneath it.
    selected_object: Rc<Cell<Option<usize>>>,
    drag: Option<Drag>,
    dirty: Rc<Cell<bool>>,
}

impl Editor {
    /// Starts a session on an empty map.
    pub fn new(config: EditorConfig, catalogs: Catalogs) -> Self {
        let mut map = Map::new(config.extent());
        let dirty = Rc::new(Cell::new(false));
        let selected_object = Rc::new(Cell::new(None));
        let flag = Rc::clone(&dirty);
        let selected = Rc::clone(&selected_object);
        map.subscribe(move |change| {
            flag.set(true);
            if change != MapChange::Tiles {
                selected.set(None);
            }
        });
        Self {
            config,
            catalogs,
            map,
            selection: None,
            selected_object,
            drag: None,
            dirty,
        }
    }

    /// Starts a session with the catalogs named in `config`.
    ///
    /// Sprite catalogs must load; instance files that fail are skipped and logged,
    /// as are instances nesting references the catalogs cannot resolve (see
    /// [`Editor::reload_instances`]).
    pub fn from_config(config: EditorConfig) -> Result<Self, MapError> {
        let entities = match &config.entity_catalog {
            Some(path) => load_sprite_catalog(path, ObjectKind::Entity)?,
            None => Vec::new(),
        };
        let props = match &config.prop_catalog {
            Some(path) => load_sprite_catalog(path, ObjectKind::Prop)?,
            None => Vec::new(),
        };
        let sprites = Catalogs::new(Vec::new(), entities, props);
        let catalogs = match &config.instance_dir {
            Some(dir) => {
                let mut batch = map_file::load_instance_dir(dir)?;
                admit_instances(&sprites, dir, &mut batch)
            }
            None => sprites,
        };
        Ok(Self::new(config, catalogs))
    }

    /// Settings the session was started with.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Current catalogs snapshot.
    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    /// The edited document.
    pub fn map(&self) -> &Map {
        &self.map
    }

    /// Direct access for tile tools and the cordon.
    ///
    /// Placement edits made through it drop the selected object, since its
    /// index may no longer name the same placement.
    pub fn map_mut(&mut self) -> &mut Map {
        &mut self.map
    }

    /// `true` if the document changed since the last successful save or load.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Ad-hoc selection region, if any.
    pub fn selection(&self) -> Option<&BoundedRectangle> {
        self.selection.as_ref()
    }

    /// Index of the selected top-level placement, if any.
    pub fn selected_object(&self) -> Option<usize> {
        self.selected_object.get()
    }

    /// Replaces the ad-hoc selection region.
    pub fn select_region(&mut self, left: i32, top: i32, width: i32, height: i32) {
        self.selection = Some(BoundedRectangle::new(
            left,
            top,
            width,
            height,
            self.map.extent(),
        ));
    }

    /// Drops both the selection region and the selected object.
    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.selected_object.set(None);
    }

    /// Selects the top-most top-level placement under `cell`.
    pub fn select_object_at(&mut self, cell: IVec2) -> Option<usize> {
        let picked = self.map.placements().pick(&self.catalogs, cell);
        self.selected_object.set(picked);
        picked
    }

    /// Starts a drag if `point` is over the selection or, failing that, the cordon.
    pub fn begin_drag(&mut self, point: Vec2, projection: Projection) -> Handle {
        let radius = self.config.handle_radius;
        let candidates = [
            (DragTarget::Selection, self.selection.as_ref()),
            (DragTarget::Cordon, Some(self.map.cordon())),
        ];
        for (target, rect) in candidates {
            let Some(rect) = rect else { continue };
            let handle = rect.hit_test_handle(point, projection, radius);
            if handle != Handle::None {
                self.drag = Some(Drag { target, handle });
                return handle;
            }
        }
        self.drag = None;
        Handle::None
    }

    /// Applies one pointer step to the active drag.
    pub fn drag_to(&mut self, current: IVec2, previous: IVec2) {
        let Some(drag) = self.drag else { return };
        let rect = match drag.target {
            DragTarget::Selection => match self.selection.as_mut() {
                Some(rect) => rect,
                None => return,
            },
            DragTarget::Cordon => self.map.cordon_mut(),
        };
        rect.adjust_by_handle(current, previous, drag.handle);
    }

    /// Ends the active drag, returning the handle that was held.
    pub fn end_drag(&mut self) -> Option<Handle> {
        self.drag.take().map(|d| d.handle)
    }

    /// Handle held by the active drag.
    pub fn active_handle(&self) -> Option<Handle> {
        self.drag.map(|d| d.handle)
    }

    /// Places `reference` at `position` on top of everything else.
    ///
    /// # Panics
    ///
    /// Panics if `reference` is outside its catalog.
    pub fn place(&mut self, reference: CatalogRef, position: IVec2) -> usize {
        self.catalogs.entry(reference);
        self.map.place(Placement::new(reference, position))
    }

    /// Deletes the selected object, or else every tile and fully-contained
    /// placement under the selection region. Returns what was removed.
    pub fn delete_selected(&mut self) -> usize {
        if let Some(index) = self.selected_object.take() {
            return usize::from(self.map.remove_placement(index).is_some());
        }
        match self.selection {
            Some(region) => {
                self.map.remove_placements_in(&self.catalogs, &region)
                    + self.map.clear_region(&region)
            }
            None => 0,
        }
    }

    /// Moves the selected object to the back of the draw order.
    pub fn send_selected_to_back(&mut self) -> bool {
        let Some(index) = self.selected_object.get() else {
            return false;
        };
        let moved = self.map.send_to_back(index);
        if moved {
            self.selected_object.set(Some(0));
        }
        moved
    }

    /// Moves the selected object to the front of the draw order.
    pub fn bring_selected_to_front(&mut self) -> bool {
        let Some(index) = self.selected_object.get() else {
            return false;
        };
        let moved = self.map.bring_to_front(index);
        if moved {
            self.selected_object.set(Some(self.map.placements().len() - 1));
        }
        moved
    }

    /// Saves the document. It is only marked clean when the write succeeded.
    pub fn save(&mut self, path: &Path) -> Result<(), MapError> {
        self.map.save(path)?;
        self.dirty.set(false);
        Ok(())
    }

    /// Loads `path` into the document.
    ///
    /// The file is decoded and every placement checked against the current
    /// catalogs before anything is replaced; on error the document is untouched.
    pub fn load(&mut self, path: &Path) -> Result<(), MapError> {
        let decoded = map_file::load_map_file(path, self.map.extent())?;
        for p in decoded.placements.iter() {
            self.catalogs.validate(p.reference)?;
        }
        self.map.replace_contents(decoded);
        self.clear_selection();
        self.drag = None;
        self.dirty.set(false);
        Ok(())
    }

    /// Rescans `dir` and swaps in a new catalogs snapshot with its instances.
    ///
    /// Instance `i<N>` is the N-th file that decoded, in file-name order, so
    /// adding, renaming or breaking a file shifts the instances after it and
    /// existing placements follow the index, not the name. An instance nesting
    /// a reference the new snapshot cannot resolve keeps its slot with its
    /// placements emptied, and is reported in [`InstanceBatch::failures`].
    ///
    /// Refused if the current document places an instance the new catalog no
    /// longer has.
    pub fn reload_instances(&mut self, dir: &Path) -> Result<InstanceBatch, MapError> {
        let mut batch = map_file::load_instance_dir(dir)?;
        let next = admit_instances(&self.catalogs, dir, &mut batch);
        for p in self.map.placements() {
            next.validate(p.reference)?;
        }
        self.catalogs = next;
        Ok(batch)
    }

    /// Resolved scene bucketed by draw layer.
    pub fn resolve_scene(&self) -> Result<LayerBuckets, SceneError> {
        Ok(LayerBuckets::from_resolved(
            self.map.resolve_objects(&self.catalogs)?,
        ))
    }
}

/// Builds a snapshot of `base` with the batch's instances, emptying any whose
/// nested references do not resolve and recording those as failures.
fn admit_instances(base: &Catalogs, dir: &Path, batch: &mut InstanceBatch) -> Catalogs {
    let mut next = base.with_instances(std::mem::take(&mut batch.instances));
    for (index, err) in next.strip_dangling_instances() {
        let path = dir.join(format!("{}.{MAP_FILE_EXTENSION}", next.instances[index].name));
        tracing::warn!("emptying instance {}: {err}", path.display());
        batch.failures.push((path, err));
    }
    next
}
