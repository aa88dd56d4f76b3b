//! Descriptors of placeable object kinds and the arena that owns them.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use macroquad::math::{ivec2, IVec2};
use serde::Deserialize;

use crate::error::MapError;
use crate::grid::TileGrid;
use crate::scene::Placement;

/// Highest layer a prop may be drawn on.
pub const MAX_PROP_LAYER: u8 = 8;
/// Layer every entity is drawn on, above all props.
pub const ENTITY_LAYER: u8 = 9;
/// Number of draw layers.
pub const LAYER_COUNT: usize = ENTITY_LAYER as usize + 1;

/// Which catalog a reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    /// A nested sub-map.
    Instance,
    /// A gameplay entity.
    Entity,
    /// A decorative prop.
    Prop,
}

impl ObjectKind {
    /// Single-letter tag used in serialized ids.
    pub fn tag(self) -> char {
        match self {
            ObjectKind::Instance => 'i',
            ObjectKind::Entity => 'e',
            ObjectKind::Prop => 'p',
        }
    }

    fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'i' => Some(ObjectKind::Instance),
            'e' => Some(ObjectKind::Entity),
            'p' => Some(ObjectKind::Prop),
            _ => None,
        }
    }
}

/// Kind tag plus index into the matching catalog. Serialized as `"p47"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogRef {
    /// Catalog the index points into.
    pub kind: ObjectKind,
    /// Position in that catalog.
    pub index: usize,
}

impl CatalogRef {
    /// Creates a reference.
    pub const fn new(kind: ObjectKind, index: usize) -> Self {
        Self { kind, index }
    }

    /// Reference into the instance catalog.
    pub const fn instance(index: usize) -> Self {
        Self::new(ObjectKind::Instance, index)
    }

    /// Reference into the entity catalog.
    pub const fn entity(index: usize) -> Self {
        Self::new(ObjectKind::Entity, index)
    }

    /// Reference into the prop catalog.
    pub const fn prop(index: usize) -> Self {
        Self::new(ObjectKind::Prop, index)
    }
}

impl fmt::Display for CatalogRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.tag(), self.index)
    }
}

impl FromStr for CatalogRef {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MapError::InvalidReference(s.to_owned());
        let mut chars = s.chars();
        let kind = chars.next().and_then(ObjectKind::from_tag).ok_or_else(invalid)?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let index = digits.parse::<usize>().map_err(|_| invalid())?;
        Ok(Self { kind, index })
    }
}

/// Opaque handle to a graphic owned by the host's asset catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GraphicRef(pub String);

/// Entity or prop descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    /// Display name.
    pub name: String,
    /// Footprint in grid cells.
    pub size: IVec2,
    /// Graphic to draw.
    pub graphic: GraphicRef,
    /// Draw layer; only meaningful for props.
    pub layer: u8,
}

impl Sprite {
    /// Creates a descriptor.
    pub fn new(name: impl Into<String>, size: IVec2, graphic: GraphicRef, layer: u8) -> Self {
        Self {
            name: name.into(),
            size,
            graphic,
            layer,
        }
    }
}

/// A nested sub-map: its own collision tiles plus placements relative to its origin.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstanceDef {
    /// Name, usually the file stem it was loaded from.
    pub name: String,
    /// Footprint in grid cells.
    pub size: IVec2,
    /// Collision tiles sized `size`, if any.
    pub tiles: Option<TileGrid>,
    /// Nested objects.
    pub placements: Vec<Placement>,
}

/// Borrowed view of one catalog entry.
#[derive(Debug, Clone, Copy)]
pub enum CatalogEntry<'a> {
    /// Instance descriptor.
    Instance(&'a InstanceDef),
    /// Entity descriptor.
    Entity(&'a Sprite),
    /// Prop descriptor.
    Prop(&'a Sprite),
}

impl CatalogEntry<'_> {
    /// Footprint in grid cells.
    pub fn size(&self) -> IVec2 {
        match self {
            CatalogEntry::Instance(def) => def.size,
            CatalogEntry::Entity(s) | CatalogEntry::Prop(s) => s.size,
        }
    }

    /// Draw layer: 0..=8 for props, 9 for entities. Instances never draw themselves
    /// and report 0.
    pub fn layer(&self) -> u8 {
        match self {
            CatalogEntry::Instance(_) => 0,
            CatalogEntry::Entity(_) => ENTITY_LAYER,
            CatalogEntry::Prop(s) => s.layer.min(MAX_PROP_LAYER),
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            CatalogEntry::Instance(def) => &def.name,
            CatalogEntry::Entity(s) | CatalogEntry::Prop(s) => &s.name,
        }
    }
}

/// Arena of every placeable kind, addressed by [`CatalogRef`].
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    /// Instance catalog.
    pub instances: Vec<InstanceDef>,
    /// Entity catalog.
    pub entities: Vec<Sprite>,
    /// Prop catalog.
    pub props: Vec<Sprite>,
}

impl Catalogs {
    /// Creates a snapshot from the three catalogs.
    pub fn new(instances: Vec<InstanceDef>, entities: Vec<Sprite>, props: Vec<Sprite>) -> Self {
        Self {
            instances,
            entities,
            props,
        }
    }

    /// Looks up `r`, returning `None` when the index is out of range.
    pub fn get(&self, r: CatalogRef) -> Option<CatalogEntry<'_>> {
        match r.kind {
            ObjectKind::Instance => self.instances.get(r.index).map(CatalogEntry::Instance),
            ObjectKind::Entity => self.entities.get(r.index).map(CatalogEntry::Entity),
            ObjectKind::Prop => self.props.get(r.index).map(CatalogEntry::Prop),
        }
    }

    /// Looks up `r`.
    ///
    /// # Panics
    ///
    /// Panics if `r` points outside its catalog. Editor code only builds references
    /// from catalog listings, and loaded maps go through [`Catalogs::validate`].
    pub fn entry(&self, r: CatalogRef) -> CatalogEntry<'_> {
        match self.get(r) {
            Some(entry) => entry,
            None => panic!("invalid catalog reference {r}"),
        }
    }

    /// Checks that `r` resolves.
    pub fn validate(&self, r: CatalogRef) -> Result<(), MapError> {
        match self.get(r) {
            Some(_) => Ok(()),
            None => Err(MapError::InvalidReference(r.to_string())),
        }
    }

    /// Empties the placements of every instance that nests a reference this
    /// snapshot cannot resolve. The instance keeps its slot so `i<N>` references
    /// elsewhere still point at the same definition. Returns each emptied
    /// instance index with the first bad reference found in it.
    pub fn strip_dangling_instances(&mut self) -> Vec<(usize, MapError)> {
        let mut stripped = Vec::new();
        for i in 0..self.instances.len() {
            let bad = self.instances[i]
                .placements
                .iter()
                .find_map(|p| self.validate(p.reference).err());
            if let Some(err) = bad {
                self.instances[i].placements.clear();
                stripped.push((i, err));
            }
        }
        stripped
    }

    /// Number of entries of `kind`.
    pub fn len(&self, kind: ObjectKind) -> usize {
        match kind {
            ObjectKind::Instance => self.instances.len(),
            ObjectKind::Entity => self.entities.len(),
            ObjectKind::Prop => self.props.len(),
        }
    }

    /// A new snapshot with the instance catalog swapped out.
    pub fn with_instances(&self, instances: Vec<InstanceDef>) -> Self {
        Self {
            instances,
            entities: self.entities.clone(),
            props: self.props.clone(),
        }
    }
}

#[derive(Deserialize)]
struct JsonSprite {
    name: String,
    #[serde(default = "one")]
    width: i32,
    #[serde(default = "one")]
    height: i32,
    #[serde(default)]
    graphic: String,
    #[serde(default)]
    layer: u8,
}

fn one() -> i32 {
    1
}

fn sprite_from_json(s: JsonSprite, kind: ObjectKind) -> Sprite {
    let layer = match kind {
        ObjectKind::Entity => ENTITY_LAYER,
        _ => s.layer.min(MAX_PROP_LAYER),
    };
    Sprite {
        name: s.name,
        size: ivec2(s.width.max(1), s.height.max(1)),
        graphic: GraphicRef(s.graphic),
        layer,
    }
}

/// Parses a JSON array of entity or prop descriptors.
pub fn parse_sprite_catalog(txt: &str, kind: ObjectKind) -> Result<Vec<Sprite>, serde_json::Error> {
    let raw: Vec<JsonSprite> = serde_json::from_str(txt)?;
    Ok(raw.into_iter().map(|s| sprite_from_json(s, kind)).collect())
}

/// Reads a JSON sprite catalog from disk.
pub fn load_sprite_catalog(path: &Path, kind: ObjectKind) -> Result<Vec<Sprite>, MapError> {
    let txt = std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let sprites = parse_sprite_catalog(&txt, kind).map_err(|source| MapError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("loaded {} {:?} descriptors from {}", sprites.len(), kind, path.display());
    Ok(sprites)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_ids_round_trip() {
        for r in [CatalogRef::instance(3), CatalogRef::entity(12), CatalogRef::prop(47)] {
            let id = r.to_string();
            assert_eq!(id.parse::<CatalogRef>().expect("parse"), r);
        }
        assert_eq!(CatalogRef::prop(47).to_string(), "p47");
    }

    #[test]
    fn ref_ids_reject_garbage() {
        for bad in ["", "p", "x3", "p-1", "e1a", "i 2", "P3"] {
            let err = bad.parse::<CatalogRef>().unwrap_err();
            assert!(matches!(err, MapError::InvalidReference(ref s) if s == bad));
        }
    }

    #[test]
    fn layers_per_kind() {
        let prop = Sprite::new("rock", ivec2(2, 2), GraphicRef::default(), 12);
        let entity = Sprite::new("player", ivec2(1, 2), GraphicRef::default(), 0);
        let cats = Catalogs::new(vec![InstanceDef::default()], vec![entity], vec![prop]);
        assert_eq!(cats.entry(CatalogRef::prop(0)).layer(), MAX_PROP_LAYER);
        assert_eq!(cats.entry(CatalogRef::entity(0)).layer(), ENTITY_LAYER);
        assert_eq!(cats.entry(CatalogRef::entity(0)).size(), ivec2(1, 2));
    }

    #[test]
    fn dangling_instances_are_emptied_in_place() {
        let rock = Sprite::new("rock", ivec2(1, 1), GraphicRef::default(), 0);
        let good = InstanceDef {
            name: "good".into(),
            placements: vec![Placement::new(CatalogRef::prop(0), ivec2(1, 1))],
            ..InstanceDef::default()
        };
        let bad = InstanceDef {
            name: "bad".into(),
            placements: vec![
                Placement::new(CatalogRef::prop(0), ivec2(0, 0)),
                Placement::new(CatalogRef::prop(99), ivec2(0, 0)),
                Placement::new(CatalogRef::instance(7), ivec2(0, 0)),
            ],
            ..InstanceDef::default()
        };
        let mut cats = Catalogs::new(vec![good, bad], vec![], vec![rock]);

        let stripped = cats.strip_dangling_instances();
        assert_eq!(stripped.len(), 1);
        assert_eq!(stripped[0].0, 1);
        assert!(matches!(stripped[0].1, MapError::InvalidReference(ref s) if s == "p99"));
        assert_eq!(cats.instances.len(), 2);
        assert_eq!(cats.instances[0].placements.len(), 1);
        assert!(cats.instances[1].placements.is_empty());
        assert_eq!(cats.instances[1].name, "bad");
    }

    #[test]
    fn validate_reports_out_of_range() {
        let cats = Catalogs::default();
        assert!(cats.get(CatalogRef::prop(0)).is_none());
        assert!(matches!(
            cats.validate(CatalogRef::entity(4)),
            Err(MapError::InvalidReference(ref s)) if s == "e4"
        ));
    }

    #[test]
    #[should_panic(expected = "invalid catalog reference")]
    fn entry_fails_fast() {
        Catalogs::default().entry(CatalogRef::instance(0));
    }

    #[test]
    fn parses_sprite_json_with_defaults() {
        let json = r#"[
            {"name":"tree","width":2,"height":3,"graphic":"tree.png","layer":4},
            {"name":"bush","layer":30}
        ]"#;
        let props = parse_sprite_catalog(json, ObjectKind::Prop).expect("parse");
        assert_eq!(props[0].size, ivec2(2, 3));
        assert_eq!(props[0].graphic, GraphicRef("tree.png".into()));
        assert_eq!(props[1].size, ivec2(1, 1));
        assert_eq!(props[1].layer, MAX_PROP_LAYER);

        let ents = parse_sprite_catalog(json, ObjectKind::Entity).expect("parse");
        assert!(ents.iter().all(|s| s.layer == ENTITY_LAYER));
    }

    #[test]
    fn load_sprite_catalog_reports_path_on_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("props.json");
        std::fs::write(&path, "{ not json").expect("write");
        let err = load_sprite_catalog(&path, ObjectKind::Prop).unwrap_err();
        assert!(matches!(err, MapError::Json { path: ref p, .. } if p == &path));

        let missing = dir.path().join("missing.json");
        let err = load_sprite_catalog(&missing, ObjectKind::Prop).unwrap_err();
        assert!(matches!(err, MapError::Io { .. }));
    }
}
