// tests/load_tests.rs

use std::fs;

use macroquad::math::ivec2;
use tilegrid_editor::{
    load_instance_dir, load_map_file, save_map_file, BoundedRectangle, CatalogRef, Catalogs,
    Editor, EditorConfig, GraphicRef, GridExtent, MapError, Placement, SceneError, Sprite, TileColor,
    TileGrid,
};

fn extent() -> GridExtent {
    GridExtent::new(128, 128)
}

fn editor() -> Editor {
    let config = EditorConfig {
        grid_width: 128,
        grid_height: 128,
        ..EditorConfig::default()
    };
    let props = vec![
        Sprite::new("barrel", ivec2(1, 1), GraphicRef("barrel.png".into()), 2),
        Sprite::new("table", ivec2(2, 1), GraphicRef("table.png".into()), 2),
    ];
    let entities = vec![Sprite::new("guard", ivec2(1, 2), GraphicRef("guard.png".into()), 0)];
    Editor::new(config, Catalogs::new(vec![], entities, props))
}

#[test]
fn shrinking_the_cordon_leaves_no_stale_bytes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("level.map");
    let mut tiles = TileGrid::with_extent(extent());
    tiles.set(ivec2(90, 90), TileColor::new(10, 20, 30));

    let big = BoundedRectangle::new(0, 0, 100, 100, extent());
    save_map_file(&path, &big, &tiles, &[]).expect("first save");
    let first_len = fs::metadata(&path).expect("meta").len();

    let small = BoundedRectangle::new(0, 0, 50, 50, extent());
    save_map_file(&path, &small, &tiles, &[]).expect("second save");
    assert!(fs::metadata(&path).expect("meta").len() < first_len);

    let decoded = load_map_file(&path, extent()).expect("load");
    assert_eq!((decoded.crop.width, decoded.crop.height), (50, 50));
    assert!(decoded.tiles.is_blank());
}

#[test]
fn delete_then_save_then_reload() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("room.map");

    let mut ed = editor();
    ed.place(CatalogRef::prop(0), ivec2(2, 2));
    ed.place(CatalogRef::entity(0), ivec2(10, 2));
    ed.place(CatalogRef::prop(1), ivec2(20, 2));
    assert_eq!(ed.select_object_at(ivec2(10, 3)), Some(1));
    assert_eq!(ed.delete_selected(), 1);
    ed.save(&path).expect("save");
    assert!(!ed.is_dirty());

    let mut reloaded = editor();
    reloaded.load(&path).expect("load");
    assert_eq!(
        reloaded.map().placements().as_slice(),
        &[
            Placement::new(CatalogRef::prop(0), ivec2(2, 2)),
            Placement::new(CatalogRef::prop(1), ivec2(20, 2)),
        ]
    );
}

#[test]
fn failed_load_leaves_document_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut ed = editor();
    ed.place(CatalogRef::prop(0), ivec2(1, 1));
    ed.map_mut().paint(ivec2(3, 3), TileColor::new(1, 2, 3));

    let missing = dir.path().join("missing.map");
    assert!(matches!(ed.load(&missing), Err(MapError::Io { .. })));

    let corrupt = dir.path().join("corrupt.map");
    fs::write(&corrupt, [1u8, 2, 3]).expect("write");
    assert!(matches!(ed.load(&corrupt), Err(MapError::Truncated { .. })));

    // valid file, but it places an instance this session has no catalog entry for
    let foreign = dir.path().join("foreign.map");
    let cordon = BoundedRectangle::new(0, 0, 4, 4, extent());
    let placements = [Placement::new(CatalogRef::instance(0), ivec2(0, 0))];
    save_map_file(&foreign, &cordon, &TileGrid::with_extent(extent()), &placements).expect("save");
    assert!(matches!(ed.load(&foreign), Err(MapError::InvalidReference(ref id)) if id == "i0"));

    assert_eq!(ed.map().placements().len(), 1);
    assert_eq!(ed.map().tiles().get(ivec2(3, 3)), TileColor::new(1, 2, 3));
    assert!(ed.is_dirty());
}

#[test]
fn failed_save_keeps_document_dirty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut ed = editor();
    ed.place(CatalogRef::prop(0), ivec2(1, 1));
    let path = dir.path().join("no_such_dir").join("level.map");
    assert!(matches!(ed.save(&path), Err(MapError::Io { .. })));
    assert!(ed.is_dirty());
}

#[test]
fn batch_load_skips_broken_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut tiles = TileGrid::with_extent(extent());
    tiles.set(ivec2(11, 11), TileColor::new(0, 255, 0));
    let cordon = BoundedRectangle::new(10, 10, 3, 2, extent());
    let placements = [Placement::new(CatalogRef::prop(1), ivec2(12, 10))];

    save_map_file(&dir.path().join("a_hut.map"), &cordon, &tiles, &placements).expect("save");
    fs::write(dir.path().join("b_broken.map"), b"nope").expect("write");
    save_map_file(&dir.path().join("c_empty.map"), &cordon, &TileGrid::with_extent(extent()), &[])
        .expect("save");
    fs::write(dir.path().join("notes.txt"), b"ignored").expect("write");

    let batch = load_instance_dir(dir.path()).expect("batch");
    let names: Vec<_> = batch.instances.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["a_hut", "c_empty"]);
    assert_eq!(batch.failures.len(), 1);
    assert!(batch.failures[0].0.ends_with("b_broken.map"));

    let hut = &batch.instances[0];
    assert_eq!(hut.size, ivec2(3, 2));
    assert_eq!(hut.placements[0].position, ivec2(2, 0));
    let hut_tiles = hut.tiles.as_ref().expect("hut tiles");
    assert_eq!(hut_tiles.get(ivec2(1, 1)), TileColor::new(0, 255, 0));
    assert!(batch.instances[1].tiles.is_none());
}

#[test]
fn reload_instances_swaps_catalog_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cordon = BoundedRectangle::new(0, 0, 2, 2, extent());
    let tiles = TileGrid::with_extent(extent());
    save_map_file(&dir.path().join("pillar.map"), &cordon, &tiles, &[]).expect("save");

    let mut ed = editor();
    let batch = ed.reload_instances(dir.path()).expect("reload");
    assert!(batch.failures.is_empty());
    assert_eq!(ed.catalogs().instances.len(), 1);
    assert_eq!(ed.catalogs().props.len(), 2);

    ed.place(CatalogRef::instance(0), ivec2(5, 5));
    let empty = tempfile::tempdir().expect("tempdir");
    assert!(matches!(
        ed.reload_instances(empty.path()),
        Err(MapError::InvalidReference(_))
    ));
    assert_eq!(ed.catalogs().instances.len(), 1);
}

#[test]
fn instance_with_unknown_nested_reference_is_emptied_not_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cordon = BoundedRectangle::new(0, 0, 4, 4, extent());
    let mut tiles = TileGrid::with_extent(extent());
    tiles.set(ivec2(1, 1), TileColor::new(9, 9, 9));
    let nested = [
        Placement::new(CatalogRef::prop(0), ivec2(0, 0)),
        Placement::new(CatalogRef::prop(99), ivec2(1, 0)),
    ];
    save_map_file(&dir.path().join("hut.map"), &cordon, &tiles, &nested).expect("save");
    save_map_file(&dir.path().join("well.map"), &cordon, &tiles, &nested[..1]).expect("save");

    let mut ed = editor();
    let batch = ed.reload_instances(dir.path()).expect("reload");
    assert_eq!(batch.failures.len(), 1);
    assert!(batch.failures[0].0.ends_with("hut.map"));
    assert!(matches!(batch.failures[0].1, MapError::InvalidReference(ref id) if id == "p99"));

    // both slots survive so the well stays at i1
    let cats = ed.catalogs();
    assert_eq!(cats.instances.len(), 2);
    assert!(cats.instances[0].placements.is_empty());
    assert!(cats.instances[0].tiles.is_some());
    assert_eq!(cats.instances[1].name, "well");

    ed.place(CatalogRef::instance(0), ivec2(5, 5));
    ed.place(CatalogRef::instance(1), ivec2(20, 5));
    let scene = ed.resolve_scene().expect("resolve");
    let placed: Vec<_> = scene.draw_order().map(|o| (o.reference, o.position)).collect();
    assert_eq!(placed, vec![(CatalogRef::prop(0), ivec2(20, 5))]);
    let grid = ed.map().collision_grid(ed.catalogs()).expect("collision");
    assert_eq!(grid.get(ivec2(6, 6)), TileColor::new(9, 9, 9));
}

#[test]
fn loaded_level_with_instance_cycle_reports_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    let instances = dir.path().join("instances");
    fs::create_dir(&instances).expect("mkdir");
    let cordon = BoundedRectangle::new(0, 0, 4, 4, extent());
    let blank = TileGrid::with_extent(extent());
    // the loop instance places itself
    let looped = [Placement::new(CatalogRef::instance(0), ivec2(1, 1))];
    save_map_file(&instances.join("loop.map"), &cordon, &blank, &looped).expect("save");

    let level = dir.path().join("level.map");
    let top = [Placement::new(CatalogRef::instance(0), ivec2(8, 8))];
    save_map_file(&level, &BoundedRectangle::new(0, 0, 32, 32, extent()), &blank, &top)
        .expect("save level");

    let mut ed = editor();
    let batch = ed.reload_instances(&instances).expect("reload");
    assert!(batch.failures.is_empty());
    ed.load(&level).expect("load");

    assert!(matches!(
        ed.resolve_scene(),
        Err(SceneError::Cycle { reference }) if reference == CatalogRef::instance(0)
    ));
    assert!(matches!(
        ed.map().collision_grid(ed.catalogs()),
        Err(SceneError::Cycle { .. })
    ));
}

#[test]
fn decode_rejects_crop_origin_past_the_grid() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("far.map");
    let bytes: Vec<u8> = [i32::MAX, 0, 1, 1, 0, 0].iter().flat_map(|v| v.to_le_bytes()).collect();
    fs::write(&path, bytes).expect("write");

    let mut ed = editor();
    ed.place(CatalogRef::prop(0), ivec2(1, 1));
    assert!(matches!(ed.load(&path), Err(MapError::InvalidCrop { left: i32::MAX, .. })));
    assert_eq!(ed.map().placements().len(), 1);
}
