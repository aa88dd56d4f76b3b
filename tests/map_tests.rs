// tests/map_tests.rs

use macroquad::math::{ivec2, IVec2};
use tilegrid_editor::{
    decode, encode, resolve_for_render, BoundedRectangle, CatalogRef, Catalogs, GraphicRef,
    GridExtent, InstanceDef, Placement, Sprite, TileColor, TileGrid,
};

fn extent() -> GridExtent {
    GridExtent::new(256, 256)
}

/// Deterministic pseudo-random colors for the round-trip grids.
fn noise_grid(seed: u32) -> TileGrid {
    let mut grid = TileGrid::with_extent(extent());
    let mut s = seed;
    for x in 0..extent().width {
        for y in 0..extent().height {
            s = s.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let c = TileColor::unpack(s >> 4);
            grid.set(ivec2(x, y), c);
        }
    }
    grid
}

#[test]
fn round_trip_random_colors_and_every_kind() {
    let tiles = noise_grid(7);
    let cordon = BoundedRectangle::new(13, 40, 57, 31, extent());
    let placements = vec![
        Placement::new(CatalogRef::instance(3), ivec2(20, 41)),
        Placement::new(CatalogRef::entity(12), ivec2(0, 0)),
        Placement::new(CatalogRef::prop(47), ivec2(255, 1)),
        Placement::new(CatalogRef::prop(47), ivec2(14, 50)),
    ];

    let decoded = decode(&encode(&cordon, &tiles, &placements), extent()).expect("decode");
    assert_eq!(
        (decoded.crop.left, decoded.crop.top, decoded.crop.width, decoded.crop.height),
        cordon.to_rect()
    );
    for x in cordon.left()..cordon.right() {
        for y in cordon.top()..cordon.bottom() {
            assert_eq!(decoded.tiles.get(ivec2(x, y)), tiles.get(ivec2(x, y)));
        }
    }
    assert_eq!(decoded.tiles.get(ivec2(12, 40)), TileColor::BLACK);
    assert_eq!(decoded.placements.as_slice(), placements.as_slice());
}

#[test]
fn round_trip_all_black_without_placements() {
    let tiles = TileGrid::with_extent(extent());
    let cordon = BoundedRectangle::covering(extent());
    let decoded = decode(&encode(&cordon, &tiles, &[]), extent()).expect("decode");
    assert_eq!(decoded.crop.width, 256);
    assert!(decoded.tiles.is_blank());
    assert!(decoded.placements.is_empty());
}

#[test]
fn flattening_sums_offsets_through_two_levels() {
    let prop = |name: &str| Sprite::new(name, ivec2(1, 1), GraphicRef(name.to_owned()), 1);
    // i0: two props and a nested i1; i1: one prop
    let outer = InstanceDef {
        name: "outer".into(),
        size: ivec2(20, 20),
        tiles: None,
        placements: vec![
            Placement::new(CatalogRef::prop(0), ivec2(0, 0)),
            Placement::new(CatalogRef::prop(1), ivec2(3, 4)),
            Placement::new(CatalogRef::instance(1), ivec2(6, 7)),
        ],
    };
    let inner = InstanceDef {
        name: "inner".into(),
        size: ivec2(5, 5),
        tiles: Some(TileGrid::new(5, 5)),
        placements: vec![Placement::new(CatalogRef::prop(2), ivec2(1, 1))],
    };
    let cats = Catalogs::new(vec![outer, inner], vec![], vec![prop("a"), prop("b"), prop("c")]);

    let top = [Placement::new(CatalogRef::instance(0), IVec2::ZERO)];
    let resolved = resolve_for_render(&cats, &top, ivec2(10, 10)).expect("resolve");
    let got: Vec<_> = resolved.iter().map(|r| (r.reference, r.position)).collect();
    assert_eq!(
        got,
        vec![
            (CatalogRef::prop(0), ivec2(10, 10)),
            (CatalogRef::prop(1), ivec2(13, 14)),
            (CatalogRef::prop(2), ivec2(17, 18)),
        ]
    );
}
