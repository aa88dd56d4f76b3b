//! Drawing of bounds, collision cells and resolved objects with macroquad.

use std::collections::HashMap;

use macroquad::prelude::*;

use crate::bounds::{BoundedRectangle, Handle, Projection};
use crate::catalog::{CatalogEntry, Catalogs, GraphicRef, ObjectKind};
use crate::grid::TileGrid;
use crate::scene::LayerBuckets;

const HANDLE_COLOR: Color = Color::new(1.0, 1.0, 1.0, 0.9);
const ACTIVE_HANDLE_COLOR: Color = Color::new(1.0, 0.8, 0.1, 1.0);

/// Textures for sprite graphics, keyed by the catalog's graphic handle.
pub type TextureLookup = HashMap<GraphicRef, Texture2D>;

fn handle_point(rect: &BoundedRectangle, handle: Handle) -> Option<(f32, f32)> {
    let (l, t, r, b) = (
        rect.left() as f32,
        rect.top() as f32,
        rect.right() as f32,
        rect.bottom() as f32,
    );
    let (mx, my) = ((l + r) * 0.5, (t + b) * 0.5);
    match handle {
        Handle::TopLeft => Some((l, t)),
        Handle::TopRight => Some((r, t)),
        Handle::BottomLeft => Some((l, b)),
        Handle::BottomRight => Some((r, b)),
        Handle::Left => Some((l, my)),
        Handle::Right => Some((r, my)),
        Handle::Top => Some((mx, t)),
        Handle::Bottom => Some((mx, b)),
        Handle::None | Handle::Body => None,
    }
}

/// Outlines `rect` and marks its corner and edge-midpoint handles.
pub fn draw_bounds(
    rect: &BoundedRectangle,
    projection: Projection,
    handle_radius: f32,
    color: Color,
    active: Option<Handle>,
) {
    let min = projection.to_screen(rect.left(), rect.top());
    let max = projection.to_screen(rect.right(), rect.bottom());
    draw_rectangle_lines(min.x, min.y, max.x - min.x, max.y - min.y, 2.0, color);

    for handle in Handle::CORNERS.into_iter().chain(Handle::EDGES) {
        let Some((gx, gy)) = handle_point(rect, handle) else {
            continue;
        };
        let p = vec2(gx, gy) * projection.scale + projection.offset;
        let c = if active == Some(handle) {
            ACTIVE_HANDLE_COLOR
        } else {
            HANDLE_COLOR
        };
        draw_circle(p.x, p.y, handle_radius * 0.5, c);
    }
}

/// Fills every non-black cell of `grid`.
pub fn draw_collision(grid: &TileGrid, projection: Projection) {
    let s = projection.scale;
    for (cell, color) in grid.occupied() {
        let p = projection.to_screen(cell.x, cell.y);
        draw_rectangle(p.x, p.y, s, s, color.into());
    }
}

/// Draws resolved objects layer by layer. Sprites without a texture get a
/// tinted outline of their footprint.
pub fn draw_objects(
    catalogs: &Catalogs,
    scene: &LayerBuckets,
    textures: &TextureLookup,
    projection: Projection,
) {
    for obj in scene.draw_order() {
        let entry = catalogs.entry(obj.reference);
        let size = entry.size().as_vec2() * projection.scale;
        let p = projection.to_screen(obj.position.x, obj.position.y);

        let sprite = match entry {
            CatalogEntry::Entity(s) | CatalogEntry::Prop(s) => s,
            CatalogEntry::Instance(_) => continue,
        };

        match textures.get(&sprite.graphic) {
            Some(tex) => draw_texture_ex(
                tex,
                p.x,
                p.y,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(size),
                    ..Default::default()
                },
            ),
            None => {
                let tint = match obj.reference.kind {
                    ObjectKind::Entity => SKYBLUE,
                    _ => ORANGE,
                };
                draw_rectangle(p.x, p.y, size.x, size.y, Color { a: 0.35, ..tint });
                draw_rectangle_lines(p.x, p.y, size.x, size.y, 1.0, tint);
            }
        }
    }
}
