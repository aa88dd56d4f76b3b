use std::path::PathBuf;

use macroquad::prelude::*;
use tilegrid_editor::render::draw::{draw_bounds, draw_collision, draw_objects, TextureLookup};
use tilegrid_editor::{CatalogRef, Editor, EditorConfig, Handle, Projection, TileColor};
use tracing_subscriber::EnvFilter;

fn window_conf() -> Conf {
    Conf {
        window_title: "Tile Grid Editor".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

fn to_cell(p: Vec2, proj: Projection) -> IVec2 {
    ((p - proj.offset) / proj.scale).round().as_ivec2()
}

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run().await {
        tracing::error!("{err:#}");
    }
}

async fn run() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => EditorConfig::load(&PathBuf::from(path))?,
        None => EditorConfig {
            grid_width: 96,
            grid_height: 64,
            ..EditorConfig::default()
        },
    };
    let save_path = PathBuf::from("demo_level.map");
    let mut editor = Editor::from_config(config)?;
    let textures = TextureLookup::new();
    let proj = Projection::new(editor.config().cell_size * 0.5, vec2(20.0, 20.0));
    let mut prev_cell = IVec2::ZERO;

    loop {
        clear_background(BLACK);

        let mouse = Vec2::from(mouse_position());
        let cell = to_cell(mouse, proj);
        let floor_cell = ((mouse - proj.offset) / proj.scale).floor().as_ivec2();

        if is_mouse_button_pressed(MouseButton::Left) {
            if editor.begin_drag(mouse, proj) == Handle::None {
                editor.select_object_at(floor_cell);
            }
        } else if is_mouse_button_down(MouseButton::Left) {
            editor.drag_to(cell, prev_cell);
        } else if is_mouse_button_released(MouseButton::Left) {
            editor.end_drag();
        }

        if is_mouse_button_down(MouseButton::Right) {
            editor.map_mut().paint(floor_cell, TileColor::new(200, 40, 40));
        }
        if is_key_pressed(KeyCode::F) {
            editor.map_mut().flood_fill(floor_cell, TileColor::new(40, 160, 40));
        }
        if is_key_pressed(KeyCode::P) && !editor.catalogs().props.is_empty() {
            editor.place(CatalogRef::prop(0), floor_cell);
        }
        if is_key_pressed(KeyCode::I) && !editor.catalogs().instances.is_empty() {
            editor.place(CatalogRef::instance(0), floor_cell);
        }
        if is_key_pressed(KeyCode::Delete) {
            editor.delete_selected();
        }
        if is_key_pressed(KeyCode::PageUp) {
            editor.bring_selected_to_front();
        }
        if is_key_pressed(KeyCode::PageDown) {
            editor.send_selected_to_back();
        }
        if is_key_pressed(KeyCode::S) {
            if let Err(err) = editor.save(&save_path) {
                tracing::error!("save failed: {err}");
            }
        }
        if is_key_pressed(KeyCode::L) {
            if let Err(err) = editor.load(&save_path) {
                tracing::error!("load failed: {err}");
            }
        }
        prev_cell = cell;

        match editor.map().collision_grid(editor.catalogs()) {
            Ok(grid) => draw_collision(&grid, proj),
            Err(err) => tracing::error!("{err}"),
        }
        if let Ok(scene) = editor.resolve_scene() {
            draw_objects(editor.catalogs(), &scene, &textures, proj);
        }
        let radius = editor.config().handle_radius;
        draw_bounds(editor.map().cordon(), proj, radius, YELLOW, editor.active_handle());
        if let Some(sel) = editor.selection() {
            draw_bounds(sel, proj, radius, SKYBLUE, editor.active_handle());
        }

        let status = if editor.is_dirty() { "modified" } else { "saved" };
        draw_text(
            &format!("{status}  cell {} {}", cell.x, cell.y),
            20.0,
            screen_height() - 20.0,
            24.0,
            WHITE,
        );

        next_frame().await;
    }
}
