use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::grid::{GridExtent, DEFAULT_GRID_SIZE};

/// Editor settings, read from a JSON file. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Columns in the grid.
    pub grid_width: i32,
    /// Rows in the grid.
    pub grid_height: i32,
    /// Screen pixels per cell at zoom 1, used by the host's projection.
    pub cell_size: f32,
    /// Pick radius of cordon/selection handles, in screen pixels.
    pub handle_radius: f32,
    /// Directory scanned for instance map files.
    pub instance_dir: Option<PathBuf>,
    /// JSON entity catalog.
    pub entity_catalog: Option<PathBuf>,
    /// JSON prop catalog.
    pub prop_catalog: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_width: DEFAULT_GRID_SIZE,
            grid_height: DEFAULT_GRID_SIZE,
            cell_size: 16.0,
            handle_radius: 6.0,
            instance_dir: None,
            entity_catalog: None,
            prop_catalog: None,
        }
    }
}

impl EditorConfig {
    /// Parses a config from JSON text.
    pub fn from_json(txt: &str) -> anyhow::Result<Self> {
        let cfg: EditorConfig = serde_json::from_str(txt).context("Parsing editor config")?;
        if cfg.grid_width < 1 || cfg.grid_height < 1 {
            anyhow::bail!(
                "Grid extent must be positive, got {}x{}",
                cfg.grid_width,
                cfg.grid_height
            );
        }
        Ok(cfg)
    }

    /// Reads a config file. Relative catalog and instance paths are resolved
    /// against the file's directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let txt = std::fs::read_to_string(path)
            .with_context(|| format!("Reading editor config {}", path.display()))?;
        let mut cfg =
            Self::from_json(&txt).with_context(|| format!("Loading editor config {}", path.display()))?;

        let base = path
            .parent()
            .map(|d| d.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./"));
        for p in [
            &mut cfg.instance_dir,
            &mut cfg.entity_catalog,
            &mut cfg.prop_catalog,
        ]
        .into_iter()
        .flatten()
        {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
        Ok(cfg)
    }

    /// Grid extent shared by the map and every rectangle on it.
    pub fn extent(&self) -> GridExtent {
        GridExtent::new(self.grid_width, self.grid_height)
    }
}
