//! Binary map format.
//!
//! All integers are little-endian `i32`; strings are an `i32` byte length followed
//! by UTF-8 bytes. There is no version tag.
//!
//! ```text
//! crop_left, crop_top, crop_width, crop_height
//! crop_width * crop_height packed colors, x outer, y inner
//! placement_count
//! placement_count * (id string, x, y)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use macroquad::math::{ivec2, IVec2};

use crate::bounds::BoundedRectangle;
use crate::catalog::{CatalogRef, InstanceDef};
use crate::error::MapError;
use crate::grid::{GridExtent, TileColor, TileGrid};
use crate::scene::{Placement, PlacementList};

/// Extension of map files picked up by [`load_instance_dir`].
pub const MAP_FILE_EXTENSION: &str = "map";

/// The saved region of the full grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBounds {
    /// Column of the crop's left edge in the full grid.
    pub left: i32,
    /// Row of the crop's top edge in the full grid.
    pub top: i32,
    /// Columns in the crop.
    pub width: i32,
    /// Rows in the crop.
    pub height: i32,
}

impl CropBounds {
    /// Top-left corner.
    pub fn origin(&self) -> IVec2 {
        ivec2(self.left, self.top)
    }

    /// Size in cells.
    pub fn size(&self) -> IVec2 {
        ivec2(self.width, self.height)
    }

    /// The crop as a rectangle inside `extent`.
    pub fn to_bounds(&self, extent: GridExtent) -> BoundedRectangle {
        BoundedRectangle::new(self.left, self.top, self.width, self.height, extent)
    }

    // `left`/`top` are non-negative and the sides positive once decoded, so
    // subtracting from the extent cannot overflow where adding could.
    fn fits(&self, extent: GridExtent) -> bool {
        self.left <= extent.width - self.width && self.top <= extent.height - self.height
    }
}

impl From<&BoundedRectangle> for CropBounds {
    fn from(r: &BoundedRectangle) -> Self {
        let (left, top, width, height) = r.to_rect();
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// File contents with tiles kept at crop size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapFile {
    /// Stored crop header.
    pub crop: CropBounds,
    /// Tiles indexed from the crop origin.
    pub tiles: TileGrid,
    /// Placements in file order, positions as stored.
    pub placements: Vec<Placement>,
}

/// File contents overlaid onto a full-extent grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMap {
    /// Stored crop header.
    pub crop: CropBounds,
    /// Full-extent grid with the crop written at its stored offset.
    pub tiles: TileGrid,
    /// Placements in file order.
    pub placements: PlacementList,
}

/// Serializes the part of `tiles` under `cordon` plus every placement.
pub fn encode(cordon: &BoundedRectangle, tiles: &TileGrid, placements: &[Placement]) -> Vec<u8> {
    let crop = CropBounds::from(cordon);
    let cells = crop.width as usize * crop.height as usize;
    let mut out = Vec::with_capacity(20 + cells * 4 + placements.len() * 16);

    for v in [crop.left, crop.top, crop.width, crop.height] {
        write_i32(&mut out, v);
    }
    for x in 0..crop.width {
        for y in 0..crop.height {
            let color = tiles.get(ivec2(crop.left + x, crop.top + y));
            write_i32(&mut out, color.pack() as i32);
        }
    }

    write_i32(&mut out, placements.len() as i32);
    for p in placements {
        write_string(&mut out, &p.reference.to_string());
        write_i32(&mut out, p.position.x);
        write_i32(&mut out, p.position.y);
    }
    out
}

/// Parses a map file, keeping tiles at crop size.
pub fn decode_crop(bytes: &[u8]) -> Result<MapFile, MapError> {
    let mut r = ByteReader::new(bytes);

    let crop = CropBounds {
        left: r.read_i32()?,
        top: r.read_i32()?,
        width: r.read_i32()?,
        height: r.read_i32()?,
    };
    if crop.left < 0 || crop.top < 0 || crop.width < 1 || crop.height < 1 {
        return Err(invalid_crop(crop));
    }
    let tile_bytes = (crop.width as usize)
        .checked_mul(crop.height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| invalid_crop(crop))?;
    if tile_bytes > r.remaining() {
        return Err(MapError::Truncated {
            needed: tile_bytes,
            offset: r.offset,
        });
    }

    let mut tiles = TileGrid::new(crop.width, crop.height);
    for x in 0..crop.width {
        for y in 0..crop.height {
            let packed = r.read_i32()? as u32;
            tiles.set(ivec2(x, y), TileColor::unpack(packed));
        }
    }

    let count = r.read_i32()?;
    if count < 0 {
        return Err(MapError::InvalidCount(count));
    }
    let mut placements = Vec::with_capacity((count as usize).min(r.remaining() / 12));
    for _ in 0..count {
        let id = r.read_string()?;
        let reference: CatalogRef = id.parse()?;
        let x = r.read_i32()?;
        let y = r.read_i32()?;
        placements.push(Placement::new(reference, ivec2(x, y)));
    }

    if r.remaining() > 0 {
        return Err(MapError::TrailingData {
            count: r.remaining(),
        });
    }

    Ok(MapFile {
        crop,
        tiles,
        placements,
    })
}

/// Parses a map file onto a fresh grid covering `extent`.
pub fn decode(bytes: &[u8], extent: GridExtent) -> Result<DecodedMap, MapError> {
    let file = decode_crop(bytes)?;
    if !file.crop.fits(extent) {
        return Err(invalid_crop(file.crop));
    }
    let mut tiles = TileGrid::with_extent(extent);
    tiles.overlay(&file.tiles, file.crop.origin());
    Ok(DecodedMap {
        crop: file.crop,
        tiles,
        placements: file.placements.into(),
    })
}

/// Writes a map file, discarding whatever was at `path` first.
pub fn save_map_file(
    path: &Path,
    cordon: &BoundedRectangle,
    tiles: &TileGrid,
    placements: &[Placement],
) -> Result<(), MapError> {
    let bytes = encode(cordon, tiles, placements);
    let io_err = |source| MapError::Io {
        path: path.to_path_buf(),
        source,
    };

    if path.exists() {
        fs::remove_file(path).map_err(io_err)?;
    }
    fs::write(path, &bytes).map_err(io_err)?;

    tracing::debug!(
        "saved {} bytes ({} placements) to {}",
        bytes.len(),
        placements.len(),
        path.display()
    );
    Ok(())
}

/// Reads and decodes a single map file.
pub fn load_map_file(path: &Path, extent: GridExtent) -> Result<DecodedMap, MapError> {
    let bytes = read_file(path)?;
    let map = decode(&bytes, extent)?;
    tracing::debug!(
        "loaded {} ({} placements, crop {:?})",
        path.display(),
        map.placements.len(),
        map.crop
    );
    Ok(map)
}

fn read_file(path: &Path) -> Result<Vec<u8>, MapError> {
    fs::read(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Turns a decoded file into an instance descriptor whose origin is the crop origin.
pub fn instance_from_file(name: impl Into<String>, file: MapFile) -> InstanceDef {
    let origin = file.crop.origin();
    InstanceDef {
        name: name.into(),
        size: file.crop.size(),
        tiles: (!file.tiles.is_blank()).then_some(file.tiles),
        placements: file
            .placements
            .into_iter()
            .map(|p| Placement::new(p.reference, p.position.wrapping_sub(origin)))
            .collect(),
    }
}

/// Result of [`load_instance_dir`]: what loaded and what was skipped.
#[derive(Debug, Default)]
pub struct InstanceBatch {
    /// Instances in file-name order.
    pub instances: Vec<InstanceDef>,
    /// Files that failed, with the reason.
    pub failures: Vec<(PathBuf, MapError)>,
}

/// Decodes every `*.map` file in `dir` into an instance.
///
/// A file that fails to read or parse is recorded in
/// [`InstanceBatch::failures`] and the rest still load. Only failing to list
/// `dir` itself is an error.
pub fn load_instance_dir(dir: &Path) -> Result<InstanceBatch, MapError> {
    let dir_err = |source| MapError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(dir_err)? {
        let path = entry.map_err(dir_err)?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(MAP_FILE_EXTENSION)
        {
            paths.push(path);
        }
    }
    paths.sort();

    let mut batch = InstanceBatch::default();
    for path in paths {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_owned();
        match read_file(&path).and_then(|bytes| decode_crop(&bytes)) {
            Ok(file) => batch.instances.push(instance_from_file(name, file)),
            Err(err) => {
                tracing::warn!("skipping instance {}: {err}", path.display());
                batch.failures.push((path, err));
            }
        }
    }

    tracing::info!(
        "loaded {} instances from {} ({} skipped)",
        batch.instances.len(),
        dir.display(),
        batch.failures.len()
    );
    Ok(batch)
}

fn invalid_crop(crop: CropBounds) -> MapError {
    MapError::InvalidCrop {
        left: crop.left,
        top: crop.top,
        width: crop.width,
        height: crop.height,
    }
}

fn write_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    write_i32(out, s.len() as i32);
    out.extend_from_slice(s.as_bytes());
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], MapError> {
        if n > self.remaining() {
            return Err(MapError::Truncated {
                needed: n,
                offset: self.offset,
            });
        }
        let slice = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    fn read_i32(&mut self) -> Result<i32, MapError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_string(&mut self) -> Result<String, MapError> {
        let start = self.offset;
        let len = self.read_i32()?;
        if len < 0 {
            return Err(MapError::InvalidString { offset: start });
        }
        let raw = self.take(len as usize)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| MapError::InvalidString { offset: start })
    }
}
