use macroquad::color::Color;
use macroquad::math::{ivec2, IVec2};

use crate::bounds::BoundedRectangle;

/// Default maximum grid extent shared by a whole map.
pub const DEFAULT_GRID_SIZE: i32 = 1024;

/// Collision color of a single grid cell. Black means "no collision data".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl TileColor {
    /// The empty-cell sentinel.
    pub const BLACK: TileColor = TileColor { r: 0, g: 0, b: 0 };

    /// Creates a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `true` for the sentinel.
    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::BLACK
    }

    /// Packs as `0xAARRGGBB` with an opaque alpha byte.
    #[inline]
    pub fn pack(self) -> u32 {
        0xFF00_0000 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Inverse of [`TileColor::pack`]; the alpha byte is ignored.
    #[inline]
    pub fn unpack(packed: u32) -> Self {
        Self {
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        }
    }
}

impl From<TileColor> for Color {
    fn from(c: TileColor) -> Self {
        Color::from_rgba(c.r, c.g, c.b, 255)
    }
}

/// Size of the bounded grid a map lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridExtent {
    /// Number of columns.
    pub width: i32,
    /// Number of rows.
    pub height: i32,
}

impl GridExtent {
    /// Creates an extent; both sides are raised to at least one cell.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// `true` if `p` addresses a cell inside the extent.
    #[inline]
    pub fn contains(&self, p: IVec2) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }
}

impl Default for GridExtent {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE, DEFAULT_GRID_SIZE)
    }
}

/// Dense 2D array of collision colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    width: i32,
    height: i32,
    cells: Vec<TileColor>,
}

impl TileGrid {
    /// An all-black grid of the given size.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![TileColor::BLACK; (width as usize) * (height as usize)],
        }
    }

    /// An all-black grid covering `extent`.
    pub fn with_extent(extent: GridExtent) -> Self {
        Self::new(extent.width, extent.height)
    }

    /// Columns.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Rows.
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    fn index(&self, p: IVec2) -> Option<usize> {
        if p.x < 0 || p.y < 0 || p.x >= self.width || p.y >= self.height {
            return None;
        }
        Some(p.y as usize * self.width as usize + p.x as usize)
    }

    /// Color at `p`; out-of-range cells read as black.
    pub fn get(&self, p: IVec2) -> TileColor {
        self.index(p).map_or(TileColor::BLACK, |i| self.cells[i])
    }

    /// Writes `color` at `p`. Returns `false` if `p` is outside the grid or nothing changed.
    pub fn set(&mut self, p: IVec2, color: TileColor) -> bool {
        match self.index(p) {
            Some(i) if self.cells[i] != color => {
                self.cells[i] = color;
                true
            }
            _ => false,
        }
    }

    /// `true` if every cell is the black sentinel.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }

    /// Non-black cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (IVec2, TileColor)> + '_ {
        let w = self.width.max(1) as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_empty())
            .map(move |(i, c)| (ivec2((i % w) as i32, (i / w) as i32), *c))
    }

    /// 4-connected flood fill starting at `start`. Returns the number of cells changed.
    pub fn flood_fill(&mut self, start: IVec2, color: TileColor) -> usize {
        let Some(first) = self.index(start) else {
            return 0;
        };
        let target = self.cells[first];
        if target == color {
            return 0;
        }

        let mut changed = 0;
        let mut stack = vec![start];
        while let Some(p) = stack.pop() {
            let Some(i) = self.index(p) else { continue };
            if self.cells[i] != target {
                continue;
            }
            self.cells[i] = color;
            changed += 1;
            stack.push(ivec2(p.x + 1, p.y));
            stack.push(ivec2(p.x - 1, p.y));
            stack.push(ivec2(p.x, p.y + 1));
            stack.push(ivec2(p.x, p.y - 1));
        }
        changed
    }

    /// Resets every cell inside `region` to black. Returns the number of cells changed.
    pub fn clear_region(&mut self, region: &BoundedRectangle) -> usize {
        let mut changed = 0;
        for x in region.left()..region.right() {
            for y in region.top()..region.bottom() {
                if self.set(ivec2(x, y), TileColor::BLACK) {
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Copies non-black cells of `other` onto `self` at `offset`, clipping to this grid.
    pub fn overlay(&mut self, other: &TileGrid, offset: IVec2) {
        for (p, c) in other.occupied() {
            self.set(p + offset, c);
        }
    }
}
