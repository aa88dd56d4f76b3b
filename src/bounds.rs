//! Axis-aligned rectangles on the bounded grid, with corner/edge handles.
//!
//! A [`BoundedRectangle`] backs both the map cordon (the region that gets saved)
//! and ad-hoc selections. Every mutation is repaired back into the grid, so the
//! rectangle can never be inverted, empty or outside the extent.

use macroquad::math::{vec2, IVec2, Vec2};

use crate::grid::GridExtent;

/// Part of a rectangle a pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Handle {
    /// Not over the rectangle.
    #[default]
    None,
    /// Inside the rectangle, away from any handle.
    Body,
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    BottomRight,
    /// Left edge.
    Left,
    /// Right edge.
    Right,
    /// Top edge.
    Top,
    /// Bottom edge.
    Bottom,
}

impl Handle {
    /// Corner handles in hit-test precedence order.
    pub const CORNERS: [Handle; 4] = [
        Handle::TopLeft,
        Handle::BottomRight,
        Handle::TopRight,
        Handle::BottomLeft,
    ];

    /// Edge handles in hit-test precedence order.
    pub const EDGES: [Handle; 4] = [Handle::Left, Handle::Right, Handle::Top, Handle::Bottom];
}

/// Grid-to-screen mapping supplied by the caller: `screen = grid * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Screen units per grid cell.
    pub scale: f32,
    /// Screen position of grid origin.
    pub offset: Vec2,
}

impl Projection {
    /// Creates a projection.
    pub fn new(scale: f32, offset: Vec2) -> Self {
        Self { scale, offset }
    }

    /// Projects a grid point to screen space.
    #[inline]
    pub fn to_screen(&self, x: i32, y: i32) -> Vec2 {
        vec2(x as f32, y as f32) * self.scale + self.offset
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(1.0, Vec2::ZERO)
    }
}

/// An axis-aligned rectangle with `0 <= left < right <= max_width` and
/// `0 <= top < bottom <= max_height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedRectangle {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
    extent: GridExtent,
}

/// Which edges a move touched; decides which side gets pinned on inversion.
#[derive(Clone, Copy, Default)]
struct Moved {
    left: bool,
    right: bool,
    top: bool,
    bottom: bool,
}

impl BoundedRectangle {
    /// Creates a rectangle at `(left, top)` of the given size inside `extent`.
    /// Out-of-range input is repaired, never rejected.
    pub fn new(left: i32, top: i32, width: i32, height: i32, extent: GridExtent) -> Self {
        let mut rect = Self {
            left,
            top,
            right: left.saturating_add(width),
            bottom: top.saturating_add(height),
            extent,
        };
        rect.repair(Moved {
            right: true,
            bottom: true,
            ..Moved::default()
        });
        rect
    }

    /// A rectangle covering the whole extent.
    pub fn covering(extent: GridExtent) -> Self {
        Self::new(0, 0, extent.width, extent.height, extent)
    }

    /// Left edge column, inclusive.
    pub fn left(&self) -> i32 {
        self.left
    }

    /// Top edge row, inclusive.
    pub fn top(&self) -> i32 {
        self.top
    }

    /// Right edge column, exclusive.
    pub fn right(&self) -> i32 {
        self.right
    }

    /// Bottom edge row, exclusive.
    pub fn bottom(&self) -> i32 {
        self.bottom
    }

    /// Width in cells, at least 1.
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Height in cells, at least 1.
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// The containing grid extent.
    pub fn extent(&self) -> GridExtent {
        self.extent
    }

    /// `(x, y, width, height)`.
    pub fn to_rect(&self) -> (i32, i32, i32, i32) {
        (self.left, self.top, self.width(), self.height())
    }

    /// `true` if grid cell `p` lies inside.
    pub fn contains(&self, p: IVec2) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }

    /// `true` if the box at `position` of `size` lies fully inside.
    pub fn contains_box(&self, position: IVec2, size: IVec2) -> bool {
        position.x >= self.left
            && position.y >= self.top
            && position.x + size.x <= self.right
            && position.y + size.y <= self.bottom
    }

    fn corner(&self, handle: Handle) -> Option<(i32, i32)> {
        match handle {
            Handle::TopLeft => Some((self.left, self.top)),
            Handle::TopRight => Some((self.right, self.top)),
            Handle::BottomLeft => Some((self.left, self.bottom)),
            Handle::BottomRight => Some((self.right, self.bottom)),
            _ => None,
        }
    }

    fn edge(&self, handle: Handle) -> Option<((i32, i32), (i32, i32))> {
        match handle {
            Handle::Left => Some(((self.left, self.top), (self.left, self.bottom))),
            Handle::Right => Some(((self.right, self.top), (self.right, self.bottom))),
            Handle::Top => Some(((self.left, self.top), (self.right, self.top))),
            Handle::Bottom => Some(((self.left, self.bottom), (self.right, self.bottom))),
            _ => None,
        }
    }

    /// Finds the handle under screen-space `point`.
    ///
    /// Corners win over edges and edges over the body; among corners the order is
    /// top-left, bottom-right, top-right, bottom-left, and among edges left, right,
    /// top, bottom.
    pub fn hit_test_handle(&self, point: Vec2, projection: Projection, radius: f32) -> Handle {
        for handle in Handle::CORNERS {
            if let Some((x, y)) = self.corner(handle) {
                if projection.to_screen(x, y).distance(point) <= radius {
                    return handle;
                }
            }
        }

        for handle in Handle::EDGES {
            if let Some(((ax, ay), (bx, by))) = self.edge(handle) {
                let a = projection.to_screen(ax, ay);
                let b = projection.to_screen(bx, by);
                if distance_to_segment(point, a, b) <= radius {
                    return handle;
                }
            }
        }

        let min = projection.to_screen(self.left, self.top);
        let max = projection.to_screen(self.right, self.bottom);
        let (lo, hi) = (min.min(max), min.max(max));
        if point.x > lo.x && point.x < hi.x && point.y > lo.y && point.y < hi.y {
            return Handle::Body;
        }

        Handle::None
    }

    /// Applies one drag step of `handle` from `previous` to `current` (grid space).
    pub fn adjust_by_handle(&mut self, current: IVec2, previous: IVec2, handle: Handle) {
        let mut moved = Moved::default();
        match handle {
            Handle::None => return,
            Handle::Body => {
                self.translate(current - previous);
                return;
            }
            Handle::TopLeft => {
                self.left = current.x;
                self.top = current.y;
                moved.left = true;
                moved.top = true;
            }
            Handle::TopRight => {
                self.right = current.x;
                self.top = current.y;
                moved.right = true;
                moved.top = true;
            }
            Handle::BottomLeft => {
                self.left = current.x;
                self.bottom = current.y;
                moved.left = true;
                moved.bottom = true;
            }
            Handle::BottomRight => {
                self.right = current.x;
                self.bottom = current.y;
                moved.right = true;
                moved.bottom = true;
            }
            Handle::Left => {
                self.left = current.x;
                moved.left = true;
            }
            Handle::Right => {
                self.right = current.x;
                moved.right = true;
            }
            Handle::Top => {
                self.top = current.y;
                moved.top = true;
            }
            Handle::Bottom => {
                self.bottom = current.y;
                moved.bottom = true;
            }
        }
        self.repair(moved);
    }

    /// Moves the whole rectangle by `delta`, one cell at a time per axis, stopping
    /// at the first step that would leave the grid.
    pub fn translate(&mut self, delta: IVec2) {
        let sx = delta.x.signum();
        for _ in 0..delta.x.unsigned_abs() {
            if self.left + sx < 0 || self.right + sx > self.extent.width {
                break;
            }
            self.left += sx;
            self.right += sx;
        }

        let sy = delta.y.signum();
        for _ in 0..delta.y.unsigned_abs() {
            if self.top + sy < 0 || self.bottom + sy > self.extent.height {
                break;
            }
            self.top += sy;
            self.bottom += sy;
        }
    }

    fn repair(&mut self, moved: Moved) {
        let max_w = self.extent.width.max(1);
        let max_h = self.extent.height.max(1);

        self.left = self.left.clamp(0, max_w - 1);
        self.right = self.right.clamp(1, max_w);
        self.top = self.top.clamp(0, max_h - 1);
        self.bottom = self.bottom.clamp(1, max_h);

        if self.left >= self.right {
            if moved.right && !moved.left {
                self.right = self.left + 1;
            } else {
                self.left = self.right - 1;
            }
        }
        if self.top >= self.bottom {
            if moved.bottom && !moved.top {
                self.bottom = self.top + 1;
            } else {
                self.top = self.bottom - 1;
            }
        }
    }
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
