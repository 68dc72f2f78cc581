use crate::error::{QuadtreeError, QuadtreeResult};
use common::shapes::{Rectangle, ShapeEnum};
use smallvec::SmallVec;

/// Null link for arena indices (node heads, list `next`, item owner).
pub(crate) const NIL: u32 = u32::MAX;

pub(crate) type NodeStack = SmallVec<[u32; 64]>;

/// Min/max form of an axis-aligned box. Node cells are kept in this form so that
/// siblings share their split coordinates exactly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RectExtent {
    pub(crate) min_x: f32,
    pub(crate) min_y: f32,
    pub(crate) max_x: f32,
    pub(crate) max_y: f32,
}

impl RectExtent {
    #[inline(always)]
    pub(crate) fn from_rect(rect: &Rectangle) -> Self {
        let half_w = rect.width * 0.5;
        let half_h = rect.height * 0.5;
        Self {
            min_x: rect.x - half_w,
            min_y: rect.y - half_h,
            max_x: rect.x + half_w,
            max_y: rect.y + half_h,
        }
    }

    #[inline(always)]
    pub(crate) fn from_min_max(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// A `width` x `height` box centered on the point.
    #[inline(always)]
    pub(crate) fn around(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_min_max(
            x - width * 0.5,
            y - height * 0.5,
            x + width * 0.5,
            y + height * 0.5,
        )
    }

    pub(crate) fn to_rect(self) -> Rectangle {
        Rectangle::from_min_max(self.min_x, self.min_y, self.max_x, self.max_y)
    }

    #[inline(always)]
    pub(crate) fn center(&self) -> (f32, f32) {
        (
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    #[inline(always)]
    pub(crate) fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[inline(always)]
    pub(crate) fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    #[inline(always)]
    pub(crate) fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    #[inline(always)]
    pub(crate) fn intersects(&self, other: &RectExtent) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    #[inline(always)]
    pub(crate) fn union(&self, other: &RectExtent) -> RectExtent {
        RectExtent {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    #[inline(always)]
    pub(crate) fn include_point(&mut self, x: f32, y: f32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    #[inline(always)]
    pub(crate) fn inflate(&self, dx: f32, dy: f32) -> RectExtent {
        RectExtent {
            min_x: self.min_x - dx,
            min_y: self.min_y - dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }

    /// Child cell for a quadrant index (see `child_index`).
    #[inline(always)]
    pub(crate) fn quadrant(&self, index: usize) -> RectExtent {
        let (cx, cy) = self.center();
        let (min_x, max_x) = if index & 0b10 == 0 {
            (self.min_x, cx)
        } else {
            (cx, self.max_x)
        };
        let (min_y, max_y) = if index & 0b01 == 0 {
            (self.min_y, cy)
        } else {
            (cy, self.max_y)
        };
        RectExtent::from_min_max(min_x, min_y, max_x, max_y)
    }

    /// Quadrant holding the point: 0 = NW, 1 = SW, 2 = NE, 3 = SE.
    /// Points on a split line go to the negative side on both axes.
    #[inline(always)]
    pub(crate) fn child_index(&self, x: f32, y: f32) -> usize {
        let (cx, cy) = self.center();
        ((x > cx) as usize) << 1 | (y > cy) as usize
    }
}

pub(crate) fn union_extent(acc: Option<RectExtent>, extent: RectExtent) -> Option<RectExtent> {
    Some(match acc {
        Some(acc) => acc.union(&extent),
        None => extent,
    })
}

/// Largest item half-extent per axis, with the identity that currently owns it.
/// Queries inflate their broad-phase box by these amounts.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LargestExtent {
    pub(crate) half_w: f32,
    pub(crate) owner_w: Option<u32>,
    pub(crate) half_h: f32,
    pub(crate) owner_h: Option<u32>,
}

impl LargestExtent {
    pub(crate) fn observe(&mut self, value: u32, extent: &RectExtent) {
        let half_w = extent.width() * 0.5;
        let half_h = extent.height() * 0.5;
        if self.owner_w.is_none() || half_w > self.half_w {
            self.half_w = half_w;
            self.owner_w = Some(value);
        }
        if self.owner_h.is_none() || half_h > self.half_h {
            self.half_h = half_h;
            self.owner_h = Some(value);
        }
    }

    pub(crate) fn is_owner(&self, value: u32) -> bool {
        self.owner_w == Some(value) || self.owner_h == Some(value)
    }
}

/// Snapshot of one node, as reported by `QuadTree::nodes` and `QuadTree::membership`.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeInfo {
    pub bounds: Rectangle,
    /// Union of the item bounding boxes below this node as of the last `update`.
    /// `None` when the subtree was empty.
    pub tight_bounds: Option<Rectangle>,
    pub depth: usize,
    /// Items linked directly on this node (always zero for internal nodes).
    pub item_count: usize,
    pub is_leaf: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Membership {
    pub shape: ShapeEnum,
    /// Owning node, or `None` while the item waits outside the bounds for the next `update`.
    pub node: Option<NodeInfo>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageCounts {
    pub nodes: usize,
    pub node_slots: usize,
    pub items: usize,
    pub item_slots: usize,
}

pub(crate) fn validate_rect_dims(width: f32, height: f32) -> QuadtreeResult<()> {
    if !(width.is_finite() && height.is_finite()) || width < 0.0 || height < 0.0 {
        return Err(QuadtreeError::InvalidRectangleDims { width, height });
    }
    Ok(())
}

pub(crate) fn validate_circle_radius(radius: f32) -> QuadtreeResult<()> {
    if !(radius.is_finite() && radius >= 0.0) {
        return Err(QuadtreeError::InvalidCircleRadius { radius });
    }
    Ok(())
}

pub(crate) fn validate_coordinates(x: f32, y: f32) -> QuadtreeResult<()> {
    if !(x.is_finite() && y.is_finite()) {
        return Err(QuadtreeError::InvalidCoordinates { x, y });
    }
    Ok(())
}

pub(crate) fn validate_rotation(angle: f32) -> QuadtreeResult<()> {
    if !angle.is_finite() {
        return Err(QuadtreeError::InvalidRotation { angle });
    }
    Ok(())
}

pub(crate) fn validate_rect(rect: &Rectangle) -> QuadtreeResult<()> {
    validate_coordinates(rect.x, rect.y)?;
    validate_rect_dims(rect.width, rect.height)
}

pub(crate) fn validate_shape(shape: &ShapeEnum) -> QuadtreeResult<()> {
    match shape {
        ShapeEnum::Point(point) => validate_coordinates(point.x, point.y),
        ShapeEnum::Circle(circle) => {
            validate_coordinates(circle.x, circle.y)?;
            validate_circle_radius(circle.radius)
        }
        ShapeEnum::Rectangle(rect) => validate_rect(rect),
        ShapeEnum::RotRect(rot) => {
            validate_coordinates(rot.x, rot.y)?;
            validate_coordinates(rot.origin_x, rot.origin_y)?;
            validate_rect_dims(rot.width, rot.height)?;
            validate_rotation(rot.angle)
        }
    }
}
