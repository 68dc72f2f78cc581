use rand::Rng;
use std::fmt::Debug;

pub trait Shape: Debug {
    fn bounding_box(&self) -> Rectangle;

    /// Representative point of the shape: the center of its axis-aligned bounding box.
    fn center(&self) -> (f32, f32) {
        let bb = self.bounding_box();
        (bb.x, bb.y)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(&self, x: f32, y: f32) -> f32 {
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy
    }
}

impl Shape for Point {
    fn bounding_box(&self) -> Rectangle {
        Rectangle::new(self.x, self.y, 0.0, 0.0)
    }
}

/// Circle by center and radius. The bounding box is derived from the fields on
/// every call, so the fields can be written directly.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Circle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl Circle {
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self { x, y, radius }
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        let dx = x - self.x;
        let dy = y - self.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

impl Shape for Circle {
    fn bounding_box(&self) -> Rectangle {
        Rectangle::new(self.x, self.y, self.radius * 2.0, self.radius * 2.0)
    }

    fn center(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

/// Axis-aligned rectangle in center form: `x`/`y` is the center.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rectangle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_min_max(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            x: (min_x + max_x) * 0.5,
            y: (min_y + max_y) * 0.5,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn half_width(&self) -> f32 {
        self.width * 0.5
    }

    pub fn half_height(&self) -> f32 {
        self.height * 0.5
    }

    pub fn left(&self) -> f32 {
        self.x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn top(&self) -> f32 {
        self.y - self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn top_left(&self) -> (f32, f32) {
        (self.left(), self.top())
    }

    pub fn top_right(&self) -> (f32, f32) {
        (self.right(), self.top())
    }

    pub fn bottom_left(&self) -> (f32, f32) {
        (self.left(), self.bottom())
    }

    pub fn bottom_right(&self) -> (f32, f32) {
        (self.right(), self.bottom())
    }

    pub fn corners(&self) -> [(f32, f32); 4] {
        [
            self.top_left(),
            self.top_right(),
            self.bottom_right(),
            self.bottom_left(),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 && self.height <= 0.0
    }

    /// Squared distance from the point to the closest point of the rectangle (0 inside).
    pub fn distance_sq_to_point(&self, x: f32, y: f32) -> f32 {
        let dx = (x - self.x).abs() - self.width / 2.0;
        let dy = (y - self.y).abs() - self.height / 2.0;
        f32::max(dx, 0.0).powi(2) + f32::max(dy, 0.0).powi(2)
    }

    pub fn intersects_circle(&self, x: f32, y: f32, radius: f32) -> bool {
        self.distance_sq_to_point(x, y) <= radius * radius
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.left() && x <= self.right() && y >= self.top() && y <= self.bottom()
    }

    pub fn contains_rectangle(&self, other: &Rectangle) -> bool {
        self.left() <= other.left()
            && self.right() >= other.right()
            && self.top() <= other.top()
            && self.bottom() >= other.bottom()
    }

    pub fn intersects_rectangle(&self, other: &Rectangle) -> bool {
        self.left() <= other.right()
            && self.right() >= other.left()
            && self.top() <= other.bottom()
            && self.bottom() >= other.top()
    }

    pub fn expand_to_include(&mut self, other: &Rectangle) {
        let left = f32::min(self.left(), other.left());
        let right = f32::max(self.right(), other.right());
        let top = f32::min(self.top(), other.top());
        let bottom = f32::max(self.bottom(), other.bottom());
        self.x = (left + right) / 2.0;
        self.y = (top + bottom) / 2.0;
        self.width = right - left;
        self.height = bottom - top;
    }

    pub fn union(&self, other: &Rectangle) -> Rectangle {
        let mut out = *self;
        out.expand_to_include(other);
        out
    }

    pub fn get_random_point_inside<R: Rng>(&self, rng: &mut R) -> (f32, f32) {
        (
            self._safe_randf32(rng, self.left(), self.right()),
            self._safe_randf32(rng, self.top(), self.bottom()),
        )
    }

    pub fn get_random_circle_coords_inside<R: Rng>(&self, radius: f32, rng: &mut R) -> (f32, f32) {
        // Increase radius by 1 in calculations to add a minimal margin.
        let radius = radius + 1.0;
        (
            self._safe_randf32(rng, self.left() + radius, self.right() - radius),
            self._safe_randf32(rng, self.top() + radius, self.bottom() - radius),
        )
    }

    fn _safe_randf32<R: Rng>(&self, rng: &mut R, min: f32, max: f32) -> f32 {
        if min >= max {
            return min;
        }
        rng.gen_range(min..=max)
    }
}

impl Default for Rectangle {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }
}

impl Shape for Rectangle {
    fn bounding_box(&self) -> Rectangle {
        *self
    }
}

/// Rectangle rotated by `angle` radians about a pivot.
///
/// `x`/`y` is the top-left corner of the unrotated rectangle and the pivot sits at
/// `(x + origin_x, y + origin_y)`.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct RotRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub angle: f32,
    pub origin_x: f32,
    pub origin_y: f32,
}

impl RotRect {
    pub fn new(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        angle: f32,
        origin_x: f32,
        origin_y: f32,
    ) -> Self {
        Self {
            x,
            y,
            width,
            height,
            angle,
            origin_x,
            origin_y,
        }
    }

    /// Rotated rectangle with the pivot at its own center.
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32, angle: f32) -> Self {
        Self::new(
            cx - width * 0.5,
            cy - height * 0.5,
            width,
            height,
            angle,
            width * 0.5,
            height * 0.5,
        )
    }

    pub fn from_rectangle(rect: &Rectangle) -> Self {
        Self::new(rect.left(), rect.top(), rect.width, rect.height, 0.0, 0.0, 0.0)
    }

    pub fn pivot(&self) -> (f32, f32) {
        (self.x + self.origin_x, self.y + self.origin_y)
    }

    pub fn is_axis_aligned(&self) -> bool {
        self.angle == 0.0
    }

    fn rotate(&self, px: f32, py: f32) -> (f32, f32) {
        let (sin, cos) = self.angle.sin_cos();
        let (ox, oy) = self.pivot();
        let dx = px - ox;
        let dy = py - oy;
        (ox + dx * cos - dy * sin, oy + dx * sin + dy * cos)
    }

    fn unrotate(&self, px: f32, py: f32) -> (f32, f32) {
        let (sin, cos) = self.angle.sin_cos();
        let (ox, oy) = self.pivot();
        let dx = px - ox;
        let dy = py - oy;
        (ox + dx * cos + dy * sin, oy - dx * sin + dy * cos)
    }

    /// Top-left, top-right, bottom-right, bottom-left after rotation.
    pub fn corners(&self) -> [(f32, f32); 4] {
        [
            self.rotate(self.x, self.y),
            self.rotate(self.x + self.width, self.y),
            self.rotate(self.x + self.width, self.y + self.height),
            self.rotate(self.x, self.y + self.height),
        ]
    }

    pub fn rotated_center(&self) -> (f32, f32) {
        self.rotate(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn half_extents(&self) -> (f32, f32) {
        (self.width * 0.5, self.height * 0.5)
    }

    pub fn contains_point(&self, px: f32, py: f32) -> bool {
        let (lx, ly) = if self.is_axis_aligned() {
            (px, py)
        } else {
            self.unrotate(px, py)
        };
        lx >= self.x && lx <= self.x + self.width && ly >= self.y && ly <= self.y + self.height
    }
}

impl Shape for RotRect {
    fn bounding_box(&self) -> Rectangle {
        if self.is_axis_aligned() {
            return Rectangle::new(
                self.x + self.width * 0.5,
                self.y + self.height * 0.5,
                self.width,
                self.height,
            );
        }
        let corners = self.corners();
        let mut min_x = corners[0].0;
        let mut min_y = corners[0].1;
        let mut max_x = min_x;
        let mut max_y = min_y;
        for &(cx, cy) in &corners[1..] {
            min_x = min_x.min(cx);
            min_y = min_y.min(cy);
            max_x = max_x.max(cx);
            max_y = max_y.max(cy);
        }
        Rectangle::from_min_max(min_x, min_y, max_x, max_y)
    }
}

/// Line segment with thickness, used for ray and line queries.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Segment {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub thickness: f32,
}

impl Segment {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            thickness,
        }
    }

    /// Segment starting at `(x, y)` heading along `(dir_x, dir_y)` for `length` units.
    /// A zero direction yields a zero-length segment at the origin.
    pub fn from_ray(x: f32, y: f32, dir_x: f32, dir_y: f32, length: f32, thickness: f32) -> Self {
        let norm = (dir_x * dir_x + dir_y * dir_y).sqrt();
        let (ux, uy) = if norm > 0.0 {
            (dir_x / norm, dir_y / norm)
        } else {
            (0.0, 0.0)
        };
        Self::new(x, y, x + ux * length, y + uy * length, thickness)
    }

    pub fn origin(&self) -> (f32, f32) {
        (self.x1, self.y1)
    }

    pub fn length(&self) -> f32 {
        let dx = self.x2 - self.x1;
        let dy = self.y2 - self.y1;
        (dx * dx + dy * dy).sqrt()
    }

    /// The thin rotated rectangle covering the segment, pivoting on the segment origin.
    pub fn to_rot_rect(&self) -> RotRect {
        let angle = (self.y2 - self.y1).atan2(self.x2 - self.x1);
        let half = self.thickness * 0.5;
        RotRect::new(
            self.x1,
            self.y1 - half,
            self.length(),
            self.thickness,
            angle,
            0.0,
            half,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ShapeEnum {
    Point(Point),
    Circle(Circle),
    Rectangle(Rectangle),
    RotRect(RotRect),
}

impl Default for ShapeEnum {
    fn default() -> Self {
        ShapeEnum::Point(Point::default())
    }
}

impl Shape for ShapeEnum {
    fn bounding_box(&self) -> Rectangle {
        match self {
            ShapeEnum::Point(point) => point.bounding_box(),
            ShapeEnum::Circle(circle) => circle.bounding_box(),
            ShapeEnum::Rectangle(rectangle) => rectangle.bounding_box(),
            ShapeEnum::RotRect(rot_rect) => rot_rect.bounding_box(),
        }
    }
}

impl From<Point> for ShapeEnum {
    fn from(point: Point) -> Self {
        ShapeEnum::Point(point)
    }
}

impl From<Circle> for ShapeEnum {
    fn from(circle: Circle) -> Self {
        ShapeEnum::Circle(circle)
    }
}

impl From<Rectangle> for ShapeEnum {
    fn from(rectangle: Rectangle) -> Self {
        ShapeEnum::Rectangle(rectangle)
    }
}

impl From<RotRect> for ShapeEnum {
    fn from(rot_rect: RotRect) -> Self {
        ShapeEnum::RotRect(rot_rect)
    }
}

impl From<Segment> for ShapeEnum {
    fn from(segment: Segment) -> Self {
        ShapeEnum::RotRect(segment.to_rot_rect())
    }
}
