//! Intersection and containment predicates for the shapes in `common::shapes`.
//!
//! Axis-aligned pairs are resolved with closed (touching counts) arithmetic tests.
//! Pairs involving a rotated rectangle are handed to parry2d.

use common::shapes::{Circle, Point, Rectangle, RotRect, Shape, ShapeEnum};
use nalgebra::{Isometry2, Vector2};
use parry2d::query;
use parry2d::shape::{Ball, Cuboid};

pub struct ShapeWithPosition {
    pub shape: ParryShape,
    pub position: Isometry2<f32>,
}

pub enum ParryShape {
    Ball(Ball),
    Cuboid(Cuboid),
}

impl ShapeWithPosition {
    pub fn from_rectangle(rect: &Rectangle) -> Self {
        Self {
            shape: ParryShape::Cuboid(Cuboid::new(Vector2::new(
                rect.half_width(),
                rect.half_height(),
            ))),
            position: Isometry2::new(Vector2::new(rect.x, rect.y), 0.0),
        }
    }

    pub fn from_rot_rect(rot: &RotRect) -> Self {
        let (cx, cy) = rot.rotated_center();
        let (hw, hh) = rot.half_extents();
        Self {
            shape: ParryShape::Cuboid(Cuboid::new(Vector2::new(hw, hh))),
            position: Isometry2::new(Vector2::new(cx, cy), rot.angle),
        }
    }

    pub fn from_circle(circle: &Circle) -> Self {
        Self {
            shape: ParryShape::Ball(Ball::new(circle.radius)),
            position: Isometry2::new(Vector2::new(circle.x, circle.y), 0.0),
        }
    }

    fn as_dyn(&self) -> &dyn parry2d::shape::Shape {
        match &self.shape {
            ParryShape::Ball(ball) => ball as &dyn parry2d::shape::Shape,
            ParryShape::Cuboid(cuboid) => cuboid,
        }
    }
}

// Check that Rectangle inner is fully contained in Rectangle outer
pub fn rectangle_contains_rectangle(outer: &Rectangle, inner: &Rectangle) -> bool {
    outer.contains_rectangle(inner)
}

pub fn rectangle_rectangle(a: &Rectangle, b: &Rectangle) -> bool {
    a.intersects_rectangle(b)
}

pub fn circle_circle(a: &Circle, b: &Circle) -> bool {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let distance_sq = dx * dx + dy * dy;
    let collision_distance = a.radius + b.radius;
    let collision_distance_sq = collision_distance * collision_distance;
    distance_sq <= collision_distance_sq
}

/// Closest point on the rectangle to the circle center, compared against the radius.
pub fn circle_rectangle(circle: &Circle, rectangle: &Rectangle) -> bool {
    rectangle.distance_sq_to_point(circle.x, circle.y) <= circle.radius * circle.radius
}

fn parry_intersects(a: &ShapeWithPosition, b: &ShapeWithPosition, fallback: bool) -> bool {
    query::intersection_test(&a.position, a.as_dyn(), &b.position, b.as_dyn())
        .unwrap_or(fallback)
}

pub fn rot_rect_rectangle(rot: &RotRect, rect: &Rectangle) -> bool {
    let envelope = rot.bounding_box();
    if !envelope.intersects_rectangle(rect) {
        return false;
    }
    if rot.is_axis_aligned() {
        return true;
    }
    if rect.contains_rectangle(&envelope) {
        return true;
    }
    parry_intersects(
        &ShapeWithPosition::from_rot_rect(rot),
        &ShapeWithPosition::from_rectangle(rect),
        true,
    )
}

pub fn rot_rect_circle(rot: &RotRect, circle: &Circle) -> bool {
    if !circle_rectangle(circle, &rot.bounding_box()) {
        return false;
    }
    if rot.is_axis_aligned() {
        return true;
    }
    parry_intersects(
        &ShapeWithPosition::from_rot_rect(rot),
        &ShapeWithPosition::from_circle(circle),
        true,
    )
}

pub fn rot_rect_rot_rect(a: &RotRect, b: &RotRect) -> bool {
    if !a.bounding_box().intersects_rectangle(&b.bounding_box()) {
        return false;
    }
    if a.is_axis_aligned() && b.is_axis_aligned() {
        return true;
    }
    parry_intersects(
        &ShapeWithPosition::from_rot_rect(a),
        &ShapeWithPosition::from_rot_rect(b),
        true,
    )
}

/// Zero-area shapes collapse to points so that degenerate queries still match by containment.
fn reduce(shape: &ShapeEnum) -> ShapeEnum {
    match shape {
        ShapeEnum::Rectangle(rect) if rect.width == 0.0 && rect.height == 0.0 => {
            ShapeEnum::Point(Point::new(rect.x, rect.y))
        }
        ShapeEnum::Circle(circle) if circle.radius == 0.0 => {
            ShapeEnum::Point(Point::new(circle.x, circle.y))
        }
        ShapeEnum::RotRect(rot) if rot.width == 0.0 && rot.height == 0.0 => {
            let (x, y) = rot.rotated_center();
            ShapeEnum::Point(Point::new(x, y))
        }
        ShapeEnum::RotRect(rot) if rot.is_axis_aligned() => ShapeEnum::Rectangle(rot.bounding_box()),
        other => other.clone(),
    }
}

pub fn shape_contains_point(shape: &ShapeEnum, x: f32, y: f32) -> bool {
    match shape {
        ShapeEnum::Point(point) => point.x == x && point.y == y,
        ShapeEnum::Rectangle(rect) => rect.contains_point(x, y),
        ShapeEnum::Circle(circle) => circle.contains_point(x, y),
        ShapeEnum::RotRect(rot) => rot.contains_point(x, y),
    }
}

pub fn shape_shape(a: &ShapeEnum, b: &ShapeEnum) -> bool {
    let a = reduce(a);
    let b = reduce(b);
    match (&a, &b) {
        (ShapeEnum::Point(point), other) | (other, ShapeEnum::Point(point)) => {
            shape_contains_point(other, point.x, point.y)
        }
        (ShapeEnum::Circle(circle_a), ShapeEnum::Circle(circle_b)) => {
            circle_circle(circle_a, circle_b)
        }
        (ShapeEnum::Circle(circle), ShapeEnum::Rectangle(rectangle))
        | (ShapeEnum::Rectangle(rectangle), ShapeEnum::Circle(circle)) => {
            circle_rectangle(circle, rectangle)
        }
        (ShapeEnum::Rectangle(rectangle_a), ShapeEnum::Rectangle(rectangle_b)) => {
            rectangle_rectangle(rectangle_a, rectangle_b)
        }
        (ShapeEnum::RotRect(rot), ShapeEnum::Rectangle(rect))
        | (ShapeEnum::Rectangle(rect), ShapeEnum::RotRect(rot)) => rot_rect_rectangle(rot, rect),
        (ShapeEnum::RotRect(rot), ShapeEnum::Circle(circle))
        | (ShapeEnum::Circle(circle), ShapeEnum::RotRect(rot)) => rot_rect_circle(rot, circle),
        (ShapeEnum::RotRect(rot_a), ShapeEnum::RotRect(rot_b)) => rot_rect_rot_rect(rot_a, rot_b),
    }
}

/// Exact intersection test; touching shapes intersect.
pub fn intersects(a: &ShapeEnum, b: &ShapeEnum) -> bool {
    shape_shape(a, b)
}

/// Whether `outer` fully covers the axis-aligned rectangle `inner`.
pub fn contains(outer: &ShapeEnum, inner: &Rectangle) -> bool {
    match outer {
        ShapeEnum::Point(point) => {
            inner.width == 0.0 && inner.height == 0.0 && inner.x == point.x && inner.y == point.y
        }
        ShapeEnum::Rectangle(rect) => rect.contains_rectangle(inner),
        ShapeEnum::Circle(circle) => inner
            .corners()
            .iter()
            .all(|&(x, y)| circle.contains_point(x, y)),
        ShapeEnum::RotRect(rot) => inner.corners().iter().all(|&(x, y)| rot.contains_point(x, y)),
    }
}
