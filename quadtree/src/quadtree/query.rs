use super::types::{
    validate_circle_radius, validate_coordinates, validate_rect, validate_rect_dims,
    validate_shape, NodeStack, RectExtent, NIL,
};
use super::QuadTree;
use crate::error::QuadtreeResult;
use common::shapes::{Circle, Point, Rectangle, RotRect, Segment, Shape, ShapeEnum};
use smallvec::smallvec;
use std::cmp::Ordering;

impl QuadTree {
    /// Visits the record index of every item whose shape intersects `query`.
    ///
    /// A clean node is pruned by its tight bounds against the exact query box. A stale
    /// node's tight bounds may lag behind its items, so it is pruned by its cell against
    /// the query box inflated by the largest item half-extent instead.
    fn visit_records<F>(&self, query: &ShapeEnum, mut visit: F)
    where
        F: FnMut(u32),
    {
        if self.root == NIL {
            return;
        }
        let extent = RectExtent::from_rect(&query.bounding_box());
        let inflated = extent.inflate(self.largest.half_w, self.largest.half_h);
        let mut stack: NodeStack = smallvec![self.root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            let cover = if node.stale {
                if !node.cell.intersects(&inflated) {
                    continue;
                }
                node.cell
            } else {
                match node.tight {
                    Some(tight) if tight.intersects(&extent) => tight,
                    _ => continue,
                }
            };

            if let Some(children) = node.children {
                stack.extend(children);
                continue;
            }

            // Every item's point lies in its leaf's cell and inside its own shape, so a
            // query covering the cell (or the tight bounds) hits every item.
            let take_all = collisions::contains(query, &cover.to_rect());
            let mut cursor = node.head;
            while cursor != NIL {
                let item = &self.items[cursor];
                if take_all || collisions::intersects(&item.shape, query) {
                    visit(cursor);
                }
                cursor = item.next;
            }
        }
    }

    pub fn collisions_with<F>(&self, shape: &ShapeEnum, mut f: F) -> QuadtreeResult<()>
    where
        F: FnMut(u32),
    {
        validate_shape(shape)?;
        self.visit_records(shape, |record| f(self.items[record].value));
        Ok(())
    }

    pub fn collisions(&self, shape: &ShapeEnum, collisions: &mut Vec<u32>) -> QuadtreeResult<()> {
        self.collisions_with(shape, |value| collisions.push(value))
    }

    pub fn collisions_batch(&self, shapes: &[ShapeEnum]) -> QuadtreeResult<Vec<Vec<u32>>> {
        shapes
            .iter()
            .map(|shape| {
                let mut collisions = Vec::new();
                self.collisions(shape, &mut collisions)?;
                Ok(collisions)
            })
            .collect()
    }

    pub fn collisions_point(&self, x: f32, y: f32, collisions: &mut Vec<u32>) -> QuadtreeResult<()> {
        validate_coordinates(x, y)?;
        self.collisions(&ShapeEnum::Point(Point::new(x, y)), collisions)
    }

    pub fn collisions_rect(
        &self,
        rect: &Rectangle,
        collisions: &mut Vec<u32>,
    ) -> QuadtreeResult<()> {
        validate_rect(rect)?;
        self.collisions(&ShapeEnum::Rectangle(*rect), collisions)
    }

    pub fn collisions_rect_extent(
        &self,
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
        collisions: &mut Vec<u32>,
    ) -> QuadtreeResult<()> {
        validate_coordinates(min_x, min_y)?;
        validate_rect_dims(max_x - min_x, max_y - min_y)?;
        self.collisions(
            &ShapeEnum::Rectangle(Rectangle::from_min_max(min_x, min_y, max_x, max_y)),
            collisions,
        )
    }

    pub fn collisions_circle_raw(
        &self,
        x: f32,
        y: f32,
        radius: f32,
        collisions: &mut Vec<u32>,
    ) -> QuadtreeResult<()> {
        validate_coordinates(x, y)?;
        validate_circle_radius(radius)?;
        self.collisions(&ShapeEnum::Circle(Circle::new(x, y, radius)), collisions)
    }

    pub fn collisions_rot_rect(
        &self,
        rot: &RotRect,
        collisions: &mut Vec<u32>,
    ) -> QuadtreeResult<()> {
        self.collisions(&ShapeEnum::RotRect(*rot), collisions)
    }

    /// Items hit by a thick segment, closest to the segment origin first.
    ///
    /// Distance is measured to each item's bounding box, then to its representative
    /// point, with the identity as the final tie-break.
    pub fn collisions_segment(
        &self,
        segment: &Segment,
        collisions: &mut Vec<u32>,
    ) -> QuadtreeResult<()> {
        validate_coordinates(segment.x1, segment.y1)?;
        validate_coordinates(segment.x2, segment.y2)?;
        validate_rect_dims(0.0, segment.thickness)?;
        let query = ShapeEnum::from(*segment);
        let (ox, oy) = segment.origin();

        let mut hits: Vec<(f32, f32, u32)> = Vec::new();
        self.visit_records(&query, |record| {
            let item = &self.items[record];
            let to_box = item.shape.bounding_box().distance_sq_to_point(ox, oy);
            let to_point = Point::new(item.x, item.y).distance_sq(ox, oy);
            hits.push((to_box, to_point, item.value));
        });
        hits.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
                .then(a.2.cmp(&b.2))
        });
        collisions.extend(hits.into_iter().map(|(_, _, value)| value));
        Ok(())
    }
}
