//! Uniform-grid companion to the quadtree.
//!
//! Items are bucketed by the grid cell of their representative point (the center of
//! their bounding box). There is no hierarchy and no deferred maintenance: every
//! mutation is applied immediately. Queries scan the cells overlapping the query box
//! inflated by the largest item half-extent, then resolve exact hits with
//! [`collisions::intersects`].

use common::shapes::{Point, Shape, ShapeEnum};
use fxhash::FxHashMap;
use log::debug;
use smallvec::SmallVec;
use std::fmt;

pub mod history;

pub const DEFAULT_SPACING: f32 = 50.0;

pub type Cell = (i32, i32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpatialHashError {
    InvalidSpacing { spacing: f32 },
    InvalidShape,
    DuplicateItem { value: u32 },
}

impl fmt::Display for SpatialHashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpatialHashError::InvalidSpacing { spacing } => {
                write!(f, "Invalid grid spacing: {}", spacing)
            }
            SpatialHashError::InvalidShape => {
                write!(f, "Shape has non-finite coordinates or negative size")
            }
            SpatialHashError::DuplicateItem { value } => {
                write!(f, "Item {} is already in the spatial hash", value)
            }
        }
    }
}

impl std::error::Error for SpatialHashError {}

pub type SpatialHashResult<T> = Result<T, SpatialHashError>;

struct Entry {
    shape: ShapeEnum,
    cell: Cell,
}

pub struct SpatialHash {
    spacing: f32,
    buckets: FxHashMap<Cell, SmallVec<[u32; 8]>>,
    items: FxHashMap<u32, Entry>,
    // Largest half-extent per axis and the item that set it. Shrinking items leave a
    // stale over-estimate behind, which only widens the scan.
    half_w: f32,
    owner_w: Option<u32>,
    half_h: f32,
    owner_h: Option<u32>,
}

impl Default for SpatialHash {
    fn default() -> Self {
        Self::with_spacing(DEFAULT_SPACING)
    }
}

fn validate_spacing(spacing: f32) -> SpatialHashResult<()> {
    if spacing.is_finite() && spacing > 0.0 {
        Ok(())
    } else {
        Err(SpatialHashError::InvalidSpacing { spacing })
    }
}

fn validate_shape(shape: &ShapeEnum) -> SpatialHashResult<()> {
    let bb = shape.bounding_box();
    let finite =
        bb.x.is_finite() && bb.y.is_finite() && bb.width.is_finite() && bb.height.is_finite();
    if finite && bb.width >= 0.0 && bb.height >= 0.0 {
        Ok(())
    } else {
        Err(SpatialHashError::InvalidShape)
    }
}

impl SpatialHash {
    pub fn new(spacing: f32) -> SpatialHashResult<Self> {
        validate_spacing(spacing)?;
        Ok(Self::with_spacing(spacing))
    }

    fn with_spacing(spacing: f32) -> Self {
        SpatialHash {
            spacing,
            buckets: FxHashMap::default(),
            items: FxHashMap::default(),
            half_w: 0.0,
            owner_w: None,
            half_h: 0.0,
            owner_h: None,
        }
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Grid cell holding the point, rounding toward negative infinity. Coordinates
    /// beyond the `i32` range saturate.
    #[inline]
    pub fn cell_of(&self, x: f32, y: f32) -> Cell {
        (
            (x / self.spacing).floor() as i32,
            (y / self.spacing).floor() as i32,
        )
    }

    /// Changes the cell size and rehashes every item.
    pub fn set_spacing(&mut self, spacing: f32) -> SpatialHashResult<()> {
        validate_spacing(spacing)?;
        debug!(
            "spatial hash rehash from spacing {} to {} with {} items",
            self.spacing,
            spacing,
            self.items.len()
        );
        self.spacing = spacing;
        self.buckets.clear();
        let values: Vec<u32> = self.items.keys().copied().collect();
        for value in values {
            let (x, y) = self.items[&value].shape.center();
            let cell = self.cell_of(x, y);
            if let Some(entry) = self.items.get_mut(&value) {
                entry.cell = cell;
            }
            self.buckets.entry(cell).or_default().push(value);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, value: u32) -> bool {
        self.items.contains_key(&value)
    }

    pub fn shape(&self, value: u32) -> Option<&ShapeEnum> {
        self.items.get(&value).map(|entry| &entry.shape)
    }

    pub fn bucket_of(&self, value: u32) -> Option<Cell> {
        self.items.get(&value).map(|entry| entry.cell)
    }

    /// Number of non-empty cells.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn insert(&mut self, value: u32, shape: ShapeEnum) -> SpatialHashResult<()> {
        let (x, y) = shape.center();
        let cell = self.cell_of(x, y);
        self.insert_in_cell(value, shape, cell)
    }

    /// Inserts into a cell recorded earlier instead of the one the shape maps to now.
    pub(crate) fn insert_in_cell(
        &mut self,
        value: u32,
        shape: ShapeEnum,
        cell: Cell,
    ) -> SpatialHashResult<()> {
        validate_shape(&shape)?;
        if self.items.contains_key(&value) {
            return Err(SpatialHashError::DuplicateItem { value });
        }
        self.observe(value, &shape);
        self.buckets.entry(cell).or_default().push(value);
        self.items.insert(value, Entry { shape, cell });
        Ok(())
    }

    /// Every item with the cell it is bucketed in.
    pub fn bundles(&self) -> Vec<(u32, ShapeEnum, Cell)> {
        self.items
            .iter()
            .map(|(&value, entry)| (value, entry.shape.clone(), entry.cell))
            .collect()
    }

    /// Replaces an item's shape. Returns `Ok(false)` for an unknown item.
    pub fn relocate(&mut self, value: u32, shape: ShapeEnum) -> SpatialHashResult<bool> {
        validate_shape(&shape)?;
        let (x, y) = shape.center();
        let cell = self.cell_of(x, y);
        if !self.items.contains_key(&value) {
            return Ok(false);
        }
        self.observe(value, &shape);
        let Some(entry) = self.items.get_mut(&value) else {
            return Ok(false);
        };
        let old_cell = entry.cell;
        entry.shape = shape;
        entry.cell = cell;
        if old_cell != cell {
            self.remove_from_bucket(old_cell, value);
            self.buckets.entry(cell).or_default().push(value);
        }
        Ok(true)
    }

    pub fn delete(&mut self, value: u32) -> bool {
        let Some(entry) = self.items.remove(&value) else {
            return false;
        };
        self.remove_from_bucket(entry.cell, value);
        if self.owner_w == Some(value) || self.owner_h == Some(value) {
            self.rescan_largest();
        }
        true
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.items.clear();
        self.half_w = 0.0;
        self.owner_w = None;
        self.half_h = 0.0;
        self.owner_h = None;
    }

    pub fn collisions_with<F>(&self, shape: &ShapeEnum, mut f: F) -> SpatialHashResult<()>
    where
        F: FnMut(u32),
    {
        validate_shape(shape)?;
        let bb = shape.bounding_box();
        let (min_x, min_y) = self.cell_of(bb.left() - self.half_w, bb.top() - self.half_h);
        let (max_x, max_y) =
            self.cell_of(bb.right() + self.half_w, bb.bottom() + self.half_h);
        let mut visit = |bucket: &SmallVec<[u32; 8]>| {
            for value in bucket {
                if let Some(entry) = self.items.get(value) {
                    if collisions::intersects(&entry.shape, shape) {
                        f(*value);
                    }
                }
            }
        };

        // Each axis spans at most 2^32 cells, so only the product can overflow.
        let span = (max_x as i64 - min_x as i64 + 1).checked_mul(max_y as i64 - min_y as i64 + 1);
        if span.map_or(true, |span| span > self.buckets.len() as i64) {
            // Sparse grid under a wide query: walk the occupied cells instead.
            for (&(cx, cy), bucket) in &self.buckets {
                if (min_x..=max_x).contains(&cx) && (min_y..=max_y).contains(&cy) {
                    visit(bucket);
                }
            }
        } else {
            for cx in min_x..=max_x {
                for cy in min_y..=max_y {
                    if let Some(bucket) = self.buckets.get(&(cx, cy)) {
                        visit(bucket);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn collisions(
        &self,
        shape: &ShapeEnum,
        collisions: &mut Vec<u32>,
    ) -> SpatialHashResult<()> {
        self.collisions_with(shape, |value| collisions.push(value))
    }

    pub fn collisions_point(
        &self,
        x: f32,
        y: f32,
        collisions: &mut Vec<u32>,
    ) -> SpatialHashResult<()> {
        self.collisions(&ShapeEnum::Point(Point::new(x, y)), collisions)
    }

    fn remove_from_bucket(&mut self, cell: Cell, value: u32) {
        if let Some(bucket) = self.buckets.get_mut(&cell) {
            if let Some(pos) = bucket.iter().position(|&v| v == value) {
                bucket.swap_remove(pos);
            }
            if bucket.is_empty() {
                self.buckets.remove(&cell);
            }
        }
    }

    fn observe(&mut self, value: u32, shape: &ShapeEnum) {
        let bb = shape.bounding_box();
        let half_w = bb.width * 0.5;
        let half_h = bb.height * 0.5;
        if self.owner_w.is_none() || half_w > self.half_w {
            self.half_w = half_w;
            self.owner_w = Some(value);
        }
        if self.owner_h.is_none() || half_h > self.half_h {
            self.half_h = half_h;
            self.owner_h = Some(value);
        }
    }

    fn rescan_largest(&mut self) {
        self.half_w = 0.0;
        self.owner_w = None;
        self.half_h = 0.0;
        self.owner_h = None;
        let shapes: Vec<(u32, ShapeEnum)> = self
            .items
            .iter()
            .map(|(&value, entry)| (value, entry.shape.clone()))
            .collect();
        for (value, shape) in &shapes {
            self.observe(*value, shape);
        }
    }
}
