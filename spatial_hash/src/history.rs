//! Undo/redo on top of [`SpatialHash`].
//!
//! Changes remember the cell an item was bucketed in, so undoing a relocation, delete or
//! clear puts items back in exactly those cells.

use crate::{Cell, SpatialHash, SpatialHashResult};
use common::shapes::ShapeEnum;

#[derive(Clone, Debug)]
enum Change {
    Inserted {
        value: u32,
        shape: ShapeEnum,
    },
    Relocated {
        value: u32,
        before: ShapeEnum,
        before_cell: Cell,
        after: ShapeEnum,
    },
    Deleted {
        value: u32,
        shape: ShapeEnum,
        cell: Cell,
    },
    SpacingSet {
        before: f32,
        after: f32,
    },
    Cleared {
        items: Vec<(u32, ShapeEnum, Cell)>,
    },
}

#[derive(Default)]
pub struct HistorySpatialHash {
    hash: SpatialHash,
    undo: Vec<Change>,
    redo: Vec<Change>,
}

impl HistorySpatialHash {
    pub fn new(hash: SpatialHash) -> Self {
        HistorySpatialHash {
            hash,
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    pub fn hash(&self) -> &SpatialHash {
        &self.hash
    }

    pub fn into_inner(self) -> SpatialHash {
        self.hash
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    fn record(&mut self, change: Change) {
        self.undo.push(change);
        self.redo.clear();
    }

    pub fn insert(&mut self, value: u32, shape: ShapeEnum) -> SpatialHashResult<()> {
        self.hash.insert(value, shape.clone())?;
        self.record(Change::Inserted { value, shape });
        Ok(())
    }

    pub fn relocate(&mut self, value: u32, shape: ShapeEnum) -> SpatialHashResult<bool> {
        let (Some(before), Some(before_cell)) =
            (self.hash.shape(value).cloned(), self.hash.bucket_of(value))
        else {
            return Ok(false);
        };
        self.hash.relocate(value, shape.clone())?;
        self.record(Change::Relocated {
            value,
            before,
            before_cell,
            after: shape,
        });
        Ok(true)
    }

    pub fn delete(&mut self, value: u32) -> bool {
        let (Some(shape), Some(cell)) =
            (self.hash.shape(value).cloned(), self.hash.bucket_of(value))
        else {
            return false;
        };
        self.hash.delete(value);
        self.record(Change::Deleted { value, shape, cell });
        true
    }

    pub fn set_spacing(&mut self, spacing: f32) -> SpatialHashResult<()> {
        let before = self.hash.spacing();
        self.hash.set_spacing(spacing)?;
        self.record(Change::SpacingSet {
            before,
            after: spacing,
        });
        Ok(())
    }

    pub fn clear(&mut self) {
        let mut items = self.hash.bundles();
        items.sort_by_key(|(value, _, _)| *value);
        self.hash.clear();
        self.record(Change::Cleared { items });
    }

    /// Reverts the most recent change. Returns `Ok(false)` when there is nothing to undo.
    /// A change that fails to revert stays on the undo stack.
    pub fn undo(&mut self) -> SpatialHashResult<bool> {
        let Some(change) = self.undo.pop() else {
            return Ok(false);
        };
        if let Err(err) = self.revert(&change) {
            self.undo.push(change);
            return Err(err);
        }
        self.redo.push(change);
        Ok(true)
    }

    /// Reapplies the most recently undone change. Returns `Ok(false)` when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> SpatialHashResult<bool> {
        let Some(change) = self.redo.pop() else {
            return Ok(false);
        };
        if let Err(err) = self.reapply(&change) {
            self.redo.push(change);
            return Err(err);
        }
        self.undo.push(change);
        Ok(true)
    }

    fn revert(&mut self, change: &Change) -> SpatialHashResult<()> {
        match change {
            Change::Inserted { value, .. } => {
                self.hash.delete(*value);
                Ok(())
            }
            Change::Relocated {
                value,
                before,
                before_cell,
                ..
            } => {
                self.hash.delete(*value);
                self.hash.insert_in_cell(*value, before.clone(), *before_cell)
            }
            Change::Deleted { value, shape, cell } => {
                self.hash.insert_in_cell(*value, shape.clone(), *cell)
            }
            Change::SpacingSet { before, .. } => self.hash.set_spacing(*before),
            Change::Cleared { items } => {
                for (value, shape, cell) in items {
                    self.hash.insert_in_cell(*value, shape.clone(), *cell)?;
                }
                Ok(())
            }
        }
    }

    fn reapply(&mut self, change: &Change) -> SpatialHashResult<()> {
        match change {
            Change::Inserted { value, shape } => self.hash.insert(*value, shape.clone()),
            Change::Relocated { value, after, .. } => {
                self.hash.relocate(*value, after.clone()).map(|_| ())
            }
            Change::Deleted { value, .. } => {
                self.hash.delete(*value);
                Ok(())
            }
            Change::SpacingSet { after, .. } => self.hash.set_spacing(*after),
            Change::Cleared { .. } => {
                self.hash.clear();
                Ok(())
            }
        }
    }
}
