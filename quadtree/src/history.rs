//! Undo/redo on top of [`QuadTree`].
//!
//! Each recorded change keeps what is needed to invert it: the item's previous shape
//! and the outer bounds before the change. Maintenance (`update`) is not recorded.

use crate::error::QuadtreeResult;
use crate::quadtree::{Config, QuadTree};
use common::shapes::{Rectangle, ShapeEnum};

#[derive(Clone, Debug)]
enum Change {
    Inserted {
        value: u32,
        shape: ShapeEnum,
        bounds_before: Option<Rectangle>,
    },
    Relocated {
        value: u32,
        before: ShapeEnum,
        after: ShapeEnum,
        bounds_before: Option<Rectangle>,
    },
    Deleted {
        value: u32,
        shape: ShapeEnum,
        bounds_before: Option<Rectangle>,
    },
    BoundsSet {
        after: Rectangle,
        bounds_before: Option<Rectangle>,
    },
    Cleared {
        items: Vec<(u32, ShapeEnum)>,
        bounds_before: Option<Rectangle>,
    },
}

pub struct HistoryQuadTree {
    tree: QuadTree,
    undo: Vec<Change>,
    redo: Vec<Change>,
}

impl HistoryQuadTree {
    pub fn new(tree: QuadTree) -> Self {
        HistoryQuadTree {
            tree,
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    pub fn unbounded_with_config(config: Config) -> Self {
        Self::new(QuadTree::unbounded_with_config(config))
    }

    pub fn tree(&self) -> &QuadTree {
        &self.tree
    }

    pub fn into_inner(self) -> QuadTree {
        self.tree
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

    pub fn insert(&mut self, value: u32, shape: ShapeEnum) -> QuadtreeResult<()> {
        let bounds_before = self.tree.bounds();
        self.tree.insert(value, shape.clone())?;
        self.record(Change::Inserted {
            value,
            shape,
            bounds_before,
        });
        Ok(())
    }

    pub fn relocate(&mut self, value: u32, shape: ShapeEnum) -> QuadtreeResult<bool> {
        let Some(before) = self.tree.shape(value).cloned() else {
            return Ok(false);
        };
        let bounds_before = self.tree.bounds();
        self.tree.relocate(value, shape.clone())?;
        self.record(Change::Relocated {
            value,
            before,
            after: shape,
            bounds_before,
        });
        Ok(true)
    }

    pub fn delete(&mut self, value: u32) -> bool {
        let Some(shape) = self.tree.shape(value).cloned() else {
            return false;
        };
        let bounds_before = self.tree.bounds();
        self.tree.delete(value);
        self.record(Change::Deleted {
            value,
            shape,
            bounds_before,
        });
        true
    }

    pub fn set_bounds(&mut self, bounds: Rectangle) -> QuadtreeResult<()> {
        let bounds_before = self.tree.bounds();
        self.tree.set_bounds(bounds)?;
        self.record(Change::BoundsSet {
            after: bounds,
            bounds_before,
        });
        Ok(())
    }

    pub fn clear(&mut self) {
        let bounds_before = self.tree.bounds();
        let mut items: Vec<(u32, ShapeEnum)> = self
            .tree
            .items()
            .map(|(value, shape)| (value, shape.clone()))
            .collect();
        items.sort_by_key(|(value, _)| *value);
        self.tree.clear();
        self.record(Change::Cleared {
            items,
            bounds_before,
        });
    }

    pub fn update(&mut self) {
        self.tree.update();
    }

    /// Reverts the most recent change. Returns `Ok(false)` when there is nothing to undo.
    /// A change that fails to revert stays on the undo stack.
    pub fn undo(&mut self) -> QuadtreeResult<bool> {
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
    /// nothing to redo. A change that fails to reapply stays on the redo stack.
    pub fn redo(&mut self) -> QuadtreeResult<bool> {
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

    fn revert(&mut self, change: &Change) -> QuadtreeResult<()> {
        match change {
            Change::Inserted {
                value,
                bounds_before,
                ..
            } => {
                self.tree.delete(*value);
                self.restore_bounds(*bounds_before)
            }
            Change::Relocated {
                value,
                before,
                bounds_before,
                ..
            } => {
                self.tree.relocate(*value, before.clone())?;
                self.restore_bounds(*bounds_before)
            }
            Change::Deleted {
                value,
                shape,
                bounds_before,
            } => {
                self.tree.insert(*value, shape.clone())?;
                self.restore_bounds(*bounds_before)
            }
            Change::BoundsSet { bounds_before, .. } => self.restore_bounds(*bounds_before),
            Change::Cleared {
                items,
                bounds_before,
            } => {
                for (value, shape) in items {
                    self.tree.insert(*value, shape.clone())?;
                }
                self.restore_bounds(*bounds_before)
            }
        }
    }

    fn reapply(&mut self, change: &Change) -> QuadtreeResult<()> {
        match change {
            Change::Inserted { value, shape, .. } => self.tree.insert(*value, shape.clone()),
            Change::Relocated { value, after, .. } => {
                self.tree.relocate(*value, after.clone()).map(|_| ())
            }
            Change::Deleted { value, .. } => {
                self.tree.delete(*value);
                Ok(())
            }
            Change::BoundsSet { after, .. } => self.tree.set_bounds(*after),
            Change::Cleared { .. } => {
                self.tree.clear();
                Ok(())
            }
        }
    }

    fn restore_bounds(&mut self, bounds: Option<Rectangle>) -> QuadtreeResult<()> {
        if self.tree.bounds() == bounds {
            return Ok(());
        }
        match bounds {
            Some(bounds) => self.tree.set_bounds(bounds),
            // Only an empty tree can be without bounds.
            None => {
                if self.tree.is_empty() {
                    self.tree.clear();
                }
                Ok(())
            }
        }
    }
}
