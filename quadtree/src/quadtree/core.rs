use super::pool::{Pool, Resettable};
use super::types::{validate_rect, validate_shape, LargestExtent, RectExtent, NIL};
use super::{Config, QuadTree, RelocationRequest};
use crate::error::{QuadtreeError, QuadtreeResult};
use common::shapes::{Rectangle, Shape, ShapeEnum};
use fxhash::{FxHashMap, FxHashSet};

#[derive(Clone, Debug)]
pub(crate) struct ItemRecord {
    pub(crate) value: u32,
    pub(crate) shape: ShapeEnum,
    pub(crate) extent: RectExtent,
    /// Representative point used to pick the owning node.
    pub(crate) x: f32,
    pub(crate) y: f32,
    /// Owning node, `NIL` while pending.
    pub(crate) node: u32,
    pub(crate) next: u32,
}

impl Default for ItemRecord {
    fn default() -> Self {
        ItemRecord {
            value: 0,
            shape: ShapeEnum::default(),
            extent: RectExtent::from_min_max(0.0, 0.0, 0.0, 0.0),
            x: 0.0,
            y: 0.0,
            node: NIL,
            next: NIL,
        }
    }
}

impl Resettable for ItemRecord {
    fn reset(&mut self) {
        *self = ItemRecord::default();
    }
}

impl Default for QuadTree {
    fn default() -> Self {
        QuadTree::unbounded()
    }
}

impl QuadTree {
    pub fn new(bounding_box: Rectangle) -> QuadtreeResult<Self> {
        Self::new_with_config(bounding_box, Config::default())
    }

    pub fn new_with_config(bounding_box: Rectangle, config: Config) -> QuadtreeResult<Self> {
        validate_rect(&bounding_box)?;
        let mut tree = Self::unbounded_with_config(config);
        tree.reset_root(RectExtent::from_rect(&bounding_box));
        Ok(tree)
    }

    /// A tree without bounds; the first insert sizes it.
    pub fn unbounded() -> Self {
        Self::unbounded_with_config(Config::default())
    }

    pub fn unbounded_with_config(config: Config) -> Self {
        let config = config.sanitized();
        QuadTree {
            bounds: None,
            root: NIL,
            nodes: Pool::with_capacity(config.pool_size),
            items: Pool::with_capacity(config.pool_size),
            owner_map: FxHashMap::default(),
            pending: FxHashSet::default(),
            to_split: FxHashSet::default(),
            to_clean: FxHashSet::default(),
            largest: LargestExtent::default(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Drops every node and starts over with a single leaf covering `bounds`.
    /// Items are left untouched; callers relink them.
    pub(crate) fn reset_root(&mut self, bounds: RectExtent) {
        self.nodes.release_all();
        self.to_split.clear();
        self.to_clean.clear();
        self.bounds = Some(bounds);
        self.root = self.alloc_node(bounds, 0, None);
    }

    pub fn insert(&mut self, value: u32, shape: ShapeEnum) -> QuadtreeResult<()> {
        validate_shape(&shape)?;
        if self.owner_map.contains_key(&value) {
            return Err(QuadtreeError::DuplicateItem { value });
        }
        let extent = RectExtent::from_rect(&shape.bounding_box());
        let (x, y) = shape.center();
        if self.bounds.is_none() {
            self.reset_root(RectExtent::around(x, y, 1.0, 1.0));
        }

        let record = self.items.acquire();
        self.items[record] = ItemRecord {
            value,
            shape,
            extent,
            x,
            y,
            node: NIL,
            next: NIL,
        };
        self.owner_map.insert(value, record);
        self.largest.observe(value, &extent);
        self.place(record, self.root);
        Ok(())
    }

    pub fn insert_rect_extent(
        &mut self,
        value: u32,
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
    ) -> QuadtreeResult<()> {
        self.insert(
            value,
            ShapeEnum::Rectangle(Rectangle::from_min_max(min_x, min_y, max_x, max_y)),
        )
    }

    /// Moves an item to a new shape. Returns `Ok(false)` when the identity is unknown.
    pub fn relocate(&mut self, value: u32, shape: ShapeEnum) -> QuadtreeResult<bool> {
        validate_shape(&shape)?;
        let Some(&record) = self.owner_map.get(&value) else {
            return Ok(false);
        };
        let extent = RectExtent::from_rect(&shape.bounding_box());
        let (x, y) = shape.center();
        self.largest.observe(value, &extent);
        let node = {
            let item = &mut self.items[record];
            item.shape = shape;
            item.extent = extent;
            item.x = x;
            item.y = y;
            item.node
        };

        if node == NIL {
            // Pending items only rejoin the tree once their point is back in bounds.
            if self.in_bounds(x, y) {
                self.pending.remove(&record);
                self.link_from(self.root, record);
            }
            return Ok(true);
        }

        let cell = self.nodes[node].cell;
        let parent = self.nodes[node].parent;
        if !self.in_bounds(x, y) {
            self.detach(record);
            self.pending.insert(record);
            return Ok(true);
        }
        if parent.is_none() || cell.contains_point(x, y) {
            self.mark_stale(node);
            return Ok(true);
        }

        self.detach(record);
        let mut ancestor = parent;
        while let Some(index) = ancestor {
            let node = &self.nodes[index];
            if node.parent.is_none() || node.cell.contains_point(x, y) {
                break;
            }
            ancestor = node.parent;
        }
        self.link_from(ancestor.unwrap_or(self.root), record);
        Ok(true)
    }

    pub fn relocate_batch(&mut self, requests: &[RelocationRequest]) -> QuadtreeResult<()> {
        for request in requests {
            self.relocate(request.value, request.shape.clone())?;
        }
        Ok(())
    }

    /// Removes an item. Returns `false` when the identity is unknown.
    pub fn delete(&mut self, value: u32) -> bool {
        let Some(record) = self.owner_map.remove(&value) else {
            return false;
        };
        if self.items[record].node == NIL {
            self.pending.remove(&record);
        } else {
            self.detach(record);
        }
        self.items.release(record);

        if self.owner_map.is_empty() {
            self.clear();
            return true;
        }
        if self.largest.is_owner(value) {
            self.rescan_largest();
        }
        true
    }

    pub fn contains(&self, value: u32) -> bool {
        self.owner_map.contains_key(&value)
    }

    pub(crate) fn in_bounds(&self, x: f32, y: f32) -> bool {
        self.bounds
            .map_or(false, |bounds| bounds.contains_point(x, y))
    }

    /// Links a record below `start` if its point is in bounds, otherwise parks it as pending.
    pub(crate) fn place(&mut self, record: u32, start: u32) {
        let (x, y) = (self.items[record].x, self.items[record].y);
        if self.in_bounds(x, y) {
            self.link_from(start, record);
        } else {
            self.pending.insert(record);
        }
    }

    pub(crate) fn link_from(&mut self, start: u32, record: u32) {
        let (x, y) = (self.items[record].x, self.items[record].y);
        let leaf = self.descend(start, x, y);
        self.link(record, leaf);
        self.mark_stale(leaf);
        if self.nodes[leaf].count as usize > self.config.node_capacity {
            self.to_split.insert(leaf);
        }
    }

    /// Unlinks a record from its node and queues the node's parent for coalescing.
    pub(crate) fn detach(&mut self, record: u32) {
        let node = self.items[record].node;
        self.unlink(record);
        self.mark_stale(node);
        if let Some(parent) = self.nodes[node].parent {
            self.to_clean.insert(parent);
        }
    }

    pub(crate) fn rescan_largest(&mut self) {
        let mut largest = LargestExtent::default();
        for (&value, &record) in &self.owner_map {
            largest.observe(value, &self.items[record].extent);
        }
        self.largest = largest;
    }
}
