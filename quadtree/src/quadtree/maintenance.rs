use super::types::{union_extent, validate_rect, LargestExtent, NodeStack, RectExtent, NIL};
use super::QuadTree;
use crate::error::QuadtreeResult;
use common::shapes::Rectangle;
use log::{debug, trace};
use smallvec::{smallvec, SmallVec};

#[derive(Debug, Default)]
struct PassStats {
    splits: usize,
    merges: usize,
    tightened: usize,
}

impl QuadTree {
    /// Runs the deferred maintenance pass. Idempotent: a second call with no
    /// mutation in between changes nothing.
    ///
    /// Order matters: bounds growth rebuilds the whole tree, so it runs before
    /// any split or merge.
    pub fn update(&mut self) {
        let mut stats = PassStats::default();
        self.grow_bounds();
        self.split_pass(&mut stats);
        self.clean_pass(&mut stats);
        stats.tightened = self.tighten();
        trace!(
            "quadtree update: {} splits, {} merges, {} nodes tightened, {} nodes live",
            stats.splits,
            stats.merges,
            stats.tightened,
            self.nodes.len()
        );
    }

    fn grow_bounds(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let Some(bounds) = self.bounds else {
            return;
        };
        let mut grown = bounds;
        for &record in &self.pending {
            let item = &self.items[record];
            grown.include_point(item.x, item.y);
        }
        debug!(
            "quadtree bounds grow from {:?} to {:?} for {} pending items ({} total)",
            bounds.to_rect(),
            grown.to_rect(),
            self.pending.len(),
            self.owner_map.len()
        );
        self.rebuild(grown);
    }

    /// Discards the node topology and relinks every item against `bounds`.
    /// Items outside the new bounds become pending.
    fn rebuild(&mut self, bounds: RectExtent) {
        self.reset_root(bounds);
        self.pending.clear();
        let records: Vec<u32> = self.owner_map.values().copied().collect();
        for record in records {
            let item = &mut self.items[record];
            item.node = NIL;
            item.next = NIL;
            self.place(record, self.root);
        }
    }

    fn split_pass(&mut self, stats: &mut PassStats) {
        let mut work: NodeStack = self.to_split.drain().collect();
        while let Some(node) = work.pop() {
            // Counts may have dropped since the leaf was queued.
            if !self.can_subdivide(node) {
                continue;
            }
            let children = self.subdivide(node);
            stats.splits += 1;
            work.extend(children);
        }
    }

    fn clean_pass(&mut self, stats: &mut PassStats) {
        let capacity = self.config.node_capacity;
        let work: Vec<u32> = self.to_clean.drain().collect();
        for node in work {
            let mut current = Some(node);
            while let Some(index) = current {
                // Released nodes are reset to leaves, so an earlier merge that swallowed
                // this one is caught here as well.
                if self.nodes[index].is_leaf() {
                    break;
                }
                if self.subtree_count_within(index, capacity).is_none() {
                    break;
                }
                self.coalesce(index);
                stats.merges += 1;
                current = self.nodes[index].parent;
            }
        }
    }

    /// Recomputes tight bounds for every stale node, children before parents.
    fn tighten(&mut self) -> usize {
        if self.root == NIL || !self.nodes[self.root].stale {
            return 0;
        }
        let mut tightened = 0;
        let mut stack: SmallVec<[(u32, bool); 64]> = smallvec![(self.root, false)];
        while let Some((index, expanded)) = stack.pop() {
            let children = self.nodes[index].children;
            if !expanded {
                stack.push((index, true));
                if let Some(children) = children {
                    for child in children {
                        if self.nodes[child].stale {
                            stack.push((child, false));
                        }
                    }
                }
                continue;
            }

            let tight = match children {
                Some(children) => children
                    .iter()
                    .filter_map(|&child| self.nodes[child].tight)
                    .fold(None, union_extent),
                None => {
                    let mut tight = None;
                    let mut cursor = self.nodes[index].head;
                    while cursor != NIL {
                        tight = union_extent(tight, self.items[cursor].extent);
                        cursor = self.items[cursor].next;
                    }
                    tight
                }
            };
            let node = &mut self.nodes[index];
            node.tight = tight;
            node.stale = false;
            tightened += 1;
        }
        tightened
    }

    /// Rebuilds with the smallest bounds enclosing every item point. An axis with no
    /// extent is padded to 1.0. Does nothing on an empty tree.
    pub fn shrink(&mut self) {
        let mut points = self
            .owner_map
            .values()
            .map(|&record| (self.items[record].x, self.items[record].y));
        let Some((x, y)) = points.next() else {
            return;
        };
        let mut fitted = RectExtent::from_min_max(x, y, x, y);
        for (x, y) in points {
            fitted.include_point(x, y);
        }
        let (cx, cy) = fitted.center();
        if fitted.width() == 0.0 {
            fitted.min_x = cx - 0.5;
            fitted.max_x = cx + 0.5;
        }
        if fitted.height() == 0.0 {
            fitted.min_y = cy - 0.5;
            fitted.max_y = cy + 0.5;
        }
        debug!(
            "quadtree shrink from {:?} to {:?}",
            self.bounds.map(RectExtent::to_rect),
            fitted.to_rect()
        );
        self.rebuild(fitted);
        self.split_pass(&mut PassStats::default());
    }

    /// Replaces the outer bounds and rebuilds. Items outside the new bounds stay
    /// pending until the next `update` grows the bounds back around them.
    pub fn set_bounds(&mut self, bounds: Rectangle) -> QuadtreeResult<()> {
        validate_rect(&bounds)?;
        let extent = RectExtent::from_rect(&bounds);
        debug!(
            "quadtree set_bounds from {:?} to {:?} with {} items",
            self.bounds.map(RectExtent::to_rect),
            bounds,
            self.owner_map.len()
        );
        self.rebuild(extent);
        self.split_pass(&mut PassStats::default());
        Ok(())
    }

    /// Drops every item and node. The tree is left without bounds.
    pub fn clear(&mut self) {
        self.items.release_all();
        self.nodes.release_all();
        self.owner_map.clear();
        self.pending.clear();
        self.to_split.clear();
        self.to_clean.clear();
        self.largest = LargestExtent::default();
        self.bounds = None;
        self.root = NIL;
    }
}
