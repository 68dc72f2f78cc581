use super::types::{Membership, NodeInfo, NodeStack, RectExtent, StorageCounts, NIL};
use super::QuadTree;
use common::shapes::{Rectangle, ShapeEnum};
use smallvec::smallvec;

impl QuadTree {
    pub fn len(&self) -> usize {
        self.owner_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owner_map.is_empty()
    }

    pub fn bounds(&self) -> Option<Rectangle> {
        self.bounds.map(RectExtent::to_rect)
    }

    pub fn shape(&self, value: u32) -> Option<&ShapeEnum> {
        self.owner_map
            .get(&value)
            .map(|&record| &self.items[record].shape)
    }

    /// The item's shape and the node currently holding it.
    pub fn membership(&self, value: u32) -> Option<Membership> {
        let &record = self.owner_map.get(&value)?;
        let item = &self.items[record];
        Some(Membership {
            shape: item.shape.clone(),
            node: (item.node != NIL).then(|| self.node_info(item.node)),
        })
    }

    /// Items parked outside the bounds until the next `update`.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node_info(&self, index: u32) -> NodeInfo {
        let node = &self.nodes[index];
        NodeInfo {
            bounds: node.cell.to_rect(),
            tight_bounds: node.tight.map(RectExtent::to_rect),
            depth: node.depth as usize,
            item_count: node.count as usize,
            is_leaf: node.is_leaf(),
        }
    }

    fn for_each_node<F>(&self, mut f: F)
    where
        F: FnMut(u32),
    {
        if self.root == NIL {
            return;
        }
        let mut stack: NodeStack = smallvec![self.root];
        while let Some(index) = stack.pop() {
            f(index);
            if let Some(children) = self.nodes[index].children {
                stack.extend(children.into_iter().rev());
            }
        }
    }

    /// Every live node, parents before children.
    pub fn nodes(&self) -> Vec<NodeInfo> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        self.for_each_node(|index| nodes.push(self.node_info(index)));
        nodes
    }

    pub fn all_node_bounding_boxes(&self, bounding_boxes: &mut Vec<Rectangle>) {
        self.for_each_node(|index| bounding_boxes.push(self.nodes[index].cell.to_rect()));
    }

    pub fn all_shapes(&self, shapes: &mut Vec<ShapeEnum>) {
        shapes.extend(
            self.owner_map
                .values()
                .map(|&record| self.items[record].shape.clone()),
        );
    }

    pub fn items(&self) -> impl Iterator<Item = (u32, &ShapeEnum)> + '_ {
        self.owner_map
            .iter()
            .map(move |(&value, &record)| (value, &self.items[record].shape))
    }

    /// Each item with the cell of the node holding it (`None` while pending).
    pub fn bundles(&self) -> Vec<(u32, Option<Rectangle>)> {
        self.owner_map
            .iter()
            .map(|(&value, &record)| {
                let node = self.items[record].node;
                (value, (node != NIL).then(|| self.nodes[node].cell.to_rect()))
            })
            .collect()
    }

    pub fn storage_counts(&self) -> StorageCounts {
        StorageCounts {
            nodes: self.nodes.len(),
            node_slots: self.nodes.slot_count(),
            items: self.items.len(),
            item_slots: self.items.slot_count(),
        }
    }
}
