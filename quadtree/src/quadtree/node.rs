use super::pool::Resettable;
use super::types::{NodeStack, RectExtent, NIL};
use super::QuadTree;
use smallvec::smallvec;

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) cell: RectExtent,
    /// Union of the item bounding boxes below this node; only trusted while `!stale`.
    pub(crate) tight: Option<RectExtent>,
    pub(crate) depth: u32,
    pub(crate) parent: Option<u32>,
    pub(crate) children: Option<[u32; 4]>,
    pub(crate) head: u32,
    pub(crate) count: u32,
    /// Set on every mutation below this node. A stale node's ancestors are stale too.
    pub(crate) stale: bool,
}

impl Default for Node {
    fn default() -> Self {
        Node {
            cell: RectExtent::from_min_max(0.0, 0.0, 0.0, 0.0),
            tight: None,
            depth: 0,
            parent: None,
            children: None,
            head: NIL,
            count: 0,
            stale: true,
        }
    }
}

impl Resettable for Node {
    fn reset(&mut self) {
        *self = Node::default();
    }
}

impl Node {
    #[inline(always)]
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

impl QuadTree {
    pub(crate) fn alloc_node(&mut self, cell: RectExtent, depth: u32, parent: Option<u32>) -> u32 {
        let index = self.nodes.acquire();
        let node = &mut self.nodes[index];
        node.cell = cell;
        node.depth = depth;
        node.parent = parent;
        index
    }

    /// Walks from `start` down to the leaf whose cell holds the point.
    pub(crate) fn descend(&self, start: u32, x: f32, y: f32) -> u32 {
        let mut node = start;
        while let Some(children) = self.nodes[node].children {
            node = children[self.nodes[node].cell.child_index(x, y)];
        }
        node
    }

    /// Pushes a record onto the head of a leaf's item list.
    pub(crate) fn link(&mut self, record: u32, node: u32) {
        let head = self.nodes[node].head;
        let item = &mut self.items[record];
        item.node = node;
        item.next = head;
        let node = &mut self.nodes[node];
        node.head = record;
        node.count += 1;
    }

    pub(crate) fn unlink(&mut self, record: u32) {
        let node = self.items[record].node;
        let next = self.items[record].next;
        let mut prev = NIL;
        let mut cursor = self.nodes[node].head;
        while cursor != NIL && cursor != record {
            prev = cursor;
            cursor = self.items[cursor].next;
        }
        debug_assert!(cursor == record, "record {} missing from node {}", record, node);
        if prev == NIL {
            self.nodes[node].head = next;
        } else {
            self.items[prev].next = next;
        }
        self.nodes[node].count -= 1;
        let item = &mut self.items[record];
        item.node = NIL;
        item.next = NIL;
    }

    /// Flags the node and every ancestor up to the first one that is already stale.
    pub(crate) fn mark_stale(&mut self, node: u32) {
        let mut current = Some(node);
        while let Some(index) = current {
            let node = &mut self.nodes[index];
            if node.stale {
                break;
            }
            node.stale = true;
            current = node.parent;
        }
    }

    pub(crate) fn can_subdivide(&self, node: u32) -> bool {
        let node = &self.nodes[node];
        node.is_leaf()
            && node.count as usize > self.config.node_capacity
            && (node.depth as usize) < self.config.max_depth
            && node.cell.width() >= self.config.min_size
            && node.cell.height() >= self.config.min_size
    }

    /// Turns a leaf into an internal node, re-homing its items into four new children.
    pub(crate) fn subdivide(&mut self, node: u32) -> [u32; 4] {
        let cell = self.nodes[node].cell;
        let depth = self.nodes[node].depth + 1;
        let mut children = [NIL; 4];
        for (index, child) in children.iter_mut().enumerate() {
            *child = self.alloc_node(cell.quadrant(index), depth, Some(node));
        }

        let mut cursor = self.nodes[node].head;
        while cursor != NIL {
            let next = self.items[cursor].next;
            let (x, y) = (self.items[cursor].x, self.items[cursor].y);
            self.link(cursor, children[cell.child_index(x, y)]);
            cursor = next;
        }

        let parent = &mut self.nodes[node];
        parent.head = NIL;
        parent.count = 0;
        parent.children = Some(children);
        parent.stale = true;
        children
    }

    /// Number of items below `node`, or `None` as soon as the running total exceeds `limit`.
    pub(crate) fn subtree_count_within(&self, node: u32, limit: usize) -> Option<usize> {
        let mut total = 0usize;
        let mut stack: NodeStack = smallvec![node];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            match node.children {
                Some(children) => stack.extend(children),
                None => {
                    total += node.count as usize;
                    if total > limit {
                        return None;
                    }
                }
            }
        }
        Some(total)
    }

    /// Releases every descendant of `node` and links their items directly onto it.
    pub(crate) fn coalesce(&mut self, node: u32) {
        let Some(children) = self.nodes[node].children.take() else {
            return;
        };
        let mut stack: NodeStack = NodeStack::from_slice(&children);
        while let Some(index) = stack.pop() {
            if let Some(grandchildren) = self.nodes[index].children {
                stack.extend(grandchildren);
            }
            let mut cursor = self.nodes[index].head;
            while cursor != NIL {
                let next = self.items[cursor].next;
                self.link(cursor, node);
                cursor = next;
            }
            self.nodes.release(index);
        }
        self.mark_stale(node);
    }
}
