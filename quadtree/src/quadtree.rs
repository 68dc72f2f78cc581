//! Adaptive quadtree over caller-identified shapes.
//!
//! Mutations (`insert`, `relocate`, `delete`) take effect on item membership
//! immediately but only queue structural work. `update` runs that work: it grows
//! the bounds for items that left them, splits overfull leaves, coalesces drained
//! subtrees and tightens node bounds. Queries are complete at any point in between.

mod config;
mod core;
mod inspect;
mod maintenance;
mod node;
mod pool;
mod query;
pub mod types;

pub use config::{Config, RelocationRequest};
pub use types::{Membership, NodeInfo, StorageCounts};

use self::core::ItemRecord;
use fxhash::{FxHashMap, FxHashSet};
use node::Node;
use pool::Pool;
use types::{LargestExtent, RectExtent};

pub struct QuadTree {
    config: Config,
    /// Outer bounds; `None` until the first insert (or after the last delete).
    bounds: Option<RectExtent>,
    root: u32,
    nodes: Pool<Node>,
    items: Pool<ItemRecord>,
    owner_map: FxHashMap<u32, u32>,
    /// Records whose point lies outside `bounds`, waiting for the next `update` to grow them.
    pending: FxHashSet<u32>,
    to_split: FxHashSet<u32>,
    to_clean: FxHashSet<u32>,
    largest: LargestExtent,
}
