pub mod error;
pub mod history;
pub mod quadtree;

pub use common::shapes;
pub use error::{QuadtreeError, QuadtreeResult};
