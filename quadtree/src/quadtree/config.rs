use common::shapes::ShapeEnum;

#[derive(Debug, Clone)]
pub struct Config {
    /// Slots reserved up front in the node and item pools.
    pub pool_size: usize,
    /// A leaf holding more items than this is split on the next `update`.
    pub node_capacity: usize,
    /// Leaves at this depth never split and accept overflow.
    pub max_depth: usize,
    /// Leaves narrower than this on either axis never split. `0.0` disables the check.
    pub min_size: f32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pool_size: 4000,
            node_capacity: 16,
            max_depth: 6,
            min_size: 0.0,
        }
    }
}

impl Config {
    pub(crate) fn sanitized(mut self) -> Self {
        self.node_capacity = self.node_capacity.max(1);
        if !(self.min_size.is_finite() && self.min_size > 0.0) {
            self.min_size = 0.0;
        }
        self
    }
}

#[derive(Clone, Debug)]
pub struct RelocationRequest {
    pub value: u32,
    pub shape: ShapeEnum,
}
