/// ID of a node in a [`Graph`](crate::graph::Graph).
///
/// Node IDs index the graph's node arena. Nodes are never removed, so an ID
/// stays valid for the lifetime of the graph it was issued by.
#[derive(Copy, Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(u32);

impl NodeId {
    /// Return the underlying u32 value of the ID.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Return the underlying ID value as a usize, for slice indexing.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_usize(value: usize) -> NodeId {
        // Graphs with more than `u32::MAX` nodes cannot be encoded anyway,
        // as protobuf messages are limited to 2GB.
        NodeId(value as u32)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}
