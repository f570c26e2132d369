//! In-memory representation of an ONNX model graph.
//!
//! A [`Graph`] owns the nodes, graph-level input and output declarations,
//! initializers and `value_info` entries of an ONNX `GraphProto`. Values are
//! identified by name, and the graph keeps an index from each value name to
//! the nodes which produce it, so that rewiring a producer or adding a node
//! does not require scanning the whole graph.

use std::mem;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use static_shape_onnx::onnx;

mod initializer;
mod node;
mod node_id;
mod value_info;


pub use initializer::Initializer;
pub use node::{AttrValue, Node};
pub use node_id::NodeId;
pub use value_info::{format_shape, Dimension, ElementType, Shape, TensorInfo};

use crate::model::{load_error, LoadError, LoadErrorImpl};

/// Graph of ONNX operators.
///
/// Nodes are stored in an arena in the order they appear in the model file.
/// New nodes are appended. The arena order is the order in which nodes are
/// serialized.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,

    /// Map of value name to the nodes which have it as an output.
    ///
    /// A well-formed graph has at most one producer per value. Additional
    /// entries are kept so that the validator can report them.
    producers: FxHashMap<String, SmallVec<[NodeId; 1]>>,

    inputs: Vec<TensorInfo>,
    outputs: Vec<TensorInfo>,
    value_info: Vec<TensorInfo>,
    initializers: Vec<Initializer>,

    /// Every name used in the graph, including node names. This may include
    /// names which are no longer used after a rename.
    names: FxHashSet<String>,

    /// Remaining fields of the `GraphProto` (name, doc string, sparse
    /// initializers, unknown fields etc.)
    rest: onnx::GraphProto,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Graph {
        Graph::default()
    }

    /// Create a graph from an ONNX `GraphProto`.
    pub fn from_proto(mut proto: onnx::GraphProto) -> Result<Graph, LoadError> {
        let mut graph = Graph::new();

        let graph_name = proto.name.clone();
        let load_values = |values: Vec<onnx::ValueInfoProto>, kind: &str| {
            values
                .into_iter()
                .map(|value| {
                    TensorInfo::from_proto(value).ok_or_else(|| {
                        load_error!(GraphError, graph_name.as_deref(), "{} has no name", kind)
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        };
        graph.inputs = load_values(mem::take(&mut proto.input), "graph input")?;
        graph.outputs = load_values(mem::take(&mut proto.output), "graph output")?;
        graph.value_info = load_values(mem::take(&mut proto.value_info), "value_info entry")?;

        for tensor in mem::take(&mut proto.initializer) {
            let init = Initializer::from_proto(tensor).ok_or_else(|| {
                load_error!(GraphError, graph_name.as_deref(), "initializer has no name")
            })?;
            graph.names.insert(init.name().to_string());
            graph.initializers.push(init);
        }

        for value in graph
            .inputs
            .iter()
            .chain(&graph.outputs)
            .chain(&graph.value_info)
        {
            graph.names.insert(value.name().to_string());
        }

        for node in mem::take(&mut proto.node) {
            if node.op_type.as_deref().unwrap_or_default().is_empty() {
                return Err(load_error!(
                    GraphError,
                    node.name.as_deref(),
                    "node has no operator type"
                ));
            }
            graph.add_node(Node::from_proto(node));
        }

        graph.rest = proto;
        Ok(graph)
    }

    /// Convert this graph back into an ONNX `GraphProto`.
    pub fn into_proto(self) -> onnx::GraphProto {
        let mut proto = self.rest;
        proto.node = self.nodes.into_iter().map(Node::into_proto).collect();
        proto.initializer = self
            .initializers
            .into_iter()
            .map(Initializer::into_proto)
            .collect();
        proto.input = self.inputs.into_iter().map(TensorInfo::into_proto).collect();
        proto.output = self.outputs.into_iter().map(TensorInfo::into_proto).collect();
        proto.value_info = self
            .value_info
            .into_iter()
            .map(TensorInfo::into_proto)
            .collect();
        proto
    }

    /// Return the graph's name, if set.
    pub fn name(&self) -> Option<&str> {
        self.rest.name.as_deref()
    }

    /// Iterate over nodes in serialization order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId::from_usize(i), node))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.as_usize())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Return a name for a node suitable for diagnostics.
    ///
    /// This is the node's name if it has one, or its operator type and ID
    /// otherwise.
    pub fn node_label(&self, id: NodeId) -> String {
        match self.node(id) {
            Some(node) => match node.name() {
                Some(name) => name.to_string(),
                None => format!("{} #{}", node.op_type(), id),
            },
            None => format!("#{}", id),
        }
    }

    pub fn inputs(&self) -> &[TensorInfo] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TensorInfo] {
        &self.outputs
    }

    pub fn value_info(&self) -> &[TensorInfo] {
        &self.value_info
    }

    pub fn initializers(&self) -> &[Initializer] {
        &self.initializers
    }

    pub fn input(&self, name: &str) -> Option<&TensorInfo> {
        self.inputs.iter().find(|info| info.name() == name)
    }

    pub fn input_mut(&mut self, name: &str) -> Option<&mut TensorInfo> {
        self.inputs.iter_mut().find(|info| info.name() == name)
    }

    pub fn output(&self, name: &str) -> Option<&TensorInfo> {
        self.outputs.iter().find(|info| info.name() == name)
    }

    pub fn output_mut(&mut self, name: &str) -> Option<&mut TensorInfo> {
        self.outputs.iter_mut().find(|info| info.name() == name)
    }

    pub fn initializer(&self, name: &str) -> Option<&Initializer> {
        self.initializers.iter().find(|init| init.name() == name)
    }

    /// Return the nodes which produce the value `name`.
    pub fn producers(&self, name: &str) -> &[NodeId] {
        self.producers
            .get(name)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Return the nodes which read the value `name`, either as an input or
    /// as a capture.
    pub fn consumers(&self, name: &str) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, node)| node.dependencies().any(|dep| dep == name))
            .map(|(id, _)| id)
            .collect()
    }

    /// Return true if `name` is used anywhere in the graph.
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Return `base` if it is not used in the graph, or else the first of
    /// `base_1`, `base_2` ... that is not.
    ///
    /// The returned name is reserved, so repeated calls with the same `base`
    /// return different names.
    pub fn unique_name(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut suffix = 0;
        while self.names.contains(&name) {
            suffix += 1;
            name = format!("{}_{}", base, suffix);
        }
        self.names.insert(name.clone());
        name
    }

    /// Append a node to the graph.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId::from_usize(self.nodes.len());
        for output in node.outputs().iter().filter(|name| !name.is_empty()) {
            self.producers.entry(output.clone()).or_default().push(id);
        }
        for name in node
            .inputs()
            .iter()
            .chain(node.outputs())
            .filter(|name| !name.is_empty())
        {
            self.names.insert(name.clone());
        }
        if let Some(name) = node.name() {
            self.names.insert(name.to_string());
        }
        // Generated names must not be shadowed inside subgraphs either.
        for name in node.subgraph_names().into_iter().filter(|name| !name.is_empty()) {
            self.names.insert(name.to_string());
        }
        self.nodes.push(node);
        id
    }

    pub fn add_initializer(&mut self, init: Initializer) {
        self.names.insert(init.name().to_string());
        self.initializers.push(init);
    }

    pub fn add_input(&mut self, info: TensorInfo) {
        self.names.insert(info.name().to_string());
        self.inputs.push(info);
    }

    pub fn add_output(&mut self, info: TensorInfo) {
        self.names.insert(info.name().to_string());
        self.outputs.push(info);
    }

    pub fn add_value_info(&mut self, info: TensorInfo) {
        self.names.insert(info.name().to_string());
        self.value_info.push(info);
    }

    /// Rename output `from` of node `id` to `to`, updating the producer
    /// index. Returns false if the node has no such output.
    pub fn rename_output(&mut self, id: NodeId, from: &str, to: &str) -> bool {
        let Some(node) = self.nodes.get_mut(id.as_usize()) else {
            return false;
        };
        if !node.rename_output(from, to) {
            return false;
        }

        if let Some(ids) = self.producers.get_mut(from) {
            ids.retain(|producer| *producer != id);
            if ids.is_empty() {
                self.producers.remove(from);
            }
        }
        self.producers.entry(to.to_string()).or_default().push(id);
        self.names.insert(to.to_string());
        true
    }

    /// Make every node that reads `from`, except for those in `exclude`, read
    /// `to` instead. Returns the IDs of the updated nodes.
    pub fn replace_uses(&mut self, from: &str, to: &str, exclude: &[NodeId]) -> Vec<NodeId> {
        let mut updated = Vec::new();
        for (i, node) in self.nodes.iter_mut().enumerate() {
            let id = NodeId::from_usize(i);
            if exclude.contains(&id) {
                continue;
            }
            if node.replace_input(from, to) {
                updated.push(id);
            }
        }
        if !updated.is_empty() {
            self.names.insert(to.to_string());
        }
        updated
    }

    /// Rename the `value_info` entry for `from`, if there is one.
    pub fn rename_value_info(&mut self, from: &str, to: &str) -> bool {
        match self.value_info.iter_mut().find(|info| info.name() == from) {
            Some(info) => {
                info.set_name(to);
                self.names.insert(to.to_string());
                true
            }
            None => false,
        }
    }
}
