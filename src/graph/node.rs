use rustc_hash::FxHashSet;
use static_shape_onnx::onnx;

/// Value of a node attribute.
#[derive(Clone, Debug)]
pub enum AttrValue {
    Float(f32),
    Graph(onnx::GraphProto),
    Int(i64),
    Ints(Vec<i64>),
    String(String),
    Tensor(onnx::TensorProto),
}

macro_rules! attr_from {
    ($variant:ident, $type:ty) => {
        impl From<$type> for AttrValue {
            fn from(val: $type) -> Self {
                AttrValue::$variant(val)
            }
        }
    };
}

attr_from!(Float, f32);
attr_from!(Graph, onnx::GraphProto);
attr_from!(Int, i64);
attr_from!(Ints, Vec<i64>);
attr_from!(String, String);
attr_from!(Tensor, onnx::TensorProto);

fn create_attr(name: &str, value: AttrValue) -> onnx::AttributeProto {
    let mut attr = onnx::AttributeProto {
        name: Some(name.to_string()),
        ..Default::default()
    };
    let attr_type = match value {
        AttrValue::Float(val) => {
            attr.f = Some(val);
            onnx::AttributeType::FLOAT
        }
        AttrValue::Graph(val) => {
            attr.g = Some(val);
            onnx::AttributeType::GRAPH
        }
        AttrValue::Int(val) => {
            attr.i = Some(val);
            onnx::AttributeType::INT
        }
        AttrValue::Ints(val) => {
            attr.ints = val;
            onnx::AttributeType::INTS
        }
        AttrValue::String(val) => {
            attr.s = Some(val.into_bytes());
            onnx::AttributeType::STRING
        }
        AttrValue::Tensor(val) => {
            attr.t = Some(val);
            onnx::AttributeType::TENSOR
        }
    };
    attr.r#type = Some(attr_type);
    attr
}

/// An operator in a [`Graph`](super::Graph).
///
/// Nodes refer to the values they consume and produce by name. Control flow
/// operators (`If`, `Loop`, `Scan`) carry subgraphs as attributes, and these
/// subgraphs may read values from the enclosing graph. The names of such
/// values are the node's _captures_ and are treated as additional inputs.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    proto: onnx::NodeProto,
    captures: Vec<String>,
}

impl Node {
    /// Create a node with a given operator type, eg. `"Concat"`.
    pub fn new(op_type: &str) -> Node {
        Node {
            proto: onnx::NodeProto {
                op_type: Some(op_type.to_string()),
                ..Default::default()
            },
            captures: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.proto.name = Some(name.to_string());
        self
    }

    pub fn with_input(mut self, name: &str) -> Self {
        self.proto.input.push(name.to_string());
        self
    }

    pub fn with_output(mut self, name: &str) -> Self {
        self.proto.output.push(name.to_string());
        self
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        let value = value.into();
        if let AttrValue::Graph(graph) = &value {
            add_captures(graph, &mut self.captures);
        }
        self.proto.attribute.push(create_attr(name, value));
        self
    }

    pub(crate) fn from_proto(proto: onnx::NodeProto) -> Node {
        let mut captures = Vec::new();
        for graph in subgraphs(&proto) {
            add_captures(graph, &mut captures);
        }
        Node { proto, captures }
    }

    pub(crate) fn into_proto(self) -> onnx::NodeProto {
        self.proto
    }

    pub fn name(&self) -> Option<&str> {
        self.proto.name.as_deref().filter(|name| !name.is_empty())
    }

    pub fn op_type(&self) -> &str {
        self.proto.op_type.as_deref().unwrap_or_default()
    }

    /// Names of input values. Empty names denote omitted optional inputs.
    pub fn inputs(&self) -> &[String] {
        &self.proto.input
    }

    /// Names of output values. Empty names denote unused optional outputs.
    pub fn outputs(&self) -> &[String] {
        &self.proto.output
    }

    /// Names of values from enclosing scopes that this node's subgraphs read.
    pub fn captures(&self) -> &[String] {
        &self.captures
    }

    /// Return all values this node needs before it can run: its non-empty
    /// inputs followed by its captures.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.proto
            .input
            .iter()
            .filter(|name| !name.is_empty())
            .chain(&self.captures)
            .map(|name| name.as_str())
    }

    pub fn attr(&self, name: &str) -> Option<&onnx::AttributeProto> {
        self.proto
            .attribute
            .iter()
            .find(|attr| attr.name.as_deref() == Some(name))
    }

    pub fn attr_int(&self, name: &str) -> Option<i64> {
        self.attr(name)?.i
    }

    /// Return the subgraphs held in this node's attributes.
    pub fn subgraphs(&self) -> impl Iterator<Item = &onnx::GraphProto> {
        subgraphs(&self.proto)
    }

    /// Return the value and node names defined inside this node's
    /// subgraphs, at any depth.
    pub(crate) fn subgraph_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for graph in self.subgraphs() {
            add_scoped_names(graph, &mut names);
        }
        names
    }

    /// Replace output `from` with `to`. Returns false if there is no such
    /// output.
    pub(crate) fn rename_output(&mut self, from: &str, to: &str) -> bool {
        let mut renamed = false;
        for output in self.proto.output.iter_mut().filter(|name| *name == from) {
            *output = to.to_string();
            renamed = true;
        }
        renamed
    }

    /// Replace every use of value `from` with `to`, including uses inside
    /// subgraphs. Returns true if anything changed.
    pub(crate) fn replace_input(&mut self, from: &str, to: &str) -> bool {
        let mut replaced = false;
        for input in self.proto.input.iter_mut().filter(|name| *name == from) {
            *input = to.to_string();
            replaced = true;
        }

        if let Some(pos) = self.captures.iter().position(|name| name == from) {
            for attr in &mut self.proto.attribute {
                for graph in attr.g.iter_mut().chain(attr.graphs.iter_mut()) {
                    replace_in_subgraph(graph, from, to);
                }
            }
            if self.captures.iter().any(|name| name == to) {
                self.captures.remove(pos);
            } else {
                self.captures[pos] = to.to_string();
            }
            replaced = true;
        }

        replaced
    }
}

fn subgraphs(node: &onnx::NodeProto) -> impl Iterator<Item = &onnx::GraphProto> {
    node.attribute
        .iter()
        .flat_map(|attr| attr.g.iter().chain(attr.graphs.iter()))
}

/// Return the names defined within a graph's own scope.
fn local_names(graph: &onnx::GraphProto) -> FxHashSet<&str> {
    let inputs = graph.input.iter().filter_map(|value| value.name.as_deref());
    let initializers = graph.initializer.iter().filter_map(|t| t.name.as_deref());
    let node_outputs = graph.node.iter().flat_map(|n| n.output.iter().map(|o| o.as_str()));
    inputs.chain(initializers).chain(node_outputs).collect()
}

fn add_scoped_names<'a>(graph: &'a onnx::GraphProto, names: &mut Vec<&'a str>) {
    names.extend(local_names(graph));
    for node in &graph.node {
        names.extend(node.name.as_deref());
        for subgraph in subgraphs(node) {
            add_scoped_names(subgraph, names);
        }
    }
}

/// Add names which `graph` reads from enclosing scopes to `captures`.
fn add_captures(graph: &onnx::GraphProto, captures: &mut Vec<String>) {
    let defined = local_names(graph);
    let mut add = |name: &str| {
        if !name.is_empty() && !defined.contains(name) && !captures.iter().any(|c| c == name) {
            captures.push(name.to_string());
        }
    };

    for node in &graph.node {
        for input in &node.input {
            add(input);
        }

        let mut nested = Vec::new();
        for subgraph in subgraphs(node) {
            add_captures(subgraph, &mut nested);
        }
        for name in &nested {
            add(name);
        }
    }

    // Graph outputs may also be values passed through from the outer scope.
    for output in &graph.output {
        if let Some(name) = output.name.as_deref() {
            add(name);
        }
    }
}

fn replace_in_subgraph(graph: &mut onnx::GraphProto, from: &str, to: &str) {
    if local_names(graph).contains(from) {
        // `from` is shadowed by a local definition.
        return;
    }
    for node in &mut graph.node {
        for input in node.input.iter_mut().filter(|name| *name == from) {
            *input = to.to_string();
        }
        for attr in &mut node.attribute {
            for subgraph in attr.g.iter_mut().chain(attr.graphs.iter_mut()) {
                replace_in_subgraph(subgraph, from, to);
            }
        }
    }
    for output in &mut graph.output {
        if output.name.as_deref() == Some(from) {
            output.name = Some(to.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use static_shape_onnx::onnx;

    use super::Node;

    fn value(name: &str) -> onnx::ValueInfoProto {
        onnx::ValueInfoProto {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// Create a subgraph which adds outer value `outer` to its own input.
    fn body_graph(outer: &str) -> onnx::GraphProto {
        let add = Node::new("Add")
            .with_input("i")
            .with_input(outer)
            .with_output("sum")
            .into_proto();
        onnx::GraphProto {
            node: vec![add],
            input: vec![value("i")],
            output: vec![value("sum")],
            ..Default::default()
        }
    }

    #[test]
    fn test_builder() {
        let node = Node::new("Concat")
            .with_name("concat")
            .with_input("a")
            .with_input("")
            .with_output("c")
            .with_attr("axis", 0i64);

        assert_eq!(node.op_type(), "Concat");
        assert_eq!(node.name(), Some("concat"));
        assert_eq!(node.attr_int("axis"), Some(0));
        assert_eq!(node.attr_int("missing"), None);
        assert_eq!(node.dependencies().collect::<Vec<_>>(), ["a"]);
        assert_eq!(
            node.attr("axis").and_then(|a| a.r#type),
            Some(onnx::AttributeType::INT)
        );
    }

    #[test]
    fn test_captures() {
        let node = Node::new("Loop")
            .with_input("count")
            .with_output("out")
            .with_attr("body", body_graph("weights"));
        assert_eq!(node.captures(), ["weights"]);
        assert_eq!(node.dependencies().collect::<Vec<_>>(), ["count", "weights"]);

        // Captures are also found when loading a node from a proto.
        let node = Node::from_proto(node.into_proto());
        assert_eq!(node.captures(), ["weights"]);
    }

    #[test]
    fn test_nested_captures() {
        let inner_if = Node::new("If")
            .with_input("cond")
            .with_output("sum")
            .with_attr("then_branch", body_graph("bias"));
        let outer_body = onnx::GraphProto {
            node: vec![inner_if.into_proto()],
            input: vec![value("cond")],
            output: vec![value("sum")],
            ..Default::default()
        };
        let node = Node::new("Loop").with_attr("body", outer_body);

        // "i" is an input of the innermost graph, "cond" of the middle one.
        assert_eq!(node.captures(), ["bias"]);
    }

    #[test]
    fn test_replace_input() {
        let mut node = Node::new("Loop")
            .with_input("x")
            .with_attr("body", body_graph("x"));

        assert!(node.replace_input("x", "y"));
        assert_eq!(node.inputs(), ["y"]);
        assert_eq!(node.captures(), ["y"]);

        let body = node.subgraphs().next().unwrap();
        assert_eq!(body.node[0].input, ["i", "y"]);

        assert!(!node.replace_input("missing", "z"));
    }

    #[test]
    fn test_replace_input_respects_shadowing() {
        // The subgraph's own input is also called "x".
        let mut body = body_graph("w");
        body.input[0].name = Some("x".into());
        body.node[0].input[0] = "x".into();

        let mut node = Node::new("Loop").with_input("x").with_attr("body", body);
        node.replace_input("x", "y");

        let body = node.subgraphs().next().unwrap();
        assert_eq!(body.node[0].input, ["x", "w"]);
    }

    #[test]
    fn test_rename_output() {
        let mut node = Node::new("Relu").with_input("a").with_output("b");
        assert!(node.rename_output("b", "b2"));
        assert_eq!(node.outputs(), ["b2"]);
        assert!(!node.rename_output("b", "b3"));
    }
}
