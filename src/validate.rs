use std::error::Error;
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::graph::{Graph, NodeId};

/// Options for [`validate`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidateOptions {
    /// Accept graph inputs which no node needed to compute the outputs reads.
    pub allow_unused_inputs: bool,

    /// Names of inputs, outputs or `value_info` entries which must have a
    /// fully static shape.
    pub require_static: Vec<String>,
}

/// A structural problem found in a graph.
#[derive(Clone, Debug, PartialEq)]
pub enum Violation {
    /// A node reads a value which is not a graph input, initializer or node
    /// output.
    DanglingInput { node: String, tensor: String },

    /// A node reads a value which is only produced by a later node.
    UsedBeforeProduced { node: String, tensor: String },

    /// A value is produced more than once. `producers` lists the producing
    /// nodes, preceded by "graph input" or "initializer" if a node output
    /// reuses the name of one.
    DuplicateProducer {
        tensor: String,
        producers: Vec<String>,
    },

    /// Two graph inputs, or two graph outputs, have the same name.
    DuplicateName { tensor: String },

    /// These nodes depend on each other.
    Cycle { nodes: Vec<String> },

    /// A graph output is not produced by any node, input or initializer.
    OutputNotProduced { tensor: String },

    /// A graph input is not read by any node needed to compute the outputs.
    UnusedInput { tensor: String },

    /// A tensor that must be static has a dynamic or unknown shape.
    NotStatic { tensor: String, shape: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingInput { node, tensor } => write!(
                f,
                "node \"{}\" reads \"{}\" which is not defined anywhere in the graph",
                node, tensor
            ),
            Self::UsedBeforeProduced { node, tensor } => write!(
                f,
                "node \"{}\" reads \"{}\" before it is produced",
                node, tensor
            ),
            Self::DuplicateProducer { tensor, producers } => write!(
                f,
                "\"{}\" is produced more than once, by {}",
                tensor,
                producers.join(", ")
            ),
            Self::DuplicateName { tensor } => {
                write!(f, "\"{}\" is declared more than once", tensor)
            }
            Self::Cycle { nodes } => write!(f, "cycle between nodes {}", nodes.join(", ")),
            Self::OutputNotProduced { tensor } => {
                write!(f, "graph output \"{}\" is never produced", tensor)
            }
            Self::UnusedInput { tensor } => write!(f, "graph input \"{}\" is unused", tensor),
            Self::NotStatic { tensor, shape } => {
                write!(f, "\"{}\" has non-static shape {}", tensor, shape)
            }
        }
    }
}

/// Error returned when a graph fails validation. Lists every violation
/// found.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "graph validation failed with {} violation(s):",
            self.violations.len()
        )?;
        for violation in &self.violations {
            write!(f, "\n  - {}", violation)?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}

/// Check that `graph` is well-formed.
pub fn validate(graph: &Graph, opts: &ValidateOptions) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    check_declarations(graph, &mut violations);
    check_node_inputs(graph, &mut violations);
    check_producers(graph, &mut violations);
    check_cycles(graph, &mut violations);
    check_outputs(graph, opts, &mut violations);

    for name in &opts.require_static {
        let info = graph
            .input(name)
            .or_else(|| graph.output(name))
            .or_else(|| graph.value_info().iter().find(|info| info.name() == name));
        if let Some(info) = info {
            if !info.is_static() {
                violations.push(Violation::NotStatic {
                    tensor: name.clone(),
                    shape: info.shape_string(),
                });
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}

fn check_declarations(graph: &Graph, violations: &mut Vec<Violation>) {
    for values in [graph.inputs(), graph.outputs()] {
        let mut seen = FxHashSet::default();
        let mut reported = FxHashSet::default();
        for info in values {
            if !seen.insert(info.name()) && reported.insert(info.name()) {
                violations.push(Violation::DuplicateName {
                    tensor: info.name().to_string(),
                });
            }
        }
    }
}

/// Check that every value a node reads is defined before the node.
fn check_node_inputs(graph: &Graph, violations: &mut Vec<Violation>) {
    let mut available: FxHashSet<&str> = graph
        .inputs()
        .iter()
        .map(|info| info.name())
        .chain(graph.initializers().iter().map(|init| init.name()))
        .collect();

    for (id, node) in graph.nodes() {
        for dep in node.dependencies() {
            if available.contains(dep) {
                continue;
            }
            let node = graph.node_label(id);
            let tensor = dep.to_string();
            if graph.producers(dep).is_empty() {
                violations.push(Violation::DanglingInput { node, tensor });
            } else {
                violations.push(Violation::UsedBeforeProduced { node, tensor });
            }
        }
        available.extend(
            node.outputs()
                .iter()
                .map(|name| name.as_str())
                .filter(|name| !name.is_empty()),
        );
    }
}

fn check_producers(graph: &Graph, violations: &mut Vec<Violation>) {
    let mut reported = FxHashSet::default();
    for (_, node) in graph.nodes() {
        for output in node.outputs().iter().filter(|name| !name.is_empty()) {
            // An input with an initializer is a single value with a default.
            let source = if graph.input(output).is_some() {
                Some("graph input")
            } else if graph.initializer(output).is_some() {
                Some("initializer")
            } else {
                None
            };
            let producers = graph.producers(output);
            let count = producers.len() + usize::from(source.is_some());
            if count > 1 && reported.insert(output.as_str()) {
                violations.push(Violation::DuplicateProducer {
                    tensor: output.clone(),
                    producers: source
                        .map(str::to_string)
                        .into_iter()
                        .chain(producers.iter().map(|id| graph.node_label(*id)))
                        .collect(),
                });
            }
        }
    }
}

/// Detect cycles by topologically sorting the nodes. Any nodes left over
/// when no more nodes have all their dependencies resolved are part of, or
/// depend on, a cycle.
///
/// Readers of a graph input or initializer use that value, even if a node
/// also produces the name, so those reads add no edge.
fn check_cycles(graph: &Graph, violations: &mut Vec<Violation>) {
    let mut pending_deps: FxHashMap<NodeId, usize> = FxHashMap::default();
    let mut dependents: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();

    for (id, node) in graph.nodes() {
        let mut count = 0;
        for dep in node.dependencies() {
            if graph.input(dep).is_some() || graph.initializer(dep).is_some() {
                continue;
            }
            let Some(&producer) = graph.producers(dep).first() else {
                continue;
            };
            count += 1;
            dependents.entry(producer).or_default().push(id);
        }
        pending_deps.insert(id, count);
    }

    let mut frontier: Vec<NodeId> = graph
        .nodes()
        .map(|(id, _)| id)
        .filter(|id| pending_deps.get(id) == Some(&0))
        .collect();
    let mut sorted = 0;

    while let Some(id) = frontier.pop() {
        sorted += 1;
        let Some(deps) = dependents.get(&id) else {
            continue;
        };
        for dependent in deps {
            if let Some(count) = pending_deps.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    frontier.push(*dependent);
                }
            }
        }
    }

    if sorted < graph.node_count() {
        let nodes = graph
            .nodes()
            .map(|(id, _)| id)
            .filter(|id| pending_deps.get(id).is_some_and(|count| *count > 0))
            .map(|id| graph.node_label(id))
            .collect();
        violations.push(Violation::Cycle { nodes });
    }
}

/// Check that every output is produced, and that every input is needed to
/// compute some output.
fn check_outputs(graph: &Graph, opts: &ValidateOptions, violations: &mut Vec<Violation>) {
    let is_input = |name: &str| graph.input(name).is_some();
    let is_initializer = |name: &str| graph.initializer(name).is_some();

    for output in graph.outputs() {
        let name = output.name();
        if graph.producers(name).is_empty() && !is_input(name) && !is_initializer(name) {
            violations.push(Violation::OutputNotProduced {
                tensor: name.to_string(),
            });
        }
    }

    if opts.allow_unused_inputs {
        return;
    }

    // Walk backwards from the outputs to find the values they depend on.
    let mut used: FxHashSet<&str> = FxHashSet::default();
    let mut visited: FxHashSet<NodeId> = FxHashSet::default();
    let mut stack: Vec<&str> = graph.outputs().iter().map(|info| info.name()).collect();
    while let Some(name) = stack.pop() {
        if !used.insert(name) {
            continue;
        }
        for &id in graph.producers(name) {
            if !visited.insert(id) {
                continue;
            }
            if let Some(node) = graph.node(id) {
                stack.extend(node.dependencies());
            }
        }
    }

    for input in graph.inputs() {
        let name = input.name();
        if !used.contains(name) && !is_initializer(name) {
            violations.push(Violation::UnusedInput {
                tensor: name.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use static_shape_testing::TestCases;

    use super::{validate, ValidateOptions, Violation};
    use crate::graph::{ElementType, Graph, Initializer, Node};
    use crate::test_util::{fixed, sym, tensor, tts_model};

    fn identity(name: &str, input: &str, output: &str) -> Node {
        Node::new("Identity")
            .with_name(name)
            .with_input(input)
            .with_output(output)
    }

    fn graph_with(inputs: &[&str], outputs: &[&str], nodes: Vec<Node>) -> Graph {
        let mut graph = Graph::new();
        for name in inputs {
            graph.add_input(tensor(name, ElementType::Float, &[sym("n")]));
        }
        for name in outputs {
            graph.add_output(tensor(name, ElementType::Float, &[sym("n")]));
        }
        for node in nodes {
            graph.add_node(node);
        }
        graph
    }

    #[test]
    fn test_valid_graph() {
        let model = tts_model();
        assert!(validate(model.graph(), &ValidateOptions::default()).is_ok());
    }

    #[test]
    fn test_violations() {
        #[derive(Debug)]
        struct Case {
            graph: Graph,
            expected: Vec<Violation>,
        }

        let cases = [
            Case {
                graph: graph_with(&["x"], &["y"], vec![identity("a", "missing", "y")]),
                expected: vec![
                    Violation::DanglingInput {
                        node: "a".into(),
                        tensor: "missing".into(),
                    },
                    Violation::UnusedInput { tensor: "x".into() },
                ],
            },
            Case {
                graph: graph_with(
                    &["x"],
                    &["z"],
                    vec![identity("a", "y", "z"), identity("b", "x", "y")],
                ),
                expected: vec![Violation::UsedBeforeProduced {
                    node: "a".into(),
                    tensor: "y".into(),
                }],
            },
            Case {
                graph: graph_with(
                    &["x"],
                    &["y"],
                    vec![identity("a", "x", "y"), identity("b", "x", "y")],
                ),
                expected: vec![Violation::DuplicateProducer {
                    tensor: "y".into(),
                    producers: vec!["a".into(), "b".into()],
                }],
            },
            // `b` overwrites the graph input `a` and `c` read.
            Case {
                graph: graph_with(
                    &["x"],
                    &["y"],
                    vec![
                        identity("a", "x", "x2"),
                        identity("b", "x2", "x"),
                        identity("c", "x", "y"),
                    ],
                ),
                expected: vec![Violation::DuplicateProducer {
                    tensor: "x".into(),
                    producers: vec!["graph input".into(), "b".into()],
                }],
            },
            Case {
                graph: {
                    let mut graph = graph_with(
                        &["x"],
                        &["y"],
                        vec![identity("a", "x", "scale"), identity("b", "scale", "y")],
                    );
                    graph.add_initializer(Initializer::from_i64s("scale", &[2]));
                    graph
                },
                expected: vec![Violation::DuplicateProducer {
                    tensor: "scale".into(),
                    producers: vec!["initializer".into(), "a".into()],
                }],
            },
            Case {
                graph: graph_with(&["x", "x"], &["y"], vec![identity("a", "x", "y")]),
                expected: vec![Violation::DuplicateName { tensor: "x".into() }],
            },
            Case {
                graph: graph_with(&["x"], &["y", "w"], vec![identity("a", "x", "y")]),
                expected: vec![Violation::OutputNotProduced { tensor: "w".into() }],
            },
            Case {
                graph: graph_with(
                    &["x"],
                    &["z"],
                    vec![
                        Node::new("Add")
                            .with_name("a")
                            .with_input("x")
                            .with_input("z")
                            .with_output("y"),
                        identity("b", "y", "z"),
                    ],
                ),
                expected: vec![
                    Violation::UsedBeforeProduced {
                        node: "a".into(),
                        tensor: "z".into(),
                    },
                    Violation::Cycle {
                        nodes: vec!["a".into(), "b".into()],
                    },
                ],
            },
            Case {
                graph: graph_with(&["x", "unused"], &["y"], vec![identity("a", "x", "y")]),
                expected: vec![Violation::UnusedInput {
                    tensor: "unused".into(),
                }],
            },
        ];

        cases.test_each(|case| {
            let err = validate(&case.graph, &ValidateOptions::default())
                .err()
                .unwrap();
            assert_eq!(err.violations(), case.expected);
        })
    }

    #[test]
    fn test_all_violations_are_reported() {
        let graph = graph_with(
            &["x"],
            &["y", "w"],
            vec![identity("a", "missing", "y"), identity("b", "x", "y")],
        );
        let err = validate(&graph, &ValidateOptions::default())
            .err()
            .unwrap();
        assert_eq!(err.violations().len(), 3);

        let message = err.to_string();
        assert!(message.contains("3 violation(s)"));
        assert!(message.contains("\"missing\""));
        assert!(message.contains("\"w\""));
    }

    #[test]
    fn test_unused_inputs() {
        let graph = graph_with(&["x", "style"], &["y"], vec![identity("a", "x", "y")]);
        let opts = ValidateOptions {
            allow_unused_inputs: true,
            ..Default::default()
        };
        assert!(validate(&graph, &opts).is_ok());

        // Inputs which only feed nodes that no output needs are unused.
        let graph = graph_with(
            &["x", "style"],
            &["y"],
            vec![identity("a", "x", "y"), identity("b", "style", "dead")],
        );
        let err = validate(&graph, &ValidateOptions::default())
            .err()
            .unwrap();
        assert_eq!(
            err.violations(),
            [Violation::UnusedInput {
                tensor: "style".into()
            }]
        );

        // An input with a default value in an initializer is optional.
        let mut graph = graph_with(&["x", "scale"], &["y"], vec![identity("a", "x", "y")]);
        graph.add_initializer(Initializer::from_i64s("scale", &[1]));
        assert!(validate(&graph, &ValidateOptions::default()).is_ok());
    }

    #[test]
    fn test_omitted_optional_inputs() {
        let graph = graph_with(
            &["x"],
            &["y"],
            vec![Node::new("Clip")
                .with_name("clip")
                .with_input("x")
                .with_input("")
                .with_output("y")],
        );
        assert!(validate(&graph, &ValidateOptions::default()).is_ok());
    }

    #[test]
    fn test_subgraph_captures() {
        let mut branch = Graph::new();
        branch.add_output(tensor("branch_out", ElementType::Float, &[sym("n")]));
        branch.add_node(identity("inner", "outer_value", "branch_out"));
        let branch = branch.into_proto();

        let make_graph = |with_producer: bool| {
            let mut nodes = Vec::new();
            if with_producer {
                nodes.push(identity("producer", "x", "outer_value"));
            }
            nodes.push(
                Node::new("If")
                    .with_name("if")
                    .with_input("cond")
                    .with_output("y")
                    .with_attr("then_branch", branch.clone())
                    .with_attr("else_branch", branch.clone()),
            );
            graph_with(&["x", "cond"], &["y"], nodes)
        };

        assert!(validate(&make_graph(true), &ValidateOptions::default()).is_ok());

        let err = validate(&make_graph(false), &ValidateOptions::default())
            .err()
            .unwrap();
        assert!(err.violations().contains(&Violation::DanglingInput {
            node: "if".into(),
            tensor: "outer_value".into(),
        }));
    }

    #[test]
    fn test_require_static() {
        let mut model = tts_model();
        model
            .graph_mut()
            .output_mut("audio")
            .unwrap()
            .set_shape(&[fixed(100)]);

        let opts = ValidateOptions {
            require_static: vec!["tokens".into(), "audio".into()],
            ..Default::default()
        };
        let err = validate(model.graph(), &opts).err().unwrap();
        assert_eq!(
            err.violations(),
            [Violation::NotStatic {
                tensor: "tokens".into(),
                shape: "[1, seq_len]".into(),
            }]
        );
    }
}
