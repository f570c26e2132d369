//! Fix the length of a graph output.
//!
//! In [declarative](StabilizeMode::Declarative) mode only the output's
//! declared shape is changed. In [structural](StabilizeMode::Structural) mode
//! the graph is rewritten so that the output is padded with zeros, or
//! truncated, to the fixed length at runtime:
//!
//! ```text
//! before:  producer -> audio
//!
//! after:   producer -> audio_unpadded --+
//!                                       Concat(axis) -> audio_concat -> Slice([0, M)) -> audio
//!          zeros[M] --------------------+
//! ```
//!
//! For a runtime length `k <= M` the output is the original `k` values
//! followed by `M - k` zeros. For `k > M` it is the first `M` values.

use log::{debug, info, warn};

use crate::graph::{Dimension, ElementType, Initializer, Node};
use crate::model::Model;
use crate::rewrite_error::RewriteError;
use crate::selector::TensorSelector;

/// Minimum version of the default opset that supports `Slice` with bounds
/// passed as inputs.
const MIN_STRUCTURAL_OPSET: i64 = 10;

/// Largest zero-filled constant that can be stored. Protobuf messages, and
/// so ONNX models without external data, are limited to 2GB.
const MAX_CONSTANT_BYTES: usize = i32::MAX as usize;

/// Strategy used to fix the length of an output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum StabilizeMode {
    /// Change the declared shape only.
    #[default]
    Declarative,

    /// Insert nodes which pad or truncate the output.
    Structural,
}

/// What to do if the output may be longer than the fixed length.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Keep only the first `length` values.
    #[default]
    Truncate,

    /// Fail if the output's declared length exceeds the fixed length.
    Reject,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StabilizeOptions {
    pub mode: StabilizeMode,

    /// Fixed number of elements in the output.
    pub length: usize,

    /// Axis along which the output is padded.
    pub axis: i64,

    pub overflow: OverflowPolicy,
}

impl Default for StabilizeOptions {
    fn default() -> Self {
        StabilizeOptions {
            mode: StabilizeMode::Declarative,
            length: 192_000,
            axis: 0,
            overflow: OverflowPolicy::Truncate,
        }
    }
}

/// Summary of the changes made by [`stabilize_output`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StabilizeReport {
    /// Name of the output that was fixed.
    pub output: String,

    pub mode: StabilizeMode,

    /// New name of the value produced by the original producer.
    pub intermediate: Option<String>,

    /// Names of nodes added to the graph.
    pub added_nodes: Vec<String>,

    /// Names of initializers added to the graph. The zero-filled constant is
    /// first.
    pub added_initializers: Vec<String>,

    /// Labels of existing nodes that were rewired to read the intermediate
    /// value.
    pub rewired: Vec<String>,
}

/// Fix the length of the output selected by `selector`.
pub fn stabilize_output(
    model: &mut Model,
    selector: &TensorSelector,
    opts: &StabilizeOptions,
) -> Result<StabilizeReport, RewriteError> {
    if opts.length == 0 {
        return Err(RewriteError::InvalidOption(
            "output length must be greater than zero".into(),
        ));
    }
    let Ok(end) = i64::try_from(opts.length) else {
        return Err(RewriteError::InvalidOption(format!(
            "output length {} is too large",
            opts.length
        )));
    };

    let graph = model.graph();
    let available: Vec<&str> = graph.outputs().iter().map(|info| info.name()).collect();
    let matches = selector
        .select(&available)
        .map_err(|err| RewriteError::NoTargetOutput {
            missing: err.missing,
            candidates: err.candidates,
        })?;
    let output = match matches.as_slice() {
        [name] => name.to_string(),
        _ => {
            return Err(RewriteError::AmbiguousOutput {
                matches: matches.iter().map(|s| s.to_string()).collect(),
            })
        }
    };

    let shape = graph
        .output(&output)
        .ok_or_else(|| missing_output(&output))?
        .shape();
    check_overflow(&output, shape.as_deref(), opts)?;

    let report = match opts.mode {
        StabilizeMode::Declarative => {
            let info = model
                .graph_mut()
                .output_mut(&output)
                .ok_or_else(|| missing_output(&output))?;
            info.set_shape(&[Dimension::Fixed(opts.length)]);
            warn!(
                "Declared shape of \"{}\" set to [{}]. The length computed at runtime may differ",
                output, opts.length
            );
            StabilizeReport {
                output,
                mode: StabilizeMode::Declarative,
                ..Default::default()
            }
        }
        StabilizeMode::Structural => pad_output(model, &output, end, opts)?,
    };

    Ok(report)
}

fn missing_output(name: &str) -> RewriteError {
    RewriteError::NoTargetOutput {
        missing: vec![name.to_string()],
        candidates: Vec::new(),
    }
}

/// Apply the overflow policy to an output's declared shape.
fn check_overflow(
    output: &str,
    shape: Option<&[Dimension]>,
    opts: &StabilizeOptions,
) -> Result<(), RewriteError> {
    let declared_len = match shape {
        Some(dims) if dims.iter().all(Dimension::is_fixed) => Some(
            dims.iter()
                .map(|dim| match dim {
                    Dimension::Fixed(size) => *size,
                    _ => 1,
                })
                .product::<usize>(),
        ),
        _ => None,
    };

    match (declared_len, opts.overflow) {
        (Some(len), OverflowPolicy::Reject) if len > opts.length => {
            Err(RewriteError::WouldTruncate {
                tensor: output.to_string(),
                length: len,
                limit: opts.length,
            })
        }
        (Some(len), OverflowPolicy::Truncate) if len > opts.length => {
            warn!(
                "Output \"{}\" has length {}. Values after the first {} will be dropped",
                output, len, opts.length
            );
            Ok(())
        }
        (None, OverflowPolicy::Truncate) if opts.mode == StabilizeMode::Structural => {
            warn!(
                "Output \"{}\" has a dynamic length. Values after the first {} will be dropped",
                output, opts.length
            );
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Insert a Concat + Slice subgraph which pads or truncates `output` to
/// `end` elements.
fn pad_output(
    model: &mut Model,
    output: &str,
    end: i64,
    opts: &StabilizeOptions,
) -> Result<StabilizeReport, RewriteError> {
    let opset = model.opset_version("");
    if !opset.is_some_and(|version| version >= MIN_STRUCTURAL_OPSET) {
        return Err(RewriteError::UnsupportedOpset {
            required: MIN_STRUCTURAL_OPSET,
            found: opset,
        });
    }

    let graph = model.graph_mut();
    let info = graph.output(output).ok_or_else(|| missing_output(output))?;

    if let Some(shape) = info.shape() {
        if shape.len() != 1 {
            return Err(RewriteError::UnsupportedRank {
                tensor: output.to_string(),
                rank: shape.len(),
            });
        }
    }
    if !matches!(opts.axis, 0 | -1) {
        return Err(RewriteError::InvalidOption(format!(
            "axis {} is out of range for a 1D output",
            opts.axis
        )));
    }

    let elem_type = info.elem_type().unwrap_or(ElementType::Float);
    if let Some(elem_size) = elem_type.size_in_bytes() {
        let fits = elem_size
            .checked_mul(opts.length)
            .is_some_and(|size| size <= MAX_CONSTANT_BYTES);
        if !fits {
            return Err(RewriteError::InvalidOption(format!(
                "output length {} is too large for a {} padding constant",
                opts.length, elem_type
            )));
        }
    }

    let producer = match graph.producers(output) {
        [id] => *id,
        ids => {
            return Err(RewriteError::ProducerNotFound {
                tensor: output.to_string(),
                producers: ids.iter().map(|id| graph.node_label(*id)).collect(),
            })
        }
    };
    debug!(
        "Output \"{}\" is produced by {}",
        output,
        graph.node_label(producer)
    );

    let zeros_name = graph.unique_name("padding_zeros");
    let Some(zeros) = Initializer::zeros(&zeros_name, elem_type, opts.length) else {
        return Err(RewriteError::UnsupportedElementType {
            tensor: output.to_string(),
            elem_type,
        });
    };

    // Move the producer's output to an intermediate value. Other readers of
    // the original value keep reading the unpadded data.
    let intermediate = graph.unique_name(&format!("{}_unpadded", output));
    graph.rename_output(producer, output, &intermediate);
    let rewired = graph.replace_uses(output, &intermediate, &[]);
    graph.rename_value_info(output, &intermediate);

    let concat_out = graph.unique_name(&format!("{}_concat", output));
    let starts = graph.unique_name("slice_starts");
    let ends = graph.unique_name("slice_ends");
    let axes = graph.unique_name("slice_axes");
    let concat_name = graph.unique_name(&format!("{}_pad_concat", output));
    let slice_name = graph.unique_name(&format!("{}_pad_slice", output));

    graph.add_initializer(zeros);
    graph.add_initializer(Initializer::from_i64s(&starts, &[0]));
    graph.add_initializer(Initializer::from_i64s(&ends, &[end]));
    graph.add_initializer(Initializer::from_i64s(&axes, &[opts.axis]));

    graph.add_node(
        Node::new("Concat")
            .with_name(&concat_name)
            .with_input(&intermediate)
            .with_input(&zeros_name)
            .with_output(&concat_out)
            .with_attr("axis", opts.axis),
    );
    graph.add_node(
        Node::new("Slice")
            .with_name(&slice_name)
            .with_input(&concat_out)
            .with_input(&starts)
            .with_input(&ends)
            .with_input(&axes)
            .with_output(output),
    );

    if let Some(info) = graph.output_mut(output) {
        info.set_elem_type(elem_type);
        info.set_shape(&[Dimension::Fixed(opts.length)]);
    }

    let rewired: Vec<String> = rewired.into_iter().map(|id| graph.node_label(id)).collect();
    for label in &rewired {
        debug!("Rewired {} to read \"{}\"", label, intermediate);
    }
    info!(
        "Padded \"{}\" to {} elements: {} -> {} -> {} -> {}",
        output, opts.length, intermediate, concat_name, slice_name, output
    );

    Ok(StabilizeReport {
        output: output.to_string(),
        mode: StabilizeMode::Structural,
        intermediate: Some(intermediate),
        added_nodes: vec![concat_name, slice_name],
        added_initializers: vec![zeros_name, starts, ends, axes],
        rewired,
    })
}

#[cfg(test)]
mod tests {
    use static_shape_testing::TestCases;

    use super::{stabilize_output, OverflowPolicy, StabilizeMode, StabilizeOptions};
    use crate::graph::{Dimension, ElementType, Graph, Initializer, Node};
    use crate::rewrite_error::RewriteError;
    use crate::selector::TensorSelector;
    use crate::test_util::{
        evaluate, fixed, passthrough_model, sym, tensor, tts_model, tts_model_with_opset,
    };
    use crate::validate::{validate, ValidateOptions};

    fn structural(length: usize) -> StabilizeOptions {
        StabilizeOptions {
            mode: StabilizeMode::Structural,
            length,
            ..Default::default()
        }
    }

    #[test]
    fn test_declarative() {
        let mut model = tts_model();
        let node_count = model.graph().node_count();
        let init_count = model.graph().initializers().len();

        let opts = StabilizeOptions {
            length: 1000,
            ..Default::default()
        };
        let report =
            stabilize_output(&mut model, &TensorSelector::default_outputs(), &opts).unwrap();

        assert_eq!(report.output, "audio");
        assert_eq!(report.mode, StabilizeMode::Declarative);
        assert!(report.added_nodes.is_empty());

        let graph = model.graph();
        assert_eq!(graph.node_count(), node_count);
        assert_eq!(graph.initializers().len(), init_count);
        assert_eq!(graph.output("audio").unwrap().shape_string(), "[1000]");
    }

    #[test]
    fn test_structural() {
        let mut model = tts_model();
        let report =
            stabilize_output(&mut model, &TensorSelector::default_outputs(), &structural(64))
                .unwrap();

        assert_eq!(report.intermediate.as_deref(), Some("audio_unpadded"));
        assert_eq!(report.added_nodes, ["audio_pad_concat", "audio_pad_slice"]);
        assert_eq!(
            report.added_initializers,
            ["padding_zeros", "slice_starts", "slice_ends", "slice_axes"]
        );

        let graph = model.graph();
        assert_eq!(graph.node_count(), 3);

        let (_, vocoder) = graph.nodes().next().unwrap();
        assert_eq!(vocoder.outputs(), ["audio_unpadded"]);

        let (_, concat) = graph.nodes().nth(1).unwrap();
        assert_eq!(concat.op_type(), "Concat");
        assert_eq!(concat.inputs(), ["audio_unpadded", "padding_zeros"]);
        assert_eq!(concat.attr_int("axis"), Some(0));

        let (_, slice) = graph.nodes().nth(2).unwrap();
        assert_eq!(slice.op_type(), "Slice");
        assert_eq!(
            slice.inputs(),
            ["audio_concat", "slice_starts", "slice_ends", "slice_axes"]
        );
        assert_eq!(slice.outputs(), ["audio"]);

        let zeros = graph.initializer("padding_zeros").unwrap();
        assert_eq!(zeros.dims(), [64]);
        assert_eq!(zeros.elem_type(), Some(ElementType::Float));

        let audio = graph.output("audio").unwrap();
        assert_eq!(audio.shape().unwrap().as_slice(), [Dimension::Fixed(64)]);

        assert_eq!(graph.producers("audio").len(), 1);
        assert_eq!(graph.producers("audio_unpadded").len(), 1);

        validate(graph, &ValidateOptions::default()).unwrap();
    }

    #[test]
    fn test_structural_counts() {
        let mut model = passthrough_model();
        let nodes_before = model.graph().node_count();
        let inits_before = model.graph().initializers().len();

        let report = stabilize_output(
            &mut model,
            &TensorSelector::names(&["audio"]),
            &structural(16),
        )
        .unwrap();

        // Two nodes are added and one existing output is renamed. Besides the
        // zero-filled constant, three slice bounds are added.
        let graph = model.graph();
        assert_eq!(graph.node_count(), nodes_before + 2);
        assert_eq!(graph.initializers().len(), inits_before + 4);
        let renamed: Vec<_> = graph
            .nodes()
            .filter(|(_, n)| n.outputs().iter().any(|o| o == "audio_unpadded"))
            .collect();
        assert_eq!(renamed.len(), 1);
        assert_eq!(report.rewired, ["post"]);
    }

    #[test]
    fn test_structural_rewires_consumers() {
        let mut model = passthrough_model();
        stabilize_output(
            &mut model,
            &TensorSelector::names(&["audio"]),
            &structural(4),
        )
        .unwrap();

        let graph = model.graph();
        let (_, post) = graph.nodes().nth(1).unwrap();
        assert_eq!(post.inputs(), ["audio_unpadded"]);

        // `energy` still sees the unpadded values.
        let outputs = evaluate(graph, &[("features", vec![-1., 2.])]).unwrap();
        assert_eq!(outputs["audio"], [-1., 2., 0., 0.]);
        assert_eq!(outputs["energy"], [0., 2.]);

        validate(graph, &ValidateOptions::default()).unwrap();
    }

    #[test]
    fn test_structural_pads_and_truncates() {
        let mut rng = fastrand::Rng::with_seed(1234);

        for _ in 0..50 {
            let length = rng.usize(1..64);
            let k = rng.usize(0..128);

            let mut model = passthrough_model();
            stabilize_output(
                &mut model,
                &TensorSelector::names(&["audio"]),
                &structural(length),
            )
            .unwrap();

            let features: Vec<f64> = (0..k).map(|_| rng.f64() + 0.5).collect();
            let outputs = evaluate(model.graph(), &[("features", features.clone())]).unwrap();
            let audio = &outputs["audio"];

            assert_eq!(audio.len(), length);
            if k <= length {
                assert_eq!(&audio[..k], features.as_slice());
                assert!(audio[k..].iter().all(|x| *x == 0.));
            } else {
                assert_eq!(audio.as_slice(), &features[..length]);
            }
        }
    }

    #[test]
    fn test_generated_names_are_unique() {
        let mut model = tts_model();
        let graph = model.graph_mut();

        // Occupy the names the rewrite would otherwise use.
        graph.add_initializer(Initializer::from_i64s("padding_zeros", &[1]));
        graph.add_initializer(Initializer::from_i64s("slice_starts", &[1]));
        graph.add_value_info(tensor("audio_unpadded", ElementType::Float, &[sym("n")]));
        graph.add_input(tensor("audio_concat", ElementType::Float, &[fixed(1)]));
        graph.add_node(
            Node::new("Identity")
                .with_input("audio_concat")
                .with_output("slice_axes"),
        );

        let report = stabilize_output(
            &mut model,
            &TensorSelector::names(&["audio"]),
            &structural(8),
        )
        .unwrap();

        assert_eq!(report.intermediate.as_deref(), Some("audio_unpadded_1"));
        assert_eq!(
            report.added_initializers,
            ["padding_zeros_1", "slice_starts_1", "slice_ends", "slice_axes_1"]
        );

        // The pre-existing initializers are untouched.
        let graph = model.graph();
        assert_eq!(graph.initializer("padding_zeros").unwrap().dims(), [1]);
        let (_, concat) = graph.nodes().nth(2).unwrap();
        assert_eq!(concat.inputs(), ["audio_unpadded_1", "padding_zeros_1"]);
        assert_eq!(concat.outputs(), ["audio_concat_1"]);
    }

    #[test]
    fn test_generated_names_avoid_subgraph_names() {
        // A branch which reads `audio` from the outer graph and defines its
        // own `audio_unpadded`.
        let mut branch = Graph::new();
        branch.add_output(tensor("branch_out", ElementType::Float, &[sym("n")]));
        branch.add_node(
            Node::new("Identity")
                .with_name("copy")
                .with_input("audio")
                .with_output("audio_unpadded"),
        );
        branch.add_node(
            Node::new("Relu")
                .with_name("relu")
                .with_input("audio_unpadded")
                .with_output("branch_out"),
        );
        let branch = branch.into_proto();

        let mut model = tts_model();
        let graph = model.graph_mut();
        graph.add_input(tensor("cond", ElementType::Bool, &[]));
        graph.add_output(tensor("energy", ElementType::Float, &[sym("n")]));
        graph.add_node(
            Node::new("If")
                .with_name("post")
                .with_input("cond")
                .with_output("energy")
                .with_attr("then_branch", branch.clone())
                .with_attr("else_branch", branch),
        );

        let report = stabilize_output(
            &mut model,
            &TensorSelector::names(&["audio"]),
            &structural(8),
        )
        .unwrap();
        assert_eq!(report.intermediate.as_deref(), Some("audio_unpadded_1"));
        assert_eq!(report.rewired, ["post"]);

        let graph = model.graph();
        let (_, post) = graph.nodes().nth(1).unwrap();
        assert_eq!(post.captures(), ["audio_unpadded_1"]);
        for branch in post.subgraphs() {
            assert_eq!(branch.node[0].input, ["audio_unpadded_1"]);
            assert_eq!(branch.node[1].input, ["audio_unpadded"]);
        }
        validate(graph, &ValidateOptions::default()).unwrap();
    }

    #[test]
    fn test_structural_moves_value_info() {
        let mut model = tts_model();
        model
            .graph_mut()
            .add_value_info(tensor("audio", ElementType::Float, &[sym("num_samples")]));

        stabilize_output(
            &mut model,
            &TensorSelector::default_outputs(),
            &structural(32),
        )
        .unwrap();

        let names: Vec<_> = model.graph().value_info().iter().map(|v| v.name()).collect();
        assert_eq!(names, ["audio_unpadded"]);
    }

    #[test]
    fn test_structural_uses_output_type() {
        let mut model = tts_model();
        model
            .graph_mut()
            .output_mut("audio")
            .unwrap()
            .set_elem_type(ElementType::Float16);

        stabilize_output(
            &mut model,
            &TensorSelector::default_outputs(),
            &structural(10),
        )
        .unwrap();

        let zeros = model.graph().initializer("padding_zeros").unwrap();
        assert_eq!(zeros.elem_type(), Some(ElementType::Float16));
        assert_eq!(zeros.proto().raw_data.as_ref().map(|d| d.len()), Some(20));
    }

    #[test]
    fn test_stabilize_errors() {
        #[derive(Debug)]
        struct Case {
            opset: i64,
            output_shape: Option<Vec<Dimension>>,
            selector: TensorSelector,
            opts: StabilizeOptions,
            expected: &'static str,
        }

        let cases = [
            Case {
                opset: 9,
                output_shape: None,
                selector: TensorSelector::default_outputs(),
                opts: structural(10),
                expected: "UnsupportedOpset",
            },
            Case {
                opset: 17,
                output_shape: Some(vec![fixed(1), sym("n")]),
                selector: TensorSelector::default_outputs(),
                opts: structural(10),
                expected: "UnsupportedRank",
            },
            Case {
                opset: 17,
                output_shape: None,
                selector: TensorSelector::names(&["mel"]),
                opts: structural(10),
                expected: "NoTargetOutput",
            },
            Case {
                opset: 17,
                output_shape: Some(vec![fixed(100)]),
                selector: TensorSelector::default_outputs(),
                opts: StabilizeOptions {
                    overflow: OverflowPolicy::Reject,
                    ..structural(10)
                },
                expected: "WouldTruncate",
            },
            Case {
                opset: 17,
                output_shape: Some(vec![fixed(100)]),
                selector: TensorSelector::default_outputs(),
                opts: StabilizeOptions {
                    overflow: OverflowPolicy::Reject,
                    length: 10,
                    ..Default::default()
                },
                expected: "WouldTruncate",
            },
            Case {
                opset: 17,
                output_shape: None,
                selector: TensorSelector::default_outputs(),
                opts: structural(0),
                expected: "InvalidOption",
            },
            Case {
                opset: 17,
                output_shape: None,
                selector: TensorSelector::default_outputs(),
                opts: StabilizeOptions {
                    axis: 1,
                    ..structural(10)
                },
                expected: "InvalidOption",
            },
            // The zero-filled constant would need more than `usize::MAX` bytes.
            Case {
                opset: 17,
                output_shape: None,
                selector: TensorSelector::default_outputs(),
                opts: structural(1 << 62),
                expected: "InvalidOption",
            },
            Case {
                opset: 17,
                output_shape: None,
                selector: TensorSelector::default_outputs(),
                opts: structural(1 << 30),
                expected: "InvalidOption",
            },
            Case {
                opset: 17,
                output_shape: None,
                selector: TensorSelector::default_outputs(),
                opts: StabilizeOptions {
                    length: usize::MAX,
                    ..Default::default()
                },
                expected: "InvalidOption",
            },
        ];

        cases.test_each(|case| {
            let mut model = tts_model_with_opset(case.opset);
            if let Some(shape) = &case.output_shape {
                model
                    .graph_mut()
                    .output_mut("audio")
                    .unwrap()
                    .set_shape(shape);
            }
            let err = stabilize_output(&mut model, &case.selector, &case.opts)
                .err()
                .unwrap();
            let name = match err {
                RewriteError::UnsupportedOpset { .. } => "UnsupportedOpset",
                RewriteError::UnsupportedRank { .. } => "UnsupportedRank",
                RewriteError::NoTargetOutput { .. } => "NoTargetOutput",
                RewriteError::WouldTruncate { .. } => "WouldTruncate",
                RewriteError::InvalidOption(_) => "InvalidOption",
                _ => "other",
            };
            assert_eq!(name, case.expected);
        })
    }

    #[test]
    fn test_truncate_policy_allows_long_output() {
        let mut model = tts_model();
        model
            .graph_mut()
            .output_mut("audio")
            .unwrap()
            .set_shape(&[fixed(100)]);

        stabilize_output(
            &mut model,
            &TensorSelector::default_outputs(),
            &structural(10),
        )
        .unwrap();
        assert_eq!(
            model.graph().output("audio").unwrap().shape_string(),
            "[10]"
        );
    }

    #[test]
    fn test_producer_not_found() {
        // The output is a graph input passed straight through.
        let mut model = tts_model();
        let graph = model.graph_mut();
        graph.add_input(tensor("waveform", ElementType::Float, &[sym("n")]));
        graph.add_output(tensor("waveform", ElementType::Float, &[sym("n")]));

        let err = stabilize_output(
            &mut model,
            &TensorSelector::names(&["waveform"]),
            &structural(10),
        )
        .err()
        .unwrap();
        match err {
            RewriteError::ProducerNotFound { tensor, producers } => {
                assert_eq!(tensor, "waveform");
                assert!(producers.is_empty());
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_producers_are_reported() {
        let mut model = tts_model();
        model.graph_mut().add_node(
            Node::new("Identity")
                .with_name("other_vocoder")
                .with_input("tokens")
                .with_output("audio"),
        );

        let err = stabilize_output(
            &mut model,
            &TensorSelector::default_outputs(),
            &structural(10),
        )
        .err()
        .unwrap();
        match err {
            RewriteError::ProducerNotFound { producers, .. } => {
                assert_eq!(producers, ["vocoder", "other_vocoder"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_ambiguous_output() {
        let mut model = tts_model();
        model
            .graph_mut()
            .add_output(tensor("waveform", ElementType::Float, &[sym("n")]));

        let err = stabilize_output(
            &mut model,
            &TensorSelector::default_outputs(),
            &StabilizeOptions::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, RewriteError::AmbiguousOutput { .. }));
    }
}
