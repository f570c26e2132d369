//! Fixtures and a small reference evaluator for tests.

use rustc_hash::FxHashMap;

use crate::graph::{Dimension, ElementType, Graph, Initializer, Node, TensorInfo};
use crate::model::Model;

pub fn sym(name: &str) -> Dimension {
    Dimension::Symbolic(name.to_string())
}

pub fn fixed(size: usize) -> Dimension {
    Dimension::Fixed(size)
}

pub fn tensor(name: &str, elem_type: ElementType, shape: &[Dimension]) -> TensorInfo {
    TensorInfo::new(name, Some(elem_type), Some(shape))
}

/// Create a text-to-speech style model with opset 17.
///
/// The graph has an `int64` input `tokens` of shape `[1, seq_len]` and a
/// `float32` output `audio` of shape `[num_samples]`, connected by a single
/// `Cast` node named "vocoder".
pub fn tts_model() -> Model {
    tts_model_with_opset(17)
}

pub fn tts_model_with_opset(opset: i64) -> Model {
    let mut graph = Graph::new();
    graph.add_input(tensor(
        "tokens",
        ElementType::Int64,
        &[fixed(1), sym("seq_len")],
    ));
    graph.add_output(tensor("audio", ElementType::Float, &[sym("num_samples")]));
    graph.add_node(
        Node::new("Cast")
            .with_name("vocoder")
            .with_input("tokens")
            .with_output("audio")
            .with_attr("to", 1i64),
    );
    Model::new(graph, opset)
}

/// Create a model whose float output `audio` is a copy of its input
/// `features`, so tests can control the length of the output.
///
/// A second node, `post`, also consumes `audio` and produces `energy`.
pub fn passthrough_model() -> Model {
    let mut graph = Graph::new();
    graph.add_input(tensor("features", ElementType::Float, &[sym("n")]));
    graph.add_output(tensor("audio", ElementType::Float, &[sym("n")]));
    graph.add_output(tensor("energy", ElementType::Float, &[sym("n")]));
    graph.add_node(
        Node::new("Identity")
            .with_name("vocoder")
            .with_input("features")
            .with_output("audio"),
    );
    graph.add_node(
        Node::new("Relu")
            .with_name("post")
            .with_input("audio")
            .with_output("energy"),
    );
    Model::new(graph, 17)
}

/// Read the values of a 1D initializer.
fn initializer_values(init: &Initializer) -> Result<Vec<f64>, String> {
    let proto = init.proto();
    if !proto.int64_data.is_empty() {
        return Ok(proto.int64_data.iter().map(|&x| x as f64).collect());
    }
    if !proto.float_data.is_empty() {
        return Ok(proto.float_data.iter().map(|&x| x as f64).collect());
    }
    let raw = proto.raw_data.as_deref().unwrap_or_default();
    match init.elem_type() {
        Some(ElementType::Float) => Ok(raw
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64)
            .collect()),
        Some(ElementType::Int64) => Ok(raw
            .chunks_exact(8)
            .map(|c| {
                let mut bytes = [0; 8];
                bytes.copy_from_slice(c);
                i64::from_le_bytes(bytes) as f64
            })
            .collect()),
        other => Err(format!("unsupported initializer type {:?}", other)),
    }
}

/// Evaluate a graph where every value is a 1D tensor.
///
/// Supports the operators used by the tests and by the output padding
/// subgraph: `Identity`, `Cast`, `Relu`, `Concat` and `Slice`. Returns the
/// values of all graph outputs.
pub fn evaluate(
    graph: &Graph,
    inputs: &[(&str, Vec<f64>)],
) -> Result<FxHashMap<String, Vec<f64>>, String> {
    let mut values: FxHashMap<String, Vec<f64>> = FxHashMap::default();
    for init in graph.initializers() {
        values.insert(init.name().to_string(), initializer_values(init)?);
    }
    for (name, data) in inputs {
        values.insert(name.to_string(), data.clone());
    }

    for (_, node) in graph.nodes() {
        let get = |i: usize| -> Result<&Vec<f64>, String> {
            let name = node
                .inputs()
                .get(i)
                .ok_or_else(|| format!("{} is missing input {}", node.op_type(), i))?;
            values
                .get(name)
                .ok_or_else(|| format!("value {} is not available", name))
        };
        let get_int = |i: usize| -> Result<i64, String> {
            get(i)?
                .first()
                .map(|x| *x as i64)
                .ok_or_else(|| format!("input {} of {} is empty", i, node.op_type()))
        };

        let output = match node.op_type() {
            "Identity" | "Cast" => get(0)?.clone(),
            "Relu" => get(0)?.iter().map(|x| x.max(0.)).collect(),
            "Concat" => {
                let mut out = Vec::new();
                for i in 0..node.inputs().len() {
                    out.extend_from_slice(get(i)?);
                }
                out
            }
            "Slice" => {
                let data = get(0)?;
                let len = data.len() as i64;
                let clamp = |x: i64| if x < 0 { (x + len).max(0) } else { x.min(len) };
                let start = clamp(get_int(1)?) as usize;
                let end = clamp(get_int(2)?) as usize;
                data[start..end.max(start)].to_vec()
            }
            op => return Err(format!("unsupported operator {}", op)),
        };

        let name = node
            .outputs()
            .first()
            .ok_or_else(|| format!("{} has no outputs", node.op_type()))?;
        values.insert(name.clone(), output);
    }

    graph
        .outputs()
        .iter()
        .map(|out| {
            let data = values
                .remove(out.name())
                .ok_or_else(|| format!("output {} was not computed", out.name()))?;
            Ok((out.name().to_string(), data))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{evaluate, passthrough_model};

    #[test]
    fn test_evaluate() {
        let model = passthrough_model();
        let outputs = evaluate(model.graph(), &[("features", vec![1., -2., 3.])]).unwrap();
        assert_eq!(outputs["audio"], [1., -2., 3.]);
        assert_eq!(outputs["energy"], [1., 0., 3.]);
    }
}
