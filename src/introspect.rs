use std::fmt;

use crate::graph::{format_shape, ElementType, Shape, TensorInfo};
use crate::model::Model;

/// Declared type and shape of a graph input or output.
#[derive(Clone, Debug, PartialEq)]
pub struct TensorSummary {
    pub name: String,

    /// Element type, or `None` if not declared.
    pub elem_type: Option<ElementType>,

    /// Shape, or `None` if the rank is unknown.
    pub shape: Option<Shape>,
}

impl TensorSummary {
    fn from_info(info: &TensorInfo) -> TensorSummary {
        TensorSummary {
            name: info.name().to_string(),
            elem_type: info.elem_type(),
            shape: info.shape(),
        }
    }

    /// Return true if every dimension of the shape is a fixed size.
    pub fn is_static(&self) -> bool {
        self.shape
            .as_ref()
            .is_some_and(|shape| shape.iter().all(|dim| dim.is_fixed()))
    }
}

impl fmt::Display for TensorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.name)?;
        match self.elem_type {
            Some(elem_type) => write!(f, "{}", elem_type)?,
            None => write!(f, "?")?,
        }
        match &self.shape {
            Some(shape) => write!(f, " {}", format_shape(shape)),
            None => write!(f, " (unknown rank)"),
        }
    }
}

/// Summary of a model's interface.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphSummary {
    pub ir_version: Option<i64>,

    /// Operator set imports as `(domain, version)` pairs.
    pub opsets: Vec<(String, i64)>,

    pub inputs: Vec<TensorSummary>,
    pub outputs: Vec<TensorSummary>,
    pub node_count: usize,
    pub initializer_count: usize,
}

impl GraphSummary {
    pub fn input(&self, name: &str) -> Option<&TensorSummary> {
        self.inputs.iter().find(|t| t.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&TensorSummary> {
        self.outputs.iter().find(|t| t.name == name)
    }
}

impl fmt::Display for GraphSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(version) = self.ir_version {
            writeln!(f, "IR version: {}", version)?;
        }
        if !self.opsets.is_empty() {
            let opsets: Vec<String> = self
                .opsets
                .iter()
                .map(|(domain, version)| format!("{} v{}", domain, version))
                .collect();
            writeln!(f, "Opsets: {}", opsets.join(", "))?;
        }
        writeln!(
            f,
            "Nodes: {}, initializers: {}",
            self.node_count, self.initializer_count
        )?;

        writeln!(f, "Inputs:")?;
        for input in &self.inputs {
            writeln!(f, "  {}", input)?;
        }
        write!(f, "Outputs:")?;
        for output in &self.outputs {
            write!(f, "\n  {}", output)?;
        }
        Ok(())
    }
}

/// Describe the inputs and outputs of a model.
pub fn describe_model(model: &Model) -> GraphSummary {
    let graph = model.graph();
    GraphSummary {
        ir_version: model.ir_version(),
        opsets: model
            .opsets()
            .map(|(domain, version)| (domain.to_string(), version))
            .collect(),
        inputs: graph.inputs().iter().map(TensorSummary::from_info).collect(),
        outputs: graph
            .outputs()
            .iter()
            .map(TensorSummary::from_info)
            .collect(),
        node_count: graph.node_count(),
        initializer_count: graph.initializers().len(),
    }
}

#[cfg(test)]
mod tests {
    use super::describe_model;
    use crate::graph::{Dimension, ElementType, TensorInfo};
    use crate::test_util::tts_model;

    #[test]
    fn test_describe_model() {
        let mut model = tts_model();
        model
            .graph_mut()
            .add_input(TensorInfo::new("speed", None, None));

        let summary = describe_model(&model);
        assert_eq!(summary.ir_version, Some(8));
        assert_eq!(summary.opsets, [("ai.onnx".to_string(), 17)]);
        assert_eq!(summary.node_count, 1);
        assert_eq!(summary.initializer_count, 0);

        let tokens = summary.input("tokens").unwrap();
        assert_eq!(tokens.elem_type, Some(ElementType::Int64));
        assert!(!tokens.is_static());

        let speed = summary.input("speed").unwrap();
        assert_eq!(speed.elem_type, None);
        assert_eq!(speed.shape, None);

        assert_eq!(
            summary.to_string(),
            "IR version: 8
Opsets: ai.onnx v17
Nodes: 1, initializers: 0
Inputs:
  tokens: int64 [1, seq_len]
  speed: ? (unknown rank)
Outputs:
  audio: float32 [num_samples]"
        );
    }

    #[test]
    fn test_describe_unknown_dims() {
        let mut model = tts_model();
        model
            .graph_mut()
            .output_mut("audio")
            .unwrap()
            .set_shape(&[Dimension::Fixed(4), Dimension::Unknown]);

        let summary = describe_model(&model);
        let audio = summary.output("audio").unwrap();
        assert_eq!(audio.to_string(), "audio: float32 [4, ?]");
        assert!(!audio.is_static());
    }
}
