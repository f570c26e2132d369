use std::path::Path;

use static_shape_onnx::onnx::{self, is_onnx_model, ModelProto};
use static_shape_onnx::protobuf::{DecodeMessage, EncodeMessage};

use crate::graph::Graph;

mod load_error;

pub use load_error::{LoadError, LoadErrorKind};
pub(crate) use load_error::{load_error, LoadErrorImpl};

/// An ONNX model: a [`Graph`] plus model-level metadata.
///
/// A model that is loaded and saved without modification encodes to the same
/// graph, weights and metadata, including fields this crate does not
/// interpret.
#[derive(Clone, Debug)]
pub struct Model {
    graph: Graph,

    /// Remaining fields of the `ModelProto`. The `graph` field is always
    /// `None` here.
    proto: ModelProto,
}

impl Model {
    /// Create a model containing `graph` which imports the default operator
    /// set at `opset_version`.
    pub fn new(graph: Graph, opset_version: i64) -> Model {
        let proto = ModelProto {
            ir_version: Some(8),
            opset_import: vec![onnx::OperatorSetIdProto {
                domain: Some(String::new()),
                version: Some(opset_version),
                ..Default::default()
            }],
            ..Default::default()
        };
        Model { graph, proto }
    }

    /// Load a model from a serialized `ModelProto`.
    pub fn load(data: &[u8]) -> Result<Model, LoadError> {
        if !is_onnx_model(data) {
            return Err(LoadErrorImpl::NotOnnx.into());
        }

        let mut proto =
            ModelProto::decode(data).map_err(|err| LoadErrorImpl::ParseFailed(Box::new(err)))?;

        let graph = match proto.graph.take() {
            Some(graph) => Graph::from_proto(graph)?,
            None => return Err(load_error!(GraphError, None, "model has no graph")),
        };

        Ok(Model { graph, proto })
    }

    /// Load a model from a `.onnx` file.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Model, LoadError> {
        let data = std::fs::read(path).map_err(LoadErrorImpl::ReadFailed)?;
        Self::load(&data)
    }

    /// Convert the model back into a `ModelProto`.
    pub fn into_proto(self) -> ModelProto {
        let mut proto = self.proto;
        proto.graph = Some(self.graph.into_proto());
        proto
    }

    /// Serialize the model as a `ModelProto`.
    pub fn into_bytes(self) -> Vec<u8> {
        self.into_proto().encode_to_vec()
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn ir_version(&self) -> Option<i64> {
        self.proto.ir_version
    }

    pub fn producer_name(&self) -> Option<&str> {
        self.proto.producer_name.as_deref()
    }

    /// Iterate over `(domain, version)` pairs of imported operator sets.
    ///
    /// The default operator set is reported with the domain `"ai.onnx"`.
    pub fn opsets(&self) -> impl Iterator<Item = (&str, i64)> {
        self.proto.opset_import.iter().map(|opset| {
            let domain = match opset.domain.as_deref() {
                None | Some("") => "ai.onnx",
                Some(domain) => domain,
            };
            (domain, opset.version.unwrap_or(0))
        })
    }

    /// Return the imported version of an operator set.
    ///
    /// `""` and `"ai.onnx"` both refer to the default operator set.
    pub fn opset_version(&self, domain: &str) -> Option<i64> {
        let domain = if domain.is_empty() { "ai.onnx" } else { domain };
        self.opsets()
            .find(|(opset_domain, _)| *opset_domain == domain)
            .map(|(_, version)| version)
    }
}
