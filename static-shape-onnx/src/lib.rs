//! Reading and writing [ONNX][onnx] model files.
//!
//! An ONNX model file is a single [Protocol Buffers][protobuf] `ModelProto`
//! message, as defined in
//! [onnx.proto](https://github.com/onnx/onnx/blob/main/onnx/onnx.proto). It
//! holds an operator graph, the graph's constant tensors (_initializers_) and
//! model metadata such as the imported operator set versions.
//!
//! This crate contains a small Protocol Buffers codec ([`protobuf`]) and the
//! subset of ONNX message types ([`onnx`]) needed to inspect and rewrite model
//! graphs. Fields which are not modeled are kept as unknown fields, so a model
//! that is decoded and re-encoded without changes produces the same graph,
//! weights and metadata.
//!
//! # Usage
//!
//! ```no_run
//! use std::error::Error;
//!
//! use static_shape_onnx::onnx::ModelProto;
//! use static_shape_onnx::protobuf::{DecodeMessage, EncodeMessage};
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     let buf = std::fs::read("model.onnx")?;
//!     let mut model = ModelProto::decode(&buf)?;
//!
//!     let op_count = model.graph.as_ref().map(|g| g.node.len()).unwrap_or(0);
//!     println!("Model has {} operators", op_count);
//!
//!     model.producer_name = Some("my-tool".to_string());
//!     std::fs::write("model-out.onnx", model.encode_to_vec())?;
//!     Ok(())
//! }
//! ```
//!
//! [onnx]: https://onnx.ai/onnx/
//! [protobuf]: https://protobuf.dev/

// Model files come from untrusted sources.
#![forbid(unsafe_code)]

pub mod onnx;
pub mod protobuf;
