//! static-shape rewrites ONNX models so that their inputs and outputs have
//! fixed shapes.
//!
//! Neural network accelerators (NPUs, DSPs) typically compile a model ahead of
//! time and require every tensor shape to be known at compile time. Models
//! exported from training frameworks often have dynamic dimensions instead,
//! such as a text-to-speech model whose token input has shape
//! `[1, seq_len]` and whose waveform output has shape `[num_samples]`.
//!
//! # Rewriting a model
//!
//! The basic workflow is:
//!
//! 1. Load the model using [`Model::load_file`] and inspect it with
//!    [`describe_model`].
//! 2. Fix the shapes of the sequence inputs with [`fix_inputs`].
//! 3. Fix the length of the output with [`stabilize_output`].
//! 4. Check the graph using [`validate`].
//! 5. Serialize the model with [`Model::into_bytes`].
//!
//! [`convert`] performs all of these steps and writes the result atomically,
//! so that a failed rewrite never leaves a partially written file:
//!
//! ```no_run
//! use static_shape::{convert, RewriteOptions, StabilizeMode};
//!
//! let opts = RewriteOptions {
//!     seq_len: 512,
//!     output_len: 192_000,
//!     mode: StabilizeMode::Structural,
//!     ..Default::default()
//! };
//! let report = convert("kokoro.onnx", "kokoro_static.onnx", &opts)?;
//! println!("{}", report.after);
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```
//!
//! # Output modes
//!
//! In [declarative](StabilizeMode::Declarative) mode only the declared shape
//! of the output is changed. This is enough for compilers which trust the
//! declaration, but the length computed at runtime may differ.
//!
//! In [structural](StabilizeMode::Structural) mode `Concat` and `Slice` nodes
//! are added after the output's producer, so the output is zero-padded, or
//! truncated, to the fixed length when the model runs. Use
//! [`OverflowPolicy::Reject`] to refuse models whose declared output length
//! is longer than the fixed length.
//!
//! # Compiling rewritten models
//!
//! The [`backend`] module has interfaces for handing a rewritten model to a
//! cloud compilation service or to a locally installed vendor SDK.

pub mod backend;
mod graph;
mod introspect;
mod model;
mod pipeline;
mod rewrite_error;
mod selector;
mod shape_fix;
mod stabilize;
mod validate;

#[cfg(test)]
mod test_util;

pub use graph::{
    format_shape, AttrValue, Dimension, ElementType, Graph, Initializer, Node, NodeId, Shape,
    TensorInfo,
};
pub use introspect::{describe_model, GraphSummary, TensorSummary};
pub use model::{LoadError, LoadErrorKind, Model};
pub use pipeline::{
    analyze, convert, rewrite, ConversionReport, RewriteOptions, RewriteReport,
};
pub use rewrite_error::RewriteError;
pub use selector::{SelectError, TensorSelector};
pub use shape_fix::fix_inputs;
pub use stabilize::{
    stabilize_output, OverflowPolicy, StabilizeMode, StabilizeOptions, StabilizeReport,
};
pub use validate::{validate, ValidateOptions, ValidationError, Violation};
