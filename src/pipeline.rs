//! Load, rewrite, validate and save a model in one step.

use std::io::Write;
use std::path::Path;

use log::{debug, info};
use tempfile::NamedTempFile;

use crate::introspect::{describe_model, GraphSummary};
use crate::model::Model;
use crate::rewrite_error::RewriteError;
use crate::selector::TensorSelector;
use crate::shape_fix::fix_inputs;
use crate::stabilize::{
    stabilize_output, OverflowPolicy, StabilizeMode, StabilizeOptions, StabilizeReport,
};
use crate::validate::{validate, ValidateOptions};

/// Options for [`rewrite`] and [`convert`].
#[derive(Clone, Debug, PartialEq)]
pub struct RewriteOptions {
    /// Sequence length for token inputs.
    pub seq_len: usize,

    /// Number of elements in the fixed-length output.
    pub output_len: usize,

    pub mode: StabilizeMode,

    /// Inputs whose shape is fixed to `[1, seq_len]`.
    pub inputs: TensorSelector,

    /// Output whose length is fixed to `output_len`.
    pub output: TensorSelector,

    pub overflow: OverflowPolicy,

    /// Axis along which the output is padded in structural mode.
    pub axis: i64,

    pub allow_unused_inputs: bool,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        RewriteOptions {
            seq_len: 512,
            output_len: 192_000,
            mode: StabilizeMode::Declarative,
            inputs: TensorSelector::default_inputs(),
            output: TensorSelector::default_outputs(),
            overflow: OverflowPolicy::Truncate,
            axis: 0,
            allow_unused_inputs: false,
        }
    }
}

/// Result of a successful [`rewrite`].
#[derive(Clone, Debug, PartialEq)]
pub struct RewriteReport {
    /// Names of the inputs whose shape was fixed.
    pub fixed_inputs: Vec<String>,

    pub stabilize: StabilizeReport,
}

/// Result of a successful [`convert`].
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionReport {
    /// Summary of the input model.
    pub before: GraphSummary,

    /// Summary of the model as read back from the output file.
    pub after: GraphSummary,

    pub fixed_inputs: Vec<String>,
    pub stabilize: StabilizeReport,
}

/// Load a model and describe its inputs and outputs.
pub fn analyze<P: AsRef<Path>>(path: P) -> Result<GraphSummary, RewriteError> {
    let model = Model::load_file(path)?;
    Ok(describe_model(&model))
}

/// Fix the shapes of a model's inputs and output, then validate the result.
///
/// If this returns an error, `model` may have been partially modified.
pub fn rewrite(model: &mut Model, opts: &RewriteOptions) -> Result<RewriteReport, RewriteError> {
    let fixed_inputs = fix_inputs(model.graph_mut(), &opts.inputs, opts.seq_len)?;

    let stabilize = stabilize_output(
        model,
        &opts.output,
        &StabilizeOptions {
            mode: opts.mode,
            length: opts.output_len,
            axis: opts.axis,
            overflow: opts.overflow,
        },
    )?;

    let mut require_static = fixed_inputs.clone();
    require_static.push(stabilize.output.clone());
    validate(
        model.graph(),
        &ValidateOptions {
            allow_unused_inputs: opts.allow_unused_inputs,
            require_static,
        },
    )?;
    debug!("Rewritten graph passed validation");

    Ok(RewriteReport {
        fixed_inputs,
        stabilize,
    })
}

/// Write `data` to `path` via a temporary file in the same directory, so that
/// `path` is either left untouched or fully written.
fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp_file = NamedTempFile::new_in(dir)?;
    tmp_file.write_all(data)?;
    tmp_file.as_file().sync_all()?;
    tmp_file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Rewrite the model at `input` and save the result to `output`.
///
/// `output` is only written if the rewritten graph passes validation.
pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    opts: &RewriteOptions,
) -> Result<ConversionReport, RewriteError> {
    let input = input.as_ref();
    let output = output.as_ref();

    info!("Loading {}", input.display());
    let mut model = Model::load_file(input)?;
    let before = describe_model(&model);

    let RewriteReport {
        fixed_inputs,
        stabilize,
    } = rewrite(&mut model, opts)?;

    let data = model.into_bytes();
    write_atomic(output, &data).map_err(|error| RewriteError::Save {
        path: output.to_path_buf(),
        error,
    })?;
    info!("Wrote {} ({} bytes)", output.display(), data.len());

    let after = analyze(output)?;

    Ok(ConversionReport {
        before,
        after,
        fixed_inputs,
        stabilize,
    })
}
