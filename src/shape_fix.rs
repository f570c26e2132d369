use log::{debug, info};

use crate::graph::{Dimension, Graph};
use crate::rewrite_error::RewriteError;
use crate::selector::TensorSelector;

/// Fix the shape of sequence inputs to `[1, seq_len]`.
///
/// Inputs matched by `selector` have their shape replaced. Other inputs are
/// not modified. No nodes are added or removed. Fixing an input which already
/// has shape `[1, seq_len]` is a no-op.
///
/// Returns the names of the matched inputs.
pub fn fix_inputs(
    graph: &mut Graph,
    selector: &TensorSelector,
    seq_len: usize,
) -> Result<Vec<String>, RewriteError> {
    if seq_len == 0 {
        return Err(RewriteError::InvalidOption(
            "sequence length must be greater than zero".into(),
        ));
    }
    if i64::try_from(seq_len).is_err() {
        return Err(RewriteError::InvalidOption(format!(
            "sequence length {} is too large",
            seq_len
        )));
    }

    let available: Vec<&str> = graph.inputs().iter().map(|info| info.name()).collect();
    let names: Vec<String> = selector
        .select(&available)
        .map_err(|err| RewriteError::NoTargetInput {
            missing: err.missing,
            candidates: err.candidates,
        })?
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    let shape = [Dimension::Fixed(1), Dimension::Fixed(seq_len)];
    for name in &names {
        let Some(input) = graph.input_mut(name) else {
            continue;
        };
        let old_shape = input.shape_string();
        input.set_shape(&shape);
        info!("Fixed input \"{}\" shape {} -> [1, {}]", name, old_shape, seq_len);
        if input.elem_type().is_none() {
            debug!("Input \"{}\" has no declared element type", name);
        }
    }

    Ok(names)
}
