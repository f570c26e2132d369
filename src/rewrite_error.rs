use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use crate::graph::ElementType;
use crate::model::LoadError;
use crate::validate::ValidationError;

/// Errors that abort a rewrite.
///
/// Every variant is fatal for the current run. The in-memory model may have
/// been partially modified when one of these is returned, so it should be
/// discarded rather than saved or rewritten again.
#[derive(Debug)]
pub enum RewriteError {
    /// The input model could not be loaded.
    Load(LoadError),

    /// The input selector did not match the graph's inputs.
    NoTargetInput {
        missing: Vec<String>,
        candidates: Vec<String>,
    },

    /// The output selector did not match the graph's outputs.
    NoTargetOutput {
        missing: Vec<String>,
        candidates: Vec<String>,
    },

    /// The output selector matched more than one graph output.
    AmbiguousOutput { matches: Vec<String> },

    /// The output to pad is not produced by exactly one node.
    ProducerNotFound {
        tensor: String,

        /// Labels of nodes which produce the tensor.
        producers: Vec<String>,
    },

    /// The model's default operator set is too old for the inserted nodes.
    UnsupportedOpset { required: i64, found: Option<i64> },

    /// Structural padding only supports 1D outputs.
    UnsupportedRank { tensor: String, rank: usize },

    /// A zero-filled constant cannot be created for the output's type.
    UnsupportedElementType {
        tensor: String,
        elem_type: ElementType,
    },

    /// The output's declared length exceeds the fixed length and truncation
    /// was not allowed.
    WouldTruncate {
        tensor: String,
        length: usize,
        limit: usize,
    },

    /// An option has an invalid value.
    InvalidOption(String),

    /// The rewritten graph failed validation.
    Validation(ValidationError),

    /// The rewritten model could not be written.
    Save {
        path: PathBuf,
        error: std::io::Error,
    },
}

fn join(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(err) => write!(f, "failed to load model: {}", err),
            Self::NoTargetInput {
                missing,
                candidates,
            } => write!(
                f,
                "no graph input named {}. Graph inputs are: {}",
                join(missing),
                join(candidates)
            ),
            Self::NoTargetOutput {
                missing,
                candidates,
            } => write!(
                f,
                "no graph output named {}. Graph outputs are: {}",
                join(missing),
                join(candidates)
            ),
            Self::AmbiguousOutput { matches } => write!(
                f,
                "several graph outputs match: {}. Choose one with an explicit output name",
                join(matches)
            ),
            Self::ProducerNotFound { tensor, producers } if producers.is_empty() => {
                write!(f, "no node produces output \"{}\"", tensor)
            }
            Self::ProducerNotFound { tensor, producers } => write!(
                f,
                "output \"{}\" has several producers: {}",
                tensor,
                join(producers)
            ),
            Self::UnsupportedOpset { required, found } => match found {
                Some(version) => write!(
                    f,
                    "output padding requires opset {} or later, but the model uses opset {}",
                    required, version
                ),
                None => write!(
                    f,
                    "output padding requires opset {} or later, but the model does not import the default opset",
                    required
                ),
            },
            Self::UnsupportedRank { tensor, rank } => write!(
                f,
                "output padding requires a 1D output, but \"{}\" has rank {}",
                tensor, rank
            ),
            Self::UnsupportedElementType { tensor, elem_type } => write!(
                f,
                "cannot create padding for output \"{}\" with element type {}",
                tensor, elem_type
            ),
            Self::WouldTruncate {
                tensor,
                length,
                limit,
            } => write!(
                f,
                "output \"{}\" has length {} which would be truncated to {}",
                tensor, length, limit
            ),
            Self::InvalidOption(msg) => write!(f, "invalid option: {}", msg),
            Self::Validation(err) => write!(f, "{}", err),
            Self::Save { path, error } => {
                write!(f, "failed to write {}: {}", path.display(), error)
            }
        }
    }
}

impl Error for RewriteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Save { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<LoadError> for RewriteError {
    fn from(err: LoadError) -> Self {
        Self::Load(err)
    }
}

impl From<ValidationError> for RewriteError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}
