use std::error::Error;
use std::fmt;
use std::io;

/// Error returned when a model file cannot be read or interpreted.
#[derive(Debug)]
pub struct LoadError {
    inner: LoadErrorImpl,

    /// Name of the graph or node where the problem was found.
    location: Option<String>,
}

impl LoadError {
    pub(crate) fn at(location: Option<&str>, inner: LoadErrorImpl) -> Self {
        LoadError {
            inner,
            location: location.map(str::to_string),
        }
    }

    /// Name of the graph or node where the problem was found, if it has one.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn kind(&self) -> LoadErrorKind {
        match self.inner {
            LoadErrorImpl::ReadFailed(_) => LoadErrorKind::IoError,
            LoadErrorImpl::NotOnnx | LoadErrorImpl::ParseFailed(_) => LoadErrorKind::ParseError,
            LoadErrorImpl::GraphError(_) => LoadErrorKind::GraphError,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "in \"{}\": ", location)?;
        }
        match &self.inner {
            LoadErrorImpl::ReadFailed(err) => write!(f, "read error: {}", err),
            LoadErrorImpl::NotOnnx => write!(f, "parse error: data is not an ONNX model"),
            LoadErrorImpl::ParseFailed(err) => write!(f, "parse error: {}", err),
            LoadErrorImpl::GraphError(err) => write!(f, "graph error: {}", err),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.inner {
            LoadErrorImpl::ReadFailed(err) => Some(err),
            LoadErrorImpl::NotOnnx => None,
            LoadErrorImpl::ParseFailed(err) | LoadErrorImpl::GraphError(err) => {
                Some(err.as_ref())
            }
        }
    }
}

impl From<LoadErrorImpl> for LoadError {
    fn from(inner: LoadErrorImpl) -> Self {
        LoadError::at(None, inner)
    }
}

/// Broad category of a [`LoadError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum LoadErrorKind {
    /// The file could not be read.
    IoError,

    /// The data is not a well-formed ONNX `ModelProto`.
    ParseError,

    /// The model decoded, but its graph is malformed.
    GraphError,
}

#[derive(Debug)]
pub(crate) enum LoadErrorImpl {
    ReadFailed(io::Error),

    /// The data lacks the fields every ONNX model has.
    NotOnnx,

    ParseFailed(Box<dyn Error + Send + Sync>),
    GraphError(Box<dyn Error + Send + Sync>),
}

/// Create a [`LoadError`] for a problem found in a named graph or node.
///
/// ```text
/// load_error!(GraphError, Some("node_name"), "{} has no name", what)
/// ```
macro_rules! load_error {
    ($kind:ident, $location:expr, $($fmt:tt)+) => {
        LoadError::at($location, LoadErrorImpl::$kind(format!($($fmt)+).into()))
    };
}

pub(crate) use load_error;
