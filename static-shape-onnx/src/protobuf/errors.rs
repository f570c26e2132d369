use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::protobuf::varint::VarintError;

/// Errors decoding Protocol Buffers messages.
#[derive(Clone, Debug, PartialEq)]
pub struct ProtobufError {
    kind: ErrorKind,
    context: Option<&'static str>,
    field: Option<u64>,
}

impl ProtobufError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
            field: None,
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Return the message type that was being decoded when the error occurred.
    pub fn context(&self) -> Option<&str> {
        self.context
    }

    /// Return the number of the field that was being decoded.
    pub fn field(&self) -> Option<u64> {
        self.field
    }

    /// Attach the message type and field number to this error.
    ///
    /// Context which has already been set is kept, so that the innermost
    /// message is reported when errors propagate out of embedded messages.
    pub fn with_context(mut self, context: Option<&'static str>, field: Option<u64>) -> Self {
        if self.context.is_none() {
            self.context = context;
            self.field = field;
        }
        self
    }
}

impl Display for ProtobufError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.context, self.field) {
            (Some(context), Some(field)) => {
                write!(f, "in message {} field {}: {}", context, field, self.kind)
            }
            (Some(context), None) => write!(f, "in message {}: {}", context, self.kind),
            _ => self.kind.fmt(f),
        }
    }
}

impl Error for ProtobufError {}

impl From<VarintError> for ProtobufError {
    fn from(val: VarintError) -> Self {
        match val {
            VarintError::Eof => Self::new(ErrorKind::Eof),
            VarintError::InvalidVarint => Self::new(ErrorKind::InvalidVarint),
        }
    }
}

/// Enum describing the kind of a [`ProtobufError`].
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The message ended in the middle of a field.
    Eof,

    /// A varint contained more than 64 bits of value data.
    InvalidVarint,

    /// A field tag used one of the two unassigned wire types (6 or 7).
    InvalidWireType,

    /// A field value was read with an accessor that doesn't match its wire
    /// type, eg. reading a string from a varint field.
    FieldTypeMismatch,

    /// A packed repeated field has a length that is not a multiple of the
    /// element size.
    FieldLengthMismatch,

    /// A string field contained invalid UTF-8.
    InvalidUtf8,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Eof => write!(f, "unexpected end of message"),
            ErrorKind::InvalidVarint => write!(f, "invalid varint"),
            ErrorKind::InvalidWireType => write!(f, "invalid wire type"),
            ErrorKind::FieldTypeMismatch => write!(f, "field type mismatch"),
            ErrorKind::FieldLengthMismatch => write!(f, "field length mismatch"),
            ErrorKind::InvalidUtf8 => write!(f, "invalid UTF-8 in string"),
        }
    }
}
