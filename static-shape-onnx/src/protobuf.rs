//! Minimal Protocol Buffers wire format codec.
//!
//! This module provides a low-level API for decoding and encoding [Protocol
//! Buffers](https://protobuf.dev/) messages. Message types implement
//! [`DecodeMessage`] and [`EncodeMessage`] by hand, choosing which fields are
//! interpreted. Fields which are not interpreted are kept as
//! [`UnknownField`]s and written back unchanged, so a decode/encode round trip
//! does not lose data.
//!
//! # Prerequisites
//!
//! It is helpful to have an understanding of how Protocol Buffers messages
//! are encoded. See <https://protobuf.dev/programming-guides/encoding/>.
//!
//! # Decoding
//!
//! Given a buffer containing a message and a `DecodeMessage` implementation
//! for the type to deserialize into, call [`DecodeMessage::decode`]. The
//! implementation uses [`Fields`] to visit each field of the message.
//!
//! # Encoding
//!
//! [`EncodeMessage::encode_to_vec`] serializes a message. Implementations
//! append fields to a [`MessageWriter`].

mod encode;
mod errors;
mod field;
mod message;
pub mod varint;

pub use encode::{EncodeMessage, MessageWriter};
pub use errors::{ErrorKind, ProtobufError};
pub use field::{Field, FieldValue, Fields, UnknownField, UnknownValue};
pub use message::DecodeMessage;
