use crate::protobuf::{Fields, ProtobufError};

/// Defines how to deserialize a type from an encoded message.
///
/// # Usage
///
/// Given the Protocol Buffers schema:
///
/// ```proto
/// message Message {
///     int32 int_field = 1;
///     string string_field = 2;
/// }
/// ```
///
/// A decoder could be written as follows:
///
/// ```
/// use static_shape_onnx::protobuf::{DecodeMessage, Fields, ProtobufError, UnknownField};
///
/// #[derive(Default)]
/// struct Message {
///     int_field: i32,
///     string_field: Option<String>,
///     unknown_fields: Vec<UnknownField>,
/// }
///
/// impl Message {
///     const INT_FIELD: u64 = 1;
///     const STRING_FIELD: u64 = 2;
/// }
///
/// impl DecodeMessage for Message {
///     fn decode_fields(fields: Fields<'_>) -> Result<Self, ProtobufError> {
///         let mut msg = Message::default();
///         for field in fields {
///             let field = field?;
///             match field.number() {
///                 Self::INT_FIELD => msg.int_field = field.get_int32()?,
///                 Self::STRING_FIELD => msg.string_field = Some(field.read_string()?),
///                 _ => msg.unknown_fields.push(field.into_unknown()),
///             }
///         }
///         Ok(msg)
///     }
/// }
///
/// let message: &[u8] = &[
///     0x08, 0x96, 0x01, // int_field = 150
///     0x12, 0x02, 0x68, 0x69, // string_field = "hi"
///     0x18, 0x01, // unrecognized field 3
/// ];
/// let msg = Message::decode(message).unwrap();
/// assert_eq!(msg.int_field, 150);
/// assert_eq!(msg.string_field.as_deref(), Some("hi"));
/// assert_eq!(msg.unknown_fields.len(), 1);
/// ```
pub trait DecodeMessage: Sized {
    /// Decode a message from an encoded buffer.
    fn decode(buf: &[u8]) -> Result<Self, ProtobufError> {
        let ctx = Some(std::any::type_name::<Self>());
        Self::decode_fields(Fields::new(buf, ctx))
    }

    /// Decode a message from an iterator over its fields.
    fn decode_fields(fields: Fields<'_>) -> Result<Self, ProtobufError>;
}
