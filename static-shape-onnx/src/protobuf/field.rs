use crate::protobuf::errors::{ErrorKind, ProtobufError};
use crate::protobuf::message::DecodeMessage;
use crate::protobuf::varint::read_varint;

/// Wire-type and associated value of a field.
///
/// See <https://protobuf.dev/programming-guides/encoding/#structure>.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FieldValue<'a> {
    /// Integer value encoded as a varint.
    Varint(u64),

    /// 64-bit fixed-width value.
    I64(i64),

    /// A variable-length value (bytes, string, embedded message or packed
    /// repeated field).
    Len(&'a [u8]),

    /// Deprecated start-of-group type.
    Sgroup,

    /// Deprecated end-of-group type.
    Egroup,

    /// 32-bit fixed-width value.
    I32(i32),
}

impl FieldValue<'_> {
    /// Return the wire type number used in the field tag.
    pub fn wire_type(&self) -> u64 {
        match self {
            Self::Varint(_) => 0,
            Self::I64(_) => 1,
            Self::Len(_) => 2,
            Self::Sgroup => 3,
            Self::Egroup => 4,
            Self::I32(_) => 5,
        }
    }
}

/// Owned copy of a field which a message decoder does not interpret.
///
/// Decoders keep these so that encoding a decoded message reproduces every
/// field of the input, including fields that were added to the schema after
/// this crate was written.
#[derive(Clone, Debug, PartialEq)]
pub struct UnknownField {
    pub number: u64,
    pub value: UnknownValue,
}

#[derive(Clone, Debug, PartialEq)]
pub enum UnknownValue {
    Varint(u64),
    I64(i64),
    Len(Vec<u8>),
    Sgroup,
    Egroup,
    I32(i32),
}

/// A single field of a message.
///
/// `Field`s are produced by iterating over [`Fields`]. Variable length values
/// borrow from the message buffer, so nothing is copied until one of the
/// `read_*` methods is called.
///
/// # Repeated fields
///
/// Repeated fields with a primitive type may have either a packed or
/// un-packed representation. The `read_repeated_*` methods return iterators
/// which handle both cases. They yield one value if the field is unpacked, or
/// all values in the block if it is packed.
#[derive(Clone, Debug)]
pub struct Field<'a> {
    number: u64,
    value: FieldValue<'a>,

    /// Debug name of the message type this field belongs to.
    context: Option<&'static str>,
}

impl<'a> Field<'a> {
    /// Return the field number.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Return the field value.
    pub fn value(&self) -> FieldValue<'a> {
        self.value
    }

    fn get_varint(&self) -> Result<u64, ProtobufError> {
        match self.value {
            FieldValue::Varint(val) => Ok(val),
            _ => Err(self.error(ErrorKind::FieldTypeMismatch)),
        }
    }

    fn get_len(&self) -> Result<&'a [u8], ProtobufError> {
        match self.value {
            FieldValue::Len(data) => Ok(data),
            _ => Err(self.error(ErrorKind::FieldTypeMismatch)),
        }
    }

    /// Get the value of a field with schema type `int32`.
    pub fn get_int32(&self) -> Result<i32, ProtobufError> {
        self.get_varint().map(|v| v as i32)
    }

    /// Get the value of a field where the schema type is an enum.
    pub fn get_enum(&self) -> Result<i32, ProtobufError> {
        self.get_int32()
    }

    /// Get the value of a field with schema type `int64`.
    pub fn get_int64(&self) -> Result<i64, ProtobufError> {
        self.get_varint().map(|v| v as i64)
    }

    /// Get the value of a field with schema type `float`.
    pub fn get_float(&self) -> Result<f32, ProtobufError> {
        match self.value {
            FieldValue::I32(val) => Ok(f32::from_le_bytes(val.to_le_bytes())),
            _ => Err(self.error(ErrorKind::FieldTypeMismatch)),
        }
    }

    /// Copy the bytes in this field.
    pub fn read_bytes(&self) -> Result<Vec<u8>, ProtobufError> {
        self.get_len().map(|data| data.to_vec())
    }

    /// Read the UTF-8 encoded string in this field.
    pub fn read_string(&self) -> Result<String, ProtobufError> {
        let data = self.get_len()?;
        std::str::from_utf8(data)
            .map(|s| s.to_string())
            .map_err(|_| self.error(ErrorKind::InvalidUtf8))
    }

    /// Decode the embedded message in this field.
    pub fn read_message<M: DecodeMessage>(&self) -> Result<M, ProtobufError> {
        let data = self.get_len()?;
        M::decode(data).map_err(|err| err.with_context(self.context, Some(self.number)))
    }

    /// Get one or multiple values from a `repeated int32` field.
    pub fn read_repeated_int32(
        &self,
    ) -> Result<impl Iterator<Item = Result<i32, ProtobufError>> + 'a, ProtobufError> {
        self.read_repeated_varint(|x| x as i32)
    }

    /// Get one or multiple values from a `repeated int64` field.
    pub fn read_repeated_int64(
        &self,
    ) -> Result<impl Iterator<Item = Result<i64, ProtobufError>> + 'a, ProtobufError> {
        self.read_repeated_varint(|x| x as i64)
    }

    /// Get one or multiple values from a `repeated uint64` field.
    pub fn read_repeated_uint64(
        &self,
    ) -> Result<impl Iterator<Item = Result<u64, ProtobufError>> + 'a, ProtobufError> {
        self.read_repeated_varint(|x| x)
    }

    /// Get one or multiple values from a `repeated float` field.
    pub fn read_repeated_float(
        &self,
    ) -> Result<impl Iterator<Item = Result<f32, ProtobufError>> + 'a, ProtobufError> {
        match self.value {
            FieldValue::I32(val) => Ok(Repeated::Unpacked(Some(f32::from_le_bytes(
                val.to_le_bytes(),
            )))),
            FieldValue::Len(data) => {
                let chunks = self.fixed_chunks::<4>(data)?;
                Ok(Repeated::Packed(Box::new(
                    chunks.map(|chunk| Ok(f32::from_le_bytes(chunk))),
                )))
            }
            _ => Err(self.error(ErrorKind::FieldTypeMismatch)),
        }
    }

    /// Get one or multiple values from a `repeated double` field.
    pub fn read_repeated_double(
        &self,
    ) -> Result<impl Iterator<Item = Result<f64, ProtobufError>> + 'a, ProtobufError> {
        match self.value {
            FieldValue::I64(val) => Ok(Repeated::Unpacked(Some(f64::from_le_bytes(
                val.to_le_bytes(),
            )))),
            FieldValue::Len(data) => {
                let chunks = self.fixed_chunks::<8>(data)?;
                Ok(Repeated::Packed(Box::new(
                    chunks.map(|chunk| Ok(f64::from_le_bytes(chunk))),
                )))
            }
            _ => Err(self.error(ErrorKind::FieldTypeMismatch)),
        }
    }

    /// Convert this field into an owned value that can be re-encoded later.
    pub fn into_unknown(self) -> UnknownField {
        let value = match self.value {
            FieldValue::Varint(val) => UnknownValue::Varint(val),
            FieldValue::I64(val) => UnknownValue::I64(val),
            FieldValue::Len(data) => UnknownValue::Len(data.to_vec()),
            FieldValue::Sgroup => UnknownValue::Sgroup,
            FieldValue::Egroup => UnknownValue::Egroup,
            FieldValue::I32(val) => UnknownValue::I32(val),
        };
        UnknownField {
            number: self.number,
            value,
        }
    }

    /// Get the value of a repeated varint field.
    fn read_repeated_varint<T: Copy + 'a>(
        &self,
        from_u64: impl Fn(u64) -> T + 'a,
    ) -> Result<Repeated<'a, T>, ProtobufError> {
        match self.value {
            FieldValue::Varint(val) => Ok(Repeated::Unpacked(Some(from_u64(val)))),
            FieldValue::Len(mut data) => {
                let context = self.context;
                let number = self.number;
                let iter = std::iter::from_fn(move || {
                    if data.is_empty() {
                        return None;
                    }
                    match read_varint(data) {
                        Ok((val, len)) => {
                            data = &data[len..];
                            Some(Ok(from_u64(val)))
                        }
                        Err(err) => {
                            data = &[];
                            Some(Err(
                                ProtobufError::from(err).with_context(context, Some(number))
                            ))
                        }
                    }
                });
                Ok(Repeated::Packed(Box::new(iter)))
            }
            _ => Err(self.error(ErrorKind::FieldTypeMismatch)),
        }
    }

    /// Split a packed block of fixed-width values into `N`-byte chunks.
    fn fixed_chunks<const N: usize>(
        &self,
        data: &'a [u8],
    ) -> Result<impl Iterator<Item = [u8; N]> + 'a, ProtobufError> {
        if data.len() % N != 0 {
            return Err(self.error(ErrorKind::FieldLengthMismatch));
        }
        Ok(data.chunks_exact(N).map(|chunk| {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(chunk);
            bytes
        }))
    }

    fn error(&self, kind: ErrorKind) -> ProtobufError {
        ProtobufError::new(kind).with_context(self.context, Some(self.number))
    }
}

/// Iterator over a repeated scalar field.
///
/// Repeated scalar fields may use either a packed or un-packed representation.
/// See <https://protobuf.dev/programming-guides/encoding/#repeated>.
enum Repeated<'a, T: Copy> {
    Unpacked(Option<T>),
    Packed(Box<dyn Iterator<Item = Result<T, ProtobufError>> + 'a>),
}

impl<T: Copy> Iterator for Repeated<'_, T> {
    type Item = Result<T, ProtobufError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Unpacked(val) => val.take().map(Ok),
            Self::Packed(packed) => packed.next(),
        }
    }
}

/// Iterator over the fields of an encoded message.
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use static_shape_onnx::protobuf::{FieldValue, Fields};
///
/// let message = [0x08, 0x96, 0x01];
/// for field in Fields::new(&message, None) {
///     let field = field?;
///     assert_eq!(field.number(), 1);
///     assert_eq!(field.value(), FieldValue::Varint(150));
/// }
/// # Ok(()) }
/// ```
///
/// Iteration stops after the first error.
pub struct Fields<'a> {
    buf: &'a [u8],

    /// Debug name of the message type.
    context: Option<&'static str>,
}

impl<'a> Fields<'a> {
    /// Iterate over fields of the message in `buf`.
    ///
    /// `context` is the name of the message type being read, for debugging
    /// purposes.
    pub fn new(buf: &'a [u8], context: Option<&'static str>) -> Self {
        Self { buf, context }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ProtobufError> {
        if len > self.buf.len() {
            return Err(ProtobufError::new(ErrorKind::Eof));
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    fn take_varint(&mut self) -> Result<u64, ProtobufError> {
        let (val, len) = read_varint(self.buf)?;
        self.buf = &self.buf[len..];
        Ok(val)
    }

    fn read_field(&mut self) -> Result<Field<'a>, ProtobufError> {
        let tag = self.take_varint()?;
        let number = tag >> 3;
        let wire_type = tag & 0x7;

        let value = match wire_type {
            0 => self.take_varint().map(FieldValue::Varint),
            1 => self
                .take(8)
                .map(|bytes| FieldValue::I64(i64::from_le_bytes(to_array(bytes)))),
            2 => self.take_varint().and_then(|len| {
                let len =
                    usize::try_from(len).map_err(|_| ProtobufError::new(ErrorKind::Eof))?;
                self.take(len).map(FieldValue::Len)
            }),
            3 => Ok(FieldValue::Sgroup),
            4 => Ok(FieldValue::Egroup),
            5 => self
                .take(4)
                .map(|bytes| FieldValue::I32(i32::from_le_bytes(to_array(bytes)))),
            _ => Err(ProtobufError::new(ErrorKind::InvalidWireType)),
        }
        .map_err(|err| err.with_context(self.context, Some(number)))?;

        Ok(Field {
            number,
            value,
            context: self.context,
        })
    }
}

impl<'a> Iterator for Fields<'a> {
    type Item = Result<Field<'a>, ProtobufError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }
        let field = self.read_field();
        if field.is_err() {
            self.buf = &[];
        }
        Some(field.map_err(|err| err.with_context(self.context, None)))
    }
}

fn to_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut array = [0u8; N];
    array.copy_from_slice(bytes);
    array
}
