//! Protocol Buffers message encoder.

use crate::protobuf::field::{UnknownField, UnknownValue};
use crate::protobuf::varint::write_varint;

const WIRE_VARINT: u64 = 0;
const WIRE_I64: u64 = 1;
const WIRE_LEN: u64 = 2;
const WIRE_SGROUP: u64 = 3;
const WIRE_EGROUP: u64 = 4;
const WIRE_I32: u64 = 5;

/// Defines how to serialize a type as a Protocol Buffers message.
///
/// Implementations write fields in ascending field-number order followed by
/// any preserved unknown fields, so that encoding the same value always
/// produces the same bytes.
pub trait EncodeMessage {
    /// Write the fields of this message to `writer`.
    fn encode_fields(&self, writer: &mut MessageWriter);

    /// Encode this message into a new buffer.
    fn encode_to_vec(&self) -> Vec<u8> {
        let mut writer = MessageWriter::new();
        self.encode_fields(&mut writer);
        writer.into_bytes()
    }
}

/// Buffer that fields of a message are appended to.
#[derive(Default)]
pub struct MessageWriter {
    buf: Vec<u8>,
}

impl MessageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the encoded message.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_tag(&mut self, number: u64, wire_type: u64) {
        write_varint(&mut self.buf, (number << 3) | wire_type);
    }

    /// Write a field with schema type `uint64` or `bool`.
    pub fn write_uint64(&mut self, number: u64, val: u64) {
        self.write_tag(number, WIRE_VARINT);
        write_varint(&mut self.buf, val);
    }

    /// Write a field with schema type `int64`.
    ///
    /// Negative values are encoded as ten-byte varints.
    pub fn write_int64(&mut self, number: u64, val: i64) {
        self.write_uint64(number, val as u64);
    }

    /// Write a field with schema type `int32` or an enum.
    ///
    /// Negative values are sign-extended to 64 bits, so they always encode as
    /// 10 bytes.
    pub fn write_int32(&mut self, number: u64, val: i32) {
        self.write_int64(number, val as i64);
    }

    pub fn write_float(&mut self, number: u64, val: f32) {
        self.write_tag(number, WIRE_I32);
        self.buf.extend(val.to_le_bytes());
    }

    pub fn write_double(&mut self, number: u64, val: f64) {
        self.write_tag(number, WIRE_I64);
        self.buf.extend(val.to_le_bytes());
    }

    pub fn write_bytes(&mut self, number: u64, val: &[u8]) {
        self.write_tag(number, WIRE_LEN);
        write_varint(&mut self.buf, val.len() as u64);
        self.buf.extend_from_slice(val);
    }

    pub fn write_string(&mut self, number: u64, val: &str) {
        self.write_bytes(number, val.as_bytes());
    }

    /// Write an embedded message.
    pub fn write_message<M: EncodeMessage + ?Sized>(&mut self, number: u64, msg: &M) {
        let mut inner = MessageWriter::new();
        msg.encode_fields(&mut inner);
        self.write_bytes(number, &inner.buf);
    }

    /// Write each message in `msgs` as a separate occurrence of a repeated
    /// field.
    pub fn write_messages<M: EncodeMessage>(&mut self, number: u64, msgs: &[M]) {
        for msg in msgs {
            self.write_message(number, msg);
        }
    }

    /// Write each string in `vals` as a separate occurrence of a repeated
    /// field.
    pub fn write_strings<S: AsRef<str>>(&mut self, number: u64, vals: &[S]) {
        for val in vals {
            self.write_string(number, val.as_ref());
        }
    }

    /// Write a repeated `int64` field using the un-packed representation.
    pub fn write_unpacked_int64(&mut self, number: u64, vals: &[i64]) {
        for &val in vals {
            self.write_int64(number, val);
        }
    }

    /// Write a repeated `float` field using the un-packed representation.
    pub fn write_unpacked_float(&mut self, number: u64, vals: &[f32]) {
        for &val in vals {
            self.write_float(number, val);
        }
    }

    /// Write a packed repeated varint field. Empty fields are omitted.
    fn write_packed_varints(&mut self, number: u64, vals: impl Iterator<Item = u64>) {
        let mut block = Vec::new();
        for val in vals {
            write_varint(&mut block, val);
        }
        if !block.is_empty() {
            self.write_bytes(number, &block);
        }
    }

    pub fn write_packed_int32(&mut self, number: u64, vals: &[i32]) {
        self.write_packed_varints(number, vals.iter().map(|&x| x as i64 as u64));
    }

    pub fn write_packed_int64(&mut self, number: u64, vals: &[i64]) {
        self.write_packed_varints(number, vals.iter().map(|&x| x as u64));
    }

    pub fn write_packed_uint64(&mut self, number: u64, vals: &[u64]) {
        self.write_packed_varints(number, vals.iter().copied());
    }

    pub fn write_packed_float(&mut self, number: u64, vals: &[f32]) {
        if vals.is_empty() {
            return;
        }
        let block: Vec<u8> = vals.iter().flat_map(|x| x.to_le_bytes()).collect();
        self.write_bytes(number, &block);
    }

    pub fn write_packed_double(&mut self, number: u64, vals: &[f64]) {
        if vals.is_empty() {
            return;
        }
        let block: Vec<u8> = vals.iter().flat_map(|x| x.to_le_bytes()).collect();
        self.write_bytes(number, &block);
    }

    /// Re-emit fields which were preserved during decoding.
    pub fn write_unknown(&mut self, fields: &[UnknownField]) {
        for field in fields {
            match &field.value {
                UnknownValue::Varint(val) => self.write_uint64(field.number, *val),
                UnknownValue::I64(val) => {
                    self.write_tag(field.number, WIRE_I64);
                    self.buf.extend(val.to_le_bytes());
                }
                UnknownValue::Len(data) => self.write_bytes(field.number, data),
                UnknownValue::Sgroup => self.write_tag(field.number, WIRE_SGROUP),
                UnknownValue::Egroup => self.write_tag(field.number, WIRE_EGROUP),
                UnknownValue::I32(val) => {
                    self.write_tag(field.number, WIRE_I32);
                    self.buf.extend(val.to_le_bytes());
                }
            }
        }
    }
}
