//! Variable length integer encoding.
//!
//! Variable length integers (_varints_) are the default encoding of integers
//! in Protocol Buffers messages, including field tags and lengths.
//!
//! See <https://protobuf.dev/programming-guides/encoding/#varints>.

/// Maximum number of bytes for an encoded varint.
///
/// Each byte contains 7 value bits and one continuation bit, so a 64-bit
/// value needs 9 full bytes plus one bit of a 10th byte.
pub const MAX_VARINT_LEN: usize = 10;

#[derive(Debug, PartialEq)]
pub enum VarintError {
    /// The input was empty.
    Eof,
    /// The varint has more than 64 bits of payload, or the input ended before
    /// the final byte.
    InvalidVarint,
}

/// Decode a varint from the start of `buf`.
///
/// Returns the value and the number of bytes it occupied.
pub fn read_varint(buf: &[u8]) -> Result<(u64, usize), VarintError> {
    if buf.is_empty() {
        return Err(VarintError::Eof);
    }

    let mut value = 0u64;
    for (index, byte) in buf.iter().copied().take(MAX_VARINT_LEN).enumerate() {
        // High bit is the continuation bit. Low 7 bits are the payload.
        value |= ((byte & 0x7f) as u64) << (index * 7);
        if byte & 0x80 == 0 {
            // Only one value bit from the last byte may be used.
            if index + 1 == MAX_VARINT_LEN && byte > 0x01 {
                return Err(VarintError::InvalidVarint);
            }
            return Ok((value, index + 1));
        }
    }

    Err(VarintError::InvalidVarint)
}

/// Append the minimal varint encoding of `val` to `out`.
pub fn write_varint(out: &mut Vec<u8>, mut val: u64) {
    while val > 0x7f {
        out.push((val & 0x7f) as u8 | 0x80);
        val >>= 7;
    }
    out.push(val as u8);
}

/// Return the minimal varint encoding of `val`.
pub fn encode_varint(val: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(MAX_VARINT_LEN);
    write_varint(&mut bytes, val);
    bytes
}
