//! Compact binary wire form for quantities.
//!
//! Layout: `[varint magnitude][i16 fraction]`. The varint is LEB128 (seven
//! bits per byte, lowest group first, `0x80` continuation bit, at most ten
//! bytes) and the fraction is a big-endian signed short. This matches the
//! integer encoding used by the rest of the shared packet channel.

use crate::quantity::Quantity;

/// Longest varint encoding of a 64-bit value.
pub const MAX_VARINT_LEN: usize = 10;

/// Errors that can occur while decoding binary data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("unexpected end of input: needed {needed} more byte(s)")]
    UnexpectedEof { needed: usize },
    #[error("varint longer than {MAX_VARINT_LEN} bytes")]
    VarIntTooLong,
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// Append `value` as a LEB128 varint.
pub fn write_var_u64(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Read a LEB128 varint and advance `input` past it.
pub fn read_var_u64(input: &mut &[u8]) -> Result<u64, CodecError> {
    let mut value = 0u64;
    for group in 0..MAX_VARINT_LEN {
        let bytes: &[u8] = *input;
        let (&byte, rest) = bytes
            .split_first()
            .ok_or(CodecError::UnexpectedEof { needed: 1 })?;
        *input = rest;
        value |= u64::from(byte & 0x7F) << (7 * group);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(CodecError::VarIntTooLong)
}

/// Number of bytes [`write_var_u64`] produces for `value`.
pub fn var_u64_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

fn read_i16_be(input: &mut &[u8]) -> Result<i16, CodecError> {
    let bytes: &[u8] = *input;
    match bytes.split_first_chunk::<2>() {
        Some((pair, rest)) => {
            *input = rest;
            Ok(i16::from_be_bytes(*pair))
        }
        None => Err(CodecError::UnexpectedEof {
            needed: 2 - bytes.len(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Quantity
// ---------------------------------------------------------------------------

impl Quantity {
    /// Append the wire form of this quantity to `buf`.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        write_var_u64(buf, self.magnitude());
        buf.extend_from_slice(&(self.fraction() as i16).to_be_bytes());
    }

    /// Decode a quantity and advance `input` past it.
    ///
    /// Out-of-range fields are clamped the same way as [`Quantity::new`]: a
    /// magnitude outside the signed 64-bit range reads as zero.
    pub fn read_from(input: &mut &[u8]) -> Result<Quantity, CodecError> {
        let magnitude = read_var_u64(input)? as i64;
        let fraction = read_i16_be(input)?;
        Ok(Quantity::new(magnitude, i32::from(fraction)))
    }

    /// Size of the wire form in bytes.
    pub fn encoded_len(&self) -> usize {
        var_u64_len(self.magnitude()) + 2
    }
}
