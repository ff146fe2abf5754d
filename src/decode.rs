//! Decoding of raw value buffers into typed values.

use crate::error::{RegistryError, Result};
use crate::types::{ValueCategory, ValueType};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use encoding_rs::Encoding;

/// Size of a `REG_DWORD` value in bytes.
pub const DWORD_SIZE: usize = 4;

/// Decodes a null-terminated narrow string.
///
/// Bytes up to the first zero byte are decoded with `encoding`. An empty
/// buffer means the value holds no data at all and decodes to `None`; a
/// buffer holding only a terminator decodes to an empty string.
pub fn decode_string(data: &[u8], encoding: &'static Encoding) -> Option<String> {
    if data.is_empty() {
        return None;
    }

    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let (text, _had_errors) = encoding.decode_without_bom_handling(&data[..end]);
    Some(text.into_owned())
}

/// Decodes a 32-bit integer in the byte order of `value_type`.
///
/// # Errors
///
/// Returns `RegistryError::TypeMismatch` if `value_type` is not a DWORD type,
/// and `RegistryError::TruncatedData` if fewer than four bytes are stored.
pub fn decode_i32(name: &str, value_type: ValueType, data: &[u8]) -> Result<i32> {
    if !value_type.is_numeric() {
        return Err(RegistryError::TypeMismatch {
            name: name.to_string(),
            expected: ValueCategory::Numeric.describe(),
            actual: value_type,
        });
    }

    if data.len() < DWORD_SIZE {
        return Err(RegistryError::TruncatedData {
            name: name.to_string(),
            expected: DWORD_SIZE,
            actual: data.len(),
        });
    }

    let bytes = &data[..DWORD_SIZE];
    Ok(if value_type == ValueType::DwordBigEndian {
        BigEndian::read_i32(bytes)
    } else {
        LittleEndian::read_i32(bytes)
    })
}
