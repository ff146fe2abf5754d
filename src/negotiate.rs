//! Two-phase value query.
//!
//! Registry value sizes are not known in advance, so every query is made
//! twice against the native layer:
//!
//! 1. **Probe**: no data buffer is passed; the native layer reports the type
//!    tag and the number of bytes the value occupies.
//! 2. **Fetch**: a buffer of exactly that size is allocated and the query is
//!    repeated to copy the data in.
//!
//! For textual values the probed size is an upper bound: the narrow API
//! reports the stored (UTF-16) byte count before converting, so the fetch may
//! copy fewer bytes. Those shorter replies are accepted and the buffer is cut
//! to the reported length.
//!
//! The probed type is checked against the requested [`ValueCategory`] between
//! the two phases, so a value of the wrong type is rejected without copying
//! its data. If the value changes between the phases the query fails with
//! `RegistryError::ValueChanged` instead of returning truncated data.

use crate::error::{RegistryError, Result};
use crate::native::{NativeRegistry, RawHandle, ERROR_MORE_DATA, ERROR_SUCCESS};
use crate::types::{ValueCategory, ValueType};
use std::ffi::CString;
use tracing::{debug, trace};

/// Raw value data as copied by the fetch phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawValue {
    /// Type reported by the native layer.
    pub value_type: ValueType,
    /// The bytes the native layer reported on fetch.
    pub data: Vec<u8>,
}

/// Type and length reported by the probe phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ValueDescriptor {
    value_type: ValueType,
    length: u32,
}

/// Converts a value name into the NUL-terminated form the native layer takes.
pub(crate) fn value_name(name: &str) -> Result<CString> {
    CString::new(name).map_err(|_| {
        RegistryError::invalid_argument(format!("value name {:?} contains a NUL byte", name))
    })
}

/// Runs the probe and fetch phases for value `name` of an open key.
///
/// # Errors
///
/// - `InvalidArgument` if `name` contains a NUL byte.
/// - `NotFound` / `Native` if either native call fails.
/// - `TypeMismatch` if the probed type is not in `category`.
/// - `ValueChanged` if the value was modified between the phases.
pub fn query_raw<N>(native: &N, handle: RawHandle, name: &str, category: ValueCategory) -> Result<RawValue>
where
    N: NativeRegistry + ?Sized,
{
    let c_name = value_name(name)?;

    let descriptor = probe(native, handle, &c_name, name)?;
    if !category.accepts(descriptor.value_type) {
        return Err(RegistryError::TypeMismatch {
            name: name.to_string(),
            expected: category.describe(),
            actual: descriptor.value_type,
        });
    }

    let data = fetch(native, handle, &c_name, name, descriptor)?;
    Ok(RawValue {
        value_type: descriptor.value_type,
        data,
    })
}

fn probe<N>(native: &N, handle: RawHandle, c_name: &CString, name: &str) -> Result<ValueDescriptor>
where
    N: NativeRegistry + ?Sized,
{
    let reply = native.query_value(handle, c_name, None);
    if reply.status != ERROR_SUCCESS {
        return Err(query_failed(reply.status, name));
    }

    let descriptor = ValueDescriptor {
        value_type: ValueType::from_u32(reply.value_type),
        length: reply.length,
    };
    debug!(
        name,
        value_type = %descriptor.value_type,
        length = descriptor.length,
        "Probed value"
    );
    Ok(descriptor)
}

fn fetch<N>(
    native: &N,
    handle: RawHandle,
    c_name: &CString,
    name: &str,
    descriptor: ValueDescriptor,
) -> Result<Vec<u8>>
where
    N: NativeRegistry + ?Sized,
{
    let mut data = vec![0u8; descriptor.length as usize];
    let reply = native.query_value(handle, c_name, Some(data.as_mut_slice()));

    if reply.status == ERROR_MORE_DATA {
        return Err(RegistryError::ValueChanged {
            name: name.to_string(),
            detail: format!("grew from {} to {} bytes", descriptor.length, reply.length),
        });
    }
    if reply.status != ERROR_SUCCESS {
        return Err(query_failed(reply.status, name));
    }

    let fetched_type = ValueType::from_u32(reply.value_type);
    if fetched_type != descriptor.value_type {
        return Err(RegistryError::ValueChanged {
            name: name.to_string(),
            detail: format!("type changed from {} to {}", descriptor.value_type, fetched_type),
        });
    }
    let shrank_textual = fetched_type.is_textual() && reply.length < descriptor.length;
    if reply.length != descriptor.length && !shrank_textual {
        return Err(RegistryError::ValueChanged {
            name: name.to_string(),
            detail: format!("length changed from {} to {} bytes", descriptor.length, reply.length),
        });
    }
    data.truncate(reply.length as usize);

    trace!(name, data = %hex::encode(&data), "Fetched value");
    Ok(data)
}

fn query_failed(status: u32, name: &str) -> RegistryError {
    RegistryError::from_status(status, format!("Failed to query value '{}'", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::native::{OpenReply, QueryReply, ERROR_FILE_NOT_FOUND};
    use std::cell::RefCell;
    use std::ffi::CStr;

    /// Binding that answers queries from a fixed script, one reply per call.
    struct Scripted {
        replies: RefCell<Vec<(QueryReply, Vec<u8>)>>,
        buffer_lengths: RefCell<Vec<Option<usize>>>,
    }

    impl Scripted {
        fn new(replies: Vec<(QueryReply, Vec<u8>)>) -> Self {
            Self {
                replies: RefCell::new(replies.into_iter().rev().collect()),
                buffer_lengths: RefCell::new(Vec::new()),
            }
        }
    }

    impl NativeRegistry for Scripted {
        fn is_loaded(&self) -> bool {
            true
        }

        fn open_key(&self, _: RawHandle, _: &CStr, _: u32, _: u32) -> OpenReply {
            unreachable!("queries never open keys")
        }

        fn query_value(&self, _: RawHandle, _: &CStr, data: Option<&mut [u8]>) -> QueryReply {
            self.buffer_lengths
                .borrow_mut()
                .push(data.as_ref().map(|buf| buf.len()));
            let (reply, bytes) = self.replies.borrow_mut().pop().expect("unexpected query");
            if let Some(buf) = data {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
            }
            reply
        }

        fn close_key(&self, _: RawHandle) -> u32 {
            unreachable!("queries never close keys")
        }
    }

    fn reply(status: u32, value_type: ValueType, length: u32) -> QueryReply {
        QueryReply {
            status,
            value_type: value_type.as_u32(),
            length,
        }
    }

    const KEY: RawHandle = RawHandle(0x40);

    #[test]
    fn test_probe_then_fetch_exact_length() {
        let native = Scripted::new(vec![
            (reply(ERROR_SUCCESS, ValueType::String, 6), vec![]),
            (reply(ERROR_SUCCESS, ValueType::String, 6), b"Hello\0".to_vec()),
        ]);

        let raw = query_raw(&native, KEY, "Greeting", ValueCategory::Textual).unwrap();
        assert_eq!(raw.value_type, ValueType::String);
        assert_eq!(raw.data, b"Hello\0");
        assert_eq!(*native.buffer_lengths.borrow(), vec![None, Some(6)]);
    }

    #[test]
    fn test_not_found_on_probe() {
        let native = Scripted::new(vec![(reply(ERROR_FILE_NOT_FOUND, ValueType::None, 0), vec![])]);

        let err = query_raw(&native, KEY, "Missing", ValueCategory::Textual).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.code(), Some(ERROR_FILE_NOT_FOUND));
        assert!(err.to_string().contains("Missing"));
    }

    #[test]
    fn test_type_checked_before_fetch() {
        let native = Scripted::new(vec![(reply(ERROR_SUCCESS, ValueType::Dword, 4), vec![])]);

        let err = query_raw(&native, KEY, "Count", ValueCategory::Textual).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::TypeMismatch { actual: ValueType::Dword, .. }
        ));
        // Only the probe ran
        assert_eq!(native.buffer_lengths.borrow().len(), 1);
    }

    #[test]
    fn test_value_grew_between_phases() {
        let native = Scripted::new(vec![
            (reply(ERROR_SUCCESS, ValueType::String, 4), vec![]),
            (reply(ERROR_MORE_DATA, ValueType::String, 12), vec![]),
        ]);

        let err = query_raw(&native, KEY, "Path", ValueCategory::Textual).unwrap_err();
        assert!(matches!(err, RegistryError::ValueChanged { .. }));
        assert_eq!(err.kind(), ErrorKind::NativeFailure);
    }

    #[test]
    fn test_narrow_string_shorter_than_probe() {
        // Probe reports the wide size, fetch copies the narrow conversion
        let native = Scripted::new(vec![
            (reply(ERROR_SUCCESS, ValueType::String, 8), vec![]),
            (reply(ERROR_SUCCESS, ValueType::String, 3), b"ab\0".to_vec()),
        ]);

        let raw = query_raw(&native, KEY, "Path", ValueCategory::Textual).unwrap();
        assert_eq!(raw.data, b"ab\0");
        assert_eq!(*native.buffer_lengths.borrow(), vec![None, Some(8)]);
    }

    #[test]
    fn test_numeric_value_shrank_between_phases() {
        let native = Scripted::new(vec![
            (reply(ERROR_SUCCESS, ValueType::Dword, 4), vec![]),
            (reply(ERROR_SUCCESS, ValueType::Dword, 2), vec![1, 0]),
        ]);

        let err = query_raw(&native, KEY, "Flags", ValueCategory::Numeric).unwrap_err();
        assert!(matches!(err, RegistryError::ValueChanged { .. }));
    }

    #[test]
    fn test_type_changed_between_phases() {
        let native = Scripted::new(vec![
            (reply(ERROR_SUCCESS, ValueType::Dword, 4), vec![]),
            (reply(ERROR_SUCCESS, ValueType::Binary, 4), vec![1, 2, 3, 4]),
        ]);

        let err = query_raw(&native, KEY, "Flags", ValueCategory::Numeric).unwrap_err();
        assert!(matches!(err, RegistryError::ValueChanged { .. }));
    }

    #[test]
    fn test_native_failure_on_fetch() {
        let native = Scripted::new(vec![
            (reply(ERROR_SUCCESS, ValueType::Dword, 4), vec![]),
            (reply(5, ValueType::Dword, 0), vec![]),
        ]);

        let err = query_raw(&native, KEY, "Flags", ValueCategory::Numeric).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NativeFailure);
        assert_eq!(err.code(), Some(5));
    }

    #[test]
    fn test_empty_value_still_fetches() {
        let native = Scripted::new(vec![
            (reply(ERROR_SUCCESS, ValueType::String, 0), vec![]),
            (reply(ERROR_SUCCESS, ValueType::String, 0), vec![]),
        ]);

        let raw = query_raw(&native, KEY, "", ValueCategory::Textual).unwrap();
        assert!(raw.data.is_empty());
        assert_eq!(*native.buffer_lengths.borrow(), vec![None, Some(0)]);
    }

    #[test]
    fn test_any_category_accepts_binary() {
        let native = Scripted::new(vec![
            (reply(ERROR_SUCCESS, ValueType::Binary, 2), vec![]),
            (reply(ERROR_SUCCESS, ValueType::Binary, 2), vec![0xAB, 0xCD]),
        ]);

        let raw = query_raw(&native, KEY, "Blob", ValueCategory::Any).unwrap();
        assert_eq!(raw.data, vec![0xAB, 0xCD]);
    }

    #[test]
    fn test_nul_in_name_is_rejected() {
        let native = Scripted::new(vec![]);
        let err = query_raw(&native, KEY, "bad\0name", ValueCategory::Any).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(native.buffer_lengths.borrow().is_empty());
    }
}
