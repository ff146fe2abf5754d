//! Placeholder binding for platforms without a registry.

use super::{NativeRegistry, OpenReply, QueryReply, RawHandle, ERROR_CALL_NOT_IMPLEMENTED};
use std::ffi::CStr;

/// Binding that never loads.
///
/// A [`Registry`](crate::Registry) built on it reports itself unavailable and
/// rejects every operation before reaching these methods.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedRegistry;

impl UnsupportedRegistry {
    /// Creates the binding.
    pub fn new() -> Self {
        Self
    }
}

impl NativeRegistry for UnsupportedRegistry {
    fn is_loaded(&self) -> bool {
        false
    }

    fn open_key(&self, _parent: RawHandle, _sub_path: &CStr, _options: u32, _access: u32) -> OpenReply {
        OpenReply {
            status: ERROR_CALL_NOT_IMPLEMENTED,
            handle: RawHandle::NULL,
        }
    }

    fn query_value(&self, _handle: RawHandle, _name: &CStr, _data: Option<&mut [u8]>) -> QueryReply {
        QueryReply {
            status: ERROR_CALL_NOT_IMPLEMENTED,
            value_type: 0,
            length: 0,
        }
    }

    fn close_key(&self, _handle: RawHandle) -> u32 {
        ERROR_CALL_NOT_IMPLEMENTED
    }
}
