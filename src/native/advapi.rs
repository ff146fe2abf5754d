//! advapi32 binding.

use super::{NativeRegistry, OpenReply, QueryReply, RawHandle};
use std::ffi::CStr;
use windows::core::PCSTR;
use windows::Win32::Globalization::GetACP;
use windows::Win32::System::Registry::{
    RegCloseKey, RegOpenKeyExA, RegQueryValueExA, HKEY, REG_SAM_FLAGS, REG_VALUE_TYPE,
};

/// Native binding over the Windows registry API.
///
/// advapi32 is linked at load time, so this binding is always loaded.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsRegistry;

impl WindowsRegistry {
    /// Creates the binding.
    pub fn new() -> Self {
        Self
    }
}

impl NativeRegistry for WindowsRegistry {
    fn is_loaded(&self) -> bool {
        true
    }

    fn open_key(&self, parent: RawHandle, sub_path: &CStr, options: u32, access: u32) -> OpenReply {
        let mut opened = HKEY(0);
        // SAFETY: `sub_path` is a valid NUL-terminated string for the duration
        // of the call and `opened` is a live out-pointer.
        let status = unsafe {
            RegOpenKeyExA(
                HKEY(parent.0),
                PCSTR(sub_path.as_ptr().cast()),
                options,
                REG_SAM_FLAGS(access),
                &mut opened,
            )
        };
        OpenReply {
            status: status.0,
            handle: RawHandle(opened.0),
        }
    }

    fn query_value(&self, handle: RawHandle, name: &CStr, data: Option<&mut [u8]>) -> QueryReply {
        let mut value_type = REG_VALUE_TYPE(0);
        let (data_ptr, mut length) = match data {
            Some(buf) => (Some(buf.as_mut_ptr()), buf.len() as u32),
            None => (None, 0),
        };
        // SAFETY: `data_ptr` points to at least `length` writable bytes, and
        // the type and length out-pointers outlive the call.
        let status = unsafe {
            RegQueryValueExA(
                HKEY(handle.0),
                PCSTR(name.as_ptr().cast()),
                None,
                Some(&mut value_type as *mut REG_VALUE_TYPE),
                data_ptr,
                Some(&mut length as *mut u32),
            )
        };
        QueryReply {
            status: status.0,
            value_type: value_type.0,
            length,
        }
    }

    fn close_key(&self, handle: RawHandle) -> u32 {
        // SAFETY: closing an arbitrary value is reported through the status
        // code; the caller never reuses the handle afterwards.
        unsafe { RegCloseKey(HKEY(handle.0)) }.0
    }

    fn ansi_code_page(&self) -> Option<u32> {
        // SAFETY: no arguments; reads process-wide locale state.
        Some(unsafe { GetACP() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native;
    use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_MORE_DATA, ERROR_SUCCESS};
    use windows::Win32::System::Registry::{
        KEY_READ, KEY_WOW64_32KEY, KEY_WOW64_64KEY, KEY_WRITE, REG_OPTION_OPEN_LINK,
    };

    #[test]
    fn test_constants_match_sdk() {
        assert_eq!(native::ERROR_SUCCESS, ERROR_SUCCESS.0);
        assert_eq!(native::ERROR_FILE_NOT_FOUND, ERROR_FILE_NOT_FOUND.0);
        assert_eq!(native::ERROR_MORE_DATA, ERROR_MORE_DATA.0);
        assert_eq!(native::KEY_READ, KEY_READ.0);
        assert_eq!(native::KEY_WRITE, KEY_WRITE.0);
        assert_eq!(native::KEY_WOW64_64KEY, KEY_WOW64_64KEY.0);
        assert_eq!(native::KEY_WOW64_32KEY, KEY_WOW64_32KEY.0);
        assert_eq!(native::REG_OPTION_OPEN_LINK, REG_OPTION_OPEN_LINK.0);
    }

    #[test]
    fn test_binding_is_loaded() {
        assert!(WindowsRegistry::new().is_loaded());
    }
}
