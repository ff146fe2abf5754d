//! Native registry binding.
//!
//! The access layer never calls the operating system directly. It talks to an
//! implementation of [`NativeRegistry`], which mirrors the three advapi32
//! entry points the crate needs (`RegOpenKeyExA`, `RegQueryValueExA` and
//! `RegCloseKey`) and reports raw status codes exactly as the OS does.
//!
//! On Windows, [`SystemRegistry`] is backed by advapi32. Elsewhere it is a
//! binding that reports itself as not loaded, so every operation is refused by
//! the availability gate before any native call is made.

use std::ffi::CStr;
use std::fmt;

#[cfg(windows)]
mod advapi;
#[cfg(not(windows))]
mod unsupported;

#[cfg(windows)]
pub use self::advapi::WindowsRegistry;
#[cfg(not(windows))]
pub use self::unsupported::UnsupportedRegistry;

/// The binding used by [`Registry::system`](crate::Registry::system).
#[cfg(windows)]
pub type SystemRegistry = WindowsRegistry;

/// The binding used by [`Registry::system`](crate::Registry::system).
#[cfg(not(windows))]
pub type SystemRegistry = UnsupportedRegistry;

/// The operation completed successfully.
pub const ERROR_SUCCESS: u32 = 0;
/// The key or value does not exist.
pub const ERROR_FILE_NOT_FOUND: u32 = 2;
/// The handle is not a valid open key.
pub const ERROR_INVALID_HANDLE: u32 = 6;
/// The function is not supported on this platform.
pub const ERROR_CALL_NOT_IMPLEMENTED: u32 = 120;
/// The supplied buffer is too small for the value data.
pub const ERROR_MORE_DATA: u32 = 234;

/// Access mask for reading a key.
pub const KEY_READ: u32 = 0x0002_0019;
/// Access mask for writing a key.
pub const KEY_WRITE: u32 = 0x0002_0006;
/// Access the 64-bit registry view regardless of process bitness.
pub const KEY_WOW64_64KEY: u32 = 0x0100;
/// Access the 32-bit registry view regardless of process bitness.
pub const KEY_WOW64_32KEY: u32 = 0x0200;

/// Open option: open the symbolic link key itself rather than its target.
pub const REG_OPTION_OPEN_LINK: u32 = 0x0008;

/// Raw native key handle.
///
/// Predefined root handles use the reserved values `0x8000_0000 + n`,
/// sign-extended to pointer width as Windows does.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(pub isize);

impl RawHandle {
    /// The cleared handle of a closed key.
    pub const NULL: RawHandle = RawHandle(0);

    /// Returns true if this is the cleared handle.
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawHandle({:#x})", self.0 as usize)
    }
}

/// Result of a native open call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenReply {
    /// Native status code.
    pub status: u32,
    /// Handle of the opened key, null unless `status` is `ERROR_SUCCESS`.
    pub handle: RawHandle,
}

/// Result of a native value query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryReply {
    /// Native status code.
    pub status: u32,
    /// Raw value type tag.
    pub value_type: u32,
    /// Data length in bytes: required length on a probe or `ERROR_MORE_DATA`,
    /// copied length on a successful fetch.
    pub length: u32,
}

/// The native calls the access layer is built on.
///
/// Implementations must behave like advapi32: a query with no data buffer
/// reports the type and required length; a query with a buffer that is too
/// small fails with [`ERROR_MORE_DATA`] and reports the required length.
pub trait NativeRegistry {
    /// Returns true if the binding loaded and may be called.
    fn is_loaded(&self) -> bool;

    /// Opens `sub_path` relative to `parent`.
    fn open_key(&self, parent: RawHandle, sub_path: &CStr, options: u32, access: u32) -> OpenReply;

    /// Queries value `name` of the key, copying data into `data` when given.
    fn query_value(&self, handle: RawHandle, name: &CStr, data: Option<&mut [u8]>) -> QueryReply;

    /// Closes an open key handle.
    fn close_key(&self, handle: RawHandle) -> u32;

    /// Returns the code page narrow strings are converted to, if known.
    fn ansi_code_page(&self) -> Option<u32> {
        None
    }
}

impl<T: NativeRegistry + ?Sized> NativeRegistry for &T {
    fn is_loaded(&self) -> bool {
        (**self).is_loaded()
    }

    fn open_key(&self, parent: RawHandle, sub_path: &CStr, options: u32, access: u32) -> OpenReply {
        (**self).open_key(parent, sub_path, options, access)
    }

    fn query_value(&self, handle: RawHandle, name: &CStr, data: Option<&mut [u8]>) -> QueryReply {
        (**self).query_value(handle, name, data)
    }

    fn close_key(&self, handle: RawHandle) -> u32 {
        (**self).close_key(handle)
    }

    fn ansi_code_page(&self) -> Option<u32> {
        (**self).ansi_code_page()
    }
}
