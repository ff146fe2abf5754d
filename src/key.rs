//! Registry key resource.
//!
//! A [`Key`] owns one native handle. It is created by opening a path under
//! another key (ultimately under one of the predefined [`RootKey`]s), borrowed
//! by value queries, and released either explicitly with [`Key::close`] or
//! implicitly when dropped.

use crate::error::Result;
use crate::native::{NativeRegistry, RawHandle};
use crate::negotiate::RawValue;
use crate::registry::Registry;
use std::fmt;
use tracing::warn;

/// Predefined top-level registry keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootKey {
    /// `HKEY_CLASSES_ROOT`
    ClassesRoot,
    /// `HKEY_CURRENT_USER`
    CurrentUser,
    /// `HKEY_LOCAL_MACHINE`
    LocalMachine,
    /// `HKEY_USERS`
    Users,
    /// `HKEY_CURRENT_CONFIG`
    CurrentConfig,
}

impl RootKey {
    /// All predefined roots.
    pub const ALL: [RootKey; 5] = [
        RootKey::ClassesRoot,
        RootKey::CurrentUser,
        RootKey::LocalMachine,
        RootKey::Users,
        RootKey::CurrentConfig,
    ];

    /// Returns the reserved native handle of this root.
    pub const fn handle(self) -> RawHandle {
        let offset = match self {
            RootKey::ClassesRoot => 0,
            RootKey::CurrentUser => 1,
            RootKey::LocalMachine => 2,
            RootKey::Users => 3,
            RootKey::CurrentConfig => 5,
        };
        RawHandle((0x8000_0000u32 + offset) as i32 as isize)
    }

    /// Returns the root whose reserved handle is `handle`, if any.
    pub fn from_handle(handle: RawHandle) -> Option<Self> {
        Self::ALL.into_iter().find(|root| root.handle() == handle)
    }

    /// Returns the conventional name of this root.
    pub fn name(&self) -> &'static str {
        match self {
            RootKey::ClassesRoot => "HKEY_CLASSES_ROOT",
            RootKey::CurrentUser => "HKEY_CURRENT_USER",
            RootKey::LocalMachine => "HKEY_LOCAL_MACHINE",
            RootKey::Users => "HKEY_USERS",
            RootKey::CurrentConfig => "HKEY_CURRENT_CONFIG",
        }
    }
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An open registry key.
///
/// Owned keys close their handle on drop; predefined roots are never closed.
/// Operations on a closed key fail with `InvalidArgument` without reaching
/// the native layer.
pub struct Key<'r, N: NativeRegistry> {
    registry: &'r Registry<N>,
    handle: RawHandle,
    predefined: bool,
}

impl<'r, N: NativeRegistry> Key<'r, N> {
    pub(crate) fn owned(registry: &'r Registry<N>, handle: RawHandle) -> Self {
        Self {
            registry,
            handle,
            predefined: false,
        }
    }

    pub(crate) fn predefined(registry: &'r Registry<N>, root: RootKey) -> Self {
        Self {
            registry,
            handle: root.handle(),
            predefined: true,
        }
    }

    /// Returns the native handle, null once the key is closed.
    pub fn handle(&self) -> RawHandle {
        self.handle
    }

    /// Returns true until the key is closed.
    pub fn is_open(&self) -> bool {
        !self.handle.is_null()
    }

    /// Returns true for the predefined root keys.
    pub fn is_predefined(&self) -> bool {
        self.predefined
    }

    /// Returns the registry this key was opened through.
    pub fn registry(&self) -> &'r Registry<N> {
        self.registry
    }

    pub(crate) fn clear(&mut self) {
        self.handle = RawHandle::NULL;
    }

    /// Opens a subkey for reading.
    pub fn open_sub_key(&self, sub_path: &str) -> Result<Key<'r, N>> {
        self.registry.open_key(self, sub_path, false)
    }

    /// Opens a subkey for reading or writing.
    pub fn open_sub_key_for(&self, sub_path: &str, for_writing: bool) -> Result<Key<'r, N>> {
        self.registry.open_key(self, sub_path, for_writing)
    }

    /// Queries the unnamed (default) value of this key.
    pub fn query_unnamed_value(&self) -> Result<Option<String>> {
        self.registry.query_unnamed_value(self)
    }

    /// Queries the unnamed value, returning `fallback` if it does not exist.
    pub fn query_unnamed_value_or(&self, fallback: &str) -> Result<Option<String>> {
        self.registry.query_unnamed_value_or(self, fallback)
    }

    /// Queries a textual (`REG_SZ` / `REG_EXPAND_SZ`) value.
    pub fn query_string_value(&self, name: &str) -> Result<Option<String>> {
        self.registry.query_string_value(self, name)
    }

    /// Queries a textual value, returning `fallback` if it does not exist.
    pub fn query_string_value_or(&self, name: &str, fallback: &str) -> Result<Option<String>> {
        self.registry.query_string_value_or(self, name, fallback)
    }

    /// Queries a numeric (`REG_DWORD` / `REG_DWORD_BIG_ENDIAN`) value.
    pub fn query_int_value(&self, name: &str) -> Result<i32> {
        self.registry.query_int_value(self, name)
    }

    /// Queries a numeric value, returning `fallback` if it does not exist.
    pub fn query_int_value_or(&self, name: &str, fallback: i32) -> Result<i32> {
        self.registry.query_int_value_or(self, name, fallback)
    }

    /// Queries a value of any type without decoding it.
    pub fn query_raw_value(&self, name: &str) -> Result<RawValue> {
        self.registry.query_raw_value(self, name)
    }

    /// Closes the key.
    ///
    /// The handle is cleared even if the native close fails. Closing a key
    /// that is already closed, or a predefined root, does nothing.
    pub fn close(&mut self) -> Result<()> {
        let registry = self.registry;
        registry.close_key(self)
    }
}

impl<N: NativeRegistry> Drop for Key<'_, N> {
    fn drop(&mut self) {
        if self.predefined || self.handle.is_null() {
            return;
        }
        if let Err(err) = self.close() {
            warn!(error = %err, "Failed to close registry key on drop");
        }
    }
}

impl<N: NativeRegistry> fmt::Display for Key<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.handle.is_null() {
            return f.write_str("(closed)");
        }
        match RootKey::from_handle(self.handle) {
            Some(root) => f.write_str(root.name()),
            None => write!(f, "{:#x}", self.handle.0 as usize),
        }
    }
}

impl<N: NativeRegistry> fmt::Debug for Key<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("handle", &self.handle)
            .field("predefined", &self.predefined)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRegistry;

    #[test]
    fn test_root_handles() {
        assert_eq!(RootKey::ClassesRoot.handle(), RawHandle(0x8000_0000u32 as i32 as isize));
        assert_eq!(RootKey::CurrentUser.handle(), RawHandle(0x8000_0001u32 as i32 as isize));
        assert_eq!(RootKey::LocalMachine.handle(), RawHandle(0x8000_0002u32 as i32 as isize));
        assert!(!RootKey::LocalMachine.handle().is_null());
    }

    #[test]
    fn test_root_from_handle() {
        for root in RootKey::ALL {
            assert_eq!(RootKey::from_handle(root.handle()), Some(root));
        }
        assert_eq!(RootKey::from_handle(RawHandle(0x1000)), None);
    }

    #[test]
    fn test_display() {
        let registry = Registry::new(MemoryRegistry::new().with_key(r"HKEY_CURRENT_USER\Software"));
        assert_eq!(registry.current_user().to_string(), "HKEY_CURRENT_USER");
        assert_eq!(registry.local_machine().to_string(), "HKEY_LOCAL_MACHINE");

        let mut key = registry.current_user().open_sub_key("Software").unwrap();
        assert_eq!(key.to_string(), format!("{:#x}", key.handle().0 as usize));

        key.close().unwrap();
        assert_eq!(key.to_string(), "(closed)");
    }

    #[test]
    fn test_drop_closes_owned_key() {
        let registry = Registry::new(MemoryRegistry::new().with_key(r"HKEY_CURRENT_USER\Software"));
        {
            let _key = registry.current_user().open_sub_key("Software").unwrap();
            assert_eq!(registry.native().open_handles(), 1);
        }
        assert_eq!(registry.native().open_handles(), 0);
        assert_eq!(registry.native().calls().close, 1);
    }

    #[test]
    fn test_roots_are_never_closed() {
        let registry = Registry::new(MemoryRegistry::new());
        let mut root = registry.local_machine();
        root.close().unwrap();
        assert!(root.is_open());
        drop(root);
        assert_eq!(registry.native().calls().close, 0);
    }
}
