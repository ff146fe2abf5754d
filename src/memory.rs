//! In-memory native binding.
//!
//! [`MemoryRegistry`] behaves like advapi32 for the three calls the access
//! layer makes, over a tree of keys held in memory. It counts every native
//! call and remembers the last open request, which makes it suitable for
//! testing code built on [`Registry`](crate::Registry) on any platform.
//!
//! Key paths start with a root name (`HKEY_LOCAL_MACHINE\SOFTWARE\...`).
//! Key and value names are case-insensitive, as in the real registry.

use crate::key::RootKey;
use crate::native::{
    NativeRegistry, OpenReply, QueryReply, RawHandle, ERROR_FILE_NOT_FOUND, ERROR_INVALID_HANDLE,
    ERROR_MORE_DATA, ERROR_SUCCESS,
};
use crate::types::ValueType;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::CStr;

/// First handle value handed out for opened keys.
const FIRST_HANDLE: isize = 0x1000;

/// Number of native calls made so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NativeCalls {
    /// Calls to `open_key`.
    pub open: usize,
    /// Calls to `query_value`.
    pub query: usize,
    /// Calls to `close_key`.
    pub close: usize,
}

impl NativeCalls {
    /// Total number of native calls.
    pub fn total(&self) -> usize {
        self.open + self.query + self.close
    }
}

/// Arguments of an `open_key` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    /// Sub key path as passed to the native layer.
    pub path: String,
    /// `ulOptions` argument.
    pub options: u32,
    /// Requested access mask.
    pub access: u32,
}

#[derive(Debug, Clone)]
struct StoredValue {
    value_type: u32,
    data: Vec<u8>,
    /// Replaces the value right after the next probe, simulating a writer
    /// racing with the reader.
    after_probe: Option<(u32, Vec<u8>)>,
}

/// Registry binding over an in-memory key tree.
#[derive(Debug)]
pub struct MemoryRegistry {
    loaded: bool,
    keys: RefCell<HashMap<String, HashMap<String, StoredValue>>>,
    handles: RefCell<HashMap<isize, String>>,
    next_handle: Cell<isize>,
    close_status: u32,
    code_page: Option<u32>,
    calls: Cell<NativeCalls>,
    last_open: RefCell<Option<OpenRequest>>,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegistry {
    /// Creates an empty, loaded binding. All predefined roots exist.
    pub fn new() -> Self {
        let keys: HashMap<String, HashMap<String, StoredValue>> = RootKey::ALL
            .into_iter()
            .map(|root| (normalize(root.name()), HashMap::new()))
            .collect();
        Self {
            loaded: true,
            keys: RefCell::new(keys),
            handles: RefCell::new(HashMap::new()),
            next_handle: Cell::new(FIRST_HANDLE),
            close_status: ERROR_SUCCESS,
            code_page: None,
            calls: Cell::new(NativeCalls::default()),
            last_open: RefCell::new(None),
        }
    }

    /// Creates a binding that reports itself as not loaded.
    pub fn unloaded() -> Self {
        Self {
            loaded: false,
            ..Self::new()
        }
    }

    /// Adds a key and all its ancestors.
    pub fn with_key(self, path: &str) -> Self {
        self.insert_key(&normalize(path));
        self
    }

    /// Adds a value with raw data, creating its key if needed.
    pub fn with_value(self, path: &str, name: &str, value_type: ValueType, data: Vec<u8>) -> Self {
        let key = normalize(path);
        self.insert_key(&key);
        self.keys.borrow_mut().entry(key).or_default().insert(
            name.to_lowercase(),
            StoredValue {
                value_type: value_type.as_u32(),
                data,
                after_probe: None,
            },
        );
        self
    }

    /// Adds a `REG_SZ` value, stored with its terminator.
    pub fn with_string(self, path: &str, name: &str, value: &str) -> Self {
        let mut data = value.as_bytes().to_vec();
        data.push(0);
        self.with_value(path, name, ValueType::String, data)
    }

    /// Adds a `REG_DWORD` value.
    pub fn with_dword(self, path: &str, name: &str, value: i32) -> Self {
        self.with_value(path, name, ValueType::Dword, value.to_le_bytes().to_vec())
    }

    /// Adds a `REG_DWORD_BIG_ENDIAN` value.
    pub fn with_dword_big_endian(self, path: &str, name: &str, value: i32) -> Self {
        self.with_value(path, name, ValueType::DwordBigEndian, value.to_be_bytes().to_vec())
    }

    /// Replaces an existing value right after its next probe.
    ///
    /// Does nothing if the value does not exist.
    pub fn with_change_after_probe(self, path: &str, name: &str, value_type: ValueType, data: Vec<u8>) -> Self {
        if let Some(stored) = self
            .keys
            .borrow_mut()
            .get_mut(&normalize(path))
            .and_then(|values| values.get_mut(&name.to_lowercase()))
        {
            stored.after_probe = Some((value_type.as_u32(), data));
        }
        self
    }

    /// Makes every close call report `status`. The handle is released anyway.
    pub fn with_close_status(mut self, status: u32) -> Self {
        self.close_status = status;
        self
    }

    /// Reports `code_page` as the ANSI code page.
    pub fn with_code_page(mut self, code_page: u32) -> Self {
        self.code_page = Some(code_page);
        self
    }

    /// Returns the number of native calls made so far.
    pub fn calls(&self) -> NativeCalls {
        self.calls.get()
    }

    /// Returns the arguments of the most recent open call.
    pub fn last_open(&self) -> Option<OpenRequest> {
        self.last_open.borrow().clone()
    }

    /// Returns the number of handles opened and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.handles.borrow().len()
    }

    fn insert_key(&self, path: &str) {
        let mut keys = self.keys.borrow_mut();
        let mut prefix = String::new();
        for part in path.split('\\') {
            if !prefix.is_empty() {
                prefix.push('\\');
            }
            prefix.push_str(part);
            keys.entry(prefix.clone()).or_default();
        }
    }

    fn resolve(&self, handle: RawHandle) -> Option<String> {
        match RootKey::from_handle(handle) {
            Some(root) => Some(normalize(root.name())),
            None => self.handles.borrow().get(&handle.0).cloned(),
        }
    }

    fn count(&self, update: impl FnOnce(&mut NativeCalls)) {
        let mut calls = self.calls.get();
        update(&mut calls);
        self.calls.set(calls);
    }
}

impl NativeRegistry for MemoryRegistry {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn open_key(&self, parent: RawHandle, sub_path: &CStr, options: u32, access: u32) -> OpenReply {
        self.count(|calls| calls.open += 1);
        let sub_path = sub_path.to_string_lossy().into_owned();
        *self.last_open.borrow_mut() = Some(OpenRequest {
            path: sub_path.clone(),
            options,
            access,
        });

        let Some(base) = self.resolve(parent) else {
            return OpenReply {
                status: ERROR_INVALID_HANDLE,
                handle: RawHandle::NULL,
            };
        };
        let sub = normalize(&sub_path);
        let path = if sub.is_empty() { base } else { format!("{}\\{}", base, sub) };

        if !self.keys.borrow().contains_key(&path) {
            return OpenReply {
                status: ERROR_FILE_NOT_FOUND,
                handle: RawHandle::NULL,
            };
        }

        let handle = self.next_handle.get();
        self.next_handle.set(handle + 4);
        self.handles.borrow_mut().insert(handle, path);
        OpenReply {
            status: ERROR_SUCCESS,
            handle: RawHandle(handle),
        }
    }

    fn query_value(&self, handle: RawHandle, name: &CStr, data: Option<&mut [u8]>) -> QueryReply {
        self.count(|calls| calls.query += 1);
        let failed = |status| QueryReply {
            status,
            value_type: 0,
            length: 0,
        };

        let Some(path) = self.resolve(handle) else {
            return failed(ERROR_INVALID_HANDLE);
        };
        let mut keys = self.keys.borrow_mut();
        let Some(stored) = keys
            .get_mut(&path)
            .and_then(|values| values.get_mut(&name.to_string_lossy().to_lowercase()))
        else {
            return failed(ERROR_FILE_NOT_FOUND);
        };

        let value_type = stored.value_type;
        let length = stored.data.len() as u32;
        match data {
            None => {
                if let Some((new_type, new_data)) = stored.after_probe.take() {
                    stored.value_type = new_type;
                    stored.data = new_data;
                }
                QueryReply {
                    status: ERROR_SUCCESS,
                    value_type,
                    length,
                }
            }
            Some(buf) if buf.len() < stored.data.len() => QueryReply {
                status: ERROR_MORE_DATA,
                value_type,
                length,
            },
            Some(buf) => {
                buf[..stored.data.len()].copy_from_slice(&stored.data);
                QueryReply {
                    status: ERROR_SUCCESS,
                    value_type,
                    length,
                }
            }
        }
    }

    fn close_key(&self, handle: RawHandle) -> u32 {
        self.count(|calls| calls.close += 1);
        if self.handles.borrow_mut().remove(&handle.0).is_none() {
            return ERROR_INVALID_HANDLE;
        }
        self.close_status
    }

    fn ansi_code_page(&self) -> Option<u32> {
        self.code_page
    }
}

/// Lowercases a path and strips empty components.
fn normalize(path: &str) -> String {
    path.split('\\')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("\\")
}
