//! The access layer context.
//!
//! [`Registry`] ties a native binding to the availability gate and the
//! configured [`RegistryOptions`]. Every operation checks the gate first and
//! fails with `RegistryError::Unavailable` before touching the binding when
//! the binding did not load.

use crate::decode::{decode_i32, decode_string};
use crate::error::{ErrorKind, RegistryError, Result};
use crate::key::{Key, RootKey};
use crate::native::{NativeRegistry, RawHandle, SystemRegistry, ERROR_SUCCESS, KEY_READ, KEY_WRITE};
use crate::negotiate::{query_raw, RawValue};
use crate::options::{RegistryOptions, RegistryView};
use crate::types::ValueCategory;
use encoding_rs::Encoding;
use std::ffi::CString;
use tracing::{debug, info, instrument};

/// Name of the unnamed (default) value.
pub const UNNAMED_VALUE: &str = "";

/// Typed, read-only access to the registry through a native binding.
///
/// # Examples
///
/// ```no_run
/// use reg_access::Registry;
///
/// # fn main() -> reg_access::Result<()> {
/// let registry = Registry::system();
/// if registry.is_available() {
///     let key = registry.local_machine()
///         .open_sub_key("SOFTWARE/Microsoft/Windows NT/CurrentVersion")?;
///     let product = key.query_string_value_or("ProductName", "unknown")?;
///     println!("{:?}", product);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Registry<N: NativeRegistry = SystemRegistry> {
    native: N,
    available: bool,
    options: RegistryOptions,
    encoding: &'static Encoding,
}

impl Registry<SystemRegistry> {
    /// Creates a registry over the platform binding with default options.
    ///
    /// On platforms without a registry the result reports itself unavailable.
    pub fn system() -> Self {
        Self::new(SystemRegistry::new())
    }
}

impl<N: NativeRegistry> Registry<N> {
    /// Creates a registry over `native` with default options.
    ///
    /// Availability is taken from [`NativeRegistry::is_loaded`]. Narrow strings
    /// are decoded in the binding's ANSI code page when it reports one.
    pub fn new(native: N) -> Self {
        let available = native.is_loaded();
        let options = RegistryOptions::for_code_page(native.ansi_code_page());
        let encoding = options.resolve_encoding().unwrap_or(encoding_rs::WINDOWS_1252);
        info!(available, encoding = encoding.name(), "Registry access layer initialized");
        Self {
            native,
            available,
            options,
            encoding,
        }
    }

    /// Starts building a registry over `native`.
    pub fn builder(native: N) -> RegistryBuilder<N> {
        RegistryBuilder::new(native)
    }

    /// Returns true if the native binding is usable.
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Returns the options in effect.
    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Returns the underlying native binding.
    pub fn native(&self) -> &N {
        &self.native
    }

    /// Returns a predefined root key.
    pub fn root(&self, root: RootKey) -> Key<'_, N> {
        Key::predefined(self, root)
    }

    /// Returns the `HKEY_CURRENT_USER` root.
    pub fn current_user(&self) -> Key<'_, N> {
        self.root(RootKey::CurrentUser)
    }

    /// Returns the `HKEY_LOCAL_MACHINE` root.
    pub fn local_machine(&self) -> Key<'_, N> {
        self.root(RootKey::LocalMachine)
    }

    fn check_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(RegistryError::Unavailable)
        }
    }

    fn live_handle(key: &Key<'_, N>) -> Result<RawHandle> {
        if key.is_open() {
            Ok(key.handle())
        } else {
            Err(RegistryError::invalid_argument("key handle is closed"))
        }
    }

    /// Opens `sub_path` under `parent`.
    ///
    /// Forward slashes in `sub_path` are accepted as separators.
    ///
    /// # Errors
    ///
    /// - `Unavailable` if the registry is not available.
    /// - `InvalidArgument` if `parent` is closed or `sub_path` contains a NUL byte.
    /// - `NotFound` if the key does not exist.
    /// - `Native` for any other native failure.
    #[instrument(skip(self, parent), fields(parent = %parent))]
    pub fn open_key(&self, parent: &Key<'_, N>, sub_path: &str, for_writing: bool) -> Result<Key<'_, N>> {
        self.check_available()?;
        let parent_handle = Self::live_handle(parent)
            .map_err(|_| RegistryError::invalid_argument("root key is closed"))?;

        let path = to_windows_path(sub_path);
        let c_path = CString::new(path.as_str()).map_err(|_| {
            RegistryError::invalid_argument(format!("sub key path {:?} contains a NUL byte", sub_path))
        })?;

        let access = (if for_writing { KEY_WRITE } else { KEY_READ }) | self.options.view.access_flag();
        let reply = self
            .native
            .open_key(parent_handle, &c_path, self.options.open_options(), access);

        if reply.status != ERROR_SUCCESS {
            return Err(RegistryError::from_status(
                reply.status,
                format!(
                    "Could not open registry key '{}' for {}",
                    sub_path,
                    if for_writing { "writing" } else { "reading" }
                ),
            ));
        }

        debug!(handle = ?reply.handle, "Opened registry key");
        Ok(Key::owned(self, reply.handle))
    }

    /// Opens `sub_path` under a predefined root.
    pub fn open_root_key(&self, root: RootKey, sub_path: &str, for_writing: bool) -> Result<Key<'_, N>> {
        self.open_key(&self.root(root), sub_path, for_writing)
    }

    /// Opens `sub_path` for reading, runs `f` on it and closes it.
    ///
    /// The key is closed on every path. An error from `f` takes precedence
    /// over an error from closing.
    pub fn with_key<T, F>(&self, parent: &Key<'_, N>, sub_path: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Key<'_, N>) -> Result<T>,
    {
        let mut key = self.open_key(parent, sub_path, false)?;
        let result = f(&key);
        let closed = self.close_key(&mut key);
        let value = result?;
        closed?;
        Ok(value)
    }

    /// Closes `key`.
    ///
    /// No-op for a closed key or a predefined root. Otherwise the handle is
    /// cleared whether or not the native close succeeds.
    #[instrument(skip(self, key), fields(key = %key))]
    pub fn close_key(&self, key: &mut Key<'_, N>) -> Result<()> {
        self.check_available()?;
        if !key.is_open() || key.is_predefined() {
            return Ok(());
        }

        let status = self.native.close_key(key.handle());
        key.clear();

        if status != ERROR_SUCCESS {
            return Err(RegistryError::Native {
                code: status,
                context: "Could not close key".to_string(),
            });
        }
        debug!("Closed registry key");
        Ok(())
    }

    fn query(&self, key: &Key<'_, N>, name: &str, category: ValueCategory) -> Result<RawValue> {
        self.check_available()?;
        let handle = Self::live_handle(key)?;
        query_raw(&self.native, handle, name, category)
    }

    /// Queries a value of any type without decoding it.
    #[instrument(skip(self, key), fields(key = %key))]
    pub fn query_raw_value(&self, key: &Key<'_, N>, name: &str) -> Result<RawValue> {
        self.query(key, name, ValueCategory::Any)
    }

    /// Queries a textual (`REG_SZ` / `REG_EXPAND_SZ`) value.
    ///
    /// Returns `None` if the value holds no data at all.
    ///
    /// # Errors
    ///
    /// - `Unavailable`, `InvalidArgument` as for [`Registry::open_key`].
    /// - `NotFound` if the value does not exist.
    /// - `TypeMismatch` if the value is not textual.
    #[instrument(skip(self, key), fields(key = %key))]
    pub fn query_string_value(&self, key: &Key<'_, N>, name: &str) -> Result<Option<String>> {
        let raw = self.query(key, name, ValueCategory::Textual)?;
        Ok(decode_string(&raw.data, self.encoding))
    }

    /// Queries a textual value, returning `fallback` if it does not exist.
    ///
    /// Only `NotFound` is replaced by the fallback; every other error is returned.
    pub fn query_string_value_or(&self, key: &Key<'_, N>, name: &str, fallback: &str) -> Result<Option<String>> {
        or_fallback(self.query_string_value(key, name), || Some(fallback.to_string()))
    }

    /// Queries the unnamed (default) value of `key`.
    pub fn query_unnamed_value(&self, key: &Key<'_, N>) -> Result<Option<String>> {
        self.query_string_value(key, UNNAMED_VALUE)
    }

    /// Queries the unnamed value, returning `fallback` if it does not exist.
    pub fn query_unnamed_value_or(&self, key: &Key<'_, N>, fallback: &str) -> Result<Option<String>> {
        self.query_string_value_or(key, UNNAMED_VALUE, fallback)
    }

    /// Queries a numeric (`REG_DWORD` / `REG_DWORD_BIG_ENDIAN`) value.
    ///
    /// The byte order follows the type the value is stored with.
    #[instrument(skip(self, key), fields(key = %key))]
    pub fn query_int_value(&self, key: &Key<'_, N>, name: &str) -> Result<i32> {
        let raw = self.query(key, name, ValueCategory::Numeric)?;
        decode_i32(name, raw.value_type, &raw.data)
    }

    /// Queries a numeric value, returning `fallback` if it does not exist.
    pub fn query_int_value_or(&self, key: &Key<'_, N>, name: &str, fallback: i32) -> Result<i32> {
        or_fallback(self.query_int_value(key, name), || fallback)
    }
}

/// Replaces a `NotFound` error with a fallback value.
fn or_fallback<T>(result: Result<T>, fallback: impl FnOnce() -> T) -> Result<T> {
    match result {
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(fallback()),
        other => other,
    }
}

/// Converts forward slashes to the backslashes the registry uses.
pub fn to_windows_path(path: &str) -> String {
    path.replace('/', "\\")
}

/// Builder for [`Registry`].
///
/// ```rust
/// use reg_access::{MemoryRegistry, Registry, RegistryView};
///
/// let registry = Registry::builder(MemoryRegistry::unloaded())
///     .view(RegistryView::Native)
///     .force_available(true)
///     .build()
///     .unwrap();
/// assert!(registry.is_available());
/// ```
pub struct RegistryBuilder<N: NativeRegistry> {
    native: N,
    options: RegistryOptions,
    force_available: bool,
}

impl<N: NativeRegistry> RegistryBuilder<N> {
    fn new(native: N) -> Self {
        let options = RegistryOptions::for_code_page(native.ansi_code_page());
        Self {
            native,
            options,
            force_available: false,
        }
    }

    /// Replaces all options.
    pub fn options(mut self, options: RegistryOptions) -> Self {
        self.options = options;
        self
    }

    /// Selects the registry view keys are opened in.
    pub fn view(mut self, view: RegistryView) -> Self {
        self.options.view = view;
        self
    }

    /// Selects whether symbolic link keys are opened themselves.
    pub fn open_link(mut self, open_link: bool) -> Self {
        self.options.open_link = open_link;
        self
    }

    /// Sets the encoding label for narrow string values.
    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.options.encoding = label.into();
        self
    }

    /// Treats the registry as available even if the binding did not load.
    ///
    /// Intended for tests that exercise the interface without a live registry.
    pub fn force_available(mut self, force: bool) -> Self {
        self.force_available = force;
        self
    }

    /// Builds the registry.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownEncoding` if the encoding label is not
    /// recognized or is not ASCII compatible.
    pub fn build(self) -> Result<Registry<N>> {
        let encoding = self.options.resolve_encoding()?;
        let available = self.force_available || self.native.is_loaded();
        info!(
            available,
            forced = self.force_available,
            view = ?self.options.view,
            encoding = encoding.name(),
            "Registry access layer initialized"
        );
        Ok(Registry {
            native: self.native,
            available,
            options: self.options,
            encoding,
        })
    }
}
