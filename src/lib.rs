//! # Windows Registry Access Layer
//!
//! A thin, typed, read-only accessor layer over the Windows Registry.
//!
//! ## Features
//!
//! - **Typed reads**: textual (`REG_SZ`, `REG_EXPAND_SZ`) and 32-bit numeric
//!   (`REG_DWORD`, `REG_DWORD_BIG_ENDIAN`) values, honoring the stored byte order
//! - **Exact-size reads**: every value is probed for its size and type before
//!   its data is copied, so nothing is truncated or over-allocated
//! - **Owned handles**: keys close themselves on drop; closing twice is harmless
//! - **Fallback values**: `_or` accessors substitute a default only when the
//!   value does not exist
//! - **Availability gate**: on platforms without a registry every operation
//!   fails fast with [`ErrorKind::Unavailable`]
//!
//! ## Architecture
//!
//! 1. **Native binding** ([`native`]): raw open/query/close calls behind the
//!    [`NativeRegistry`] trait, backed by advapi32 on Windows
//! 2. **Negotiation** ([`negotiate`]): the probe-then-fetch value query
//! 3. **Decoding** ([`decode`]): raw bytes to strings and integers
//! 4. **Keys** ([`key`]): the owned handle resource
//! 5. **Registry** ([`registry`]): availability gate, options, typed accessors
//!
//! ## Examples
//!
//! ### Reading values
//!
//! ```no_run
//! use reg_access::Registry;
//!
//! # fn main() -> reg_access::Result<()> {
//! let registry = Registry::system();
//! let mut key = registry
//!     .local_machine()
//!     .open_sub_key(r"SOFTWARE\Microsoft\Windows NT\CurrentVersion")?;
//!
//! let product = key.query_string_value("ProductName")?;
//! let build = key.query_int_value_or("UBR", 0)?;
//! println!("{:?} (UBR {})", product, build);
//!
//! key.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Testing without a registry
//!
//! ```rust
//! use reg_access::{ErrorKind, MemoryRegistry, Registry};
//!
//! let native = MemoryRegistry::new()
//!     .with_string(r"HKEY_CURRENT_USER\Software\Acme", "Theme", "dark")
//!     .with_dword(r"HKEY_CURRENT_USER\Software\Acme", "Volume", 7);
//! let registry = Registry::new(native);
//!
//! let key = registry.current_user().open_sub_key("Software/Acme").unwrap();
//! assert_eq!(key.query_string_value("Theme").unwrap().as_deref(), Some("dark"));
//! assert_eq!(key.query_int_value("Volume").unwrap(), 7);
//! assert_eq!(key.query_int_value_or("Missing", -1).unwrap(), -1);
//! assert_eq!(key.query_int_value("Theme").unwrap_err().kind(), ErrorKind::TypeMismatch);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decode;
pub mod error;
pub mod key;
pub mod memory;
pub mod native;
pub mod negotiate;
pub mod options;
pub mod registry;
pub mod types;

// Re-export main types for convenience
pub use error::{ErrorKind, RegistryError, Result};
pub use key::{Key, RootKey};
pub use memory::{MemoryRegistry, NativeCalls, OpenRequest};
pub use native::{NativeRegistry, RawHandle, SystemRegistry};
pub use negotiate::RawValue;
pub use options::{RegistryOptions, RegistryView};
pub use registry::{Registry, RegistryBuilder};
pub use types::{ValueCategory, ValueType};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
