//! Access layer configuration.

use crate::error::{RegistryError, Result};
use crate::native::{KEY_WOW64_32KEY, KEY_WOW64_64KEY, REG_OPTION_OPEN_LINK};
use encoding_rs::Encoding;

/// Encoding for narrow (`A`-suffixed API) strings when the binding does not
/// report its ANSI code page.
pub const DEFAULT_ENCODING: &str = "windows-1252";

/// Returns the encoding label for a Windows ANSI code page.
///
/// Only code pages whose narrow form keeps ASCII (and therefore NUL) as single
/// bytes are listed.
pub fn code_page_label(code_page: u32) -> Option<&'static str> {
    let label = match code_page {
        874 => "windows-874",
        932 => "shift_jis",
        936 => "gbk",
        949 => "euc-kr",
        950 => "big5",
        1250 => "windows-1250",
        1251 => "windows-1251",
        1252 => "windows-1252",
        1253 => "windows-1253",
        1254 => "windows-1254",
        1255 => "windows-1255",
        1256 => "windows-1256",
        1257 => "windows-1257",
        1258 => "windows-1258",
        65001 => "utf-8",
        _ => return None,
    };
    Some(label)
}

/// Which registry view keys are opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum RegistryView {
    /// The view matching the bitness of the current process.
    Native,
    /// Always the 64-bit view.
    #[default]
    Force64,
    /// Always the 32-bit view.
    Force32,
}

impl RegistryView {
    /// Returns the access mask bit selecting this view.
    pub fn access_flag(&self) -> u32 {
        match self {
            RegistryView::Native => 0,
            RegistryView::Force64 => KEY_WOW64_64KEY,
            RegistryView::Force32 => KEY_WOW64_32KEY,
        }
    }
}

/// Options applied to every key opened through a [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct RegistryOptions {
    /// Registry view requested on open.
    pub view: RegistryView,

    /// Open symbolic link keys themselves instead of following them.
    pub open_link: bool,

    /// Label of the encoding used to decode narrow string values,
    /// as understood by `encoding_rs` (e.g. `"windows-1252"`, `"utf-8"`).
    ///
    /// The narrow API converts strings to the system ANSI code page, so this
    /// should name that code page. Encodings that are not ASCII compatible
    /// (UTF-16, ISO-2022-JP) are rejected.
    pub encoding: String,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            view: RegistryView::default(),
            open_link: true,
            encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

impl RegistryOptions {
    /// Returns default options decoding strings in `code_page`.
    ///
    /// Falls back to [`DEFAULT_ENCODING`] for unknown or missing code pages.
    pub fn for_code_page(code_page: Option<u32>) -> Self {
        let encoding = code_page.and_then(code_page_label).unwrap_or(DEFAULT_ENCODING);
        Self {
            encoding: encoding.to_string(),
            ..Self::default()
        }
    }

    /// Returns the `ulOptions` argument for the native open call.
    pub fn open_options(&self) -> u32 {
        if self.open_link {
            REG_OPTION_OPEN_LINK
        } else {
            0
        }
    }

    /// Resolves the configured encoding label.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownEncoding` if the label is not recognized
    /// or names an encoding that is not ASCII compatible. Values are cut at
    /// the first zero byte, which such encodings use inside characters.
    pub fn resolve_encoding(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.encoding.trim().as_bytes())
            .filter(|encoding| encoding.is_ascii_compatible())
            .ok_or_else(|| RegistryError::UnknownEncoding(self.encoding.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults_preserve_64bit_view() {
        let options = RegistryOptions::default();
        assert_eq!(options.view, RegistryView::Force64);
        assert_eq!(options.view.access_flag(), KEY_WOW64_64KEY);
        assert_eq!(options.open_options(), REG_OPTION_OPEN_LINK);
        assert_eq!(options.resolve_encoding().unwrap(), encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn test_view_flags() {
        assert_eq!(RegistryView::Native.access_flag(), 0);
        assert_eq!(RegistryView::Force32.access_flag(), KEY_WOW64_32KEY);
    }

    #[test]
    fn test_unknown_encoding() {
        let options = RegistryOptions {
            encoding: "klingon".into(),
            ..RegistryOptions::default()
        };
        let err = options.resolve_encoding().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_rejects_encodings_with_embedded_zero_bytes() {
        for label in ["utf-16le", "UTF-16BE", "replacement", "iso-2022-jp"] {
            let options = RegistryOptions {
                encoding: label.into(),
                ..RegistryOptions::default()
            };
            let err = options.resolve_encoding().unwrap_err();
            assert!(matches!(err, RegistryError::UnknownEncoding(_)), "{}", label);
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_code_page_labels_resolve() {
        for code_page in [874, 932, 936, 949, 950, 1250, 1251, 1252, 1253, 1254, 1255, 1256, 1257, 1258, 65001] {
            let options = RegistryOptions::for_code_page(Some(code_page));
            assert!(options.resolve_encoding().is_ok(), "code page {}", code_page);
        }
        assert_eq!(
            RegistryOptions::for_code_page(Some(1251)).resolve_encoding().unwrap(),
            encoding_rs::WINDOWS_1251
        );
        assert_eq!(
            RegistryOptions::for_code_page(Some(932)).resolve_encoding().unwrap(),
            encoding_rs::SHIFT_JIS
        );
    }

    #[test]
    fn test_unknown_code_page_falls_back() {
        assert_eq!(code_page_label(37), None);
        assert_eq!(RegistryOptions::for_code_page(Some(37)), RegistryOptions::default());
        assert_eq!(RegistryOptions::for_code_page(None), RegistryOptions::default());
    }

    #[test]
    fn test_encoding_label_is_case_insensitive() {
        let options = RegistryOptions {
            encoding: "UTF-8".into(),
            ..RegistryOptions::default()
        };
        assert_eq!(options.resolve_encoding().unwrap(), encoding_rs::UTF_8);
    }
}
