//! Registry value type tags.
//!
//! The native layer reports a value's type as a raw `u32` tag during the
//! probe phase. [`ValueType`] names those tags and [`ValueCategory`] groups
//! them into what the semantic accessors are willing to decode.

use std::fmt;

/// Registry value data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ValueType {
    /// No value type.
    None,

    /// String (null-terminated).
    String,

    /// String with environment variables.
    ExpandString,

    /// Binary data.
    Binary,

    /// 32-bit little-endian integer.
    Dword,

    /// 32-bit big-endian integer.
    DwordBigEndian,

    /// Symbolic link.
    Link,

    /// Multiple strings.
    MultiString,

    /// Resource list.
    ResourceList,

    /// Full resource descriptor.
    FullResourceDescriptor,

    /// Resource requirements list.
    ResourceRequirementsList,

    /// 64-bit little-endian integer.
    Qword,

    /// Unknown or non-standard value type.
    /// Contains the raw type value.
    Unknown(u32),
}

impl ValueType {
    /// Parses a value type from the raw tag reported by the native layer.
    ///
    /// Tags 0-11 are predefined; anything else is kept as `ValueType::Unknown`.
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => ValueType::None,
            1 => ValueType::String,
            2 => ValueType::ExpandString,
            3 => ValueType::Binary,
            4 => ValueType::Dword,
            5 => ValueType::DwordBigEndian,
            6 => ValueType::Link,
            7 => ValueType::MultiString,
            8 => ValueType::ResourceList,
            9 => ValueType::FullResourceDescriptor,
            10 => ValueType::ResourceRequirementsList,
            11 => ValueType::Qword,
            _ => ValueType::Unknown(value),
        }
    }

    /// Returns the raw tag of this value type.
    pub fn as_u32(&self) -> u32 {
        match self {
            ValueType::None => 0,
            ValueType::String => 1,
            ValueType::ExpandString => 2,
            ValueType::Binary => 3,
            ValueType::Dword => 4,
            ValueType::DwordBigEndian => 5,
            ValueType::Link => 6,
            ValueType::MultiString => 7,
            ValueType::ResourceList => 8,
            ValueType::FullResourceDescriptor => 9,
            ValueType::ResourceRequirementsList => 10,
            ValueType::Qword => 11,
            ValueType::Unknown(value) => *value,
        }
    }

    /// Returns the name of this value type.
    pub fn name(&self) -> String {
        match self {
            ValueType::None => "REG_NONE".to_string(),
            ValueType::String => "REG_SZ".to_string(),
            ValueType::ExpandString => "REG_EXPAND_SZ".to_string(),
            ValueType::Binary => "REG_BINARY".to_string(),
            ValueType::Dword => "REG_DWORD".to_string(),
            ValueType::DwordBigEndian => "REG_DWORD_BIG_ENDIAN".to_string(),
            ValueType::Link => "REG_LINK".to_string(),
            ValueType::MultiString => "REG_MULTI_SZ".to_string(),
            ValueType::ResourceList => "REG_RESOURCE_LIST".to_string(),
            ValueType::FullResourceDescriptor => "REG_FULL_RESOURCE_DESCRIPTOR".to_string(),
            ValueType::ResourceRequirementsList => "REG_RESOURCE_REQUIREMENTS_LIST".to_string(),
            ValueType::Qword => "REG_QWORD".to_string(),
            ValueType::Unknown(value) => format!("REG_UNKNOWN_{:#010x}", value),
        }
    }

    /// Returns true for `REG_SZ` and `REG_EXPAND_SZ`.
    pub fn is_textual(&self) -> bool {
        matches!(self, ValueType::String | ValueType::ExpandString)
    }

    /// Returns true for `REG_DWORD` and `REG_DWORD_BIG_ENDIAN`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Dword | ValueType::DwordBigEndian)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Semantic category requested by an accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCategory {
    /// `REG_SZ` or `REG_EXPAND_SZ`.
    Textual,
    /// `REG_DWORD` or `REG_DWORD_BIG_ENDIAN`.
    Numeric,
    /// Any type; no check is made.
    Any,
}

impl ValueCategory {
    /// Returns true if `value_type` belongs to this category.
    pub fn accepts(&self, value_type: ValueType) -> bool {
        match self {
            ValueCategory::Textual => value_type.is_textual(),
            ValueCategory::Numeric => value_type.is_numeric(),
            ValueCategory::Any => true,
        }
    }

    /// Human-readable description used in type mismatch errors.
    pub fn describe(&self) -> &'static str {
        match self {
            ValueCategory::Textual => "a textual type (REG_SZ or REG_EXPAND_SZ)",
            ValueCategory::Numeric => "a numeric type (REG_DWORD or REG_DWORD_BIG_ENDIAN)",
            ValueCategory::Any => "any type",
        }
    }
}
