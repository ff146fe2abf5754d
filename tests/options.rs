//! Serialized form of the access layer options.

#![cfg(feature = "serde")]

use reg_access::{MemoryRegistry, Registry, RegistryOptions, RegistryView, ValueType};

#[test]
fn test_options_from_json() {
    let options: RegistryOptions =
        serde_json::from_str(r#"{ "view": "force32", "encoding": "utf-8" }"#).unwrap();

    assert_eq!(options.view, RegistryView::Force32);
    assert_eq!(options.encoding, "utf-8");
    // Missing fields keep their defaults
    assert!(options.open_link);

    let registry = Registry::builder(MemoryRegistry::new()).options(options).build().unwrap();
    assert_eq!(registry.options().view, RegistryView::Force32);
}

#[test]
fn test_empty_json_is_default() {
    let options: RegistryOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(options, RegistryOptions::default());
}

#[test]
fn test_options_serialize() {
    let json = serde_json::to_value(RegistryOptions::default()).unwrap();
    assert_eq!(json["view"], "force64");
    assert_eq!(json["open-link"], true);
    assert_eq!(json["encoding"], "windows-1252");
}

#[test]
fn test_value_type_serialize() {
    assert_eq!(serde_json::to_string(&ValueType::DwordBigEndian).unwrap(), r#""dword-big-endian""#);
    assert_eq!(serde_json::to_string(&ValueType::Unknown(42)).unwrap(), r#"{"unknown":42}"#);
}
