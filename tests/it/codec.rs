use crate::helpers::*;
use stashdb::{Codec, EncryptionMethod, Error, Map, Value};

fn sample_tree() -> Map {
    let mut tree = Map::new();
    tree.insert("users".to_string(), map_of(&[("1", user("Alice", 30))]));
    tree.insert(
        "tags".to_string(),
        Value::Array(vec![Value::from("a"), Value::Int(2), Value::Null]),
    );
    tree
}

#[test]
fn test_round_trip_all_methods() {
    let tree = sample_tree();

    for (method, key) in [
        (EncryptionMethod::None, None),
        (EncryptionMethod::Base64, None),
        (EncryptionMethod::Aes, Some("secret".to_string())),
    ] {
        let codec = Codec::new(method, key).expect("Failed to build codec");
        let encoded = codec.encode(&tree).expect("Failed to encode");
        let decoded = codec.decode(&encoded).expect("Failed to decode");
        assert_eq!(decoded, tree, "round trip failed for method {method}");
    }
}

#[test]
fn test_round_trip_empty_tree() {
    for (method, key) in [
        (EncryptionMethod::None, None),
        (EncryptionMethod::Base64, None),
        (EncryptionMethod::Aes, Some("secret".to_string())),
    ] {
        let codec = Codec::new(method, key).expect("Failed to build codec");
        let encoded = codec.encode(&Map::new()).expect("Failed to encode");
        let decoded = codec.decode(&encoded).expect("Failed to decode");
        assert!(decoded.is_empty(), "empty tree round trip for {method}");
    }
}

#[test]
fn test_none_method_is_plain_json() {
    let codec = Codec::new(EncryptionMethod::None, None).expect("Failed to build codec");
    let encoded = codec.encode(&Map::new()).expect("Failed to encode");
    assert_eq!(encoded, "{}");
}

#[test]
fn test_aes_payload_has_salt_iv_ciphertext_shape() {
    let codec =
        Codec::new(EncryptionMethod::Aes, Some("secret".to_string())).expect("Failed to build");
    let encoded = codec.encode(&sample_tree()).expect("Failed to encode");

    let parts: Vec<&str> = encoded.split(':').collect();
    assert_eq!(parts.len(), 3);
    // No part is plaintext JSON
    assert!(!encoded.contains("Alice"));
}

#[test]
fn test_aes_uses_fresh_salt_and_iv_per_encode() {
    let codec =
        Codec::new(EncryptionMethod::Aes, Some("secret".to_string())).expect("Failed to build");
    let tree = sample_tree();

    let first = codec.encode(&tree).expect("Failed to encode");
    let second = codec.encode(&tree).expect("Failed to encode");
    assert_ne!(first, second);
}

#[test]
fn test_aes_wrong_key_fails_with_decode_error() {
    let writer =
        Codec::new(EncryptionMethod::Aes, Some("secret".to_string())).expect("Failed to build");
    let reader =
        Codec::new(EncryptionMethod::Aes, Some("wrong".to_string())).expect("Failed to build");

    let encoded = writer.encode(&sample_tree()).expect("Failed to encode");
    match reader.decode(&encoded) {
        Err(Error::Decode(_)) => {}
        other => panic!("Expected Decode, got {other:?}"),
    }
}

#[test]
fn test_aes_malformed_payload_fails_with_decode_error() {
    let codec =
        Codec::new(EncryptionMethod::Aes, Some("secret".to_string())).expect("Failed to build");

    for payload in ["", "only-one-part", "a:b", "!!!:!!!:!!!"] {
        match codec.decode(payload) {
            Err(Error::Decode(_)) => {}
            other => panic!("Expected Decode for {payload:?}, got {other:?}"),
        }
    }
}

#[test]
fn test_base64_invalid_payload_fails_with_decode_error() {
    let codec = Codec::new(EncryptionMethod::Base64, None).expect("Failed to build codec");

    match codec.decode("not base64 at all!") {
        Err(Error::Decode(_)) => {}
        other => panic!("Expected Decode, got {other:?}"),
    }
}

#[test]
fn test_invalid_json_fails_with_decode_error() {
    let codec = Codec::new(EncryptionMethod::None, None).expect("Failed to build codec");

    match codec.decode("{ not json") {
        Err(Error::Decode(_)) => {}
        other => panic!("Expected Decode, got {other:?}"),
    }
}

#[test]
fn test_aes_requires_non_empty_key() {
    match Codec::new(EncryptionMethod::Aes, None) {
        Err(Error::Config(_)) => {}
        other => panic!("Expected Config, got {:?}", other.err()),
    }
    match Codec::new(EncryptionMethod::Aes, Some(String::new())) {
        Err(Error::Config(_)) => {}
        other => panic!("Expected Config, got {:?}", other.err()),
    }
}

#[test]
fn test_method_names_parse_case_insensitively() {
    assert_eq!(EncryptionMethod::from_name("BASE64"), EncryptionMethod::Base64);
    assert_eq!(EncryptionMethod::from_name("aes"), EncryptionMethod::Aes);
    assert_eq!(EncryptionMethod::from_name("none"), EncryptionMethod::None);
    // Unknown names fall back to no encryption
    assert_eq!(EncryptionMethod::from_name("rot13"), EncryptionMethod::None);
}
