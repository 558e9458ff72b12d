//! Key/value record decoding
//!
//! A [`KeyValue`] record becomes a nested fragment of the configuration tree:
//! each dot-delimited segment of the key is one level of mapping and the last
//! segment holds the payload. Records without a format keep their payload as
//! raw bytes; records with a format are decoded by the [`Decoder`] registered
//! for it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::value::{Value, PATH_SEPARATOR};

/// One raw configuration record, as produced by a source
#[derive(Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// Dot-delimited key path (e.g., "service.name")
    pub key: String,
    /// Raw payload
    pub value: Vec<u8>,
    /// Format hint (e.g., "json"); empty means raw bytes
    pub format: String,
}

impl KeyValue {
    /// Create a raw record (no format)
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            format: String::new(),
        }
    }

    /// Create a record whose payload is decoded with `format`
    pub fn with_format(
        key: impl Into<String>,
        value: impl Into<Vec<u8>>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            format: format.into(),
        }
    }
}

impl fmt::Debug for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyValue")
            .field("key", &self.key)
            .field("value", &String::from_utf8_lossy(&self.value))
            .field("format", &self.format)
            .finish()
    }
}

/// Turns a formatted payload into a configuration value
pub trait Decoder: Send + Sync {
    /// Decode a payload
    fn decode(&self, payload: &[u8]) -> Result<Value>;

    /// The format name this decoder handles
    fn format(&self) -> &str;
}

/// A simple function-based decoder
pub struct FnDecoder<F>
where
    F: Fn(&[u8]) -> Result<Value> + Send + Sync,
{
    format: String,
    func: F,
}

impl<F> FnDecoder<F>
where
    F: Fn(&[u8]) -> Result<Value> + Send + Sync,
{
    /// Create a new function-based decoder
    pub fn new(format: impl Into<String>, func: F) -> Self {
        Self {
            format: format.into(),
            func,
        }
    }
}

impl<F> Decoder for FnDecoder<F>
where
    F: Fn(&[u8]) -> Result<Value> + Send + Sync,
{
    fn decode(&self, payload: &[u8]) -> Result<Value> {
        (self.func)(payload)
    }

    fn format(&self) -> &str {
        &self.format
    }
}

/// Registry of format decoders
#[derive(Clone)]
pub struct DecoderRegistry {
    decoders: HashMap<String, Arc<dyn Decoder>>,
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}

impl DecoderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Create a registry with the built-in decoders (json, yaml, yml)
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_fn("json", json_decoder);
        registry.register_fn("yaml", yaml_decoder);
        registry.register_fn("yml", yaml_decoder);
        registry
    }

    /// Register a decoder, replacing any decoder for the same format
    pub fn register(&mut self, decoder: Arc<dyn Decoder>) {
        self.decoders
            .insert(decoder.format().to_ascii_lowercase(), decoder);
    }

    /// Register a function as a decoder
    pub fn register_fn<F>(&mut self, format: impl Into<String>, func: F)
    where
        F: Fn(&[u8]) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnDecoder::new(format, func)));
    }

    /// Get the decoder for a format (case-insensitive)
    pub fn get(&self, format: &str) -> Option<&Arc<dyn Decoder>> {
        self.decoders.get(&format.to_ascii_lowercase())
    }

    /// Check if a format has a decoder
    pub fn contains(&self, format: &str) -> bool {
        self.get(format).is_some()
    }

    /// Registered format names, sorted
    pub fn formats(&self) -> Vec<&str> {
        let mut formats: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        formats.sort_unstable();
        formats
    }

    /// Decode a record into a fresh fragment
    pub fn decode(&self, kv: &KeyValue) -> Result<Value> {
        let mut fragment = IndexMap::new();
        self.decode_into(kv, &mut fragment)?;
        Ok(Value::Mapping(fragment))
    }

    /// Decode a record into an existing mapping, creating intermediate
    /// mappings as needed
    ///
    /// Fails with `InvalidPath` when the key runs through a non-mapping value,
    /// or when it would replace a mapping with a scalar or the other way round.
    pub fn decode_into(&self, kv: &KeyValue, target: &mut IndexMap<String, Value>) -> Result<()> {
        let payload = self.decode_payload(kv)?;
        log::trace!(
            "Decoded record '{}' ({} bytes, format '{}') as {}",
            kv.key,
            kv.value.len(),
            kv.format,
            payload.type_name()
        );

        if kv.key.is_empty() {
            return place_document(target, payload, kv);
        }

        let segments: Vec<&str> = kv.key.split(PATH_SEPARATOR).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::invalid_path(&kv.key, "key contains an empty segment"));
        }
        place(target, &segments, payload, &kv.key)
    }

    fn decode_payload(&self, kv: &KeyValue) -> Result<Value> {
        if kv.format.is_empty() {
            return Ok(Value::Bytes(kv.value.clone()));
        }
        let decoder = self
            .get(&kv.format)
            .ok_or_else(|| Error::unsupported_format(&kv.format, &kv.key))?;
        decoder.decode(&kv.value).map_err(|e| e.with_path(&kv.key))
    }
}

/// Merge a whole decoded document (record with an empty key) at the root
fn place_document(
    target: &mut IndexMap<String, Value>,
    document: Value,
    kv: &KeyValue,
) -> Result<()> {
    if kv.format.is_empty() {
        return Err(Error::invalid_path("", "a raw record needs a non-empty key"));
    }
    match document {
        Value::Mapping(entries) => {
            for (key, value) in entries {
                place(target, &[key.as_str()], value, &key)?;
            }
            Ok(())
        }
        // An empty document contributes nothing
        Value::Null => Ok(()),
        other => Err(Error::invalid_path(
            "",
            format!(
                "a {} document without a key must be a mapping, got {}",
                kv.format,
                other.type_name()
            ),
        )),
    }
}

fn place(
    target: &mut IndexMap<String, Value>,
    segments: &[&str],
    leaf: Value,
    key: &str,
) -> Result<()> {
    let Some((last, parents)) = segments.split_last() else {
        return Err(Error::internal("decoder called with an empty key path"));
    };

    let mut current = target;
    for (i, segment) in parents.iter().enumerate() {
        let node = current
            .entry(segment.to_string())
            .or_insert_with(Value::mapping);
        current = match node {
            Value::Mapping(map) => map,
            other => {
                return Err(Error::invalid_path(
                    key,
                    format!(
                        "'{}' holds a {}, not a mapping",
                        segments[..=i].join("."),
                        other.type_name()
                    ),
                ))
            }
        };
    }

    match current.get_mut(*last) {
        None => {
            current.insert(last.to_string(), leaf);
        }
        Some(existing) => match (existing.is_mapping(), leaf.is_mapping()) {
            (true, true) => existing.merge(leaf),
            (false, false) => *existing = leaf,
            _ => {
                return Err(Error::invalid_path(
                    key,
                    format!(
                        "'{}' would change from a {} to a {}",
                        key,
                        existing.type_name(),
                        leaf.type_name()
                    ),
                ))
            }
        },
    }
    Ok(())
}

fn json_decoder(payload: &[u8]) -> Result<Value> {
    serde_json::from_slice(payload).map_err(|e| Error::decode(format!("Invalid JSON: {}", e)))
}

fn yaml_decoder(payload: &[u8]) -> Result<Value> {
    serde_yaml::from_slice(payload).map_err(|e| Error::decode(format!("Invalid YAML: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn mapping(entries: Vec<(&str, Value)>) -> Value {
        Value::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    fn bytes(text: &str) -> Value {
        Value::Bytes(text.as_bytes().to_vec())
    }

    #[test]
    fn test_decode_single_segment() {
        let registry = DecoderRegistry::with_builtins();
        let fragment = registry.decode(&KeyValue::new("service", "config")).unwrap();

        assert_eq!(fragment, mapping(vec![("service", bytes("config"))]));
    }

    #[test]
    fn test_decode_nested_key() {
        let registry = DecoderRegistry::with_builtins();
        let fragment = registry
            .decode(&KeyValue::new("service.name.alias", "2233"))
            .unwrap();

        assert_eq!(
            fragment,
            mapping(vec![(
                "service",
                mapping(vec![("name", mapping(vec![("alias", bytes("2233"))]))])
            )])
        );
        assert!(fragment.get_path("service.name").unwrap().is_mapping());
    }

    #[test]
    fn test_decode_round_trip() {
        let registry = DecoderRegistry::with_builtins();
        for (key, payload) in [("a", "1"), ("a.b.c", "x y z"), ("PORT", ""), ("k", "$PORT")] {
            let fragment = registry.decode(&KeyValue::new(key, payload)).unwrap();
            assert_eq!(fragment.get_path(key), Some(&bytes(payload)), "{}", key);
        }
    }

    #[test]
    fn test_decode_into_shared_target() {
        let registry = DecoderRegistry::with_builtins();
        let mut target = IndexMap::new();

        registry
            .decode_into(&KeyValue::new("db.host", "localhost"), &mut target)
            .unwrap();
        registry
            .decode_into(&KeyValue::new("db.port", "5432"), &mut target)
            .unwrap();
        registry
            .decode_into(&KeyValue::new("db.host", "prod"), &mut target)
            .unwrap();

        assert_eq!(
            Value::Mapping(target),
            mapping(vec![(
                "db",
                mapping(vec![("host", bytes("prod")), ("port", bytes("5432"))])
            )])
        );
    }

    #[test]
    fn test_decode_into_scalar_intermediate_is_invalid() {
        let registry = DecoderRegistry::with_builtins();
        let mut target = IndexMap::new();
        registry
            .decode_into(&KeyValue::new("service", "config"), &mut target)
            .unwrap();

        let err = registry
            .decode_into(&KeyValue::new("service.name", "x"), &mut target)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPath);
        assert_eq!(err.path.as_deref(), Some("service.name"));
        assert!(err.to_string().contains("'service' holds a bytes"));
    }

    #[test]
    fn test_decode_into_scalar_over_mapping_is_invalid() {
        let registry = DecoderRegistry::with_builtins();
        let mut target = IndexMap::new();
        registry
            .decode_into(&KeyValue::new("service.name", "x"), &mut target)
            .unwrap();

        let err = registry
            .decode_into(&KeyValue::new("service", "config"), &mut target)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPath);
    }

    #[test]
    fn test_decode_empty_segments_are_invalid() {
        let registry = DecoderRegistry::with_builtins();
        for key in ["a..b", ".a", "a.", ""] {
            let err = registry.decode(&KeyValue::new(key, "v")).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidPath, "{:?}", key);
        }
    }

    #[test]
    fn test_decode_unsupported_format() {
        let registry = DecoderRegistry::with_builtins();
        let err = registry
            .decode(&KeyValue::with_format("app", "a = 1", "toml"))
            .unwrap_err();

        assert_eq!(
            err.kind,
            ErrorKind::UnsupportedFormat {
                format: "toml".into()
            }
        );
        assert_eq!(err.path.as_deref(), Some("app"));
    }

    #[test]
    fn test_decode_json_at_key() {
        let registry = DecoderRegistry::with_builtins();
        let fragment = registry
            .decode(&KeyValue::with_format(
                "app.db",
                r#"{"host": "localhost", "port": 5432}"#,
                "json",
            ))
            .unwrap();

        assert_eq!(
            fragment.get_path("app.db"),
            Some(&mapping(vec![
                ("host", Value::from("localhost")),
                ("port", Value::Integer(5432)),
            ]))
        );
    }

    #[test]
    fn test_decode_yaml_document_at_root() {
        let registry = DecoderRegistry::with_builtins();
        let yaml = "server:\n  port: ${PORT:8080}\nPORT: \"9090\"\n";
        let fragment = registry
            .decode(&KeyValue::with_format("", yaml, "YAML"))
            .unwrap();

        assert_eq!(
            fragment,
            mapping(vec![
                ("server", mapping(vec![("port", Value::from("${PORT:8080}"))])),
                ("PORT", Value::from("9090")),
            ])
        );
    }

    #[test]
    fn test_decode_document_keys_are_not_split() {
        let registry = DecoderRegistry::with_builtins();
        let fragment = registry
            .decode(&KeyValue::with_format("", r#"{"a.b": 1}"#, "json"))
            .unwrap();
        assert_eq!(fragment, mapping(vec![("a.b", Value::Integer(1))]));
    }

    #[test]
    fn test_decode_root_document_must_be_mapping() {
        let registry = DecoderRegistry::with_builtins();
        let err = registry
            .decode(&KeyValue::with_format("", "[1, 2]", "json"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPath);

        let empty = registry
            .decode(&KeyValue::with_format("", "", "yaml"))
            .unwrap();
        assert_eq!(empty, Value::mapping());
    }

    #[test]
    fn test_decode_invalid_json() {
        let registry = DecoderRegistry::with_builtins();
        let err = registry
            .decode(&KeyValue::with_format("app", "{not json", "json"))
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Decode);
        assert_eq!(err.path.as_deref(), Some("app"));
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn test_register_custom_decoder() {
        let mut registry = DecoderRegistry::new();
        registry.register_fn("csv", |payload: &[u8]| {
            let text = std::str::from_utf8(payload).map_err(|e| Error::decode(e.to_string()))?;
            Ok(Value::Sequence(text.split(',').map(Value::from).collect()))
        });

        assert!(registry.contains("CSV"));
        assert!(!registry.contains("json"));
        assert_eq!(registry.formats(), vec!["csv"]);

        let fragment = registry
            .decode(&KeyValue::with_format("hosts", "a,b", "csv"))
            .unwrap();
        assert_eq!(fragment.get_path("hosts"), Some(&Value::from(vec!["a", "b"])));
    }

    #[test]
    fn test_builtin_formats() {
        let registry = DecoderRegistry::default();
        assert_eq!(registry.formats(), vec!["json", "yaml", "yml"]);
    }

    #[test]
    fn test_key_value_debug_shows_text() {
        let kv = KeyValue::new("PORT", "8080");
        assert_eq!(
            format!("{:?}", kv),
            r#"KeyValue { key: "PORT", value: "8080", format: "" }"#
        );
    }
}
