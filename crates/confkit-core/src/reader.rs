//! Typed access to a resolved configuration tree
//!
//! A [`Reader`] is bound to an immutable snapshot of the tree. Lookups return
//! an [`Entry`] whose accessors convert the leaf on demand; a missing path is
//! `None`, never an error.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::literal::{self, Number};
use crate::value::Value;

/// Read-only view over a resolved configuration snapshot
#[derive(Debug, Clone)]
pub struct Reader {
    root: Arc<Value>,
}

impl Reader {
    /// Bind a reader to a snapshot
    pub fn new(root: Arc<Value>) -> Self {
        Self { root }
    }

    /// The snapshot this reader is bound to
    pub fn root(&self) -> &Arc<Value> {
        &self.root
    }

    /// Look up the value at a dotted path
    pub fn value(&self, path: &str) -> Option<Entry<'_>> {
        self.root.get_path(path).map(|value| Entry {
            path: path.to_string(),
            value,
        })
    }

    /// Render the whole snapshot as JSON
    pub fn source(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&*self.root).map_err(|e| Error::internal(e.to_string()))
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self::new(Arc::new(Value::mapping()))
    }
}

impl From<Value> for Reader {
    fn from(value: Value) -> Self {
        Self::new(Arc::new(value))
    }
}

/// Handle to a value found by [`Reader::value`]
#[derive(Debug, Clone)]
pub struct Entry<'a> {
    path: String,
    value: &'a Value,
}

impl<'a> Entry<'a> {
    /// The path this entry was looked up with
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Borrow the underlying value
    pub fn raw(&self) -> &'a Value {
        self.value
    }

    /// Return the value in its native resolved type
    pub fn load(&self) -> Value {
        self.value.clone()
    }

    /// Convert to an integer
    ///
    /// Accepts integers, floats without a fractional part, and text holding
    /// any integer literal form (`42`, `-0x2A`, `0b101010`, `0o52`).
    pub fn int(&self) -> Result<i64> {
        let converted = match self.value {
            Value::Integer(i) => Some(*i),
            Value::Float(f) => float_to_int(*f),
            other => other
                .as_text()
                .and_then(literal::parse_number)
                .and_then(|n| match n {
                    Number::Integer(i) => Some(i),
                    Number::Float(f) => float_to_int(f),
                }),
        };
        converted.ok_or_else(|| self.mismatch("integer"))
    }

    /// Convert to a float
    pub fn float(&self) -> Result<f64> {
        let converted = match self.value {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            other => other
                .as_text()
                .and_then(literal::parse_number)
                .map(Number::as_f64),
        };
        converted.ok_or_else(|| self.mismatch("float"))
    }

    /// Convert to a boolean
    ///
    /// Text is accepted only when it is "true" or "false", ignoring case.
    pub fn bool(&self) -> Result<bool> {
        let converted = match self.value {
            Value::Bool(b) => Some(*b),
            other => other.as_text().and_then(|text| {
                if text.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if text.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }),
        };
        converted.ok_or_else(|| self.mismatch("boolean"))
    }

    /// Render the leaf as a string
    ///
    /// Fails only for mappings, which are not leaves.
    pub fn string(&self) -> Result<String> {
        match self.value {
            Value::Mapping(_) => Err(self.mismatch("string")),
            other => Ok(other.to_string()),
        }
    }

    /// Deserialize the value into `T`
    pub fn scan<T: DeserializeOwned>(&self) -> Result<T> {
        let json = serde_json::to_value(self.value).map_err(|e| Error::internal(e.to_string()))?;
        serde_json::from_value(json).map_err(|e| Error::decode(e.to_string()).with_path(&self.path))
    }

    fn mismatch(&self, expected: &str) -> Error {
        let got = match self.value.as_text() {
            Some(text) => format!("{} (\"{}\")", self.value.type_name(), text),
            None => self.value.type_name().to_string(),
        };
        Error::type_mismatch(&self.path, expected, got)
    }
}

// i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
fn float_to_int(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
