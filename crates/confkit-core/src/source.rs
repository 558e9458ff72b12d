//! Configuration sources
//!
//! A [`Source`] produces the raw key/value records that are decoded and merged
//! into the configuration tree. Sources are loaded in registration order and
//! later sources win on conflicting keys.

use std::sync::{Arc, Mutex, PoisonError};

use crate::decoder::KeyValue;
use crate::error::Result;

/// A provider of raw configuration records
pub trait Source: Send + Sync {
    /// Load the current records
    fn load(&self) -> Result<Vec<KeyValue>>;

    /// Name used in logs and error messages
    fn name(&self) -> &str;
}

impl<S: Source + ?Sized> Source for Arc<S> {
    fn load(&self) -> Result<Vec<KeyValue>> {
        (**self).load()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// An in-memory source
///
/// Records can be replaced between loads, which makes this source useful for
/// tests and for values computed at runtime.
#[derive(Debug, Default)]
pub struct MemorySource {
    name: String,
    records: Mutex<Vec<KeyValue>>,
}

impl MemorySource {
    /// Create a source holding `records`
    pub fn new(name: impl Into<String>, records: Vec<KeyValue>) -> Self {
        Self {
            name: name.into(),
            records: Mutex::new(records),
        }
    }

    /// Replace the records returned by the next load
    pub fn set(&self, records: Vec<KeyValue>) {
        *self.records.lock().unwrap_or_else(PoisonError::into_inner) = records;
    }

    /// Append a record
    pub fn push(&self, record: KeyValue) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

impl Source for MemorySource {
    fn load(&self) -> Result<Vec<KeyValue>> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
