//! Main Config type for confkit
//!
//! A [`Config`] owns the sources, the decoder registry and the resolver. Each
//! [`Config::load`] runs the whole pipeline (load records, decode, merge,
//! resolve) on the caller's thread and then publishes the resolved tree as a
//! new immutable snapshot.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;

use crate::decoder::{Decoder, DecoderRegistry, KeyValue};
use crate::error::{Error, Result};
use crate::reader::Reader;
use crate::resolver::{PlaceholderResolver, Resolver};
use crate::source::{MemorySource, Source};
use crate::value::Value;

/// The main configuration container
pub struct Config {
    sources: Vec<Arc<dyn Source>>,
    decoders: DecoderRegistry,
    resolver: Arc<dyn Resolver>,
    snapshot: RwLock<Arc<Value>>,
}

impl Config {
    /// Start building a Config
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Build and load a Config from in-memory records
    pub fn from_records(records: Vec<KeyValue>) -> Result<Self> {
        let config = Self::builder()
            .source(MemorySource::new("memory", records))
            .build();
        config.load()?;
        Ok(config)
    }

    /// Load every source and publish the resolved tree
    ///
    /// Also used to reload. On error the previously published snapshot stays
    /// in place.
    pub fn load(&self) -> Result<()> {
        let tree = Arc::new(self.assemble()?);
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = tree;
        Ok(())
    }

    fn assemble(&self) -> Result<Value> {
        log::debug!("Loading configuration from {} sources", self.sources.len());

        let mut tree = Value::mapping();
        let mut total = 0usize;
        for source in &self.sources {
            let records = source
                .load()
                .map_err(|e| e.context(format_args!("source '{}'", source.name())))?;
            log::debug!(
                "Source '{}' produced {} records",
                source.name(),
                records.len()
            );

            for record in &records {
                let fragment = self.decoders.decode(record).map_err(|e| {
                    e.context(format_args!(
                        "source '{}', key '{}'",
                        source.name(),
                        record.key
                    ))
                })?;
                tree.merge(fragment);
            }
            total += records.len();
        }

        self.resolver.resolve(&mut tree).map_err(|e| {
            e.context(format_args!("resolver '{}'", self.resolver.name()))
        })?;
        log::debug!("Loaded {} records", total);
        Ok(tree)
    }

    /// A reader bound to the current snapshot
    ///
    /// The reader keeps its snapshot across later reloads.
    pub fn reader(&self) -> Reader {
        Reader::new(self.snapshot())
    }

    /// The resolved value at a dotted path
    pub fn value(&self, path: &str) -> Option<Value> {
        self.snapshot().get_path(path).cloned()
    }

    /// Deserialize the whole tree into `T`
    pub fn scan<T: DeserializeOwned>(&self) -> Result<T> {
        let reader = self.reader();
        match reader.value("") {
            Some(entry) => entry.scan(),
            None => Err(Error::internal("snapshot has no root")),
        }
    }

    /// Export the current snapshot as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&*self.snapshot()).map_err(|e| Error::internal(e.to_string()))
    }

    /// Export the current snapshot as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&*self.snapshot()).map_err(|e| Error::internal(e.to_string()))
    }

    /// Names of the registered sources, in load order
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    fn snapshot(&self) -> Arc<Value> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("sources", &self.source_names())
            .field("decoders", &self.decoders)
            .field("resolver", &self.resolver.name())
            .finish()
    }
}

/// Builder for [`Config`]
pub struct ConfigBuilder {
    sources: Vec<Arc<dyn Source>>,
    decoders: DecoderRegistry,
    resolver: Arc<dyn Resolver>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            decoders: DecoderRegistry::with_builtins(),
            resolver: Arc::new(PlaceholderResolver),
        }
    }
}

impl ConfigBuilder {
    /// Add a source; later sources win on conflicting keys
    pub fn source(mut self, source: impl Source + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Register an extra decoder on top of the current registry
    pub fn decoder(mut self, decoder: impl Decoder + 'static) -> Self {
        self.decoders.register(Arc::new(decoder));
        self
    }

    /// Replace the decoder registry
    pub fn decoders(mut self, decoders: DecoderRegistry) -> Self {
        self.decoders = decoders;
        self
    }

    /// Replace the placeholder resolver
    pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Build the Config; nothing is loaded until [`Config::load`]
    pub fn build(self) -> Config {
        Config {
            sources: self.sources,
            decoders: self.decoders,
            resolver: self.resolver,
            snapshot: RwLock::new(Arc::new(Value::mapping())),
        }
    }
}
