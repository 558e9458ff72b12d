//! confkit-core: Configuration assembly with placeholder resolution
//!
//! This crate turns a flat, ordered list of key/value records into one nested
//! configuration tree, resolves `${path:default}` placeholders against the
//! tree itself, and exposes the result through typed accessors.
//!
//! # Example
//!
//! ```rust
//! use confkit_core::{Config, KeyValue};
//!
//! let yaml = r#"
//! database:
//!   host: ${DB_HOST:localhost}
//!   port: ${DB_PORT}
//! "#;
//!
//! let config = Config::from_records(vec![
//!     KeyValue::with_format("", yaml, "yaml"),
//!     KeyValue::new("DB_PORT", "5432"),
//! ])
//! .unwrap();
//!
//! let reader = config.reader();
//! assert_eq!(reader.value("database.host").unwrap().string().unwrap(), "localhost");
//! assert_eq!(reader.value("database.port").unwrap().int().unwrap(), 5432);
//! assert!(reader.value("database.user").is_none());
//! ```

pub mod decoder;
pub mod error;
pub mod literal;
pub mod placeholder;
pub mod reader;
pub mod resolver;
pub mod source;
pub mod value;

mod config;

pub use config::{Config, ConfigBuilder};
pub use decoder::{Decoder, DecoderRegistry, FnDecoder, KeyValue};
pub use error::{Error, ErrorKind, Result};
pub use reader::{Entry, Reader};
pub use resolver::{resolve, FnResolver, PlaceholderResolver, Resolver};
pub use source::{MemorySource, Source};
pub use value::{Value, PATH_SEPARATOR};
