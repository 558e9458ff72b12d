//! File and environment sources used by the CLI

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use confkit_core::{Error, KeyValue, Result, Source, PATH_SEPARATOR};

/// Decoder format for a file, from its extension
///
/// Returns `None` for files that are loaded as raw bytes.
pub fn format_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "json" => Some("json"),
        "yaml" => Some("yaml"),
        "yml" => Some("yml"),
        _ => None,
    }
}

/// A configuration file
///
/// JSON and YAML files are merged at the root of the tree. Any other file is
/// stored as raw bytes under its file stem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(&self, contents: Vec<u8>) -> Result<KeyValue> {
        if let Some(format) = format_for(&self.path) {
            return Ok(KeyValue::with_format("", contents, format));
        }
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::source_failed(&self.name, "file has no usable name"))?;
        Ok(KeyValue::new(stem, contents))
    }
}

impl Source for FileSource {
    fn load(&self) -> Result<Vec<KeyValue>> {
        let contents = std::fs::read(&self.path).map_err(|e| {
            Error::source_failed(&self.name, e.to_string())
                .with_help("Check that the file exists and is readable")
        })?;
        log::debug!("Read {} bytes from {}", contents.len(), self.name);
        Ok(vec![self.record(contents)?])
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Process environment variables as raw records
///
/// With a prefix, only variables starting with it are taken, and the prefix
/// (plus one following `_`) is stripped from the key.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    prefix: Option<String>,
}

impl EnvSource {
    pub fn new(prefix: Option<String>) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()),
        }
    }

    fn records<I>(&self, vars: I) -> Vec<KeyValue>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        vars.into_iter()
            .filter_map(|(key, value)| {
                let key = key.into_string().ok()?;
                let key = match &self.prefix {
                    Some(prefix) => {
                        let rest = key.strip_prefix(prefix.as_str())?;
                        rest.strip_prefix('_').unwrap_or(rest).to_string()
                    }
                    None => key,
                };
                // Names that cannot be a key path are skipped
                if key.split(PATH_SEPARATOR).any(str::is_empty) {
                    return None;
                }
                Some(KeyValue::new(key, value.into_encoded_bytes()))
            })
            .collect()
    }
}

impl Source for EnvSource {
    fn load(&self) -> Result<Vec<KeyValue>> {
        Ok(self.records(std::env::vars_os()))
    }

    fn name(&self) -> &str {
        "environment"
    }
}
