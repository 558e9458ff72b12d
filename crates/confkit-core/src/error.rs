//! Error types for confkit
//!
//! Errors are structured: a kind, the key path the error relates to, the
//! underlying cause and an actionable help message. Missing keys are not
//! errors; lookups return `Option`.

use std::fmt;

/// Result type alias for confkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for confkit operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Key path the error relates to (e.g., "database.port")
    pub path: Option<String>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// A record's format hint has no registered decoder
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },
    /// A dotted key conflicts with the shape of the tree
    #[error("Invalid path")]
    InvalidPath,
    /// A typed accessor could not convert the value
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },
    /// A registered decoder rejected the record payload
    #[error("Decode error")]
    Decode,
    /// A source failed to produce its records
    #[error("Source '{name}' failed")]
    Source { name: String },
    /// Internal error (bug in confkit)
    #[error("Internal error")]
    Internal,
}

impl Error {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: None,
            help: None,
            cause: None,
        }
    }

    /// Create an unsupported format error
    pub fn unsupported_format(format: impl Into<String>, key: impl Into<String>) -> Self {
        let format = format.into();
        Self {
            path: non_empty(key.into()),
            help: Some(format!(
                "Register a decoder for '{}' or leave the format empty for raw bytes",
                format
            )),
            ..Self::new(ErrorKind::UnsupportedFormat { format })
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            help: Some("A key cannot hold both a value and nested keys".into()),
            cause: Some(message.into()),
            ..Self::new(ErrorKind::InvalidPath)
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(
        path: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        let expected = expected.into();
        Self {
            path: non_empty(path.into()),
            help: Some(format!("Ensure the value can be converted to {}", expected)),
            ..Self::new(ErrorKind::TypeMismatch {
                expected,
                got: got.into(),
            })
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Decode)
        }
    }

    /// Create a source error
    pub fn source_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Source { name: name.into() })
        }
    }

    /// Create an internal error (bug in confkit)
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            help: Some("This is likely a bug in confkit. Please report it.".into()),
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Internal)
        }
    }

    /// Add path context to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = non_empty(path.into());
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Prefix the cause with extra context, keeping the kind
    pub fn context(mut self, context: impl fmt::Display) -> Self {
        self.cause = Some(match self.cause.take() {
            Some(cause) => format!("{}: {}", context, cause),
            None => context.to_string(),
        });
        self
    }
}

fn non_empty(path: String) -> Option<String> {
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(path) = &self.path {
            write!(f, "\n  Path: {}", path)?;
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
