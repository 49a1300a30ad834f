use thiserror::Error;

use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("expected a {expected} handle, got a {found} handle")]
    WrongSymbolKind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{capability} is not implemented for this symbol")]
    Unimplemented { capability: &'static str },

    #[error("unrecognized {kind} value: {value}")]
    UnrecognizedValue { kind: &'static str, value: i64 },

    #[error("invalid option in [{section}]: {source}")]
    InvalidOption {
        section: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("{kind} {name} not found in policy")]
    NotFound { kind: &'static str, name: String },

    #[error("invalid regular expression '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid policy data: {reason}")]
    InvalidPolicy { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse policy {path}: {source}")]
    PolicyParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
