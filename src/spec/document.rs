// Copyright (c) 2025 - Cowboy AI, Inc.
//! Specification Document Model
//!
//! Specifications are ingested into a generic nested value (mapping /
//! sequence / scalar) before validation. The document is immutable once
//! parsed; validators walk it without modifying it, and the typed exercise
//! model is built from it in a separate pass.

use std::fs::File;
use std::path::Path;

use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::{error, info};

/// Generic nested document value produced by parsing a specification file
pub type Document = Value;

/// Errors that can occur while ingesting a specification or side-file
#[derive(Debug, Error)]
pub enum DocumentError {
    /// File is missing or unreadable
    #[error("Could not open file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid YAML
    #[error("Could not parse file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// File is not valid JSON
    #[error("Could not parse file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Document root is not a mapping
    #[error("Specification root of {0} must be a mapping")]
    NotAMapping(String),
}

/// Parse a YAML specification file into a document
///
/// Syntax errors are logged with the position the parser reported before the
/// error is returned.
pub fn parse_yaml_file(path: impl AsRef<Path>) -> Result<Document, DocumentError> {
    let path = path.as_ref();
    let path_display = path.display().to_string();

    let file = File::open(path).map_err(|source| DocumentError::Io {
        path: path_display.clone(),
        source,
    })?;

    match serde_yaml::from_reader::<_, Value>(file) {
        Ok(doc) => {
            info!("Successfully ingested specification file {}", path_display);
            Ok(doc)
        }
        Err(source) => {
            error!("Could not parse file {}", path_display);
            if let Some(location) = source.location() {
                error!("Error position: ({}:{})", location.line(), location.column());
            }
            Err(DocumentError::Yaml {
                path: path_display,
                source,
            })
        }
    }
}

/// Read a JSON side-file (login files, user lists)
pub fn read_json_file(path: impl AsRef<Path>) -> Result<serde_json::Value, DocumentError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let file = File::open(path).map_err(|source| DocumentError::Io {
        path: display.clone(),
        source,
    })?;

    serde_json::from_reader(file).map_err(|source| DocumentError::Json {
        path: display,
        source,
    })
}

/// View a document as a mapping, if it is one
pub fn as_mapping(value: &Value) -> Option<&Mapping> {
    value.as_mapping()
}

/// Look up a key in a mapping
pub fn get<'a>(mapping: &'a Mapping, key: &str) -> Option<&'a Value> {
    mapping.get(key)
}

/// True when the mapping contains the key
pub fn contains(mapping: &Mapping, key: &str) -> bool {
    mapping.contains_key(key)
}

/// Look up a string-valued key
pub fn get_str<'a>(mapping: &'a Mapping, key: &str) -> Option<&'a str> {
    get(mapping, key).and_then(Value::as_str)
}

/// The string form of a mapping key, where keys are expected to be strings
pub fn key_str(key: &Value) -> Option<&str> {
    key.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> Document {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_mapping_access() {
        let doc = doc("name: test\nprefix: T\ncount: 3\n");
        let mapping = as_mapping(&doc).unwrap();
        assert_eq!(get_str(mapping, "name"), Some("test"));
        assert!(contains(mapping, "prefix"));
        assert!(!contains(mapping, "missing"));
        assert_eq!(get(mapping, "count").and_then(Value::as_u64), Some(3));
    }

    #[test]
    fn test_scalar_is_not_mapping() {
        let doc = doc("just-a-string");
        assert!(as_mapping(&doc).is_none());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = parse_yaml_file("/nonexistent/spec.yaml");
        assert!(matches!(result, Err(DocumentError::Io { .. })));
    }
}
