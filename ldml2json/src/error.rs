//! All error types for the ldml2json crate.
//!
//! These are returned from every fallible operation (path parsing, key
//! resolution, rule loading, emission and I/O).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed path `{path}` at offset {offset}: {reason}")]
    MalformedPath {
        path: String,
        offset: usize,
        reason: String,
    },

    #[error("conflicting key attributes on `{node}`: `{first}` and `{second}` both want to become the key")]
    ConflictingKeyAttribute {
        node: String,
        first: String,
        second: String,
    },

    #[error("conflicting anonymous attributes on `{node}`: `{first}` and `{second}` both want the anonymous slot")]
    ConflictingAnonymousAttribute {
        node: String,
        first: String,
        second: String,
    },

    #[error("duplicate path `{0}`: a distinguishing attribute may have been dropped")]
    DuplicatePathCollision(String),

    #[error("unbalanced container close: {0}")]
    UnbalancedContainerClose(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TSV parse error: {0}")]
    CsvParse(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("section `{section}` failed: {source}")]
    Section {
        section: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Creates a new malformed path error pointing at `offset` in `path`.
    pub fn malformed_path(path: &str, offset: usize, reason: impl Into<String>) -> Self {
        Error::MalformedPath {
            path: path.to_string(),
            offset,
            reason: reason.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Wraps an error with the name of the section it aborted.
    pub fn in_section(self, section: impl Into<String>) -> Self {
        Error::Section {
            section: section.into(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_malformed_path_error() {
        let error = Error::malformed_path("//a/b[@x=\"1\"", 5, "unterminated attribute");
        assert_eq!(
            error.to_string(),
            "malformed path `//a/b[@x=\"1\"` at offset 5: unterminated attribute"
        );
    }

    #[test]
    fn test_conflicting_key_attribute_error() {
        let error = Error::ConflictingKeyAttribute {
            node: "currency".to_string(),
            first: "type".to_string(),
            second: "iso4217".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("currency"));
        assert!(display.contains("`type`"));
        assert!(display.contains("`iso4217`"));
    }

    #[test]
    fn test_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = Error::Io(io_error);
        assert!(error.to_string().contains("I/O error"));
    }

    #[test]
    fn test_pattern_error() {
        let regex_error = regex::Regex::new("(unclosed").unwrap_err();
        let error = Error::from(regex_error);
        assert!(error.to_string().starts_with("invalid pattern"));
    }

    #[test]
    fn test_section_error_wraps_source() {
        let error = Error::config_error("missing path").in_section("numbers");
        assert_eq!(
            error.to_string(),
            "section `numbers` failed: invalid configuration: missing path"
        );
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_error_debug() {
        let error = Error::Config("test".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("Config"));
        assert!(debug.contains("test"));
    }
}
