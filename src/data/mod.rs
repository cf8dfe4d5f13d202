//! Document identifiers and document sources
//!
//! A [`DocId`] names one Markdown document in a document store. Sources map an
//! identifier to raw Markdown text; [`HttpSource`] reads `<base>/<id>.md` over
//! HTTP.

pub mod source;

pub use source::{DocumentSource, HttpSource};

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Identifier of a document in the store
///
/// Only ASCII letters, digits, `-` and `_` are accepted, so an identifier can
/// never address anything outside the store's base location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocId(String);

impl DocId {
    /// Validates `raw` as a document identifier
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(FetchError::InvalidId { id: raw.to_string() })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource path of the document relative to the store's base location
    pub fn resource_path(&self) -> String {
        format!("{}.md", self.0)
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors that can occur when fetching a document
///
/// Every variant carries the identifier that was attempted.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The identifier is not a plain token
    #[error("Invalid document identifier: '{id}'")]
    InvalidId { id: String },

    /// Transport-level failure
    #[error("Request for '{id}' failed: {source}")]
    Network {
        id: String,
        #[source]
        source: reqwest::Error,
    },

    /// The store answered with a non-success status
    #[error("Document '{id}' returned HTTP {status}")]
    Status { id: String, status: u16 },

    /// No answer within the fetch timeout
    #[error("Fetching '{id}' timed out after {after:?}")]
    Timeout { id: String, after: Duration },
}

impl FetchError {
    /// The identifier the failed operation was attempted for
    pub fn id(&self) -> &str {
        match self {
            FetchError::InvalidId { id }
            | FetchError::Network { id, .. }
            | FetchError::Status { id, .. }
            | FetchError::Timeout { id, .. } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_id_accepts_plain_tokens() {
        for raw in ["intro", "getting-started", "faq_2", "README"] {
            let id = DocId::parse(raw).expect("should be valid");
            assert_eq!(id.as_str(), raw);
        }
    }

    #[test]
    fn test_doc_id_rejects_paths_and_empty() {
        for raw in ["", "../secret", "a/b", "a.md", "with space", "%2e%2e"] {
            let err = DocId::parse(raw).expect_err("should be rejected");
            assert!(matches!(err, FetchError::InvalidId { .. }));
            assert_eq!(err.id(), raw);
        }
    }

    #[test]
    fn test_resource_path() {
        let id = DocId::parse("install").unwrap();
        assert_eq!(id.resource_path(), "install.md");
        assert_eq!(id.to_string(), "install");
    }

    #[test]
    fn test_fetch_error_messages_carry_id() {
        let err = FetchError::Status {
            id: "faq".to_string(),
            status: 404,
        };
        assert_eq!(err.to_string(), "Document 'faq' returned HTTP 404");
        assert_eq!(err.id(), "faq");

        let err = FetchError::Timeout {
            id: "faq".to_string(),
            after: Duration::from_secs(15),
        };
        assert!(err.to_string().contains("timed out"));
    }
}
