//! Error types for tracker communication.
//!
//! These never cross the host boundary: every `IssueTrackerExtension`
//! operation logs them and degrades to an empty or missing result.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// The tracker rejected the session cookie (HTTP 401).
    #[error("unauthorized request to {url}")]
    Unauthorized { url: String },

    /// Any other non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    Status { status: StatusCode, url: String },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed tracker XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed XML attribute: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("response contains no issue element")]
    MissingIssue,

    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl TrackerError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TrackerError::Unauthorized { .. })
    }
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;
