//! Error types for the schedule ingestion pipeline.
//!
//! Per-cell irregularities never surface here; they degrade to default values
//! inside the scraper and classifier. Everything in this enum aborts the run
//! for one schedule.

use thiserror::Error;

/// Errors that can occur while ingesting a schedule.
#[derive(Debug, Error, Clone)]
pub enum IngestError {
    /// The page contained no parsable time header cell
    #[error("No schedule anchor time: the page has no time interval cells")]
    NoScheduleAnchorTime,

    /// Every course cell was dropped or the page had none
    #[error("Course set is empty after classification")]
    EmptyCourseSet,

    /// Network/HTTP request failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// Server returned an unexpected response
    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    /// URL parsing/construction failed
    #[error("URL error: {message}")]
    UrlError { message: String },

    /// A marker class could not be turned into a CSS selector
    #[error("Invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },

    /// Configuration file missing, unreadable or inconsistent
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The storage collaborator failed to supply the persisted course set
    #[error("Repository error: {message}")]
    Repository { message: String },

    /// The event collaborator rejected an outbound event
    #[error("Failed to publish event: {message}")]
    Publish { message: String },
}

impl IngestError {
    /// Returns true if this error is potentially transient and retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IngestError::Network { .. } | IngestError::UnexpectedResponse { .. }
        )
    }

    /// Returns true if running again on the same page and configuration
    /// cannot succeed.
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            IngestError::NoScheduleAnchorTime
                | IngestError::EmptyCourseSet
                | IngestError::UrlError { .. }
                | IngestError::InvalidSelector { .. }
                | IngestError::Config { .. }
        )
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        IngestError::Network {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for IngestError {
    fn from(err: url::ParseError) -> Self {
        IngestError::UrlError {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::Config {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::Config {
            message: err.to_string(),
        }
    }
}
