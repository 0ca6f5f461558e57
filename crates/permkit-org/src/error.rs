//! Error types for org operations.

use thiserror::Error;

/// Errors raised while talking to the `sf` CLI or the org's REST API.
#[derive(Debug, Error)]
pub enum OrgError {
    /// The `sf` executable could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The `sf` CLI reported an error
    #[error("{command} failed: {message}")]
    Cli { command: String, message: String },

    /// Neither stdout nor stderr held a JSON envelope
    #[error("Unparseable output from {command}: {message}")]
    Json {
        command: String,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// The envelope reported success without a result
    #[error("{command} returned no result")]
    MissingResult { command: String },

    /// Login URLs need the org's generated password
    #[error("No password is set for {username}; generate one with `sf org generate password` first")]
    MissingPassword { username: String },

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The REST API answered with a non-success status
    #[error("REST API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// A describe call in a batch failed
    #[error("Unable to get describe for object {object}")]
    Describe {
        object: String,
        #[source]
        source: Box<OrgError>,
    },
}

/// Result type for org operations.
pub type OrgResult<T> = Result<T, OrgError>;
