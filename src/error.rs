use std::io;

/// Custom error type for octoapp operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("payload is missing identity field '{0}'")]
    MissingIdentityField(&'static str),

    #[error("failed to fetch config file '{path}': {source}")]
    ConfigFetch {
        path: String,
        #[source]
        source: octocrab::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ConfigParse { path: String, message: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("route '{0}' is already mounted")]
    RouteConflict(String),

    #[error("{failed} handler(s) failed for event '{event}': {detail}")]
    Dispatch {
        event: String,
        failed: usize,
        detail: String,
    },

    #[error("invalid event delivery: {0}")]
    InvalidEvent(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("GitHub API error: {0}")]
    GitHub(#[from] octocrab::Error),
}

/// Helper type for Results that use Error
pub type Result<T> = std::result::Result<T, Error>;
