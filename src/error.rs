// Error types shared by every stage of an upload run. Each variant is
// terminal: the orchestrator never retries and never moves on to the next
// file once one of these has been produced.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// An input value is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required environment variable is unset or empty.
    #[error("The {0} environment variable is not set")]
    MissingEnv(&'static str),

    /// The run token file named by the environment could not be read.
    #[error("Failed to read run token from {path}: {source}")]
    RunToken {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The request never produced a response (connect, TLS, stream errors).
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with anything other than `201 Created`.
    #[error("Server did not respond with \"201 Created\" but \"{status}\"{}", body_suffix(.body))]
    UnexpectedStatus { status: String, body: String },

    #[error("Server did not provide a public URL in response")]
    MissingPublicUrl,

    /// A local read, write or delete failed.
    #[error("Failed to {action} {path}: {source}")]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid search pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },

    #[error("No files were found with the provided path: {0}. No artifacts will be uploaded.")]
    NoFilesFound(String),
}

impl Error {
    pub(crate) fn filesystem(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Error::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }
}

fn body_suffix(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!(": {}", body)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
