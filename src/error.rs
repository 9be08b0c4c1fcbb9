use std::path::{Path, PathBuf};

use thiserror::Error;

/// Library error type for frame refresh operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Request could not be sent or the body could not be read.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("request to {url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The connectivity gate gave up waiting for the network.
    #[error("network unreachable after {attempts} attempts")]
    Offline { attempts: u32 },

    /// A JSON payload (remote or snapshot) did not match the expected shape.
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// An image could not be decoded or encoded.
    #[error("image error for {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Underlying IO error tied to a path.
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Drawing a composite failed.
    #[error("render error: {0}")]
    Render(String),

    /// Invalid or unusable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The provider produced nothing to show, not even a snapshot.
    #[error("no images available from {provider}")]
    NoImages { provider: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn fs(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn image(path: impl AsRef<Path>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn transport(url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn decode(what: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            what: what.into(),
            source,
        }
    }
}
