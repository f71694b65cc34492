//! Error types shared by the indexing and answering pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid startup configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A collaborator could not be constructed at startup
    #[error("failed to initialize {component}: {message}")]
    Init {
        component: &'static str,
        message: String,
    },

    /// The uploaded bytes could not be read as a PDF
    #[error("pdf extraction error: {0}")]
    Extraction(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("store error: {0}")]
    Store(String),

    /// The inference API answered with an error or an unusable body
    #[error("inference error: {0}")]
    Inference(String),

    /// A question was asked before any document finished indexing
    #[error("no document has been indexed yet")]
    NotReady,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_errors_display_unwrapped() {
        // a relative URL fails in the request builder, before any network access
        let inner = reqwest::blocking::get("not a url").unwrap_err();
        let expected = inner.to_string();

        let err = Error::from(inner);
        assert!(matches!(err, Error::Http(_)));
        assert_eq!(err.to_string(), expected);
    }
}
