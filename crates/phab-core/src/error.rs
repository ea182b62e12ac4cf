//! Error types for phab-tools.

use thiserror::Error;

/// Main error type for phab-tools operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication failed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Conduit returned an application-level error
    #[error("Conduit error: {code} - {info}")]
    Conduit { code: String, info: String },

    /// API returned a non-success HTTP status
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Unified diff text could not be parsed
    #[error("Malformed diff: {0}")]
    MalformedDiff(String),

    /// Requested object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response did not match the expected shape
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Map an HTTP status code to the matching error variant.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Error::Auth(message),
            404 => Error::NotFound(message),
            _ => Error::Api { status, message },
        }
    }
}

/// Result type alias for phab-tools operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_auth() {
        assert!(matches!(
            Error::from_status(401, "denied".into()),
            Error::Auth(_)
        ));
        assert!(matches!(
            Error::from_status(403, "denied".into()),
            Error::Auth(_)
        ));
    }

    #[test]
    fn test_from_status_not_found() {
        assert!(matches!(
            Error::from_status(404, "gone".into()),
            Error::NotFound(_)
        ));
    }

    #[test]
    fn test_from_status_other() {
        match Error::from_status(500, "boom".into()) {
            Error::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_display() {
        let err = Error::Conduit {
            code: "ERR-INVALID-AUTH".into(),
            info: "token expired".into(),
        };
        assert_eq!(err.to_string(), "Conduit error: ERR-INVALID-AUTH - token expired");

        let err = Error::MalformedDiff("bad hunk header".into());
        assert!(err.to_string().contains("bad hunk header"));
    }
}
