use thiserror::Error;

/// Every failure the mail backend can surface to a caller.
#[derive(Debug, Error)]
pub enum MailError {
    /// Dial or TLS handshake failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// The server rejected the credentials.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// A LIST/SELECT/FETCH/STATUS command failed at the server.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Local store I/O or transaction failure.
    #[error("cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    #[error("not found: {0}")]
    NotFound(String),

    /// MIME or structured-content parse failure.
    #[error("malformed data: {0}")]
    MalformedData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for MailError {
    fn from(e: serde_json::Error) -> Self {
        MailError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MailError>;
