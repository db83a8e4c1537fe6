use model::ModelError;
use thiserror::Error;

/// Errors raised by a server connection or while opening one.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Low-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    /// The connection was closed before or during the call.
    #[error("connection to {0} is closed")]
    Closed(String),

    /// The server rejected or failed the script.
    #[error("server response: {0}")]
    Server(String),

    /// The response could not be interpreted.
    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}
