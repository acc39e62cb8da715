use thiserror::Error;

/// Failure modes of [`Connector::connect`](crate::Connector::connect).
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("server address or passphrase is not configured")]
    ConfigurationMissing,
    #[error("another connect attempt is already in flight")]
    ConnectInProgress,
    #[error("connector is already connected")]
    AlreadyConnected,
    #[error("unable to connect to server: {0}")]
    ConnectionFailed(String),
    #[error("disconnected from server")]
    ConnectionLost,
    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),
}

/// Failure modes of a single request/acknowledgement exchange.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("connector is not connected")]
    NotConnected,
    /// The acknowledgement arrived with a non-success status. The
    /// peer-supplied message is the sole diagnostic.
    #[error("server rejected request (status {status}): {message}")]
    RemoteRejected { status: u16, message: String },
    #[error("no acknowledgement arrived before the request timeout")]
    NoResponse,
    #[error("connection lost while waiting for acknowledgement")]
    ConnectionLost,
    /// The acknowledgement claimed success but its `data` did not match the
    /// operation's result type.
    #[error("invalid acknowledgement payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("transport error: {0}")]
    Transport(#[source] anyhow::Error),
}
