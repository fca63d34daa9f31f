//! Error type for session, notification, correlation, and event-log operations.

/// Result alias used throughout `mcp-session`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the session layer.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No session exists with the given id.
    #[error("unknown session: {0}")]
    UnknownSession(String),

    /// The session exists but has already been terminated.
    #[error("session terminated: {0}")]
    SessionTerminated(String),

    /// A correlation id was not awaited (already delivered, cancelled, or never registered).
    #[error("no pending correlation for id: {0}")]
    UnknownCorrelation(String),

    /// A blocking delivery exceeded its deadline.
    #[error("delivery timed out after {0:?}")]
    DeliveryTimeout(std::time::Duration),

    /// `Last-Event-ID` did not match any retained event; the log may have rotated past it.
    #[error("event id {0} is not in the replay window")]
    EventNotFound(String),

    /// The requested operation has no meaning without a live session (e.g. stateless mode).
    #[error("operation requires a session but the server is running in stateless mode")]
    StatelessMode,
}
