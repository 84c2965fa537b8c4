use thiserror::Error;

/// Errors raised by a `Provider`'s lifecycle or capability contract.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// A lifecycle call (`enable`/`disable`/`activate`/`deactivate`) was made
    /// from a state that does not permit it.
    #[error("invalid provider state transition: {attempted} while {current}")]
    InvalidState {
        attempted: &'static str,
        current: &'static str,
    },

    /// The provider backend reported a recoverable fault. Never propagated
    /// past the engine boundary; logged and absorbed.
    #[error("provider reported a transient fault: {0}")]
    Transient(String),
}

/// Errors raised while creating or managing a client session.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("caller lacks permission for the requested criteria")]
    InsufficientPermissions,

    #[error("a session is already registered at this object path")]
    DuplicateSession,

    #[error("session could not be created")]
    CreatingSession,
}
