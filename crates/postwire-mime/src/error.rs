//! Error types for message serialization.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
///
/// Every variant is raised by validation, before any output is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The message has no sender address.
    #[error("From field is missing")]
    MissingSender,

    /// The message has no recipients in To, Cc or Bcc.
    #[error("Message has no recipients")]
    NoRecipients,

    /// An envelope address contains CR, LF, `<` or `>`.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}
