use thiserror::Error as ThisError;

/// Failure taxonomy for the transaction core.
///
/// Every failure is terminal for the operation that produced it: the engine
/// never retries internally and never leaves partial effects behind a
/// returned error.
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum EngineError {
    #[error("round credential missing or invalid")]
    Unauthorized,
    #[error("unknown {kind}: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("ad completion event already claimed (event_id={event_id})")]
    DuplicateEvent { event_id: String },
    #[error("insufficient coin balance (have={balance}, need={cost})")]
    InsufficientBalance { balance: i64, cost: i64 },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl EngineError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::DuplicateEvent { .. } => "DUPLICATE_EVENT",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::InvalidInput { .. } => "INVALID_INPUT",
        }
    }
}
