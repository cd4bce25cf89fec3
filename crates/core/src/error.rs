/// Result alias that carries the custom [`TimelineError`] type.
pub type Result<T> = std::result::Result<T, TimelineError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// Free-form failure surfaced to the host application as a readable
    /// message.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Payload could not be encoded or decoded.
    #[error("invalid timeline payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The remote store rejected or failed a request.
    #[error("timeline store error: {0}")]
    Store(String),
    /// A write carried a revision the store no longer holds.
    #[error("revision conflict: sent {sent}, store holds {current}")]
    Conflict { sent: u64, current: u64 },
    #[error("unknown clip `{0}`")]
    ClipNotFound(String),
    /// Cut time does not fall strictly inside the clip.
    #[error("cannot split clip `{id}` at {at:.3}s")]
    InvalidSplit { id: String, at: f64 },
}

impl TimelineError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Whether the error is an optimistic-concurrency rejection.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<&str> for TimelineError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for TimelineError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
