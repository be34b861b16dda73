use thiserror::Error;

/// Type alias of the [`Result`] type specific to `topic-reader`.
pub type TopicResult<T, E> = std::result::Result<T, TopicErr<E>>;

#[derive(Error, Debug)]
/// Common errors that may occur.
pub enum TopicErr<E: std::error::Error> {
    #[error("Connection Error: {0}")]
    Connect(String),
    /// The per-fetch deadline elapsed before any message arrived.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
    /// The cancellation token fired while the operation was in flight.
    #[error("context canceled")]
    Cancelled,
    /// The reader has been closed; it will never yield another message.
    #[error("Reader is closed")]
    Closed,
    #[error("Backend error: {0}")]
    Backend(E),
    #[error("Runtime error: {0}")]
    Runtime(Box<dyn std::error::Error + Send + Sync>),
}

impl<E: std::error::Error> TopicErr<E> {
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Function to construct a [`TopicErr::Runtime`] error variant.
pub fn runtime_error<T: std::error::Error, E: std::error::Error + Send + Sync + 'static>(
    e: E,
) -> TopicErr<T> {
    TopicErr::Runtime(Box::new(e))
}
