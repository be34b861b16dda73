use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    ConnectOptions, ConsumerName, Endpoint, MessageBatch, ReaderOptions, TopicMessage, TopicPath,
    TopicResult,
};

#[async_trait]
/// Common interface of topic service clients.
pub trait Session: Sized + Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;
    type Reader: Reader<Error = Self::Error>;
    type ConnectOptions: ConnectOptions;

    /// Establish an authenticated session with the service.
    async fn open(
        endpoint: Endpoint,
        options: Self::ConnectOptions,
        cancel: &CancellationToken,
    ) -> TopicResult<Self, Self::Error>;

    /// Start a reader for one consumer on one topic.
    async fn start_reader(
        &self,
        consumer: ConsumerName,
        topic: TopicPath,
        options: ReaderOptions,
    ) -> TopicResult<Self::Reader, Self::Error>;

    /// Release the session. Readers should be closed before this.
    async fn close(self, cancel: &CancellationToken) -> TopicResult<(), Self::Error>;
}

#[async_trait]
/// Common interface of topic readers, to be implemented by all backends.
pub trait Reader: Sized + Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Wait for the next batch of messages. Returns at least one message, and no more than
    /// the reader's batch limit.
    ///
    /// The wait is unbounded; callers bound it with a timeout. If `cancel` fires first,
    /// returns [`crate::TopicErr::Cancelled`]. A closed reader returns [`crate::TopicErr::Closed`].
    async fn read_batch(
        &mut self,
        cancel: &CancellationToken,
    ) -> TopicResult<MessageBatch, Self::Error>;

    /// Commit this message for the reader's consumer, so that it will not be delivered again.
    async fn commit(
        &mut self,
        message: &TopicMessage,
        cancel: &CancellationToken,
    ) -> TopicResult<(), Self::Error>;

    /// Stop reading. Any later call on this reader returns [`crate::TopicErr::Closed`].
    async fn close(&mut self, cancel: &CancellationToken) -> TopicResult<(), Self::Error>;
}
