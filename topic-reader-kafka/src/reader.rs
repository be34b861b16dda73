use futures::FutureExt;
use rdkafka::{
    config::ClientConfig,
    consumer::{CommitMode, Consumer, StreamConsumer as RawConsumer},
    Offset, TopicPartitionList,
};
use std::sync::Arc;
use tokio::task::spawn_blocking;

use topic_reader_types::{
    export::async_trait::async_trait, runtime_error, CancellationToken, ConsumerName,
    MessageBatch, Reader, TopicErr, TopicMessage, TopicPath, DEFAULT_BATCH_MAX_COUNT,
};

use crate::{impl_into_string, to_topic_message, topic_err, KafkaResult};

/// Reads one topic on behalf of one consumer.
///
/// Offsets are only ever committed explicitly, one message at a time.
pub struct KafkaReader {
    inner: Option<Arc<RawConsumer>>,
    topic: TopicPath,
    batch_max_count: usize,
}

#[derive(Debug, Clone)]
pub struct KafkaReaderOptions {
    /// https://kafka.apache.org/documentation/#connectconfigs_group.id
    group_id: ConsumerName,
    batch_max_count: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KafkaReaderOptionKey {
    GroupId,
    AutoOffsetReset,
    EnableAutoCommit,
    EnableAutoOffsetStore,
}

type OptionKey = KafkaReaderOptionKey;

impl KafkaReaderOptions {
    pub fn new(group_id: ConsumerName) -> Self {
        Self {
            group_id,
            batch_max_count: DEFAULT_BATCH_MAX_COUNT,
        }
    }

    /// The consumer name. The service tracks committed offsets per consumer, and
    /// partitions are balanced among readers sharing the same name.
    pub fn group_id(&self) -> &ConsumerName {
        &self.group_id
    }

    /// Upper bound of messages returned by one `read_batch`. Zero is treated as one.
    pub fn set_batch_max_count(&mut self, v: usize) -> &mut Self {
        self.batch_max_count = v.max(1);
        self
    }
    pub fn batch_max_count(&self) -> usize {
        self.batch_max_count
    }

    fn make_client_config(&self, client_config: &mut ClientConfig) {
        client_config.set(OptionKey::GroupId, self.group_id.name());
        // a consumer without a committed offset reads the topic from the beginning
        client_config.set(OptionKey::AutoOffsetReset, "earliest");
        // offsets advance only through `commit`
        client_config.set(OptionKey::EnableAutoCommit, "false");
        client_config.set(OptionKey::EnableAutoOffsetStore, "false");
    }
}

impl OptionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GroupId => "group.id",
            Self::AutoOffsetReset => "auto.offset.reset",
            Self::EnableAutoCommit => "enable.auto.commit",
            Self::EnableAutoOffsetStore => "enable.auto.offset.store",
        }
    }
}

impl_into_string!(OptionKey);

impl std::fmt::Debug for KafkaReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaReader")
            .field("topic", &self.topic)
            .field("batch_max_count", &self.batch_max_count)
            .field("closed", &self.inner.is_none())
            .finish()
    }
}

impl KafkaReader {
    fn get(&self) -> KafkaResult<Arc<RawConsumer>> {
        self.inner.clone().ok_or(TopicErr::Closed)
    }

    pub fn topic(&self) -> &TopicPath {
        &self.topic
    }
}

#[async_trait]
impl Reader for KafkaReader {
    type Error = crate::KafkaErr;

    /// Awaits the first message, then takes whatever else is already buffered,
    /// up to the batch limit, without waiting any further.
    async fn read_batch(&mut self, cancel: &CancellationToken) -> KafkaResult<MessageBatch> {
        let consumer = self.get()?;

        let first = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TopicErr::Cancelled),
            res = consumer.recv() => res.map_err(topic_err)?,
        };
        let mut messages = Vec::with_capacity(self.batch_max_count);
        messages.push(to_topic_message(&first));
        drop(first);

        while messages.len() < self.batch_max_count {
            match consumer.recv().now_or_never() {
                Some(Ok(mess)) => messages.push(to_topic_message(&mess)),
                Some(Err(err)) => {
                    // surface it on the next call instead of dropping the messages we have
                    log::debug!("Stop filling batch: {err}");
                    break;
                }
                None => break,
            }
        }

        Ok(MessageBatch::new(messages))
    }

    /// Commits `offset + 1` of the message's partition, i.e. the next message to read.
    async fn commit(
        &mut self,
        message: &TopicMessage,
        cancel: &CancellationToken,
    ) -> KafkaResult<()> {
        let consumer = self.get()?;
        if cancel.is_cancelled() {
            return Err(TopicErr::Cancelled);
        }

        let (topic, partition, offset) = message.header().identifier();
        let partition: i32 = partition.try_into().map_err(runtime_error)?;
        let next: i64 = (offset + 1).try_into().map_err(runtime_error)?;
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(topic.path(), partition, Offset::Offset(next))
            .map_err(topic_err)?;

        // `commit` with `CommitMode::Sync` blocks until the broker acknowledges
        let task = spawn_blocking(move || consumer.commit(&tpl, CommitMode::Sync));
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TopicErr::Cancelled),
            res = task => res.map_err(runtime_error)?.map_err(topic_err),
        }
    }

    async fn close(&mut self, _: &CancellationToken) -> KafkaResult<()> {
        if let Some(consumer) = self.inner.take() {
            consumer.unsubscribe();
            // leaving the group blocks until the broker answers
            spawn_blocking(move || drop(consumer))
                .await
                .map_err(runtime_error)?;
            log::debug!("Reader on {} closed", self.topic);
        }
        Ok(())
    }
}

pub(crate) fn create_reader(
    mut client_config: ClientConfig,
    options: &KafkaReaderOptions,
    topic: TopicPath,
) -> KafkaResult<KafkaReader> {
    options.make_client_config(&mut client_config);

    let consumer: RawConsumer = client_config.create().map_err(topic_err)?;
    consumer.subscribe(&[topic.path()]).map_err(topic_err)?;

    Ok(KafkaReader {
        inner: Some(Arc::new(consumer)),
        topic,
        batch_max_count: options.batch_max_count(),
    })
}
