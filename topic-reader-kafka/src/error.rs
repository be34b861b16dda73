/// Re-export of [`rdkafka::error::KafkaError`].
pub use rdkafka::error::KafkaError as KafkaErr;
use topic_reader_types::{TopicErr, TopicResult};

/// Alias for `TopicResult<T, KafkaErr>`.
pub type KafkaResult<T> = TopicResult<T, KafkaErr>;

pub(crate) fn topic_err(err: KafkaErr) -> TopicErr<KafkaErr> {
    TopicErr::Backend(err)
}
