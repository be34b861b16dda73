use rdkafka::message::{Headers, Message as KafkaMessageTrait};
use topic_reader_types::{Body, MessageHeader, Metadata, Timestamp, TopicMessage, TopicPath};

/// Copy a message received from librdkafka into a [`TopicMessage`].
///
/// The Kafka API carries no producer sequence number or write session metadata;
/// those are left empty. The record key, if any, is taken as the producer id.
/// The record timestamp, whichever its type, is used for both `created_at` and `written_at`.
pub fn to_topic_message<M: KafkaMessageTrait>(mess: &M) -> TopicMessage {
    let timestamp = mess
        .timestamp()
        .to_millis()
        .and_then(|ms| Timestamp::from_unix_timestamp_nanos(ms as i128 * 1_000_000).ok())
        .unwrap_or(Timestamp::UNIX_EPOCH);

    let mut header = MessageHeader::new(
        TopicPath::new(mess.topic()),
        mess.partition() as i64,
        u64::try_from(mess.offset()).unwrap_or_default(),
        timestamp,
    );
    if let Some(key) = mess.key() {
        header.set_producer_id(String::from_utf8_lossy(key));
    }

    let mut metadata = Metadata::new();
    if let Some(headers) = mess.headers() {
        for h in headers.iter() {
            metadata.push(h.key, h.value.unwrap_or_default());
        }
    }

    let body = Body::from_bytes(mess.payload().unwrap_or_default());

    TopicMessage::new(header, metadata, body)
}
