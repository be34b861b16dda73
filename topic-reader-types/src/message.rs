use std::{
    collections::BTreeMap,
    fmt::Debug,
    io::{Cursor, Read},
};

use crate::{Timestamp, TopicPath};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Metadata associated with a message.
pub struct MessageHeader {
    topic: TopicPath,
    partition_id: i64,
    offset: u64,
    seq_no: u64,
    producer_id: String,
    created_at: Timestamp,
    written_at: Timestamp,
    write_session_meta: BTreeMap<String, String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
/// User metadata attached to a message by its producer. Entries keep the order they were written in.
pub struct Metadata {
    items: Vec<(String, Vec<u8>)>,
}

/// The content of a message. It is read on demand, and can only be read once.
pub struct Body {
    inner: Option<Box<dyn Read + Send + Sync>>,
}

#[derive(Debug)]
/// One message delivered from a topic.
pub struct TopicMessage {
    header: MessageHeader,
    metadata: Metadata,
    body: Body,
}

#[derive(Debug, Default)]
/// The messages returned by one fetch, in delivery order.
pub struct MessageBatch {
    messages: Vec<TopicMessage>,
}

impl MessageHeader {
    /// Both timestamps are set to `created_at`; the remaining fields start out empty.
    pub fn new(topic: TopicPath, partition_id: i64, offset: u64, created_at: Timestamp) -> Self {
        Self {
            topic,
            partition_id,
            offset,
            seq_no: 0,
            producer_id: String::new(),
            created_at,
            written_at: created_at,
            write_session_meta: BTreeMap::new(),
        }
    }

    pub fn topic(&self) -> &TopicPath {
        &self.topic
    }

    pub fn partition_id(&self) -> &i64 {
        &self.partition_id
    }

    /// Position within the partition.
    pub fn offset(&self) -> &u64 {
        &self.offset
    }

    /// Sequence number assigned by the producer.
    pub fn seq_no(&self) -> &u64 {
        &self.seq_no
    }

    pub fn producer_id(&self) -> &str {
        &self.producer_id
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn written_at(&self) -> &Timestamp {
        &self.written_at
    }

    pub fn write_session_meta(&self) -> &BTreeMap<String, String> {
        &self.write_session_meta
    }

    pub fn set_seq_no(&mut self, seq_no: u64) -> &mut Self {
        self.seq_no = seq_no;
        self
    }

    pub fn set_producer_id<S: Into<String>>(&mut self, producer_id: S) -> &mut Self {
        self.producer_id = producer_id.into();
        self
    }

    pub fn set_written_at(&mut self, written_at: Timestamp) -> &mut Self {
        self.written_at = written_at;
        self
    }

    pub fn set_write_session_meta(&mut self, meta: BTreeMap<String, String>) -> &mut Self {
        self.write_session_meta = meta;
        self
    }

    /// tuple to uniquely identify a message
    pub fn identifier(&self) -> (TopicPath, i64, u64) {
        (self.topic.clone(), self.partition_id, self.offset)
    }
}

impl Metadata {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push<K: Into<String>, V: Into<Vec<u8>>>(&mut self, key: K, value: V) -> &mut Self {
        self.items.push((key.into(), value.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.items.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl<K: Into<String>, V: Into<Vec<u8>>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            items: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Body {
    pub fn from_bytes<B: Into<Vec<u8>>>(bytes: B) -> Self {
        Self::from_reader(Cursor::new(bytes.into()))
    }

    pub fn from_reader<R: Read + Send + Sync + 'static>(reader: R) -> Self {
        Self {
            inner: Some(Box::new(reader)),
        }
    }

    /// Read the whole body into memory. A second call returns an error.
    pub fn read_all(&mut self) -> std::io::Result<Vec<u8>> {
        let mut reader = self.inner.take().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "message body already read")
        })?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    pub fn is_consumed(&self) -> bool {
        self.inner.is_none()
    }
}

impl Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Body")
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

impl TopicMessage {
    pub fn new(header: MessageHeader, metadata: Metadata, body: Body) -> Self {
        Self {
            header,
            metadata,
            body,
        }
    }

    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Read the whole body into memory. See [`Body::read_all`].
    pub fn read_body(&mut self) -> std::io::Result<Vec<u8>> {
        self.body.read_all()
    }

    pub fn take(self) -> (MessageHeader, Metadata, Body) {
        let Self {
            header,
            metadata,
            body,
        } = self;
        (header, metadata, body)
    }
}

impl MessageBatch {
    pub fn new(messages: Vec<TopicMessage>) -> Self {
        Self { messages }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[TopicMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<TopicMessage> {
        self.messages
    }
}

impl IntoIterator for MessageBatch {
    type Item = TopicMessage;
    type IntoIter = std::vec::IntoIter<TopicMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}
