//! The block printed for every message.
//!
//! ```text
//! ===========================
//! Message WrittenAt: 2024-03-05 07:08:09 +0000 UTC
//! Message CreatedAt: 2024-03-05 07:08:09 +0000 UTC
//! Message WriteSessionMetadata: map[]
//! Message Offset: 42
//! Message ProducerID: p1
//! Message SeqNo: 7
//! Message PartitionID: 0
//! Metadata:
//!   k = v
//! Message body: hello
//! ```
//!
//! The `Metadata:` section is omitted when the message carries no metadata.
//! Bytes that are not valid UTF-8 are printed lossily.

use std::fmt::Display;
use topic_reader_types::{format_timestamp, MessageHeader, Metadata};

pub const SEPARATOR: &str = "===========================";

#[derive(Debug, Clone, Copy)]
/// A message ready to be printed; `Display` renders the whole block, trailing newline included.
pub struct MessageBlock<'a> {
    header: &'a MessageHeader,
    metadata: &'a Metadata,
    body: &'a [u8],
}

impl<'a> MessageBlock<'a> {
    pub fn new(header: &'a MessageHeader, metadata: &'a Metadata, body: &'a [u8]) -> Self {
        Self {
            header,
            metadata,
            body,
        }
    }
}

impl<'a> Display for MessageBlock<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header = self.header;
        writeln!(f, "{SEPARATOR}")?;
        writeln!(f, "Message WrittenAt: {}", format_timestamp(header.written_at()))?;
        writeln!(f, "Message CreatedAt: {}", format_timestamp(header.created_at()))?;
        write!(f, "Message WriteSessionMetadata: map[")?;
        for (i, (k, v)) in header.write_session_meta().iter().enumerate() {
            write!(f, "{space}{k}:{v}", space = if i != 0 { " " } else { "" })?;
        }
        writeln!(f, "]")?;
        writeln!(f, "Message Offset: {}", header.offset())?;
        writeln!(f, "Message ProducerID: {}", header.producer_id())?;
        writeln!(f, "Message SeqNo: {}", header.seq_no())?;
        writeln!(f, "Message PartitionID: {}", header.partition_id())?;

        if !self.metadata.is_empty() {
            writeln!(f, "Metadata:")?;
            for (k, v) in self.metadata.iter() {
                writeln!(f, "  {} = {}", k, String::from_utf8_lossy(v))?;
            }
        }

        writeln!(f, "Message body: {}", String::from_utf8_lossy(self.body))
    }
}
