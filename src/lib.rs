//! ### `topic-reader`
//!
//! Reads a topic as a named consumer, prints every message to standard output and commits it.
//!
//! ```text
//! topic-reader --endpoint ydb.example.com:9093 --database /ru-central1/b1g/etn \
//!     --user reader --password *** --ca_file ca.pem --topic orders --consumer audit
//! ```
//!
//! The work is split into three crates:
//!
//! + `topic-reader-types`: the [`Session`] / [`Reader`] traits and the message types
//! + `topic-reader-kafka`: a client for the service's Kafka-compatible endpoint
//! + `topic-reader` (this crate): the [`shell`] driving any [`Session`], and the binary
//!
//! The shell fetches one batch at a time, bounded by `--read_timeout`. Each message is printed,
//! then committed, in delivery order, before the next fetch. SIGINT / SIGTERM stop the loop;
//! the reader and then the session are closed.

pub mod config;
pub mod format;
pub mod shell;
pub mod signal;

pub use topic_reader_types::*;
