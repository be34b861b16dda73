//! ### `topic-reader-kafka`: Kafka-compatible topic API backend
//!
//! The topic service accepts Kafka clients on a dedicated endpoint. This crate implements
//! [`Session`](topic_reader_types::Session) and [`Reader`](topic_reader_types::Reader) on top of it.
//!
//! All blocking librdkafka calls (metadata fetch, synchronous commit, consumer teardown) are moved
//! onto the blocking thread pool and awaited against the caller's cancellation token.
//!
//! Authentication is SASL/PLAIN over TLS. The service expects the login as `<user>@<database>`.
//!
//! This crate depends on [`rdkafka`](https://docs.rs/rdkafka),
//! which in turn depends on [librdkafka-sys](https://docs.rs/librdkafka-sys), which itself is a wrapper of
//! [librdkafka](https://docs.confluent.io/platform/current/clients/librdkafka/html/index.html).
//! TLS requires the `ssl` (or `ssl-vendored`) feature.
//!
//! Configuration Reference: <https://kafka.apache.org/documentation/#configuration>

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_debug_implementations)]

/// The default timeout for establishing a session
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

mod error;
mod message;
mod reader;
mod session;

pub use error::*;
pub use message::*;
pub use reader::*;
pub use session::*;

/// Re-export types from `rdkafka`
pub mod export {
    pub use rdkafka;
}

macro_rules! impl_into_string {
    ($name:ident) => {
        impl From<$name> for String {
            fn from(o: $name) -> Self {
                o.as_str().to_owned()
            }
        }
    };
}

pub(crate) use impl_into_string;
