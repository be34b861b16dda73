//! ### `topic-reader-types`: Traits & Types
//!
//! This crate defines the contract between the reader shell and a topic service client:
//! a [`Session`] opens an authenticated connection, a [`Reader`] fetches batches of messages
//! for one consumer on one topic and commits them. It does not provide any implementation.
//!
//! Every call that may block takes a [`CancellationToken`], so that a shutdown signal can
//! interrupt in-flight operations.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_debug_implementations)]

mod error;
mod message;
mod options;
mod session;
mod topic;

pub use error::*;
pub use message::*;
pub use options::*;
pub use session::*;
pub use topic::*;

pub use tokio_util::sync::CancellationToken;

/// Re-export types from related libraries
pub mod export {
    pub use async_trait;
    pub use futures;
    pub use time;
    pub use tokio_util;
}
