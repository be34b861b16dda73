//! The read loop.
//!
//! ```text
//! open session -> start reader -> loop { fetch batch -> for each message: print, commit } -> close reader -> close session
//! ```
//!
//! Only one network operation is in flight at any time: a batch is fully printed and committed
//! before the next fetch is issued. All errors after startup are logged and the loop carries on.

use std::{io::Write, time::Duration};
use thiserror::Error;
use tokio::time::{sleep, timeout};
use topic_reader_types::{
    CancellationToken, ConsumerName, Endpoint, Reader, ReaderOptions, Session, TopicErr,
    TopicMessage, TopicPath,
};

use crate::format::MessageBlock;

/// Pause after a failed fetch. Fixed, there is no exponential growth.
pub const FETCH_ERROR_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct ShellSettings {
    pub consumer: ConsumerName,
    pub topic: TopicPath,
    pub reader: ReaderOptions,
    /// Upper bound of a single fetch. An empty fetch is retried immediately.
    pub read_timeout: Duration,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// Counters of one run.
pub struct LoopStats {
    pub batches: u64,
    pub printed: u64,
    pub committed: u64,
    /// Messages neither printed nor committed.
    pub skipped: u64,
    pub commit_failures: u64,
    pub fetch_errors: u64,
    /// Fetches that returned nothing within the read timeout.
    pub idle_fetches: u64,
}

#[derive(Error, Debug)]
/// Startup failures. Nothing can be read without a session and a reader.
pub enum ShellErr<E: std::error::Error> {
    #[error("failed to connect to {endpoint}: {err}")]
    Connect {
        endpoint: Endpoint,
        err: TopicErr<E>,
    },
    #[error("failed to start topic reader: {0}")]
    StartReader(TopicErr<E>),
}

/// Open a session to `endpoint` and [`run`] on it.
pub async fn start<S: Session, W: Write>(
    endpoint: Endpoint,
    options: S::ConnectOptions,
    settings: &ShellSettings,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<LoopStats, ShellErr<S::Error>> {
    let session = match S::open(endpoint.clone(), options, cancel).await {
        Ok(session) => session,
        Err(err) => return Err(ShellErr::Connect { endpoint, err }),
    };
    run(session, settings, cancel, out).await
}

/// Start a reader on `session` and read until `cancel` fires. The reader and then the session
/// are closed on the way out; failures to close are logged.
pub async fn run<S: Session, W: Write>(
    session: S,
    settings: &ShellSettings,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<LoopStats, ShellErr<S::Error>> {
    let mut reader = match session
        .start_reader(
            settings.consumer.clone(),
            settings.topic.clone(),
            settings.reader.clone(),
        )
        .await
    {
        Ok(reader) => reader,
        Err(err) => {
            close_session(session, cancel).await;
            return Err(ShellErr::StartReader(err));
        }
    };

    log::info!("Starting to read messages from topic: {}", settings.topic);
    let stats = read_loop(&mut reader, settings, cancel, out).await;

    if let Err(err) = reader.close(cancel).await {
        log::warn!("failed to close reader: {err}");
    }
    close_session(session, cancel).await;

    Ok(stats)
}

async fn close_session<S: Session>(session: S, cancel: &CancellationToken) {
    if let Err(err) = session.close(cancel).await {
        log::warn!("failed to close session: {err}");
    }
}

/// Fetch and process batches until `cancel` fires.
pub async fn read_loop<R: Reader, W: Write>(
    reader: &mut R,
    settings: &ShellSettings,
    cancel: &CancellationToken,
    out: &mut W,
) -> LoopStats {
    let mut stats = LoopStats::default();

    loop {
        if cancel.is_cancelled() {
            log::info!("Shutdown signal received, exiting...");
            break;
        }

        let batch = match timeout(settings.read_timeout, reader.read_batch(cancel)).await {
            Ok(Ok(batch)) => batch,
            Err(_) => {
                stats.idle_fetches += 1;
                continue;
            }
            Ok(Err(err)) if err.is_deadline_exceeded() => {
                stats.idle_fetches += 1;
                continue;
            }
            // interrupted by shutdown; the check above ends the loop
            Ok(Err(err)) if err.is_cancelled() && cancel.is_cancelled() => continue,
            Ok(Err(err)) => {
                log::error!("error reading batch: {err}");
                stats.fetch_errors += 1;
                tokio::select! {
                    _ = cancel.cancelled() => (),
                    _ = sleep(FETCH_ERROR_BACKOFF) => (),
                }
                continue;
            }
        };

        stats.batches += 1;
        for message in batch {
            process_message(reader, message, cancel, out, &mut stats).await;
        }
    }

    stats
}

/// Print then commit. A message whose body cannot be read is neither printed nor committed.
async fn process_message<R: Reader, W: Write>(
    reader: &mut R,
    mut message: TopicMessage,
    cancel: &CancellationToken,
    out: &mut W,
    stats: &mut LoopStats,
) {
    let body = match message.read_body() {
        Ok(body) => body,
        Err(err) => {
            log::error!("failed to read message body: {err}");
            stats.skipped += 1;
            return;
        }
    };

    let block = MessageBlock::new(message.header(), message.metadata(), &body);
    if let Err(err) = write!(out, "{block}").and_then(|_| out.flush()) {
        log::error!("failed to print message: {err}");
        stats.skipped += 1;
        return;
    }
    stats.printed += 1;

    match reader.commit(&message, cancel).await {
        Ok(()) => stats.committed += 1,
        Err(err) => {
            log::error!("commit failed: {err}");
            stats.commit_failures += 1;
        }
    }
}
