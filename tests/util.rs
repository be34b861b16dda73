#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::VecDeque,
    io::Read,
    path::PathBuf,
    sync::{Arc, Mutex, Once},
    time::Duration,
};
use tokio::time::Instant;
use topic_reader::{
    export::async_trait::async_trait, Body, CancellationToken, ConnectOptions, ConsumerName,
    Endpoint, MessageBatch, MessageHeader, Metadata, Reader, ReaderOptions, Session,
    StaticCredentials, Timestamp, TopicErr, TopicMessage, TopicPath, TopicResult,
};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FakeErr(pub String);

pub type FakeResult<T> = TopicResult<T, FakeErr>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open(Endpoint),
    StartReader {
        consumer: String,
        topic: String,
        batch_max_count: usize,
    },
    Fetch(Instant),
    Commit(u64),
    CloseReader,
    CloseSession,
}

/// What the next fetch does.
#[derive(Debug)]
pub enum Step {
    Batch(Vec<FakeMessage>),
    /// Never returns; the caller's timeout or cancellation ends it
    Idle,
    /// Cancel the token, then behave like `Idle`
    Shutdown,
    Fail(&'static str),
    Closed,
}

#[derive(Debug, Clone)]
pub struct FakeMessage {
    pub offset: u64,
    pub body: Option<&'static str>,
    pub metadata: Vec<(&'static str, &'static str)>,
    pub fail_commit: bool,
}

#[derive(Debug, Default)]
struct State {
    events: Vec<Event>,
    steps: VecDeque<Step>,
    fail_open: bool,
    fail_start: bool,
    cancel: Option<CancellationToken>,
}

#[derive(Debug, Clone, Default)]
/// Shared between the test and the fake session; it doubles as `ConnectOptions`.
pub struct Script {
    state: Arc<Mutex<State>>,
}

#[derive(Debug)]
pub struct FakeSession {
    script: Script,
}

#[derive(Debug)]
pub struct FakeReader {
    script: Script,
    failing_commits: Vec<u64>,
    closed: bool,
}

struct BrokenBody;

impl Read for BrokenBody {
    fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "unsupported codec",
        ))
    }
}

impl FakeMessage {
    pub fn new(offset: u64, body: &'static str) -> Self {
        Self {
            offset,
            body: Some(body),
            metadata: Vec::new(),
            fail_commit: false,
        }
    }

    pub fn broken(offset: u64) -> Self {
        Self {
            body: None,
            ..Self::new(offset, "")
        }
    }

    pub fn with_metadata(mut self, k: &'static str, v: &'static str) -> Self {
        self.metadata.push((k, v));
        self
    }

    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    fn to_message(&self) -> TopicMessage {
        let mut header = MessageHeader::new(
            TopicPath::new("orders"),
            0,
            self.offset,
            Timestamp::from_unix_timestamp(1_709_622_489).unwrap(),
        );
        header.set_producer_id("p1").set_seq_no(self.offset + 1);
        let metadata: Metadata = self.metadata.iter().copied().collect();
        let body = match self.body {
            Some(body) => Body::from_bytes(body),
            None => Body::from_reader(BrokenBody),
        };
        TopicMessage::new(header, metadata, body)
    }
}

impl Script {
    pub fn new(steps: Vec<Step>) -> Self {
        let script = Self::default();
        script.state().steps = steps.into();
        script
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// The token cancelled when the steps run out, or on `Step::Shutdown`.
    pub fn bind(&self, cancel: &CancellationToken) -> &Self {
        self.state().cancel = Some(cancel.clone());
        self
    }

    pub fn fail_open(&self) -> &Self {
        self.state().fail_open = true;
        self
    }

    pub fn fail_start(&self) -> &Self {
        self.state().fail_start = true;
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.state().events.clone()
    }

    pub fn fetch_times(&self) -> Vec<Instant> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Fetch(at) => Some(at),
                _ => None,
            })
            .collect()
    }

    /// Events with fetch timestamps erased, for comparing sequences.
    pub fn trace(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|e| match e {
                Event::Open(_) => "open".to_owned(),
                Event::StartReader { .. } => "start".to_owned(),
                Event::Fetch(_) => "fetch".to_owned(),
                Event::Commit(offset) => format!("commit {offset}"),
                Event::CloseReader => "close reader".to_owned(),
                Event::CloseSession => "close session".to_owned(),
            })
            .collect()
    }

    fn record(&self, event: Event) {
        self.state().events.push(event);
    }
}

impl ConnectOptions for Script {
    type Error = FakeErr;

    fn timeout(&self) -> FakeResult<Duration> {
        Ok(Duration::from_secs(1))
    }

    fn set_timeout(&mut self, _: Duration) -> FakeResult<&mut Self> {
        Ok(self)
    }

    fn set_credentials(&mut self, _: StaticCredentials) -> FakeResult<&mut Self> {
        Ok(self)
    }

    fn set_ca_file(&mut self, _: PathBuf) -> FakeResult<&mut Self> {
        Ok(self)
    }
}

#[async_trait]
impl Session for FakeSession {
    type Error = FakeErr;
    type Reader = FakeReader;
    type ConnectOptions = Script;

    async fn open(
        endpoint: Endpoint,
        script: Script,
        _: &CancellationToken,
    ) -> FakeResult<Self> {
        script.record(Event::Open(endpoint));
        if script.state().fail_open {
            return Err(TopicErr::Connect("authentication failed".to_owned()));
        }
        Ok(Self { script })
    }

    async fn start_reader(
        &self,
        consumer: ConsumerName,
        topic: TopicPath,
        options: ReaderOptions,
    ) -> FakeResult<FakeReader> {
        self.script.record(Event::StartReader {
            consumer: consumer.name().to_owned(),
            topic: topic.path().to_owned(),
            batch_max_count: options.batch_max_count(),
        });
        if self.script.state().fail_start {
            return Err(TopicErr::Backend(FakeErr(format!(
                "topic {topic} does not exist"
            ))));
        }
        Ok(FakeReader {
            script: self.script.clone(),
            failing_commits: Vec::new(),
            closed: false,
        })
    }

    async fn close(self, _: &CancellationToken) -> FakeResult<()> {
        self.script.record(Event::CloseSession);
        Ok(())
    }
}

#[async_trait]
impl Reader for FakeReader {
    type Error = FakeErr;

    async fn read_batch(&mut self, cancel: &CancellationToken) -> FakeResult<MessageBatch> {
        if self.closed {
            return Err(TopicErr::Closed);
        }
        self.script.record(Event::Fetch(Instant::now()));
        let step = {
            let mut state = self.script.state();
            match state.steps.pop_front() {
                Some(step) => step,
                None => {
                    if let Some(token) = &state.cancel {
                        token.cancel();
                    }
                    Step::Idle
                }
            }
        };
        match step {
            Step::Batch(messages) => {
                for m in messages.iter().filter(|m| m.fail_commit) {
                    self.failing_commits.push(m.offset);
                }
                Ok(MessageBatch::new(
                    messages.iter().map(FakeMessage::to_message).collect(),
                ))
            }
            Step::Idle => {
                cancel.cancelled().await;
                Err(TopicErr::Cancelled)
            }
            Step::Shutdown => {
                cancel.cancel();
                cancel.cancelled().await;
                Err(TopicErr::Cancelled)
            }
            Step::Fail(reason) => Err(TopicErr::Backend(FakeErr(reason.to_owned()))),
            Step::Closed => Err(TopicErr::Closed),
        }
    }

    async fn commit(
        &mut self,
        message: &TopicMessage,
        _: &CancellationToken,
    ) -> FakeResult<()> {
        let offset = *message.header().offset();
        self.script.record(Event::Commit(offset));
        if self.failing_commits.contains(&offset) {
            return Err(TopicErr::Backend(FakeErr("partition session closed".to_owned())));
        }
        Ok(())
    }

    async fn close(&mut self, _: &CancellationToken) -> FakeResult<()> {
        self.closed = true;
        self.script.record(Event::CloseReader);
        Ok(())
    }
}

thread_local! {
    static RECORDS: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Keeps records of this crate on the logging thread. `#[tokio::test]` runs on the
/// test's own thread, so tests running in parallel do not see each other's records.
struct CaptureLogger;

static LOGGER: CaptureLogger = CaptureLogger;
static INIT_LOGGER: Once = Once::new();

impl log::Log for CaptureLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.target().starts_with("topic_reader")
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            RECORDS.with(|r| {
                r.borrow_mut()
                    .push((record.level(), record.args().to_string()))
            });
        }
    }

    fn flush(&self) {}
}

/// Start capturing log records on this thread, discarding earlier ones.
pub fn capture_logs() {
    INIT_LOGGER.call_once(|| {
        log::set_logger(&LOGGER).expect("logger already set");
        log::set_max_level(log::LevelFilter::Trace);
    });
    RECORDS.with(|r| r.borrow_mut().clear());
}

pub fn logs() -> Vec<(log::Level, String)> {
    RECORDS.with(|r| r.borrow().clone())
}

/// Records at `Warn` or above.
pub fn problems() -> Vec<String> {
    logs()
        .into_iter()
        .filter(|(level, _)| *level <= log::Level::Warn)
        .map(|(_, line)| line)
        .collect()
}
