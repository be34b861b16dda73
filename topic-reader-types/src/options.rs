use crate::TopicResult;
use std::{fmt::Display, path::PathBuf, time::Duration};

/// Messages requested per fetch when unspecified.
pub const DEFAULT_BATCH_MAX_COUNT: usize = 100;

/// Common options of a session.
pub trait ConnectOptions: Default + Clone + Send {
    type Error: std::error::Error;

    fn timeout(&self) -> TopicResult<Duration, Self::Error>;
    fn set_timeout(&mut self, d: Duration) -> TopicResult<&mut Self, Self::Error>;

    /// Login and password to authenticate the session with.
    fn set_credentials(
        &mut self,
        credentials: StaticCredentials,
    ) -> TopicResult<&mut Self, Self::Error>;

    /// CA certificate (PEM) used to verify the server.
    fn set_ca_file(&mut self, path: PathBuf) -> TopicResult<&mut Self, Self::Error>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
/// Where the service lives: a `host:port` address and a database path on it.
pub struct Endpoint {
    address: String,
    database: String,
}

#[derive(Clone, Default, PartialEq, Eq)]
/// Login / password pair.
pub struct StaticCredentials {
    user: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Options of a reader.
pub struct ReaderOptions {
    batch_max_count: usize,
}

impl Endpoint {
    pub fn new<A: Into<String>, D: Into<String>>(address: A, database: D) -> Self {
        Self {
            address: address.into(),
            database: database.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}?database={}", self.address, self.database)
    }
}

impl StaticCredentials {
    pub fn new<U: Into<String>, P: Into<String>>(user: U, password: P) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// No login configured; the session connects anonymously.
    pub fn is_anonymous(&self) -> bool {
        self.user.is_empty()
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            batch_max_count: DEFAULT_BATCH_MAX_COUNT,
        }
    }
}

impl ReaderOptions {
    /// Upper bound of messages returned by one fetch. Zero is treated as one.
    pub fn set_batch_max_count(&mut self, v: usize) -> &mut Self {
        self.batch_max_count = v.max(1);
        self
    }

    pub fn batch_max_count(&self) -> usize {
        self.batch_max_count
    }
}
