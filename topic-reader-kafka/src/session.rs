use rdkafka::{
    config::ClientConfig,
    consumer::{BaseConsumer, Consumer},
    util::Timeout,
};
use std::{path::PathBuf, time::Duration};
use tokio::task::spawn_blocking;

use topic_reader_types::{
    export::async_trait::async_trait, runtime_error, CancellationToken, ConnectOptions,
    ConsumerName, Endpoint, ReaderOptions, Session, StaticCredentials, TopicErr, TopicPath,
};

use crate::{
    create_reader, impl_into_string, KafkaErr, KafkaReader, KafkaReaderOptions, KafkaResult,
    DEFAULT_TIMEOUT,
};

/// An authenticated connection to the Kafka-compatible endpoint.
///
/// `open` verifies the endpoint and credentials by fetching cluster metadata;
/// readers then connect with the same client configuration.
pub struct KafkaSession {
    endpoint: Endpoint,
    options: KafkaConnectOptions,
    probe: Option<BaseConsumer>,
}

#[derive(Debug, Default, Clone)]
pub struct KafkaConnectOptions {
    timeout: Option<Duration>,
    credentials: Option<StaticCredentials>,
    ca_file: Option<PathBuf>,
    client_options: Vec<(String, String)>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OptionKey {
    BootstrapServers,
    SocketTimeout,
    SecurityProtocol,
    SslCaLocation,
    SaslMechanism,
    SaslUsername,
    SaslPassword,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SecurityProtocol {
    Plaintext,
    Ssl,
    SaslPlaintext,
    SaslSsl,
}

impl ConnectOptions for KafkaConnectOptions {
    type Error = KafkaErr;

    /// Defaults to [`DEFAULT_TIMEOUT`]
    fn timeout(&self) -> KafkaResult<Duration> {
        Ok(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
    }

    /// Timeout for establishing the session, also used as the socket timeout of network requests.
    fn set_timeout(&mut self, v: Duration) -> KafkaResult<&mut Self> {
        self.timeout = Some(v);
        Ok(self)
    }

    /// An empty login means the session is not authenticated.
    fn set_credentials(&mut self, v: StaticCredentials) -> KafkaResult<&mut Self> {
        self.credentials = if v.is_anonymous() { None } else { Some(v) };
        Ok(self)
    }

    /// An empty path means the system trust store is used.
    fn set_ca_file(&mut self, v: PathBuf) -> KafkaResult<&mut Self> {
        self.ca_file = if v.as_os_str().is_empty() {
            None
        } else {
            Some(v)
        };
        Ok(self)
    }
}

impl KafkaConnectOptions {
    /// Set an arbitrary librdkafka property. These are applied last, so they override
    /// anything derived from the typed options.
    pub fn set_client_option<K: Into<String>, V: Into<String>>(&mut self, k: K, v: V) -> &mut Self {
        self.client_options.push((k.into(), v.into()));
        self
    }

    pub fn client_options(&self) -> &[(String, String)] {
        &self.client_options
    }

    pub fn credentials(&self) -> Option<&StaticCredentials> {
        self.credentials.as_ref()
    }

    pub fn ca_file(&self) -> Option<&PathBuf> {
        self.ca_file.as_ref()
    }

    /// The session is always encrypted, unless overridden by a client option.
    pub fn security_protocol(&self) -> SecurityProtocol {
        if self.credentials.is_some() {
            SecurityProtocol::SaslSsl
        } else {
            SecurityProtocol::Ssl
        }
    }

    pub(crate) fn make_client_config(&self, endpoint: &Endpoint, client_config: &mut ClientConfig) {
        client_config.set(OptionKey::BootstrapServers, endpoint.address());
        if let Some(v) = self.timeout {
            client_config.set(OptionKey::SocketTimeout, format!("{}", v.as_millis()));
        }
        client_config.set(OptionKey::SecurityProtocol, self.security_protocol());
        if let Some(path) = &self.ca_file {
            client_config.set(OptionKey::SslCaLocation, path.to_string_lossy());
        }
        if let Some(credentials) = &self.credentials {
            client_config.set(OptionKey::SaslMechanism, "PLAIN");
            client_config.set(
                OptionKey::SaslUsername,
                format!("{}@{}", credentials.user(), endpoint.database()),
            );
            client_config.set(OptionKey::SaslPassword, credentials.password());
        }
        for (k, v) in self.client_options.iter() {
            client_config.set(k, v);
        }
    }
}

impl OptionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BootstrapServers => "bootstrap.servers",
            Self::SocketTimeout => "socket.timeout.ms",
            Self::SecurityProtocol => "security.protocol",
            Self::SslCaLocation => "ssl.ca.location",
            Self::SaslMechanism => "sasl.mechanism",
            Self::SaslUsername => "sasl.username",
            Self::SaslPassword => "sasl.password",
        }
    }
}

impl SecurityProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plaintext => "PLAINTEXT",
            Self::Ssl => "SSL",
            Self::SaslPlaintext => "SASL_PLAINTEXT",
            Self::SaslSsl => "SASL_SSL",
        }
    }
}

impl_into_string!(OptionKey);
impl_into_string!(SecurityProtocol);

impl std::fmt::Debug for KafkaSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaSession")
            .field("endpoint", &self.endpoint)
            .field("open", &self.probe.is_some())
            .finish()
    }
}

#[async_trait]
impl Session for KafkaSession {
    type Error = KafkaErr;
    type Reader = KafkaReader;
    type ConnectOptions = KafkaConnectOptions;

    async fn open(
        endpoint: Endpoint,
        options: Self::ConnectOptions,
        cancel: &CancellationToken,
    ) -> KafkaResult<Self> {
        let mut client_config = ClientConfig::new();
        options.make_client_config(&endpoint, &mut client_config);
        let probe: BaseConsumer = client_config
            .create()
            .map_err(|e| TopicErr::Connect(e.to_string()))?;
        let timeout = options.timeout()?;

        // `fetch_metadata` blocks until the brokers answer or the timeout elapses
        let task = spawn_blocking(move || {
            match probe.fetch_metadata(None, Timeout::After(timeout)) {
                Ok(metadata) => Ok((metadata.brokers().len(), probe)),
                Err(err) => Err(err),
            }
        });
        let (brokers, probe) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TopicErr::Cancelled),
            res = task => res
                .map_err(runtime_error)?
                .map_err(|e| TopicErr::Connect(e.to_string()))?,
        };
        log::debug!("Connected to {endpoint}: {brokers} broker(s)");

        Ok(KafkaSession {
            endpoint,
            options,
            probe: Some(probe),
        })
    }

    async fn start_reader(
        &self,
        consumer: ConsumerName,
        topic: TopicPath,
        options: ReaderOptions,
    ) -> KafkaResult<Self::Reader> {
        let mut client_config = ClientConfig::new();
        self.options
            .make_client_config(&self.endpoint, &mut client_config);

        let mut reader_options = KafkaReaderOptions::new(consumer);
        reader_options.set_batch_max_count(options.batch_max_count());

        create_reader(client_config, &reader_options, topic)
    }

    /// Readers created from this session keep their own connections.
    async fn close(mut self, _: &CancellationToken) -> KafkaResult<()> {
        if let Some(probe) = self.probe.take() {
            spawn_blocking(move || drop(probe))
                .await
                .map_err(runtime_error)?;
        }
        log::debug!("Session to {} closed", self.endpoint);
        Ok(())
    }
}
