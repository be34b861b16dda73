use anyhow::{anyhow, Result};
use clap::Parser;
use std::{path::PathBuf, time::Duration};
use topic_reader_types::{
    ConnectOptions, ConsumerName, Endpoint, ReaderOptions, StaticCredentials, TopicPath,
    TopicResult, DEFAULT_CONSUMER,
};

use crate::shell::ShellSettings;

#[derive(Clone, Parser)]
#[command(
    name = "topic-reader",
    about = "Read messages from a topic as a consumer, print and commit them"
)]
/// Startup configuration. Nothing is validated here: empty or malformed values
/// are passed through and rejected by the service.
pub struct RunConfig {
    #[arg(long, env = "TOPIC_READER_ENDPOINT", default_value = "", help = "Service endpoint, host:port")]
    pub endpoint: String,
    #[arg(long, env = "TOPIC_READER_DATABASE", default_value = "", help = "Database path")]
    pub database: String,
    #[arg(long, env = "TOPIC_READER_USER", default_value = "", help = "User login")]
    pub user: String,
    #[arg(
        long,
        env = "TOPIC_READER_PASSWORD",
        default_value = "",
        hide_env_values = true,
        help = "User password"
    )]
    pub password: String,
    #[arg(
        long = "ca_file",
        visible_alias = "ca-file",
        env = "TOPIC_READER_CA_FILE",
        default_value = "",
        help = "Path to CA certificate"
    )]
    pub ca_file: String,
    #[arg(long, env = "TOPIC_READER_TOPIC", default_value = "", help = "Topic to read from")]
    pub topic: TopicPath,
    #[arg(long, env = "TOPIC_READER_CONSUMER", default_value = DEFAULT_CONSUMER, help = "Consumer name")]
    pub consumer: ConsumerName,
    #[arg(
        long = "batch_size",
        visible_alias = "batch-size",
        env = "TOPIC_READER_BATCH_SIZE",
        default_value_t = 100,
        help = "Max messages per batch"
    )]
    pub batch_size: usize,
    #[arg(
        long = "read_timeout",
        visible_alias = "read-timeout",
        env = "TOPIC_READER_READ_TIMEOUT",
        default_value = "5s",
        value_parser = parse_duration,
        help = "Timeout for reading a batch, e.g. 5s, 500ms"
    )]
    pub read_timeout: Duration,
    #[arg(
        long = "connect_timeout",
        visible_alias = "connect-timeout",
        env = "TOPIC_READER_CONNECT_TIMEOUT",
        default_value = "10s",
        value_parser = parse_duration,
        help = "Timeout for establishing the session"
    )]
    pub connect_timeout: Duration,
    #[arg(
        long = "client_option",
        visible_alias = "client-option",
        value_parser = parse_client_option,
        help = "Extra client property as key=value; may be repeated"
    )]
    pub client_options: Vec<(String, String)>,
}

/// Parse a duration the way Go's `time.ParseDuration` does: a sequence of decimal numbers,
/// each with an optional fraction and a unit suffix, e.g. `300ms`, `1.5s` or `2h45m`.
/// Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare `0` is accepted.
/// Negative durations are rejected.
pub fn parse_duration(src: &str) -> Result<Duration> {
    let s = src.strip_prefix('+').unwrap_or(src);
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(anyhow!("Failed to parse {:?} as Duration", src));
    }

    let mut rest = s;
    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| anyhow!("Missing unit in duration {:?}", src))?;
        let (number, tail) = rest.split_at(number_end);
        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);

        let scale = unit_nanos(unit)
            .ok_or_else(|| anyhow!("Unknown unit {:?} in duration {:?}", unit, src))?;
        total = segment_nanos(number, scale)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| anyhow!("Failed to parse {:?} as Duration", src))?;
        rest = tail;
    }

    u64::try_from(total)
        .map(Duration::from_nanos)
        .map_err(|_| anyhow!("Duration {:?} is out of range", src))
}

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 3600 * 1_000_000_000,
        _ => return None,
    })
}

/// `number` is `digits[.digits]`; either side of the dot may be empty, but not both.
fn segment_nanos(number: &str, scale: u128) -> Option<u128> {
    let (int, frac) = number.split_once('.').unwrap_or((number, ""));
    if (int.is_empty() && frac.is_empty()) || frac.contains('.') {
        return None;
    }
    let mut nanos = if int.is_empty() {
        0
    } else {
        int.parse::<u128>().ok()?.checked_mul(scale)?
    };
    // digits past nanosecond precision of the largest unit do not matter
    let frac = &frac[..frac.len().min(18)];
    if !frac.is_empty() {
        let value = frac.parse::<u128>().ok()?;
        let divisor = 10u128.pow(frac.len() as u32);
        nanos = nanos.checked_add(value * scale / divisor)?;
    }
    Some(nanos)
}

fn parse_client_option(src: &str) -> Result<(String, String)> {
    match src.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_owned(), v.trim().to_owned())),
        _ => Err(anyhow!("Expected key=value, got {}", src)),
    }
}

impl RunConfig {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(&self.endpoint, &self.database)
    }

    pub fn credentials(&self) -> StaticCredentials {
        StaticCredentials::new(&self.user, &self.password)
    }

    /// Session options from this config. Backend specific `client_options` are not included.
    pub fn connect_options<O: ConnectOptions>(&self) -> TopicResult<O, O::Error> {
        let mut options = O::default();
        options
            .set_timeout(self.connect_timeout)?
            .set_credentials(self.credentials())?
            .set_ca_file(PathBuf::from(&self.ca_file))?;
        Ok(options)
    }

    pub fn settings(&self) -> ShellSettings {
        let mut reader = ReaderOptions::default();
        reader.set_batch_max_count(self.batch_size);
        ShellSettings {
            consumer: self.consumer.clone(),
            topic: self.topic.clone(),
            reader,
            read_timeout: self.read_timeout,
        }
    }
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("endpoint", &self.endpoint)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("ca_file", &self.ca_file)
            .field("topic", &self.topic)
            .field("consumer", &self.consumer)
            .field("batch_size", &self.batch_size)
            .field("read_timeout", &self.read_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("client_options", &self.client_options)
            .finish()
    }
}
