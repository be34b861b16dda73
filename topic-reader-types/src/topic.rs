use std::{convert::Infallible, fmt::Display, str::FromStr, sync::Arc};
pub use time::OffsetDateTime as Timestamp;

/// Consumer name used when none is configured.
pub const DEFAULT_CONSUMER: &str = "test-consumer";

/// Display format for the whole seconds of a Timestamp. Timestamps are converted to UTC before formatting.
pub const TIMESTAMP_FORMAT: &[time::format_description::FormatItem<'static>] =
    time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Identifies a topic. The path is passed through to the service as-is;
/// an invalid path is reported by the service when the reader starts.
pub struct TopicPath {
    path: Arc<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Identifies a consumer. The service tracks committed offsets per consumer.
pub struct ConsumerName {
    name: String,
}

impl TopicPath {
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl ConsumerName {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for ConsumerName {
    fn default() -> Self {
        Self::new(DEFAULT_CONSUMER)
    }
}

impl Display for TopicPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl Display for ConsumerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl FromStr for TopicPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TopicPath::new(s))
    }
}

impl FromStr for ConsumerName {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ConsumerName::new(s))
    }
}

/// Render a timestamp as `2024-03-05 07:08:09.123 +0000 UTC`.
///
/// The fraction keeps at most nine digits with trailing zeros removed, and is
/// left out entirely on a whole second.
pub fn format_timestamp(ts: &Timestamp) -> String {
    let utc = ts.to_offset(time::UtcOffset::UTC);
    let mut out = match utc.format(TIMESTAMP_FORMAT) {
        Ok(s) => s,
        Err(_) => return ts.to_string(),
    };
    let nanos = utc.nanosecond();
    if nanos != 0 {
        let fraction = format!("{nanos:09}");
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }
    out.push_str(" +0000 UTC");
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        let ts = time::macros::datetime!(2024-03-05 07:08:09.123456789 UTC);
        assert_eq!(
            format_timestamp(&ts),
            "2024-03-05 07:08:09.123456789 +0000 UTC"
        );

        let ts = time::macros::datetime!(2024-03-05 10:08:09 +03:00);
        assert_eq!(format_timestamp(&ts), "2024-03-05 07:08:09 +0000 UTC");

        let ts = time::macros::datetime!(2024-03-05 07:08:09.123 UTC);
        assert_eq!(format_timestamp(&ts), "2024-03-05 07:08:09.123 +0000 UTC");

        let ts = time::macros::datetime!(2024-03-05 07:08:09.000000050 UTC);
        assert_eq!(format_timestamp(&ts), "2024-03-05 07:08:09.00000005 +0000 UTC");
    }

    #[test]
    fn test_names_pass_through() {
        let topic: TopicPath = "/local/my topic".parse().unwrap();
        assert_eq!(topic.path(), "/local/my topic");
        assert_eq!(TopicPath::new("").path(), "");
        assert_eq!(ConsumerName::default().name(), "test-consumer");
    }
}
