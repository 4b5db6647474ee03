//! Ingestion configuration
//!
//! Source URLs, refresh intervals and limits for the ingestion pipeline.

use serde::{Serialize, Serializer};
use std::{fmt, str::FromStr, time::Duration};

use crate::config::env_or;

pub const DEFAULT_SOURCE1_URL: &str =
    "https://buenro-tech-assessment-materials.s3.eu-north-1.amazonaws.com/structured_generated_data.json";

pub const DEFAULT_SOURCE2_URL: &str =
    "https://buenro-tech-assessment-materials.s3.eu-north-1.amazonaws.com/large_generated_data.json";

pub const DEFAULT_INGEST_INTERVAL: &str = "EVERY_HOUR";

/// Default HTTP connect timeout for the fallback fetch.
pub const DEFAULT_HTTP_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default upper bound on one scheduled run (1 hour).
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 3600;

const NAMED_INTERVALS: [(&str, u64); 8] = [
    ("EVERY_MINUTE", 60),
    ("EVERY_5_MINUTES", 5 * 60),
    ("EVERY_10_MINUTES", 10 * 60),
    ("EVERY_30_MINUTES", 30 * 60),
    ("EVERY_HOUR", 60 * 60),
    ("EVERY_6_HOURS", 6 * 60 * 60),
    ("EVERY_12_HOURS", 12 * 60 * 60),
    ("EVERY_DAY", 24 * 60 * 60),
];

/// How often a source should be refreshed.
///
/// Parsed from a named interval such as `EVERY_HOUR`, or a number of seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestInterval {
    label: String,
    period: Duration,
}

impl IngestInterval {
    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for IngestInterval {
    fn default() -> Self {
        Self {
            label: DEFAULT_INGEST_INTERVAL.to_string(),
            period: Duration::from_secs(60 * 60),
        }
    }
}

impl FromStr for IngestInterval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let upper = s.to_ascii_uppercase();

        if let Some((label, secs)) = NAMED_INTERVALS.iter().find(|(name, _)| *name == upper) {
            return Ok(Self {
                label: label.to_string(),
                period: Duration::from_secs(*secs),
            });
        }

        match s.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Self {
                label: s.to_string(),
                period: Duration::from_secs(secs),
            }),
            _ => Err(anyhow::anyhow!(
                "Invalid ingest interval '{}': expected EVERY_* or a positive number of seconds",
                s
            )),
        }
    }
}

impl fmt::Display for IngestInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl Serialize for IngestInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}

/// Location and refresh interval of one configured source
#[derive(Debug, Clone, Serialize)]
pub struct SourceEndpoint {
    pub url: String,
    pub interval: IngestInterval,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestConfig {
    pub source1: SourceEndpoint,
    pub source2: SourceEndpoint,
    pub http_connect_timeout_secs: u64,
    /// Largest single array element accepted by the streaming decoder
    pub max_element_bytes: Option<usize>,
    /// Run the background scheduler in the server process
    pub schedule_enabled: bool,
    pub run_timeout_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source1: SourceEndpoint {
                url: DEFAULT_SOURCE1_URL.to_string(),
                interval: IngestInterval::default(),
            },
            source2: SourceEndpoint {
                url: DEFAULT_SOURCE2_URL.to_string(),
                interval: IngestInterval::default(),
            },
            http_connect_timeout_secs: DEFAULT_HTTP_CONNECT_TIMEOUT_SECS,
            max_element_bytes: None,
            schedule_enabled: false,
            run_timeout_secs: DEFAULT_RUN_TIMEOUT_SECS,
        }
    }
}

fn endpoint_from_env(
    url_key: &str,
    interval_key: &str,
    default_url: &str,
) -> anyhow::Result<SourceEndpoint> {
    let interval = match std::env::var(interval_key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{}: {}", interval_key, e))?,
        Err(_) => IngestInterval::default(),
    };

    Ok(SourceEndpoint {
        url: std::env::var(url_key).unwrap_or_else(|_| default_url.to_string()),
        interval,
    })
}

/// Unset or blank means unlimited; anything else must be a positive integer
fn max_element_bytes_from_env() -> anyhow::Result<Option<usize>> {
    let raw = match std::env::var("INGEST_MAX_ELEMENT_BYTES") {
        Ok(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(None),
    };

    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => anyhow::bail!(
            "INGEST_MAX_ELEMENT_BYTES must be a positive integer, got '{}'",
            raw
        ),
    }
}

impl IngestConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            source1: endpoint_from_env(
                "SOURCE1_URL",
                "SOURCE1_INGEST_INTERVAL",
                DEFAULT_SOURCE1_URL,
            )?,
            source2: endpoint_from_env(
                "SOURCE2_URL",
                "SOURCE2_INGEST_INTERVAL",
                DEFAULT_SOURCE2_URL,
            )?,
            http_connect_timeout_secs: env_or(
                "HTTP_CONNECT_TIMEOUT_SECS",
                DEFAULT_HTTP_CONNECT_TIMEOUT_SECS,
            ),
            max_element_bytes: max_element_bytes_from_env()?,
            schedule_enabled: env_or("INGEST_SCHEDULE_ENABLED", false),
            run_timeout_secs: env_or("INGEST_RUN_TIMEOUT_SECS", DEFAULT_RUN_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, endpoint) in [("SOURCE1_URL", &self.source1), ("SOURCE2_URL", &self.source2)] {
            if endpoint.url.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
        }

        if self.run_timeout_secs == 0 {
            anyhow::bail!("INGEST_RUN_TIMEOUT_SECS must be greater than 0");
        }

        Ok(())
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_named_intervals() {
        let hourly: IngestInterval = "EVERY_HOUR".parse().unwrap();
        assert_eq!(hourly.period(), Duration::from_secs(3600));
        assert_eq!(hourly.to_string(), "EVERY_HOUR");

        let five: IngestInterval = "every_5_minutes".parse().unwrap();
        assert_eq!(five.period(), Duration::from_secs(300));
        assert_eq!(five.label(), "EVERY_5_MINUTES");
    }

    #[test]
    fn test_numeric_interval() {
        let interval: IngestInterval = "90".parse().unwrap();
        assert_eq!(interval.period(), Duration::from_secs(90));
        assert!("0".parse::<IngestInterval>().is_err());
        assert!("EVERY_FORTNIGHT".parse::<IngestInterval>().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        for key in [
            "SOURCE1_URL",
            "SOURCE1_INGEST_INTERVAL",
            "SOURCE2_URL",
            "SOURCE2_INGEST_INTERVAL",
            "INGEST_MAX_ELEMENT_BYTES",
            "INGEST_SCHEDULE_ENABLED",
        ] {
            std::env::remove_var(key);
        }

        let config = IngestConfig::from_env().unwrap();
        assert_eq!(config.source1.url, DEFAULT_SOURCE1_URL);
        assert_eq!(config.source2.interval, IngestInterval::default());
        assert_eq!(config.max_element_bytes, None);
        assert!(!config.schedule_enabled);
    }

    #[test]
    #[serial]
    fn test_invalid_max_element_bytes_is_rejected() {
        for value in ["lots", "0", "-5"] {
            std::env::set_var("INGEST_MAX_ELEMENT_BYTES", value);
            let result = IngestConfig::from_env();
            std::env::remove_var("INGEST_MAX_ELEMENT_BYTES");

            let err = result.unwrap_err();
            assert!(err.to_string().contains("INGEST_MAX_ELEMENT_BYTES"), "{value}");
        }
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        std::env::set_var("SOURCE2_URL", "http://mirror.test/large.json");
        std::env::set_var("SOURCE2_INGEST_INTERVAL", "EVERY_DAY");
        std::env::set_var("INGEST_MAX_ELEMENT_BYTES", "65536");

        let config = IngestConfig::from_env();

        std::env::remove_var("SOURCE2_URL");
        std::env::remove_var("SOURCE2_INGEST_INTERVAL");
        std::env::remove_var("INGEST_MAX_ELEMENT_BYTES");

        let config = config.unwrap();
        assert_eq!(config.source2.url, "http://mirror.test/large.json");
        assert_eq!(config.source2.interval.period(), Duration::from_secs(86_400));
        assert_eq!(config.max_element_bytes, Some(65_536));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_interval() {
        std::env::set_var("SOURCE1_INGEST_INTERVAL", "sometimes");
        let result = IngestConfig::from_env();
        std::env::remove_var("SOURCE1_INGEST_INTERVAL");
        assert!(result.is_err());
    }
}
