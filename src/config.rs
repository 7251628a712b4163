use std::env;
use std::time::Duration;

use crate::Error;

/// Public Zoo API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.zoo.dev";

/// Connection settings for the Zoo API.
#[derive(Debug, Clone)]
pub struct ZooConfig {
    pub api_token: String,
    pub base_url: String,
    /// Per-request timeout for submission and status calls.
    pub request_timeout: Duration,
}

impl ZooConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// How a submitted job is awaited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause before each status query.
    pub interval: Duration,
    /// Total time to wait for a terminal status once the job is submitted.
    pub deadline: Duration,
    /// Retries of a single status query after a transient failure.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub retry_backoff: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            deadline: Duration::from_secs(120),
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl PollConfig {
    /// Backoff to apply before retry number `attempt` (starting at 1).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_backoff.saturating_mul(factor)
    }

    /// Reject settings that would busy-poll or time out before the first poll.
    pub fn validate(&self) -> Result<(), Error> {
        if self.interval.is_zero() {
            return Err(Error::config("poll interval must be greater than zero"));
        }
        if self.deadline.is_zero() {
            return Err(Error::config("poll deadline must be greater than zero"));
        }
        Ok(())
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub zoo: ZooConfig,
    pub poll: PollConfig,
}

impl Config {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = lookup("ZOO_API_TOKEN")
            .or_else(|| lookup("KITTYCAD_API_TOKEN"))
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                Error::config("ZOO_API_TOKEN (or KITTYCAD_API_TOKEN) environment variable is required")
            })?;

        let mut zoo = ZooConfig::new(api_token);
        if let Some(host) = lookup("ZOO_HOST") {
            zoo.base_url = host;
        }
        if let Some(secs) = parse_secs(&lookup, "ZOO_REQUEST_TIMEOUT_SECS")? {
            zoo.request_timeout = secs;
        }

        let mut poll = PollConfig::default();
        if let Some(secs) = parse_secs(&lookup, "ZOO_POLL_INTERVAL_SECS")? {
            poll.interval = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "ZOO_POLL_DEADLINE_SECS")? {
            poll.deadline = secs;
        }
        if let Some(retries) = lookup("ZOO_POLL_RETRIES") {
            poll.max_retries = retries.trim().parse().map_err(|_| {
                Error::config(format!("ZOO_POLL_RETRIES must be a whole number, got '{retries}'"))
            })?;
        }

        poll.validate()?;

        Ok(Self { zoo, poll })
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>, Error>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };

    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("{key} must be a number of seconds, got '{raw}'")))?;
    Duration::try_from_secs_f64(secs)
        .map(Some)
        .map_err(|_| Error::config(format!("{key} must be a non-negative number, got '{raw}'")))
}
