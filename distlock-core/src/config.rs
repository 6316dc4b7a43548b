//! Lock configuration.
//!
//! A [`LockConfig`] is built once per application and passed explicitly to a
//! [`LockManager`](crate::LockManager). Per-call overrides are expressed as
//! [`LockOption`]s applied in order over a base config; later options win.
//!
//! No validation is performed. A zero `timeout` gives up after the first
//! failed attempt, a zero `sleep_per_try` polls without delay, and a zero
//! `expire` is passed through to the store (both bundled stores treat it as
//! "no expiry").

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::key::Namespace;

/// Default lease duration.
pub const DEFAULT_EXPIRE: Duration = Duration::from_secs(30);

/// Default acquisition budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default delay between polling attempts.
pub const DEFAULT_SLEEP_PER_TRY: Duration = Duration::from_millis(50);

/// Lock configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Lease duration attached to the key at creation.
    #[serde(with = "millis")]
    pub expire: Duration,
    /// Upper bound on how long acquisition keeps retrying.
    #[serde(with = "millis")]
    pub timeout: Duration,
    /// Delay between polling attempts.
    #[serde(with = "millis")]
    pub sleep_per_try: Duration,
    /// Prefix for every lock key.
    pub namespace: Namespace,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            expire: DEFAULT_EXPIRE,
            timeout: DEFAULT_TIMEOUT,
            sleep_per_try: DEFAULT_SLEEP_PER_TRY,
            namespace: Namespace::default(),
        }
    }
}

impl LockConfig {
    /// Create a configuration with the default durations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `DISTLOCK_EXPIRE_MS`, `DISTLOCK_TIMEOUT_MS`,
    /// `DISTLOCK_SLEEP_PER_TRY_MS` and `DISTLOCK_NAMESPACE`. Unset or
    /// unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |name: &str| {
            lookup(name)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        };

        let mut config = Self::default();

        if let Some(expire) = millis("DISTLOCK_EXPIRE_MS") {
            config.expire = expire;
        }

        if let Some(timeout) = millis("DISTLOCK_TIMEOUT_MS") {
            config.timeout = timeout;
        }

        if let Some(sleep) = millis("DISTLOCK_SLEEP_PER_TRY_MS") {
            config.sleep_per_try = sleep;
        }

        if let Some(namespace) = lookup("DISTLOCK_NAMESPACE") {
            config.namespace = Namespace::new(namespace);
        }

        config
    }

    /// Set the lease duration.
    pub fn expire(mut self, expire: Duration) -> Self {
        self.expire = expire;
        self
    }

    /// Set the acquisition timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the delay between polling attempts.
    pub fn sleep_per_try(mut self, sleep: Duration) -> Self {
        self.sleep_per_try = sleep;
        self
    }

    /// Set the key namespace.
    pub fn namespace(mut self, namespace: impl Into<Namespace>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Apply overrides in order.
    pub fn with_options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = LockOption>,
    {
        for option in options {
            option.apply(&mut self);
        }
        self
    }
}

/// A single configuration override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOption {
    /// Override the lease duration.
    Expire(Duration),
    /// Override the acquisition timeout.
    Timeout(Duration),
    /// Override the delay between polling attempts.
    SleepPerTry(Duration),
}

impl LockOption {
    /// Apply this override to a config.
    pub fn apply(self, config: &mut LockConfig) {
        match self {
            LockOption::Expire(d) => config.expire = d,
            LockOption::Timeout(d) => config.timeout = d,
            LockOption::SleepPerTry(d) => config.sleep_per_try = d,
        }
    }
}

/// Override the lease duration.
pub fn with_expire(expire: Duration) -> LockOption {
    LockOption::Expire(expire)
}

/// Override the acquisition timeout.
pub fn with_timeout(timeout: Duration) -> LockOption {
    LockOption::Timeout(timeout)
}

/// Override the delay between polling attempts.
pub fn with_sleep_per_try(sleep: Duration) -> LockOption {
    LockOption::SleepPerTry(sleep)
}

mod millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
