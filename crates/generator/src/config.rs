use std::time::Duration;

use tracing::warn;

use crate::emitter::{MAX_TRADES_PER_SEC, MIN_TRADES_PER_SEC};

const DEFAULT_TRADES_PER_SEC: u32 = 1;
const DEFAULT_TTL: Duration = Duration::from_secs(120);

/// Settings for the standalone generator binary.
///
/// Bad values fall back to the defaults with a warning rather than
/// failing startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerConfig {
    pub trades_per_sec: u32,
    /// How long to emit before exiting
    pub ttl: Duration,
    /// Keep the process alive after the TTL elapses
    pub stay_alive: bool,
    pub seed: Option<u64>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            trades_per_sec: DEFAULT_TRADES_PER_SEC,
            ttl: DEFAULT_TTL,
            stay_alive: false,
            seed: None,
        }
    }
}

impl ProducerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(raw) = var("TRADES_PER_SEC") {
            match raw.parse::<u32>() {
                Ok(rate) if (MIN_TRADES_PER_SEC..=MAX_TRADES_PER_SEC).contains(&rate) => {
                    config.trades_per_sec = rate;
                }
                _ => warn!(value = %raw, "invalid TRADES_PER_SEC, using default"),
            }
        }
        if let Some(raw) = var("PRODUCER_TTL") {
            match parse_duration(&raw) {
                Some(ttl) => config.ttl = ttl,
                None => warn!(value = %raw, "invalid PRODUCER_TTL, using default"),
            }
        }
        if let Some(raw) = var("PRODUCER_STAY_ALIVE") {
            match parse_bool(&raw) {
                Some(stay_alive) => config.stay_alive = stay_alive,
                None => warn!(value = %raw, "invalid PRODUCER_STAY_ALIVE, using default"),
            }
        }
        if let Some(raw) = var("GENERATOR_SEED") {
            match raw.parse::<u64>() {
                Ok(seed) => config.seed = Some(seed),
                Err(_) => warn!(value = %raw, "invalid GENERATOR_SEED, ignoring"),
            }
        }

        config
    }
}

/// `500ms`, `90s`, `2m`, `1h`, or a bare number of seconds
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let value: u64 = digits.parse().ok()?;

    match unit {
        "ms" => Some(Duration::from_millis(value)),
        "" | "s" => Some(Duration::from_secs(value)),
        "m" => value.checked_mul(60).map(Duration::from_secs),
        "h" => value.checked_mul(3_600).map(Duration::from_secs),
        _ => None,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
