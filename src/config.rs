use std::{env, path::PathBuf};

use anyhow::{anyhow, Result};
use tokio::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_SETTINGS_PATH: &str = "kiosk-settings.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Fixed timings of the scan-to-mark path and the session watchdog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingConfig {
    /// How long a code must stay the latest decode before it counts.
    pub debounce_window: Duration,
    /// Pause between a successful mark and the roster re-read.
    pub settle_delay: Duration,
    pub clock_tick: Duration,
    pub inactivity_check: Duration,
    pub inactivity_threshold: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_millis(2000),
            settle_delay: Duration::from_millis(500),
            clock_tick: Duration::from_secs(1),
            inactivity_check: Duration::from_secs(60),
            inactivity_threshold: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KioskConfig {
    pub api_base: String,
    pub settings_path: PathBuf,
    pub password: Option<String>,
    pub debug: bool,
    pub http_timeout: Duration,
    pub timing: TimingConfig,
}

impl KioskConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_base = lookup("KIOSK_API_BASE")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let settings_path = lookup("KIOSK_SETTINGS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));
        let password = lookup("KIOSK_PASSWORD").filter(|value| !value.is_empty());
        let debug = lookup("KIOSK_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let http_timeout_secs = match lookup("KIOSK_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| anyhow!("invalid value for KIOSK_HTTP_TIMEOUT_SECS: {raw}"))?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            api_base,
            settings_path,
            password,
            debug,
            http_timeout: Duration::from_secs(http_timeout_secs),
            timing: TimingConfig::default(),
        })
    }
}
