use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use uuid::Uuid;

use crate::clock::TimezoneOffset;

/// Kiosk state that survives restarts. Informational apart from the
/// timezone, which is restored at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskSettings {
    pub api_base: Option<String>,
    pub timezone: TimezoneOffset,
    pub session_id: Option<String>,
    pub session_started_at: Option<DateTime<Utc>>,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<KioskSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            KioskSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn snapshot(&self) -> KioskSettings {
        self.read().clone()
    }

    pub fn timezone(&self) -> TimezoneOffset {
        self.read().timezone
    }

    pub fn set_timezone(&self, timezone: TimezoneOffset) -> Result<()> {
        let mut guard = self.write();
        guard.timezone = timezone;
        self.persist(&guard)
    }

    /// Stamp a fresh session and remember which service it logged into.
    pub fn record_session_start(&self, api_base: &str, started_at: DateTime<Utc>) -> Result<String> {
        let session_id = Uuid::new_v4().to_string();
        let mut guard = self.write();
        guard.api_base = Some(api_base.to_string());
        guard.session_id = Some(session_id.clone());
        guard.session_started_at = Some(started_at);
        self.persist(&guard)?;
        Ok(session_id)
    }

    pub fn clear_session(&self) -> Result<()> {
        let mut guard = self.write();
        guard.session_id = None;
        guard.session_started_at = None;
        self.persist(&guard)
    }

    fn read(&self) -> RwLockReadGuard<'_, KioskSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, KioskSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, data: &KioskSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
