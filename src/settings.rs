use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

/// Shortens ticks to 100 ms for trying out sessions by hand.
const FAST_ENV: &str = "LOOTIMER_FAST";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChimeSettings {
    pub enabled: bool,
    pub frequency_hz: f32,
    pub duration_ms: u64,
    pub volume: f32,
}

impl Default for ChimeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency_hz: 880.0,
            duration_ms: 1200,
            volume: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerSettings {
    pub tick_interval_ms: u64,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
        }
    }
}

impl TimerSettings {
    pub fn tick_interval(&self) -> Duration {
        let fast = std::env::var(FAST_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if fast {
            Duration::from_millis(100)
        } else {
            Duration::from_millis(self.tick_interval_ms.max(1))
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserSettings {
    #[serde(default)]
    pub chime: ChimeSettings,
    #[serde(default)]
    pub timer: TimerSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    /// Loads settings from `path`. A missing or unreadable-as-JSON file yields defaults.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed settings {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn chime(&self) -> ChimeSettings {
        self.read().chime
    }

    pub fn timer(&self) -> TimerSettings {
        self.read().timer
    }

    pub fn update_chime(&self, settings: ChimeSettings) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        guard.chime = settings;
        self.persist(&guard)
    }

    fn read(&self) -> UserSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
