use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::timer::SessionDurations;

pub const DATA_DIR_ENV: &str = "DEEPFOCUS_DATA_DIR";

/// Directory holding `settings.json` and the key-value database.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .map(|dir| dir.join("deepfocus"))
        .unwrap_or_else(|| PathBuf::from(".deepfocus"))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub durations: SessionDurations,
    /// Silences the alarm and pauses ambient tracks.
    pub muted: bool,
    /// Ambient volume, 0.0..=1.0.
    pub volume: f32,
    pub dark_mode: bool,
    pub notifications_enabled: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            durations: SessionDurations::default(),
            muted: false,
            volume: 0.5,
            dark_mode: false,
            notifications_enabled: true,
        }
    }
}

/// Process-wide settings, read once at startup and rewritten in full on every
/// change.
pub struct SettingsStore {
    path: Option<PathBuf>,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable settings at {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    /// Store that never touches disk.
    pub fn ephemeral(settings: UserSettings) -> Self {
        Self {
            path: None,
            data: RwLock::new(settings),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> UserSettings {
        self.read().clone()
    }

    pub fn muted(&self) -> bool {
        self.read().muted
    }

    pub fn durations(&self) -> SessionDurations {
        self.read().durations
    }

    pub fn update<F>(&self, change: F) -> Result<UserSettings>
    where
        F: FnOnce(&mut UserSettings),
    {
        let mut guard = self.write();
        let mut next = guard.clone();
        change(&mut next);
        self.persist(&next)?;
        *guard = next.clone();
        Ok(next)
    }

    pub fn set_muted(&self, muted: bool) -> Result<()> {
        self.update(|settings| settings.muted = muted).map(|_| ())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::SessionKind;

    #[test]
    fn updates_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(store.snapshot(), UserSettings::default());
        store.set_muted(true).unwrap();
        store
            .update(|settings| settings.durations.set(SessionKind::LongBreak, 45))
            .unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        assert!(reloaded.muted());
        assert_eq!(reloaded.durations().long_break, 45);
        assert_eq!(reloaded.durations().focus, 25);
    }

    #[test]
    fn failed_write_keeps_previous_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("settings.json");

        let store = SettingsStore::new(path).unwrap();
        assert!(store.set_muted(true).is_err());
        assert!(store
            .update(|settings| settings.volume = 0.9)
            .is_err());
        assert_eq!(store.snapshot(), UserSettings::default());
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.snapshot(), UserSettings::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"darkMode": true, "durations": {"focus": 50}}"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().snapshot();
        assert!(settings.dark_mode);
        assert_eq!(settings.durations.focus, 50);
        assert_eq!(settings.durations.short_break, 5);
        assert!(settings.notifications_enabled);
    }
}
