use std::path::{Path, PathBuf};

use enumset::{EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Individually watched setting keys.
#[derive(Debug, EnumSetType, derive_more::Display)]
pub enum SettingKey {
    #[display("enabled")]
    Enabled,

    #[display("mode")]
    Mode,

    #[display("limit")]
    Limit,

    #[display("start_time")]
    StartTime,

    #[display("target_time")]
    TargetTime,
}

/// Boundary to the persistent settings store.
///
/// Values are raw integers; interpretation, validation, and defaults live with
/// the supervisor. `get` returns `None` for a key that has never been written.
pub trait ConfigStore: Send {
    fn get(&self, key: SettingKey) -> Option<i64>;

    fn set(&mut self, key: SettingKey, value: i64) -> Result<()>;

    /// Re-read the backing storage after an external change and report which keys differ.
    fn reload(&mut self) -> Result<EnumSet<SettingKey>>;
}

/// Raw stored values. Unset keys fall back to the configured defaults.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    enabled: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    target_time: Option<i64>,
}

impl StoredSettings {
    const fn get(&self, key: SettingKey) -> Option<i64> {
        match key {
            SettingKey::Enabled => self.enabled,
            SettingKey::Mode => self.mode,
            SettingKey::Limit => self.limit,
            SettingKey::StartTime => self.start_time,
            SettingKey::TargetTime => self.target_time,
        }
    }

    const fn set(&mut self, key: SettingKey, value: i64) {
        match key {
            SettingKey::Enabled => self.enabled = Some(value),
            SettingKey::Mode => self.mode = Some(value),
            SettingKey::Limit => self.limit = Some(value),
            SettingKey::StartTime => self.start_time = Some(value),
            SettingKey::TargetTime => self.target_time = Some(value),
        }
    }

    fn diff(&self, other: &Self) -> EnumSet<SettingKey> {
        EnumSet::<SettingKey>::all().iter().filter(|key| self.get(*key) != other.get(*key)).collect()
    }
}

/// Volatile store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore(StoredSettings);

#[cfg(test)]
impl ConfigStore for MemoryStore {
    fn get(&self, key: SettingKey) -> Option<i64> {
        self.0.get(key)
    }

    fn set(&mut self, key: SettingKey, value: i64) -> Result<()> {
        self.0.set(key, value);
        Ok(())
    }

    fn reload(&mut self) -> Result<EnumSet<SettingKey>> {
        Ok(EnumSet::empty())
    }
}

/// TOML-backed settings store. The file is created on the first write.
pub struct FileStore {
    path: PathBuf,
    settings: StoredSettings,
}

impl FileStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = Self::read(&path)?;
        Ok(Self { path, settings })
    }

    fn read(path: &Path) -> Result<StoredSettings> {
        if !path.exists() {
            return Ok(StoredSettings::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("failed to parse `{}`", path.display()))
    }

    fn flush(&self) -> Result<()> {
        let contents = toml::to_string_pretty(&self.settings)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("failed to write `{}`", self.path.display()))
    }
}

impl ConfigStore for FileStore {
    fn get(&self, key: SettingKey) -> Option<i64> {
        self.settings.get(key)
    }

    fn set(&mut self, key: SettingKey, value: i64) -> Result<()> {
        self.settings.set(key, value);
        self.flush()
    }

    fn reload(&mut self) -> Result<EnumSet<SettingKey>> {
        let settings = Self::read(&self.path)?;
        let changed = self.settings.diff(&settings);
        self.settings = settings;
        Ok(changed)
    }
}
