use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

pub const REQUIRED_SETTINGS: [&str; 3] = ["username", "password", "apikey"];

/// Credential bundle sent with every API call.
///
/// Values stay as raw JSON so keys written by something else survive a save.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Settings(BTreeMap<String, Value>);

impl Settings {
    /// Empty values for every required key, shown when nothing is stored yet.
    pub fn scaffold() -> Self {
        REQUIRED_SETTINGS
            .iter()
            .map(|key| (key.to_string(), String::new()))
            .collect()
    }

    /// String value of `key`; non-string values read as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Every entry, with non-string values rendered as JSON text.
    pub fn iter(&self) -> impl Iterator<Item = (&str, String)> {
        self.0.iter().map(|(k, v)| {
            let text = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.as_str(), text)
        })
    }

    /// Required keys that are absent or empty, in declaration order.
    pub fn missing(&self) -> Vec<&'static str> {
        REQUIRED_SETTINGS
            .into_iter()
            .filter(|key| self.get(key).map_or(true, str::is_empty))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::ConfigIncomplete(
                missing.into_iter().map(String::from).collect(),
            ))
        }
    }

    /// Merges non-empty updates over the current values.
    pub fn merge(&mut self, updates: Settings) {
        self.0.extend(
            updates
                .0
                .into_iter()
                .filter(|(_, value)| !matches!(value, Value::Null) && value.as_str() != Some("")),
        );
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/readitlater/settings.json`
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("readitlater").join("settings.json"))
            .ok_or(Error::NoConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            // Leave the directory in place so the first `settings` save succeeds.
            self.make_dir()?;
            return Err(Error::ConfigMissing(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path).map_err(|e| Error::ConfigCorrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let settings =
            serde_json::from_str::<Settings>(&content).map_err(|e| Error::ConfigCorrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        log::debug!("Loaded settings from {}", self.path.display());
        Ok(settings)
    }

    pub fn save(&self, updates: Settings) -> Result<Settings> {
        let mut settings = self.load().unwrap_or_else(|e| {
            log::debug!("Starting from empty settings: {}", e);
            Settings::default()
        });
        settings.merge(updates);

        self.make_dir()?;
        let content = serde_json::to_string_pretty(&settings).map_err(|e| Error::Io {
            path: self.path.clone(),
            source: e.into(),
        })?;
        fs::write(&self.path, content).map_err(|source| Error::Io {
            path: self.path.clone(),
            source,
        })?;

        log::debug!("Saved settings to {}", self.path.display());
        Ok(settings)
    }

    fn make_dir(&self) -> Result<()> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                fs::create_dir_all(dir).map_err(|source| Error::Io {
                    path: dir.to_path_buf(),
                    source,
                })
            }
            _ => Ok(()),
        }
    }
}
