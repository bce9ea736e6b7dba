use crate::models::{default_breaks, BreakConfig, SoundId, TimeUnit};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const APP_DIR_NAME: &str = "dontforgetyourbreaks";
const PREFERENCES_FILE_NAME: &str = "preferences.json";

#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
}

pub type DataResult<T> = Result<T, DataError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub breaks: Vec<BreakConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_geometry: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            breaks: default_breaks(),
            window_geometry: None,
        }
    }
}

/// On-disk shape tolerant of missing keys; merged over the defaults.
#[derive(Debug, Default, Deserialize)]
struct StoredPreferences {
    #[serde(default)]
    breaks: Vec<StoredBreak>,
    #[serde(default)]
    window_geometry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StoredBreak {
    name: Option<String>,
    interval_val: Option<i64>,
    interval_unit: Option<TimeUnit>,
    duration_val: Option<i64>,
    duration_unit: Option<TimeUnit>,
    start_sound: Option<SoundId>,
    end_sound: Option<SoundId>,
    loop_end_sound: Option<bool>,
    auto_dismiss: Option<bool>,
}

impl StoredBreak {
    fn merge_over(self, fallback: &BreakConfig) -> BreakConfig {
        BreakConfig {
            name: self.name.unwrap_or_else(|| fallback.name.clone()),
            interval_value: self.interval_val.unwrap_or(fallback.interval_value),
            interval_unit: self.interval_unit.unwrap_or(fallback.interval_unit),
            duration_value: self.duration_val.unwrap_or(fallback.duration_value),
            duration_unit: self.duration_unit.unwrap_or(fallback.duration_unit),
            start_sound: self
                .start_sound
                .unwrap_or_else(|| fallback.start_sound.clone()),
            end_sound: self.end_sound.unwrap_or_else(|| fallback.end_sound.clone()),
            loop_end_sound: self.loop_end_sound.unwrap_or(fallback.loop_end_sound),
            auto_dismiss: self.auto_dismiss.unwrap_or(fallback.auto_dismiss),
        }
    }

    fn into_complete(self) -> Option<BreakConfig> {
        Some(BreakConfig {
            name: self.name?,
            interval_value: self.interval_val?,
            interval_unit: self.interval_unit?,
            duration_value: self.duration_val?,
            duration_unit: self.duration_unit?,
            start_sound: self.start_sound?,
            end_sound: self.end_sound?,
            loop_end_sound: self.loop_end_sound?,
            auto_dismiss: self.auto_dismiss?,
        })
    }
}

impl From<StoredPreferences> for Preferences {
    fn from(stored: StoredPreferences) -> Self {
        let defaults = default_breaks();
        let mut stored_breaks = stored.breaks.into_iter();
        let mut breaks = Vec::with_capacity(defaults.len());

        for fallback in &defaults {
            let config = stored_breaks
                .next()
                .unwrap_or_default()
                .merge_over(fallback);
            breaks.push(accept_or(config, fallback));
        }
        for extra in stored_breaks {
            match extra.into_complete() {
                Some(config) if config.validate().is_ok() => breaks.push(config),
                _ => warn!("ignoring incomplete break entry in preferences"),
            }
        }

        let mut seen = Vec::with_capacity(breaks.len());
        breaks.retain(|config| {
            if seen.contains(&config.name) {
                warn!(name = %config.name, "ignoring duplicate break name in preferences");
                false
            } else {
                seen.push(config.name.clone());
                true
            }
        });

        Self {
            breaks,
            window_geometry: stored.window_geometry,
        }
    }
}

fn accept_or(config: BreakConfig, fallback: &BreakConfig) -> BreakConfig {
    match config.validate() {
        Ok(()) => config,
        Err(err) => {
            warn!(error = %err, "invalid break in preferences, using default");
            fallback.clone()
        }
    }
}

pub fn default_preferences_path() -> DataResult<PathBuf> {
    let base = dirs_next::config_dir().ok_or(DataError::NoConfigDir)?;
    Ok(base.join(APP_DIR_NAME).join(PREFERENCES_FILE_NAME))
}

#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> DataResult<Preferences> {
        if !self.path.exists() {
            return Ok(Preferences::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Preferences::default());
        }
        let stored: StoredPreferences = serde_json::from_str(&contents)?;
        Ok(stored.into())
    }

    /// Like `load`, but a broken file only costs the user their saved settings.
    pub fn load_or_default(&self) -> Preferences {
        match self.load() {
            Ok(preferences) => preferences,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "could not load preferences");
                Preferences::default()
            }
        }
    }

    pub fn save(&self, preferences: &Preferences) -> DataResult<()> {
        debug!(path = %self.path.display(), "saving preferences");
        self.write_json(&self.path, preferences)
    }

    /// Saves new break settings, keeping whatever window geometry is on disk.
    pub fn save_breaks(&self, breaks: &[BreakConfig]) -> DataResult<()> {
        let window_geometry = self
            .load()
            .ok()
            .and_then(|existing| existing.window_geometry);
        self.save(&Preferences {
            breaks: breaks.to_vec(),
            window_geometry,
        })
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> DataResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = path.with_extension("tmp");
        let file = fs::File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        match fs::rename(&temp_path, path) {
            Ok(()) => Ok(()),
            Err(_err) if path.exists() => {
                let _ = fs::remove_file(path);
                fs::rename(&temp_path, path).map_err(DataError::from)
            }
            Err(err) => Err(DataError::from(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DataError, Preferences, PreferencesStore};
    use crate::models::{default_breaks, BreakConfig, SoundId, TimeUnit};
    use pretty_assertions::assert_eq;
    use std::fs;

    fn custom_break() -> BreakConfig {
        BreakConfig {
            name: "Walk".to_string(),
            interval_value: 2,
            interval_unit: TimeUnit::Hour,
            duration_value: 15,
            duration_unit: TimeUnit::Min,
            start_sound: SoundId::named("Pop"),
            end_sound: SoundId::None,
            loop_end_sound: true,
            auto_dismiss: false,
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = PreferencesStore::new(dir.path().join("prefs.json"));
        assert_eq!(store.load().expect("load"), Preferences::default());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = PreferencesStore::new(dir.path().join("nested").join("prefs.json"));
        let mut breaks = default_breaks();
        breaks.push(custom_break());
        let preferences = Preferences {
            breaks,
            window_geometry: Some("560x520+10+10".to_string()),
        };

        store.save(&preferences).expect("save");
        assert_eq!(store.load().expect("load"), preferences);
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn missing_keys_fall_back_to_positional_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("prefs.json");
        fs::write(
            &path,
            r#"{"breaks": [{"interval_val": 20, "start_sound": "None"}]}"#,
        )
        .expect("write");

        let loaded = PreferencesStore::new(&path).load().expect("load");
        let defaults = default_breaks();
        assert_eq!(loaded.breaks.len(), 2);
        assert_eq!(loaded.breaks[0].name, "Micro Break");
        assert_eq!(loaded.breaks[0].interval_value, 20);
        assert_eq!(loaded.breaks[0].start_sound, SoundId::None);
        assert_eq!(loaded.breaks[0].end_sound, defaults[0].end_sound);
        assert_eq!(loaded.breaks[1], defaults[1]);
    }

    #[test]
    fn invalid_entry_is_replaced_by_default() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"breaks": [{"duration_val": 0}]}"#).expect("write");

        let loaded = PreferencesStore::new(&path).load().expect("load");
        assert_eq!(loaded.breaks[0], default_breaks()[0]);
    }

    #[test]
    fn corrupt_file_is_an_error_but_load_or_default_recovers() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{ not json").expect("write");

        let store = PreferencesStore::new(&path);
        assert!(matches!(store.load(), Err(DataError::Serde(_))));
        assert_eq!(store.load_or_default(), Preferences::default());
    }

    #[test]
    fn save_breaks_keeps_window_geometry() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = PreferencesStore::new(dir.path().join("prefs.json"));
        store
            .save(&Preferences {
                breaks: default_breaks(),
                window_geometry: Some("600x400".to_string()),
            })
            .expect("save");

        let mut breaks = default_breaks();
        breaks[0].duration_value = 30;
        store.save_breaks(&breaks).expect("save breaks");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.breaks[0].duration_value, 30);
        assert_eq!(loaded.window_geometry.as_deref(), Some("600x400"));
    }
}
