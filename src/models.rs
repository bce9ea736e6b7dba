use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const SOUND_NAMES: [&str; 5] = ["None", "Glass", "Ping", "Pop", "Submarine"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("break name must not be empty")]
    EmptyName,
    #[error("{field} of {name} must be at least 1, got {value}")]
    NonPositive {
        name: String,
        field: &'static str,
        value: i64,
    },
    #[error("unknown time unit: {0}")]
    UnknownUnit(String),
    #[error("duplicate break name: {0}")]
    DuplicateName(String),
    #[error("configuration must define at least one break")]
    NoBreaks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Sec,
    Min,
    Hour,
}

impl TimeUnit {
    pub fn multiplier(self) -> i64 {
        match self {
            TimeUnit::Sec => 1,
            TimeUnit::Min => 60,
            TimeUnit::Hour => 3600,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Sec => "sec",
            TimeUnit::Min => "min",
            TimeUnit::Hour => "hour",
        }
    }

    pub fn to_seconds(self, value: i64) -> i64 {
        value.saturating_mul(self.multiplier())
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Ok(TimeUnit::Sec),
            "m" | "min" | "mins" | "minute" | "minutes" => Ok(TimeUnit::Min),
            "h" | "hour" | "hours" => Ok(TimeUnit::Hour),
            _ => Err(ConfigError::UnknownUnit(value.to_string())),
        }
    }
}

/// A named sound cue. Serialised as its name, with `"None"` meaning silence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SoundId {
    #[default]
    None,
    Named(String),
}

impl SoundId {
    pub fn named(name: impl Into<String>) -> Self {
        Self::from(name.into())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            SoundId::None => None,
            SoundId::Named(name) => Some(name),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, SoundId::None)
    }
}

impl From<String> for SoundId {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            SoundId::None
        } else if trimmed.len() == value.len() {
            SoundId::Named(value)
        } else {
            SoundId::Named(trimmed.to_string())
        }
    }
}

impl From<SoundId> for String {
    fn from(value: SoundId) -> Self {
        match value {
            SoundId::None => "None".to_string(),
            SoundId::Named(name) => name,
        }
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or("None"))
    }
}

/// Configuration of one recurring break, in the shape it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakConfig {
    pub name: String,
    #[serde(rename = "interval_val")]
    pub interval_value: i64,
    pub interval_unit: TimeUnit,
    #[serde(rename = "duration_val")]
    pub duration_value: i64,
    pub duration_unit: TimeUnit,
    pub start_sound: SoundId,
    pub end_sound: SoundId,
    pub loop_end_sound: bool,
    pub auto_dismiss: bool,
}

impl BreakConfig {
    pub fn interval_seconds(&self) -> i64 {
        self.interval_unit.to_seconds(self.interval_value)
    }

    pub fn duration_seconds(&self) -> i64 {
        self.duration_unit.to_seconds(self.duration_value)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.interval_value < 1 {
            return Err(ConfigError::NonPositive {
                name: self.name.clone(),
                field: "interval",
                value: self.interval_value,
            });
        }
        if self.duration_value < 1 {
            return Err(ConfigError::NonPositive {
                name: self.name.clone(),
                field: "duration",
                value: self.duration_value,
            });
        }
        Ok(())
    }
}

pub fn validate_breaks(configs: &[BreakConfig]) -> Result<(), ConfigError> {
    if configs.is_empty() {
        return Err(ConfigError::NoBreaks);
    }
    for (index, config) in configs.iter().enumerate() {
        config.validate()?;
        if configs[..index].iter().any(|other| other.name == config.name) {
            return Err(ConfigError::DuplicateName(config.name.clone()));
        }
    }
    Ok(())
}

pub fn default_breaks() -> Vec<BreakConfig> {
    vec![
        BreakConfig {
            name: "Micro Break".to_string(),
            interval_value: 25,
            interval_unit: TimeUnit::Min,
            duration_value: 5,
            duration_unit: TimeUnit::Sec,
            start_sound: SoundId::named("Ping"),
            end_sound: SoundId::named("Glass"),
            loop_end_sound: false,
            auto_dismiss: true,
        },
        BreakConfig {
            name: "Normal Break".to_string(),
            interval_value: 50,
            interval_unit: TimeUnit::Min,
            duration_value: 10,
            duration_unit: TimeUnit::Min,
            start_sound: SoundId::named("Glass"),
            end_sound: SoundId::named("Submarine"),
            loop_end_sound: true,
            auto_dismiss: false,
        },
    ]
}

/// A single edit to a break's configuration, as issued from the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    Interval { value: i64, unit: TimeUnit },
    Duration { value: i64, unit: TimeUnit },
    StartSound(SoundId),
    EndSound(SoundId),
    LoopEndSound(bool),
    AutoDismiss(bool),
    Rename(String),
}

impl ConfigChange {
    pub fn apply(&self, config: &mut BreakConfig) {
        match self {
            ConfigChange::Interval { value, unit } => {
                config.interval_value = *value;
                config.interval_unit = *unit;
            }
            ConfigChange::Duration { value, unit } => {
                config.duration_value = *value;
                config.duration_unit = *unit;
            }
            ConfigChange::StartSound(sound) => config.start_sound = sound.clone(),
            ConfigChange::EndSound(sound) => config.end_sound = sound.clone(),
            ConfigChange::LoopEndSound(enabled) => config.loop_end_sound = *enabled,
            ConfigChange::AutoDismiss(enabled) => config.auto_dismiss = *enabled,
            ConfigChange::Rename(name) => config.name = name.clone(),
        }
    }
}
