use crate::commands::CommandParseError;
use crate::data_manager::DataError;
use crate::models::ConfigError;
use crate::popup_controller::PopupError;
use crate::scheduler::SchedulerError;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppErrorKind {
    System,
    Data,
    Scheduler,
    Config,
    Command,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppErrorPayload {
    pub kind: AppErrorKind,
    pub message: String,
    pub detail: Option<String>,
    pub recoverable: bool,
}

#[derive(Debug, Clone)]
pub struct AppError {
    kind: AppErrorKind,
    message: String,
    detail: Option<String>,
    recoverable: bool,
}

impl AppError {
    pub fn new(kind: AppErrorKind, message: impl Into<String>, recoverable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
            recoverable,
        }
    }

    pub fn with_detail(
        kind: AppErrorKind,
        message: impl Into<String>,
        detail: impl Into<String>,
        recoverable: bool,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: Some(detail.into()),
            recoverable,
        }
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::System, message, true)
    }

    pub fn fatal(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::with_detail(AppErrorKind::System, message, detail, false)
    }

    pub fn kind(&self) -> AppErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }

    pub fn payload(&self) -> AppErrorPayload {
        AppErrorPayload {
            kind: self.kind,
            message: self.message.clone(),
            detail: self.detail.clone(),
            recoverable: self.recoverable,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({detail})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for AppError {}

impl From<SchedulerError> for AppError {
    fn from(error: SchedulerError) -> Self {
        let detail = error.to_string();
        let message = match error {
            SchedulerError::AlreadyRunning => "Breaks are already running",
            SchedulerError::NotRunning => "Breaks are not running",
            SchedulerError::AlreadyPaused => "Breaks are already paused",
            SchedulerError::NotPaused => "Breaks are not paused",
            SchedulerError::UnknownBreak(ref name) => {
                return Self::with_detail(
                    AppErrorKind::Scheduler,
                    format!("No break called \"{name}\""),
                    detail,
                    true,
                );
            }
            SchedulerError::Popup(popup) => return popup.into(),
            SchedulerError::Config(config) => return config.into(),
        };
        Self::with_detail(AppErrorKind::Scheduler, message, detail, true)
    }
}

impl From<PopupError> for AppError {
    fn from(error: PopupError) -> Self {
        let detail = error.to_string();
        let message = match error {
            PopupError::NoActivePopup => "There is no break on screen",
            PopupError::SnoozeUnavailable => "This break cannot be snoozed",
            PopupError::AlreadyShowing => "A break is already on screen",
        };
        Self::with_detail(AppErrorKind::Scheduler, message, detail, true)
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let detail = error.to_string();
        let message = match error {
            ConfigError::EmptyName => "Give the break a name".to_string(),
            ConfigError::NonPositive { ref field, .. } => {
                format!("The {field} must be at least 1")
            }
            ConfigError::UnknownUnit(ref unit) => {
                format!("Unknown time unit \"{unit}\" (use sec, min or hour)")
            }
            ConfigError::DuplicateName(ref name) => {
                format!("Another break is already called \"{name}\"")
            }
            ConfigError::NoBreaks => "At least one break is required".to_string(),
        };
        Self::with_detail(AppErrorKind::Config, message, detail, true)
    }
}

impl From<DataError> for AppError {
    fn from(error: DataError) -> Self {
        let detail = error.to_string();
        let message = match error {
            DataError::Io(_) => "Could not read or write preferences",
            DataError::Serde(_) => "Preferences file is not valid",
            DataError::NoConfigDir => "No place to store preferences",
        };
        Self::with_detail(AppErrorKind::Data, message, detail, true)
    }
}

impl From<CommandParseError> for AppError {
    fn from(error: CommandParseError) -> Self {
        Self::with_detail(
            AppErrorKind::Command,
            "Command not understood (type \"help\")",
            error.to_string(),
            true,
        )
    }
}
