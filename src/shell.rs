use crate::app_error::{AppError, AppErrorPayload};
use crate::break_queue::BreakEvent;
use crate::commands::HELP_TEXT;
use crate::data_manager::PreferencesStore;
use crate::events::{Presenter, QueueSource};
use crate::models::BreakConfig;
use crate::popup_controller::CloseReason;
use crate::scheduler::{SchedulerState, SchedulerStatus};
use crate::status::{format_clock, format_countdown, format_status};
use chrono::{DateTime, Local};
use std::fmt;
use std::io::Write;
use tracing::{info, warn};

/// Renders scheduler events as plain lines and persists configuration changes.
pub struct TerminalPresenter<W: Write> {
    out: W,
    store: Option<PreferencesStore>,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W, store: Option<PreferencesStore>) -> Self {
        Self { out, store }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: impl fmt::Display) {
        let result = writeln!(self.out, "{text}").and_then(|()| self.out.flush());
        if let Err(err) = result {
            warn!(error = %err, "could not write to terminal");
        }
    }
}

impl<W: Write> fmt::Debug for TerminalPresenter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalPresenter")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

fn local_time(rfc3339: &str) -> String {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|_| rfc3339.to_string())
}

fn popup_hint(auto_dismiss: bool) -> &'static str {
    if auto_dismiss {
        "(closes by itself, \"done\" to close now)"
    } else {
        "(\"done\" to dismiss, \"snooze\" for 5 more minutes)"
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn on_state_changed(&mut self, state: SchedulerState) {
        let text = match state {
            SchedulerState::Running => "Breaks running",
            SchedulerState::Paused => "Breaks paused",
            SchedulerState::Stopped => "Breaks stopped",
        };
        self.line(text);
    }

    fn on_break_queued(&mut self, name: &str, source: QueueSource) {
        if source == QueueSource::Snooze {
            self.line(format_args!("{name} is back from snooze"));
        }
    }

    fn on_popup_shown(&mut self, event: &BreakEvent) {
        self.line(format_args!(
            "== {} == {} {}",
            event.name,
            format_countdown(event.duration_seconds),
            popup_hint(event.auto_dismiss)
        ));
    }

    fn on_popup_tick(&mut self, remaining_seconds: i64, _total_seconds: i64) {
        // Every second would flood the terminal.
        if remaining_seconds > 0 && (remaining_seconds <= 5 || remaining_seconds % 60 == 0) {
            self.line(format_args!("   {}", format_countdown(remaining_seconds)));
        }
    }

    fn on_popup_awaiting_dismissal(&mut self, name: &str) {
        self.line(format_args!("{name}: Done! {}", popup_hint(false)));
    }

    fn on_popup_closed(&mut self, name: &str, reason: CloseReason, elapsed_seconds: i64) {
        let verb = match reason {
            CloseReason::Completed => "finished",
            CloseReason::Dismissed => "dismissed",
            CloseReason::Snoozed => "snoozed",
            CloseReason::Cancelled => "cancelled",
        };
        self.line(format_args!(
            "{name} {verb} after {}",
            format_clock(elapsed_seconds)
        ));
    }

    fn on_snooze_scheduled(&mut self, name: &str, due_at: &str) {
        self.line(format_args!("{name} will be back at {}", local_time(due_at)));
    }

    fn on_snooze_dropped(&mut self, name: &str) {
        self.line(format_args!("{name} not snoozed, breaks are not running"));
    }

    fn on_config_changed(&mut self, breaks: &[BreakConfig]) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        match store.save_breaks(breaks) {
            Ok(()) => {
                info!(path = %store.path().display(), "preferences saved");
                self.line("Preferences saved");
            }
            Err(err) => {
                let error = AppError::from(err);
                warn!(error = %error, "could not save preferences");
                self.on_error(&error.payload());
            }
        }
    }

    fn on_status(&mut self, status: &SchedulerStatus) {
        self.line(format_status(status));
    }

    fn on_error(&mut self, error: &AppErrorPayload) {
        match &error.detail {
            Some(detail) => self.line(format_args!("Error: {} ({detail})", error.message)),
            None => self.line(format_args!("Error: {}", error.message)),
        }
    }

    fn on_help(&mut self) {
        self.line(HELP_TEXT);
    }
}

#[cfg(test)]
mod tests {
    use super::TerminalPresenter;
    use crate::app_error::AppError;
    use crate::break_queue::BreakEvent;
    use crate::data_manager::PreferencesStore;
    use crate::events::{Presenter, QueueSource};
    use crate::models::default_breaks;
    use crate::popup_controller::CloseReason;
    use crate::scheduler::{SchedulerError, SchedulerState};
    use pretty_assertions::assert_eq;

    fn output(presenter: TerminalPresenter<Vec<u8>>) -> String {
        String::from_utf8(presenter.into_inner()).expect("utf8")
    }

    #[test]
    fn renders_popup_lifecycle() {
        let mut presenter = TerminalPresenter::new(Vec::new(), None);
        let event = BreakEvent::from_config(&default_breaks()[0]);

        presenter.on_state_changed(SchedulerState::Running);
        presenter.on_break_queued("Micro Break", QueueSource::Timer);
        presenter.on_popup_shown(&event);
        presenter.on_popup_tick(4, 5);
        presenter.on_popup_tick(0, 5);
        presenter.on_popup_closed("Micro Break", CloseReason::Completed, 5);

        assert_eq!(
            output(presenter),
            "Breaks running\n\
             == Micro Break == 5s (closes by itself, \"done\" to close now)\n   \
             4s\n\
             Micro Break finished after 00:05\n"
        );
    }

    #[test]
    fn awaiting_dismissal_says_done() {
        let mut presenter = TerminalPresenter::new(Vec::new(), None);
        presenter.on_popup_awaiting_dismissal("Normal Break");
        assert!(output(presenter).starts_with("Normal Break: Done!"));
    }

    #[test]
    fn errors_include_detail() {
        let mut presenter = TerminalPresenter::new(Vec::new(), None);
        let error = AppError::from(SchedulerError::NotRunning);
        presenter.on_error(&error.payload());
        assert_eq!(
            output(presenter),
            "Error: Breaks are not running (scheduler not running)\n"
        );
    }

    #[test]
    fn config_changes_are_saved() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = PreferencesStore::new(dir.path().join("prefs.json"));
        let mut presenter = TerminalPresenter::new(Vec::new(), Some(store.clone()));

        let mut breaks = default_breaks();
        breaks[1].loop_end_sound = false;
        presenter.on_config_changed(&breaks);

        assert_eq!(store.load().expect("load").breaks, breaks);
        assert_eq!(output(presenter), "Preferences saved\n");
    }

    #[test]
    fn snooze_with_unparseable_time_prints_it_raw() {
        let mut presenter = TerminalPresenter::new(Vec::new(), None);
        presenter.on_snooze_scheduled("Normal Break", "later");
        assert_eq!(output(presenter), "Normal Break will be back at later\n");
    }
}
