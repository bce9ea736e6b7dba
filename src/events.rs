use crate::app_error::AppErrorPayload;
use crate::break_queue::BreakEvent;
use crate::models::BreakConfig;
use crate::popup_controller::CloseReason;
use crate::scheduler::{SchedulerState, SchedulerStatus};
use serde::Serialize;

const STATE_CHANGED_EVENT: &str = "state-changed";
const TIMER_TICK_EVENT: &str = "timer-tick";
const BREAK_QUEUED_EVENT: &str = "break-queued";
const POPUP_SHOWN_EVENT: &str = "popup-shown";
const POPUP_TICK_EVENT: &str = "popup-tick";
const POPUP_AWAITING_DISMISSAL_EVENT: &str = "popup-awaiting-dismissal";
const POPUP_CLOSED_EVENT: &str = "popup-closed";
const SNOOZE_SCHEDULED_EVENT: &str = "snooze-scheduled";
const SNOOZE_DROPPED_EVENT: &str = "snooze-dropped";
const CONFIG_CHANGED_EVENT: &str = "config-changed";
const STATUS_EVENT: &str = "status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueSource {
    Timer,
    Test,
    Snooze,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SchedulerEvent {
    StateChanged {
        state: SchedulerState,
    },
    TimerTick {
        timer: String,
        remaining_seconds: i64,
    },
    BreakQueued {
        name: String,
        source: QueueSource,
    },
    PopupShown {
        event: BreakEvent,
    },
    PopupTick {
        remaining_seconds: i64,
        total_seconds: i64,
    },
    PopupAwaitingDismissal {
        name: String,
    },
    PopupClosed {
        name: String,
        reason: CloseReason,
        elapsed_seconds: i64,
    },
    SnoozeScheduled {
        name: String,
        due_at: String,
    },
    SnoozeDropped {
        name: String,
    },
    ConfigChanged {
        breaks: Vec<BreakConfig>,
    },
    Status(SchedulerStatus),
}

impl SchedulerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SchedulerEvent::StateChanged { .. } => STATE_CHANGED_EVENT,
            SchedulerEvent::TimerTick { .. } => TIMER_TICK_EVENT,
            SchedulerEvent::BreakQueued { .. } => BREAK_QUEUED_EVENT,
            SchedulerEvent::PopupShown { .. } => POPUP_SHOWN_EVENT,
            SchedulerEvent::PopupTick { .. } => POPUP_TICK_EVENT,
            SchedulerEvent::PopupAwaitingDismissal { .. } => POPUP_AWAITING_DISMISSAL_EVENT,
            SchedulerEvent::PopupClosed { .. } => POPUP_CLOSED_EVENT,
            SchedulerEvent::SnoozeScheduled { .. } => SNOOZE_SCHEDULED_EVENT,
            SchedulerEvent::SnoozeDropped { .. } => SNOOZE_DROPPED_EVENT,
            SchedulerEvent::ConfigChanged { .. } => CONFIG_CHANGED_EVENT,
            SchedulerEvent::Status(_) => STATUS_EVENT,
        }
    }
}

/// Presentation collaborator. Every callback defaults to doing nothing.
pub trait Presenter {
    fn on_state_changed(&mut self, _state: SchedulerState) {}
    fn on_tick(&mut self, _timer: &str, _remaining_seconds: i64) {}
    fn on_break_queued(&mut self, _name: &str, _source: QueueSource) {}
    fn on_popup_shown(&mut self, _event: &BreakEvent) {}
    fn on_popup_tick(&mut self, _remaining_seconds: i64, _total_seconds: i64) {}
    fn on_popup_awaiting_dismissal(&mut self, _name: &str) {}
    fn on_popup_closed(&mut self, _name: &str, _reason: CloseReason, _elapsed_seconds: i64) {}
    fn on_snooze_scheduled(&mut self, _name: &str, _due_at: &str) {}
    fn on_snooze_dropped(&mut self, _name: &str) {}
    fn on_config_changed(&mut self, _breaks: &[BreakConfig]) {}
    fn on_status(&mut self, _status: &SchedulerStatus) {}
    fn on_error(&mut self, _error: &AppErrorPayload) {}
    fn on_help(&mut self) {}
}

pub fn dispatch(presenter: &mut dyn Presenter, event: &SchedulerEvent) {
    match event {
        SchedulerEvent::StateChanged { state } => presenter.on_state_changed(*state),
        SchedulerEvent::TimerTick {
            timer,
            remaining_seconds,
        } => presenter.on_tick(timer, *remaining_seconds),
        SchedulerEvent::BreakQueued { name, source } => presenter.on_break_queued(name, *source),
        SchedulerEvent::PopupShown { event } => presenter.on_popup_shown(event),
        SchedulerEvent::PopupTick {
            remaining_seconds,
            total_seconds,
        } => presenter.on_popup_tick(*remaining_seconds, *total_seconds),
        SchedulerEvent::PopupAwaitingDismissal { name } => {
            presenter.on_popup_awaiting_dismissal(name)
        }
        SchedulerEvent::PopupClosed {
            name,
            reason,
            elapsed_seconds,
        } => presenter.on_popup_closed(name, *reason, *elapsed_seconds),
        SchedulerEvent::SnoozeScheduled { name, due_at } => {
            presenter.on_snooze_scheduled(name, due_at)
        }
        SchedulerEvent::SnoozeDropped { name } => presenter.on_snooze_dropped(name),
        SchedulerEvent::ConfigChanged { breaks } => presenter.on_config_changed(breaks),
        SchedulerEvent::Status(status) => presenter.on_status(status),
    }
}

#[cfg(test)]
mod tests {
    use super::{dispatch, Presenter, QueueSource, SchedulerEvent};
    use crate::popup_controller::CloseReason;

    #[derive(Default)]
    struct Collect {
        calls: Vec<String>,
    }

    impl Presenter for Collect {
        fn on_tick(&mut self, timer: &str, remaining_seconds: i64) {
            self.calls.push(format!("tick {timer} {remaining_seconds}"));
        }

        fn on_popup_closed(&mut self, name: &str, reason: CloseReason, elapsed_seconds: i64) {
            self.calls
                .push(format!("closed {name} {reason:?} {elapsed_seconds}"));
        }
    }

    #[test]
    fn dispatch_routes_to_matching_callback() {
        let mut presenter = Collect::default();
        dispatch(
            &mut presenter,
            &SchedulerEvent::TimerTick {
                timer: "Micro Break".to_string(),
                remaining_seconds: 12,
            },
        );
        dispatch(
            &mut presenter,
            &SchedulerEvent::BreakQueued {
                name: "Micro Break".to_string(),
                source: QueueSource::Timer,
            },
        );
        dispatch(
            &mut presenter,
            &SchedulerEvent::PopupClosed {
                name: "Micro Break".to_string(),
                reason: CloseReason::Completed,
                elapsed_seconds: 5,
            },
        );
        assert_eq!(
            presenter.calls,
            vec!["tick Micro Break 12", "closed Micro Break Completed 5"]
        );
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = SchedulerEvent::PopupTick {
            remaining_seconds: 3,
            total_seconds: 10,
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "popupTick");
        assert_eq!(json["remainingSeconds"], 3);
        assert_eq!(event.name(), "popup-tick");
    }
}
