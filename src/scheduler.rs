use crate::audio_manager::SoundPlayer;
use crate::break_queue::{BreakEvent, BreakQueue};
use crate::break_timer::BreakTimer;
use crate::clock::{Clock, SystemClock};
use crate::events::{QueueSource, SchedulerEvent};
use crate::models::{validate_breaks, BreakConfig, ConfigError, SoundId};
use crate::popup_controller::{
    ClosedPopup, CloseReason, PopupController, PopupError, PopupPhase, PopupTick, PopupView,
    SNOOZE_MINUTES,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("scheduler already running")]
    AlreadyRunning,
    #[error("scheduler not running")]
    NotRunning,
    #[error("scheduler already paused")]
    AlreadyPaused,
    #[error("scheduler not paused")]
    NotPaused,
    #[error("unknown break: {0}")]
    UnknownBreak(String),
    #[error(transparent)]
    Popup(#[from] PopupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    #[default]
    Stopped,
    Running,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerStatus {
    pub name: String,
    pub remaining_seconds: i64,
    pub interval_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextBreak {
    pub name: String,
    pub remaining_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub timers: Vec<TimerStatus>,
    pub queued: usize,
    pub pending_snoozes: usize,
    pub popup: Option<PopupView>,
    pub next_break: Option<NextBreak>,
    pub muted: bool,
}

#[derive(Debug, Clone)]
struct PendingSnooze {
    due_at: DateTime<Utc>,
    event: BreakEvent,
}

/// Owns every break timer, the backlog of fired breaks and the popup. All
/// mutation happens through `&mut self` on one loop, driven by `pulse` and by
/// user commands.
#[derive(Debug)]
pub struct Scheduler {
    timers: Vec<BreakTimer>,
    queue: BreakQueue,
    popup: PopupController,
    state: SchedulerState,
    pending_snoozes: Vec<PendingSnooze>,
    clock: Arc<dyn Clock>,
    sound: Box<dyn SoundPlayer>,
    events: Vec<SchedulerEvent>,
}

impl Scheduler {
    pub fn new(
        configs: Vec<BreakConfig>,
        sound: Box<dyn SoundPlayer>,
    ) -> Result<Self, ConfigError> {
        validate_breaks(&configs)?;
        Ok(Self {
            timers: configs.into_iter().map(BreakTimer::new).collect(),
            queue: BreakQueue::new(),
            popup: PopupController::new(),
            state: SchedulerState::Stopped,
            pending_snoozes: Vec::new(),
            clock: Arc::new(SystemClock),
            sound,
            events: Vec::new(),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    pub fn timers(&self) -> &[BreakTimer] {
        &self.timers
    }

    pub fn timer(&self, name: &str) -> Option<&BreakTimer> {
        self.timers.iter().find(|timer| timer.name() == name)
    }

    pub fn queue(&self) -> &BreakQueue {
        &self.queue
    }

    pub fn popup_phase(&self) -> PopupPhase {
        self.popup.phase()
    }

    pub fn popup_view(&self) -> Option<PopupView> {
        self.popup.view()
    }

    pub fn pending_snooze_count(&self) -> usize {
        self.pending_snoozes.len()
    }

    pub fn configs(&self) -> Vec<BreakConfig> {
        self.timers.iter().map(|timer| timer.config().clone()).collect()
    }

    pub fn take_events(&mut self) -> Vec<SchedulerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.state == SchedulerState::Running {
            return Err(SchedulerError::AlreadyRunning);
        }
        for timer in &mut self.timers {
            timer.reset();
        }
        self.set_state(SchedulerState::Running);
        self.emit_timer_ticks();
        info!(breaks = self.timers.len(), "break timers started");
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), SchedulerError> {
        match self.state {
            SchedulerState::Running => {
                self.set_state(SchedulerState::Paused);
                info!("break timers paused");
                Ok(())
            }
            SchedulerState::Paused => Err(SchedulerError::AlreadyPaused),
            SchedulerState::Stopped => Err(SchedulerError::NotRunning),
        }
    }

    pub fn resume(&mut self) -> Result<(), SchedulerError> {
        match self.state {
            SchedulerState::Paused => {
                self.set_state(SchedulerState::Running);
                info!("break timers resumed");
                Ok(())
            }
            SchedulerState::Running => Err(SchedulerError::NotPaused),
            SchedulerState::Stopped => Err(SchedulerError::NotRunning),
        }
    }

    pub fn toggle_pause(&mut self) -> Result<(), SchedulerError> {
        match self.state {
            SchedulerState::Paused => self.resume(),
            _ => self.pause(),
        }
    }

    /// Master cancellation. Safe to call in any state, any number of times.
    pub fn stop(&mut self) {
        if let Some(event) = self.popup.cancel(self.sound.as_mut()) {
            self.events.push(SchedulerEvent::PopupClosed {
                name: event.name,
                reason: CloseReason::Cancelled,
                elapsed_seconds: 0,
            });
        }
        self.queue.clear();
        self.pending_snoozes.clear();
        for timer in &mut self.timers {
            timer.reset();
        }
        if self.state != SchedulerState::Stopped {
            self.set_state(SchedulerState::Stopped);
            info!("break timers stopped");
        }
    }

    /// One cooperative step, run once per second. Background timers only count
    /// down while running and while no popup is up.
    pub fn pulse(&mut self) {
        let now = self.clock.now();
        if self.popup.is_active() {
            self.advance_popup(now);
        } else if self.state == SchedulerState::Running {
            self.tick_timers();
        }
        self.deliver_due_snoozes(now);
        self.show_next(now);
    }

    /// Queues a break from the timer's current settings, whatever the state.
    pub fn test_break(&mut self, name: &str) -> Result<(), SchedulerError> {
        let event = self
            .timer(name)
            .map(BreakTimer::snapshot)
            .ok_or_else(|| SchedulerError::UnknownBreak(name.to_string()))?;
        self.enqueue(event, QueueSource::Test);
        let now = self.clock.now();
        self.show_next(now);
        Ok(())
    }

    pub fn dismiss(&mut self) -> Result<(), SchedulerError> {
        let now = self.clock.now();
        let closed = self.popup.dismiss(now, self.sound.as_mut())?;
        self.finish_popup(closed, now);
        Ok(())
    }

    /// Closing the popup window counts as dismissing it.
    pub fn close_window(&mut self) -> Result<(), SchedulerError> {
        self.dismiss()
    }

    pub fn snooze(&mut self) -> Result<(), SchedulerError> {
        let now = self.clock.now();
        let closed = self.popup.snooze(now, self.sound.as_mut())?;
        if self.state == SchedulerState::Running {
            let due_at = now + ChronoDuration::minutes(SNOOZE_MINUTES);
            info!(name = %closed.event.name, %due_at, "break snoozed");
            self.events.push(SchedulerEvent::SnoozeScheduled {
                name: closed.event.name.clone(),
                due_at: due_at.to_rfc3339(),
            });
            self.pending_snoozes.push(PendingSnooze {
                due_at,
                event: closed.event.restored(),
            });
        } else {
            self.drop_snooze(&closed.event.name);
        }
        self.finish_popup(closed, now);
        Ok(())
    }

    pub fn update_break(&mut self, name: &str, config: BreakConfig) -> Result<(), SchedulerError> {
        config.validate()?;
        let index = self
            .timers
            .iter()
            .position(|timer| timer.name() == name)
            .ok_or_else(|| SchedulerError::UnknownBreak(name.to_string()))?;
        let clashes = self
            .timers
            .iter()
            .enumerate()
            .any(|(other, timer)| other != index && timer.name() == config.name);
        if clashes {
            return Err(ConfigError::DuplicateName(config.name).into());
        }
        self.timers[index].reconfigure(config);
        info!(name, "break configuration updated");
        self.events.push(SchedulerEvent::ConfigChanged {
            breaks: self.configs(),
        });
        Ok(())
    }

    /// The break due soonest, while the timers are counting.
    pub fn next_break(&self) -> Option<NextBreak> {
        if self.state != SchedulerState::Running {
            return None;
        }
        self.timers
            .iter()
            .min_by_key(|timer| timer.remaining())
            .map(|timer| NextBreak {
                name: timer.name().to_string(),
                remaining_seconds: timer.remaining(),
            })
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            state: self.state,
            timers: self
                .timers
                .iter()
                .map(|timer| TimerStatus {
                    name: timer.name().to_string(),
                    remaining_seconds: timer.remaining(),
                    interval_seconds: timer.interval_seconds(),
                })
                .collect(),
            queued: self.queue.len(),
            pending_snoozes: self.pending_snoozes.len(),
            popup: self.popup.view(),
            next_break: self.next_break(),
            muted: self.sound.is_muted(),
        }
    }

    pub fn report_status(&mut self) {
        let status = self.status();
        self.events.push(SchedulerEvent::Status(status));
    }

    pub fn preview_sound(&mut self, sound: &SoundId) {
        self.sound.play_sound(sound);
    }

    pub fn toggle_mute(&mut self) -> bool {
        let muted = !self.sound.is_muted();
        self.sound.set_global_mute(muted);
        info!(muted, "global mute toggled");
        muted
    }

    fn set_state(&mut self, state: SchedulerState) {
        self.state = state;
        self.events.push(SchedulerEvent::StateChanged { state });
    }

    fn tick_timers(&mut self) {
        let mut fired = Vec::new();
        for timer in &mut self.timers {
            if timer.tick() {
                fired.push(timer.snapshot());
                timer.reset();
            }
        }
        self.emit_timer_ticks();
        for event in fired {
            info!(name = %event.name, "break fired");
            self.enqueue(event, QueueSource::Timer);
        }
    }

    fn emit_timer_ticks(&mut self) {
        for timer in &self.timers {
            self.events.push(SchedulerEvent::TimerTick {
                timer: timer.name().to_string(),
                remaining_seconds: timer.remaining(),
            });
        }
    }

    fn enqueue(&mut self, event: BreakEvent, source: QueueSource) {
        self.events.push(SchedulerEvent::BreakQueued {
            name: event.name.clone(),
            source,
        });
        self.queue.enqueue(event);
    }

    fn advance_popup(&mut self, now: DateTime<Utc>) {
        match self.popup.tick(now, self.sound.as_mut()) {
            PopupTick::Counting { remaining, total } => {
                self.events.push(SchedulerEvent::PopupTick {
                    remaining_seconds: remaining,
                    total_seconds: total,
                });
            }
            PopupTick::ReachedEnd => {
                self.events.push(SchedulerEvent::PopupTick {
                    remaining_seconds: 0,
                    total_seconds: self.popup.view().map_or(0, |view| view.total_seconds),
                });
                if let Some(event) = self.popup.current_event() {
                    self.events.push(SchedulerEvent::PopupAwaitingDismissal {
                        name: event.name.clone(),
                    });
                }
            }
            PopupTick::Closed(closed) => self.finish_popup(closed, now),
            PopupTick::Waiting | PopupTick::Idle => {}
        }
    }

    fn finish_popup(&mut self, closed: ClosedPopup, now: DateTime<Utc>) {
        self.queue.reconcile(closed.elapsed_seconds);
        self.events.push(SchedulerEvent::PopupClosed {
            name: closed.event.name,
            reason: closed.reason,
            elapsed_seconds: closed.elapsed_seconds,
        });
        self.show_next(now);
    }

    fn show_next(&mut self, now: DateTime<Utc>) {
        if self.popup.is_active() {
            return;
        }
        let Some(event) = self.queue.dequeue_next() else {
            return;
        };
        let shown = event.clone();
        match self.popup.show(event, now, self.sound.as_mut()) {
            Ok(()) => self.events.push(SchedulerEvent::PopupShown { event: shown }),
            Err(err) => warn!(name = %shown.name, error = %err, "could not show break"),
        }
    }

    fn deliver_due_snoozes(&mut self, now: DateTime<Utc>) {
        if self.pending_snoozes.is_empty() {
            return;
        }
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_snoozes)
            .into_iter()
            .partition(|pending| pending.due_at <= now);
        self.pending_snoozes = waiting;
        for pending in due {
            if self.state == SchedulerState::Running {
                debug!(name = %pending.event.name, "snoozed break is due");
                self.enqueue(pending.event, QueueSource::Snooze);
            } else {
                self.drop_snooze(&pending.event.name);
            }
        }
    }

    fn drop_snooze(&mut self, name: &str) {
        info!(name, state = ?self.state, "snooze dropped, timers are not running");
        self.events.push(SchedulerEvent::SnoozeDropped {
            name: name.to_string(),
        });
    }
}
