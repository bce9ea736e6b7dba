use crate::audio_manager::{LoopHandle, SoundPlayer};
use crate::break_queue::BreakEvent;
use crate::clock::elapsed_seconds;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

pub const SNOOZE_MINUTES: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PopupError {
    #[error("no break popup is active")]
    NoActivePopup,
    #[error("snooze is unavailable for breaks that dismiss themselves")]
    SnoozeUnavailable,
    #[error("a break popup is already showing")]
    AlreadyShowing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PopupPhase {
    Idle,
    Showing,
    AwaitingDismissal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CloseReason {
    Completed,
    Dismissed,
    Snoozed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedPopup {
    pub event: BreakEvent,
    pub reason: CloseReason,
    pub elapsed_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupTick {
    Idle,
    Counting { remaining: i64, total: i64 },
    ReachedEnd,
    Waiting,
    Closed(ClosedPopup),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupView {
    pub name: String,
    pub phase: PopupPhase,
    pub remaining_seconds: i64,
    pub total_seconds: i64,
    pub can_snooze: bool,
}

#[derive(Debug)]
struct ActivePopup {
    event: BreakEvent,
    remaining: i64,
    total: i64,
    started_at: DateTime<Utc>,
    awaiting_dismissal: bool,
    end_loop: Option<LoopHandle>,
}

/// Lifecycle of the single visible break notification.
#[derive(Debug, Default)]
pub struct PopupController {
    active: Option<ActivePopup>,
}

impl PopupController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn phase(&self) -> PopupPhase {
        match &self.active {
            None => PopupPhase::Idle,
            Some(popup) if popup.awaiting_dismissal => PopupPhase::AwaitingDismissal,
            Some(_) => PopupPhase::Showing,
        }
    }

    pub fn current_event(&self) -> Option<&BreakEvent> {
        self.active.as_ref().map(|popup| &popup.event)
    }

    pub fn view(&self) -> Option<PopupView> {
        let phase = self.phase();
        self.active.as_ref().map(|popup| PopupView {
            name: popup.event.name.clone(),
            phase,
            remaining_seconds: popup.remaining,
            total_seconds: popup.total,
            can_snooze: !popup.event.auto_dismiss,
        })
    }

    pub fn show(
        &mut self,
        event: BreakEvent,
        now: DateTime<Utc>,
        sound: &mut dyn SoundPlayer,
    ) -> Result<(), PopupError> {
        if self.active.is_some() {
            return Err(PopupError::AlreadyShowing);
        }
        sound.play_sound(&event.start_sound);
        info!(
            name = %event.name,
            duration_seconds = event.duration_seconds,
            "showing break"
        );
        self.active = Some(ActivePopup {
            remaining: event.duration_seconds,
            total: event.duration_seconds,
            started_at: now,
            awaiting_dismissal: false,
            end_loop: None,
            event,
        });
        Ok(())
    }

    /// One second of popup countdown.
    pub fn tick(&mut self, now: DateTime<Utc>, sound: &mut dyn SoundPlayer) -> PopupTick {
        let Some(popup) = self.active.as_mut() else {
            return PopupTick::Idle;
        };
        if popup.awaiting_dismissal {
            return PopupTick::Waiting;
        }
        popup.remaining = popup.remaining.saturating_sub(1);
        if popup.remaining > 0 {
            return PopupTick::Counting {
                remaining: popup.remaining,
                total: popup.total,
            };
        }

        if popup.event.auto_dismiss {
            // The popup closes on this same pulse, so a loop would be cut off
            // immediately: the end sound is a single cue either way.
            sound.play_sound(&popup.event.end_sound);
            return match self.close(now, CloseReason::Completed, sound) {
                Some(closed) => PopupTick::Closed(closed),
                None => PopupTick::Idle,
            };
        }

        popup.end_loop = if popup.event.loop_end_sound {
            sound.start_looping_sound(&popup.event.end_sound)
        } else {
            sound.play_sound(&popup.event.end_sound);
            None
        };
        popup.awaiting_dismissal = true;
        info!(name = %popup.event.name, "break finished, waiting for dismissal");
        PopupTick::ReachedEnd
    }

    /// Done button or window close. Accepted at any point while a popup is up.
    pub fn dismiss(
        &mut self,
        now: DateTime<Utc>,
        sound: &mut dyn SoundPlayer,
    ) -> Result<ClosedPopup, PopupError> {
        self.close(now, CloseReason::Dismissed, sound)
            .ok_or(PopupError::NoActivePopup)
    }

    pub fn snooze(
        &mut self,
        now: DateTime<Utc>,
        sound: &mut dyn SoundPlayer,
    ) -> Result<ClosedPopup, PopupError> {
        let popup = self.active.as_ref().ok_or(PopupError::NoActivePopup)?;
        if popup.event.auto_dismiss {
            return Err(PopupError::SnoozeUnavailable);
        }
        self.close(now, CloseReason::Snoozed, sound)
            .ok_or(PopupError::NoActivePopup)
    }

    /// Tears the popup down without reporting elapsed time.
    pub fn cancel(&mut self, sound: &mut dyn SoundPlayer) -> Option<BreakEvent> {
        let popup = self.active.take()?;
        if let Some(handle) = &popup.end_loop {
            sound.stop_looping_sound(handle);
        }
        info!(name = %popup.event.name, "break popup cancelled");
        Some(popup.event)
    }

    fn close(
        &mut self,
        now: DateTime<Utc>,
        reason: CloseReason,
        sound: &mut dyn SoundPlayer,
    ) -> Option<ClosedPopup> {
        let popup = self.active.take()?;
        if let Some(handle) = &popup.end_loop {
            sound.stop_looping_sound(handle);
        }
        let elapsed_seconds = elapsed_seconds(popup.started_at, now);
        info!(
            name = %popup.event.name,
            ?reason,
            elapsed_seconds,
            "break popup closed"
        );
        Some(ClosedPopup {
            event: popup.event,
            reason,
            elapsed_seconds,
        })
    }
}
