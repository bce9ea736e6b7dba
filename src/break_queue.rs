use crate::models::{BreakConfig, SoundId};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::debug;

/// Snapshot of a break taken when it fired. Never refers back to its timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEvent {
    pub name: String,
    pub duration_seconds: i64,
    pub original_duration_seconds: i64,
    pub auto_dismiss: bool,
    pub start_sound: SoundId,
    pub end_sound: SoundId,
    pub loop_end_sound: bool,
}

impl BreakEvent {
    pub fn from_config(config: &BreakConfig) -> Self {
        let duration_seconds = config.duration_seconds();
        Self {
            name: config.name.clone(),
            duration_seconds,
            original_duration_seconds: duration_seconds,
            auto_dismiss: config.auto_dismiss,
            start_sound: config.start_sound.clone(),
            end_sound: config.end_sound.clone(),
            loop_end_sound: config.loop_end_sound,
        }
    }

    /// The same break with its fire-time duration, as used when re-queuing a snooze.
    pub fn restored(&self) -> Self {
        Self {
            duration_seconds: self.original_duration_seconds,
            ..self.clone()
        }
    }

    pub fn is_spent(&self) -> bool {
        self.duration_seconds <= 0
    }
}

#[derive(Debug, Default)]
pub struct BreakQueue {
    events: VecDeque<BreakEvent>,
}

impl BreakQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, event: BreakEvent) {
        self.events.push_back(event);
    }

    /// Pops events until one still has time left. Spent events are dropped silently.
    pub fn dequeue_next(&mut self) -> Option<BreakEvent> {
        while let Some(event) = self.events.pop_front() {
            if event.is_spent() {
                debug!(
                    name = %event.name,
                    duration_seconds = event.duration_seconds,
                    "discarding break already covered by an earlier one"
                );
                continue;
            }
            return Some(event);
        }
        None
    }

    /// Credits every waiting break with time the user already spent on a break.
    pub fn reconcile(&mut self, elapsed_seconds: i64) {
        if elapsed_seconds <= 0 {
            return;
        }
        for event in &mut self.events {
            event.duration_seconds = event.duration_seconds.saturating_sub(elapsed_seconds);
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn front(&self) -> Option<&BreakEvent> {
        self.events.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BreakEvent> {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{BreakEvent, BreakQueue};
    use crate::models::SoundId;

    fn event(name: &str, duration_seconds: i64) -> BreakEvent {
        BreakEvent {
            name: name.to_string(),
            duration_seconds,
            original_duration_seconds: duration_seconds,
            auto_dismiss: true,
            start_sound: SoundId::None,
            end_sound: SoundId::None,
            loop_end_sound: false,
        }
    }

    #[test]
    fn dequeue_preserves_fire_order() {
        let mut queue = BreakQueue::new();
        queue.enqueue(event("first", 10));
        queue.enqueue(event("second", 10));

        assert_eq!(queue.dequeue_next().map(|e| e.name), Some("first".to_string()));
        assert_eq!(queue.dequeue_next().map(|e| e.name), Some("second".to_string()));
        assert_eq!(queue.dequeue_next(), None);
    }

    #[test]
    fn reconcile_can_consume_a_queued_break() {
        let mut queue = BreakQueue::new();
        queue.enqueue(event("short", 30));
        queue.reconcile(45);

        assert_eq!(queue.front().map(|e| e.duration_seconds), Some(-15));
        assert_eq!(queue.dequeue_next(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn dequeue_skips_spent_events_and_returns_next_live_one() {
        let mut queue = BreakQueue::new();
        queue.enqueue(event("short", 20));
        queue.enqueue(event("long", 600));
        queue.reconcile(20);

        let next = queue.dequeue_next().expect("long break survives");
        assert_eq!(next.name, "long");
        assert_eq!(next.duration_seconds, 580);
        assert_eq!(next.original_duration_seconds, 600);
    }

    #[test]
    fn restored_event_uses_original_duration() {
        let mut reconciled = event("normal", 600);
        reconciled.duration_seconds = 120;
        assert_eq!(reconciled.restored().duration_seconds, 600);
    }

    #[test]
    fn zero_elapsed_leaves_durations_untouched() {
        let mut queue = BreakQueue::new();
        queue.enqueue(event("micro", 5));
        queue.reconcile(0);
        assert_eq!(queue.front().map(|e| e.duration_seconds), Some(5));
    }
}
