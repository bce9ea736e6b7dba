use crate::popup_controller::{PopupPhase, PopupView};
use crate::scheduler::{NextBreak, SchedulerState, SchedulerStatus};

const MAX_NAME_CHARS: usize = 24;

/// `MM:SS`, with minutes growing past two digits for long intervals.
pub fn format_clock(total_seconds: i64) -> String {
    let total = total_seconds.max(0);
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Popup countdown: plain seconds under a minute.
pub fn format_countdown(total_seconds: i64) -> String {
    let total = total_seconds.max(0);
    if total < 60 {
        format!("{total}s")
    } else {
        format_clock(total)
    }
}

pub fn format_popup(view: &PopupView) -> String {
    let name = truncate_label(&view.name, MAX_NAME_CHARS);
    match view.phase {
        PopupPhase::Idle => String::new(),
        PopupPhase::Showing => {
            format!("{name}: {}", format_countdown(view.remaining_seconds))
        }
        PopupPhase::AwaitingDismissal => format!("{name}: Done!"),
    }
}

pub fn format_next_break(next: Option<&NextBreak>) -> String {
    match next {
        Some(next) => format!(
            "Next: {} in {}",
            truncate_label(&next.name, MAX_NAME_CHARS),
            format_clock(next.remaining_seconds)
        ),
        None => "Next: --".to_string(),
    }
}

/// Multi-line summary for the `status` command.
pub fn format_status(status: &SchedulerStatus) -> String {
    let state = match status.state {
        SchedulerState::Stopped => "Stopped",
        SchedulerState::Running => "Running",
        SchedulerState::Paused => "Paused",
    };
    let mut lines = vec![if status.muted {
        format!("{state} (muted)")
    } else {
        state.to_string()
    }];
    for timer in &status.timers {
        lines.push(format!(
            "  {} {} / {}",
            truncate_label(&timer.name, MAX_NAME_CHARS),
            format_clock(timer.remaining_seconds),
            format_clock(timer.interval_seconds)
        ));
    }
    if let Some(popup) = status.popup.as_ref() {
        lines.push(format!("  On screen: {}", format_popup(popup)));
    }
    if status.queued > 0 || status.pending_snoozes > 0 {
        lines.push(format!(
            "  Waiting: {} queued, {} snoozed",
            status.queued, status.pending_snoozes
        ));
    }
    lines.push(format_next_break(status.next_break.as_ref()));
    lines.join("\n")
}

pub fn truncate_label(label: &str, max_chars: usize) -> String {
    let count = label.chars().count();
    if count <= max_chars {
        return label.to_string();
    }
    if max_chars <= 3 {
        return ".".repeat(max_chars);
    }
    let keep = max_chars.saturating_sub(3);
    let truncated: String = label.chars().take(keep).collect();
    format!("{truncated}...")
}
