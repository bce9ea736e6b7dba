use crate::app_error::AppError;
use crate::commands::{Command, CommandParseError};
use crate::events::{dispatch, Presenter};
use crate::scheduler::{Scheduler, SchedulerError};
use std::sync::mpsc::Receiver;
use tracing::{debug, info, warn};

/// Everything the cooperative loop reacts to. The ticker thread posts
/// `Pulse`, the input thread posts the rest.
#[derive(Debug)]
pub enum LoopMessage {
    Pulse,
    Command(Command),
    Invalid(CommandParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Quit,
    Disconnected,
}

pub fn apply_command(scheduler: &mut Scheduler, command: Command) -> Result<(), AppError> {
    match command {
        Command::Start => scheduler.start()?,
        Command::Pause => scheduler.pause()?,
        Command::Resume => scheduler.resume()?,
        Command::TogglePause => scheduler.toggle_pause()?,
        Command::Stop => scheduler.stop(),
        Command::Test(name) => scheduler.test_break(&name)?,
        Command::Dismiss => scheduler.close_window()?,
        Command::Snooze => scheduler.snooze()?,
        Command::Status => scheduler.report_status(),
        Command::Update { name, change } => {
            let mut config = scheduler
                .timer(&name)
                .map(|timer| timer.config().clone())
                .ok_or_else(|| SchedulerError::UnknownBreak(name.clone()))?;
            change.apply(&mut config);
            scheduler.update_break(&name, config)?;
        }
        Command::PlaySound(sound) => scheduler.preview_sound(&sound),
        Command::ToggleMute => {
            scheduler.toggle_mute();
            scheduler.report_status();
        }
        Command::Help | Command::Quit => {}
    }
    Ok(())
}

pub fn flush_events(scheduler: &mut Scheduler, presenter: &mut dyn Presenter) {
    for event in scheduler.take_events() {
        debug!(event = event.name(), "dispatching scheduler event");
        dispatch(presenter, &event);
    }
}

fn report_error(presenter: &mut dyn Presenter, error: AppError) {
    warn!(kind = ?error.kind(), error = %error, "command failed");
    presenter.on_error(&error.payload());
}

/// Runs until `quit` arrives or every sender is gone. Events raised by each
/// message are presented before the next message is taken.
pub fn run_loop(
    scheduler: &mut Scheduler,
    messages: &Receiver<LoopMessage>,
    presenter: &mut dyn Presenter,
) -> LoopExit {
    let exit = loop {
        let Ok(message) = messages.recv() else {
            break LoopExit::Disconnected;
        };
        match message {
            LoopMessage::Pulse => scheduler.pulse(),
            LoopMessage::Invalid(error) => report_error(presenter, error.into()),
            LoopMessage::Command(Command::Quit) => break LoopExit::Quit,
            LoopMessage::Command(Command::Help) => presenter.on_help(),
            LoopMessage::Command(command) => {
                debug!(?command, "applying command");
                if let Err(error) = apply_command(scheduler, command) {
                    report_error(presenter, error);
                }
            }
        }
        flush_events(scheduler, presenter);
    };
    info!(?exit, "break loop finished");
    scheduler.stop();
    flush_events(scheduler, presenter);
    exit
}
