pub mod app_error;
pub mod audio_manager;
pub mod break_queue;
pub mod break_timer;
pub mod clock;
pub mod commands;
pub mod data_manager;
pub mod events;
pub mod logging;
pub mod models;
pub mod popup_controller;
pub mod scheduler;
pub mod shell;
pub mod status;
pub mod timer_actions;

use crate::app_error::AppError;
use crate::audio_manager::{AudioManager, SoundPlayer};
use crate::clock::{Ticker, PULSE_INTERVAL};
use crate::commands::{parse_command, Command};
use crate::data_manager::{default_preferences_path, PreferencesStore};
use crate::events::Presenter;
use crate::scheduler::Scheduler;
use crate::shell::TerminalPresenter;
use crate::timer_actions::{run_loop, LoopExit, LoopMessage};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub config_path: Option<PathBuf>,
    pub autostart: bool,
    pub mute: bool,
}

fn spawn_input_reader(sender: Sender<LoopMessage>) -> io::Result<()> {
    thread::Builder::new()
        .name("command-input".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!(error = %err, "could not read input");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                let message = match parse_command(&line) {
                    Ok(command) => LoopMessage::Command(command),
                    Err(err) => LoopMessage::Invalid(err),
                };
                if sender.send(message).is_err() {
                    return;
                }
            }
            // End of input behaves like `quit`.
            debug!("input closed");
            let _ = sender.send(LoopMessage::Command(Command::Quit));
        })?;
    Ok(())
}

pub fn run(options: AppOptions) -> Result<(), AppError> {
    let path = match options.config_path {
        Some(path) => path,
        None => default_preferences_path()?,
    };
    let store = PreferencesStore::new(path);
    let preferences = store.load_or_default();
    info!(
        path = %store.path().display(),
        breaks = preferences.breaks.len(),
        "preferences loaded"
    );

    let mut sound = AudioManager::new();
    if options.mute {
        sound.set_global_mute(true);
    }
    let mut scheduler = Scheduler::new(preferences.breaks, Box::new(sound))?;

    let (sender, receiver) = mpsc::channel();
    let pulse_sender = sender.clone();
    let mut ticker = Ticker::spawn(PULSE_INTERVAL, move || {
        pulse_sender.send(LoopMessage::Pulse).is_ok()
    })
    .map_err(|err| AppError::fatal("Could not start the break timer", err.to_string()))?;
    spawn_input_reader(sender.clone())
        .map_err(|err| AppError::fatal("Could not read commands", err.to_string()))?;

    if options.autostart {
        let _ = sender.send(LoopMessage::Command(Command::Start));
    }
    drop(sender);

    let mut presenter = TerminalPresenter::new(io::stdout(), Some(store.clone()));
    presenter.on_help();
    let exit = run_loop(&mut scheduler, &receiver, &mut presenter);
    ticker.stop();

    if exit == LoopExit::Quit {
        store.save_breaks(&scheduler.configs())?;
        info!(path = %store.path().display(), "preferences saved on quit");
    }
    Ok(())
}
