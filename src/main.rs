use break_reminder::{logging, run, AppOptions};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// Reminds you to take recurring breaks away from the screen.
#[derive(Debug, Parser)]
#[command(name = "break-reminder", version, about)]
struct Cli {
    /// Preferences file to load and save instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level; RUST_LOG is honoured
    #[arg(long)]
    debug: bool,

    /// Start the break timers immediately
    #[arg(long)]
    autostart: bool,

    /// Start with all sounds muted
    #[arg(long)]
    mute: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let options = AppOptions {
        config_path: cli.config,
        autostart: cli.autostart,
        mute: cli.mute,
    };
    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
