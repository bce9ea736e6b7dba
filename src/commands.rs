use crate::models::{ConfigChange, ConfigError, SoundId, TimeUnit, SOUND_NAMES};
use thiserror::Error;

pub const HELP_TEXT: &str = "\
Commands:
  start | pause | resume | toggle | stop
  test <break>                     show a break now
  done | dismiss | close           close the break on screen
  snooze                           postpone the break on screen by 5 minutes
  status                           show timers and the next break
  set <break> interval <n> [unit]  unit is sec, min or hour (default min)
  set <break> duration <n> [unit]
  set <break> start|end <sound>    Glass, Ping, Pop, Submarine or None
  set <break> loop|auto on|off
  set <break> rename <new name>
  play <sound> | mute | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Resume,
    TogglePause,
    Stop,
    Test(String),
    Dismiss,
    Snooze,
    Status,
    Update { name: String, change: ConfigChange },
    PlaySound(SoundId),
    ToggleMute,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("{command} needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("not a number: {0}")]
    InvalidNumber(String),
    #[error("expected on or off, got {0}")]
    InvalidFlag(String),
    #[error("unknown sound: {0}")]
    UnknownSound(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

const SETTING_KEYWORDS: [&str; 7] = [
    "interval", "duration", "start", "end", "loop", "auto", "rename",
];

pub fn parse_command(line: &str) -> Result<Command, CommandParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((head, rest)) = tokens.split_first() else {
        return Err(CommandParseError::Empty);
    };
    let command = match head.to_ascii_lowercase().as_str() {
        "start" => Command::Start,
        "pause" => Command::Pause,
        "resume" => Command::Resume,
        "toggle" => Command::TogglePause,
        "stop" => Command::Stop,
        "done" | "dismiss" | "close" => Command::Dismiss,
        "snooze" => Command::Snooze,
        "status" => Command::Status,
        "mute" => Command::ToggleMute,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "test" => Command::Test(join_required(rest, "test", "a break name")?),
        "play" => Command::PlaySound(parse_sound(&join_required(rest, "play", "a sound")?)?),
        "set" => parse_set(rest)?,
        other => return Err(CommandParseError::Unknown(other.to_string())),
    };
    Ok(command)
}

fn join_required(
    tokens: &[&str],
    command: &'static str,
    expected: &'static str,
) -> Result<String, CommandParseError> {
    if tokens.is_empty() {
        return Err(CommandParseError::MissingArgument { command, expected });
    }
    Ok(tokens.join(" "))
}

fn parse_set(tokens: &[&str]) -> Result<Command, CommandParseError> {
    let missing = CommandParseError::MissingArgument {
        command: "set",
        expected: "a break name, a setting and a value",
    };
    // Break names may contain spaces, so the name runs up to the first setting keyword.
    let split = tokens
        .iter()
        .skip(1)
        .position(|token| SETTING_KEYWORDS.contains(&token.to_ascii_lowercase().as_str()))
        .map(|index| index + 1)
        .ok_or_else(|| missing.clone())?;
    let name = tokens[..split].join(" ");
    let field = tokens[split].to_ascii_lowercase();
    let values = &tokens[split + 1..];
    if values.is_empty() {
        return Err(missing);
    }

    let change = match field.as_str() {
        "interval" => {
            let (value, unit) = parse_span(values)?;
            ConfigChange::Interval { value, unit }
        }
        "duration" => {
            let (value, unit) = parse_span(values)?;
            ConfigChange::Duration { value, unit }
        }
        "start" => ConfigChange::StartSound(parse_sound(&values.join(" "))?),
        "end" => ConfigChange::EndSound(parse_sound(&values.join(" "))?),
        "loop" => ConfigChange::LoopEndSound(parse_flag(values[0])?),
        "auto" => ConfigChange::AutoDismiss(parse_flag(values[0])?),
        _ => ConfigChange::Rename(values.join(" ")),
    };
    Ok(Command::Update { name, change })
}

fn parse_span(values: &[&str]) -> Result<(i64, TimeUnit), CommandParseError> {
    let value = values[0]
        .parse::<i64>()
        .map_err(|_| CommandParseError::InvalidNumber(values[0].to_string()))?;
    let unit = match values.get(1) {
        Some(unit) => unit.parse::<TimeUnit>()?,
        None => TimeUnit::Min,
    };
    Ok((value, unit))
}

/// Matches a bundled sound name regardless of case.
fn parse_sound(value: &str) -> Result<SoundId, CommandParseError> {
    SOUND_NAMES
        .iter()
        .find(|name| name.eq_ignore_ascii_case(value))
        .map(|name| SoundId::named(*name))
        .ok_or_else(|| CommandParseError::UnknownSound(value.to_string()))
}

fn parse_flag(value: &str) -> Result<bool, CommandParseError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" | "1" => Ok(true),
        "off" | "no" | "false" | "0" => Ok(false),
        _ => Err(CommandParseError::InvalidFlag(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_command, Command, CommandParseError};
    use crate::models::{ConfigChange, ConfigError, SoundId, TimeUnit};

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse_command("start"), Ok(Command::Start));
        assert_eq!(parse_command("  Pause "), Ok(Command::Pause));
        assert_eq!(parse_command("done"), Ok(Command::Dismiss));
        assert_eq!(parse_command("close"), Ok(Command::Dismiss));
        assert_eq!(parse_command("toggle"), Ok(Command::TogglePause));
        assert_eq!(parse_command(""), Err(CommandParseError::Empty));
        assert_eq!(
            parse_command("launch"),
            Err(CommandParseError::Unknown("launch".to_string()))
        );
    }

    #[test]
    fn test_takes_multi_word_break_name() {
        assert_eq!(
            parse_command("test Micro Break"),
            Ok(Command::Test("Micro Break".to_string()))
        );
        assert!(matches!(
            parse_command("test"),
            Err(CommandParseError::MissingArgument { command: "test", .. })
        ));
    }

    #[test]
    fn set_interval_with_default_unit() {
        assert_eq!(
            parse_command("set Normal Break interval 45"),
            Ok(Command::Update {
                name: "Normal Break".to_string(),
                change: ConfigChange::Interval {
                    value: 45,
                    unit: TimeUnit::Min
                },
            })
        );
    }

    #[test]
    fn set_duration_with_explicit_unit() {
        assert_eq!(
            parse_command("set Micro Break duration 20 sec"),
            Ok(Command::Update {
                name: "Micro Break".to_string(),
                change: ConfigChange::Duration {
                    value: 20,
                    unit: TimeUnit::Sec
                },
            })
        );
    }

    #[test]
    fn set_sounds_and_flags() {
        assert_eq!(
            parse_command("set Micro Break end none"),
            Ok(Command::Update {
                name: "Micro Break".to_string(),
                change: ConfigChange::EndSound(SoundId::None),
            })
        );
        assert_eq!(
            parse_command("set Normal Break loop off"),
            Ok(Command::Update {
                name: "Normal Break".to_string(),
                change: ConfigChange::LoopEndSound(false),
            })
        );
        assert_eq!(
            parse_command("set Normal Break auto maybe"),
            Err(CommandParseError::InvalidFlag("maybe".to_string()))
        );
    }

    #[test]
    fn set_rejects_bad_numbers_and_units() {
        assert_eq!(
            parse_command("set Micro interval soon"),
            Err(CommandParseError::InvalidNumber("soon".to_string()))
        );
        assert_eq!(
            parse_command("set Micro interval 5 weeks"),
            Err(CommandParseError::Config(ConfigError::UnknownUnit(
                "weeks".to_string()
            )))
        );
        assert!(matches!(
            parse_command("set interval 5"),
            Err(CommandParseError::MissingArgument { .. })
        ));
        assert!(matches!(
            parse_command("set Micro interval"),
            Err(CommandParseError::MissingArgument { .. })
        ));
    }

    #[test]
    fn play_parses_sound_name() {
        assert_eq!(
            parse_command("play submarine"),
            Ok(Command::PlaySound(SoundId::named("Submarine")))
        );
        assert_eq!(
            parse_command("play Trumpet"),
            Err(CommandParseError::UnknownSound("Trumpet".to_string()))
        );
    }
}
