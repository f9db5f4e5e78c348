use anyhow::{anyhow, Result};
use std::fmt;
use std::str::FromStr;

/// A single text frame understood by the remote split timer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerCommand {
    Start,
    Split,
    Reset,
    TogglePause,
    Undo,
    Skip,
    InitGameTime,
    SetGameTime { seconds: f64 },
    PauseGameTime,
    ResumeGameTime,
}

impl TimerCommand {
    /// Build a `setgametime` command from a file time in milliseconds.
    pub fn set_game_time_ms(elapsed_ms: u64) -> Self {
        TimerCommand::SetGameTime {
            seconds: elapsed_ms as f64 / 1000.0,
        }
    }

    /// Commands that keep the game-time clock in sync. These are chatty
    /// (one per tick while running) and only logged in debug mode.
    pub fn is_time_sync(&self) -> bool {
        matches!(
            self,
            TimerCommand::InitGameTime
                | TimerCommand::SetGameTime { .. }
                | TimerCommand::PauseGameTime
                | TimerCommand::ResumeGameTime
        )
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            TimerCommand::Start => "start",
            TimerCommand::Split => "split",
            TimerCommand::Reset => "reset",
            TimerCommand::TogglePause => "togglepause",
            TimerCommand::Undo => "undo",
            TimerCommand::Skip => "skip",
            TimerCommand::InitGameTime => "initgametime",
            TimerCommand::SetGameTime { .. } => "setgametime",
            TimerCommand::PauseGameTime => "pausegametime",
            TimerCommand::ResumeGameTime => "resumegametime",
        }
    }
}

/// Seconds always carry a fractional part so whole values read `5.0`, not `5`.
fn format_seconds(seconds: f64) -> String {
    if seconds.is_finite() && seconds.fract() == 0.0 {
        format!("{:.1}", seconds)
    } else {
        format!("{}", seconds)
    }
}

impl fmt::Display for TimerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerCommand::SetGameTime { seconds } => {
                write!(f, "{} {}", self.keyword(), format_seconds(*seconds))
            }
            other => f.write_str(other.keyword()),
        }
    }
}

impl FromStr for TimerCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().splitn(2, ' ');
        let keyword = parts.next().unwrap_or_default();
        let argument = parts.next().map(str::trim);

        let command = match keyword {
            "start" => TimerCommand::Start,
            "split" => TimerCommand::Split,
            "reset" => TimerCommand::Reset,
            "togglepause" => TimerCommand::TogglePause,
            "undo" => TimerCommand::Undo,
            "skip" => TimerCommand::Skip,
            "initgametime" => TimerCommand::InitGameTime,
            "pausegametime" => TimerCommand::PauseGameTime,
            "resumegametime" => TimerCommand::ResumeGameTime,
            "setgametime" => {
                let raw = argument.ok_or_else(|| anyhow!("setgametime requires a value"))?;
                let seconds = raw
                    .parse::<f64>()
                    .map_err(|e| anyhow!("invalid game time '{}': {}", raw, e))?;
                return Ok(TimerCommand::SetGameTime { seconds });
            }
            other => return Err(anyhow!("unknown timer command: '{}'", other)),
        };

        if let Some(extra) = argument {
            return Err(anyhow!("'{}' takes no argument, got '{}'", keyword, extra));
        }
        Ok(command)
    }
}
