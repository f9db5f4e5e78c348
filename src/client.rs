//! Typed command surface over a [`TimerConnection`].

use crate::engine::CommandSink;
use crate::protocol::TimerCommand;
use crate::server::TimerConnection;

/// Sends [`TimerCommand`]s to the remote timer. Game-time sync commands are
/// only logged when `debug` is set; control commands are always logged.
#[derive(Clone)]
pub struct TimerClient {
    connection: TimerConnection,
    debug: bool,
}

impl TimerClient {
    pub fn new(connection: TimerConnection, debug: bool) -> Self {
        Self { connection, debug }
    }

    pub fn connected(&self) -> bool {
        self.connection.connected()
    }

    pub fn dispatch(&self, command: TimerCommand) {
        let log = self.debug || !command.is_time_sync();
        self.connection.send(&command.to_string(), log);
    }

    pub fn start(&self) {
        self.dispatch(TimerCommand::Start);
    }

    pub fn split(&self) {
        self.dispatch(TimerCommand::Split);
    }

    pub fn reset(&self) {
        self.dispatch(TimerCommand::Reset);
    }

    pub fn toggle_pause(&self) {
        self.dispatch(TimerCommand::TogglePause);
    }

    pub fn undo(&self) {
        self.dispatch(TimerCommand::Undo);
    }

    pub fn skip(&self) {
        self.dispatch(TimerCommand::Skip);
    }

    pub fn init_game_time(&self) {
        self.dispatch(TimerCommand::InitGameTime);
    }

    /// `seconds` is forwarded as-is; [`TimerCommand::set_game_time_ms`]
    /// converts file times.
    pub fn set_game_time(&self, seconds: f64) {
        self.dispatch(TimerCommand::SetGameTime { seconds });
    }

    pub fn pause_game_time(&self) {
        self.dispatch(TimerCommand::PauseGameTime);
    }

    pub fn resume_game_time(&self) {
        self.dispatch(TimerCommand::ResumeGameTime);
    }
}

impl CommandSink for TimerClient {
    fn send(&self, command: TimerCommand) {
        self.dispatch(command);
    }
}
