//! State-diff engine
//!
//! Turns successive [`Snapshot`]s into the timer command stream. Every rule is
//! edge-triggered against the held [`EngineState`], so polling faster or
//! re-reading the same snapshot never repeats `start`, `split`,
//! `resumegametime` or `pausegametime`.

pub mod snapshot;

pub use snapshot::Snapshot;

use tracing::trace;

use crate::protocol::TimerCommand;

/// Anything that can carry a command to the remote timer.
pub trait CommandSink {
    fn send(&self, command: TimerCommand);
}

/// What the engine last observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineState {
    /// `None` until the first snapshot has been seen.
    pub last_split_marker: Option<u32>,
    pub started: bool,
    pub timer_active: bool,
}

pub struct SplitEngine<S> {
    sink: S,
    state: EngineState,
}

impl<S: CommandSink> SplitEngine<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: EngineState::default(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume one tick. Held state advances even if a send is dropped.
    pub fn observe(&mut self, snapshot: &Snapshot) {
        trace!(?snapshot, state = ?self.state, "observe");

        if snapshot.started && !self.state.started {
            self.sink.send(TimerCommand::Start);
            self.sink.send(TimerCommand::InitGameTime);
            self.state.started = true;
        }

        let marker = snapshot.split_marker();
        match self.state.last_split_marker {
            // First sighting only establishes the baseline
            None => self.state.last_split_marker = Some(marker),
            Some(last) if last != marker => {
                // Game time must land before the split that records it
                self.sink.send(TimerCommand::set_game_time_ms(snapshot.elapsed_file_time));
                self.sink.send(TimerCommand::Split);
                self.state.last_split_marker = Some(marker);
            }
            Some(_) => {}
        }

        if snapshot.timer_active {
            self.sink.send(TimerCommand::set_game_time_ms(snapshot.elapsed_file_time));
            if !self.state.timer_active {
                self.sink.send(TimerCommand::ResumeGameTime);
                self.state.timer_active = true;
            }
        } else if self.state.timer_active {
            self.sink.send(TimerCommand::PauseGameTime);
            self.state.timer_active = false;
        }
    }
}
