use serde::Deserialize;

/// One polling tick's view of the tracked run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Whether the run has begun at all.
    pub started: bool,

    /// Whether the in-game timer is currently running.
    pub timer_active: bool,

    /// In-game file time in milliseconds.
    pub elapsed_file_time: u64,

    /// Previous-split value per tracked segment. Segment 0 drives splits.
    pub previous_splits: Vec<u32>,
}

impl Snapshot {
    /// Split trigger value: segment 0's previous split, 0 when untracked.
    pub fn split_marker(&self) -> u32 {
        self.previous_splits.first().copied().unwrap_or(0)
    }
}
