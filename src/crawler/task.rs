use std::fmt;

/// Lifecycle of one input URL within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Processing,
    Done,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskState::Pending => "pending",
            TaskState::Processing => "processing",
            TaskState::Done => "done",
        };
        f.write_str(label)
    }
}

/// One profile page to visit
#[derive(Debug, Clone)]
pub struct ScrapeTask {
    /// 1-based position in the input list, also names the debug artifact
    pub index: usize,

    /// URL to visit
    pub url: String,

    /// Current state of this task
    pub state: TaskState,
}

impl ScrapeTask {
    pub fn new(index: usize, url: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
            state: TaskState::Pending,
        }
    }
}
