use nix::sys::{signal::Signal, wait::WaitStatus};

use crate::prelude::*;

/// How a single stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Exited(i32),
    Signaled(Signal),
    /// The program image could not be loaded at all.
    LaunchFailed(Errno),
}

impl ExitOutcome {
    pub fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(Self::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Some(Self::Signaled(signal)),
            _ => None,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }

    /// The conventional shell status for this outcome.
    pub fn code(&self) -> i32 {
        match self {
            Self::Exited(code) => *code,
            Self::Signaled(signal) => 128 + *signal as i32,
            Self::LaunchFailed(errno) => launch_exit_code(*errno),
        }
    }
}

/// Status a child exits with when it cannot load its program.
pub fn launch_exit_code(errno: Errno) -> i32 {
    match errno {
        Errno::ENOENT => 127,
        _ => 126,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub program: String,
    pub outcome: ExitOutcome,
}

/// Outcomes of every stage that was spawned, in stage order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOutcome {
    stages: Vec<StageOutcome>,
}

impl PipelineOutcome {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stages: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, program: String, outcome: ExitOutcome) {
        self.stages.push(StageOutcome { program, outcome });
    }

    pub fn stages(&self) -> &[StageOutcome] {
        &self.stages
    }

    /// The pipeline's status is the status of its last stage.
    pub fn status(&self) -> Option<ExitOutcome> {
        self.stages.last().map(|stage| stage.outcome)
    }

    pub fn success(&self) -> bool {
        self.status().map_or(true, |status| status.success())
    }

    pub fn launch_failures(&self) -> impl Iterator<Item = (&str, Errno)> {
        self.stages.iter().filter_map(|stage| match stage.outcome {
            ExitOutcome::LaunchFailed(errno) => Some((stage.program.as_str(), errno)),
            _ => None,
        })
    }
}
