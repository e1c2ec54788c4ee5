use thiserror::Error;

use super::execution_plan::ExecutionPlan;
use crate::{
    prelude::*,
    process::{
        child::{ChildProcess, SpawnError},
        exec::{Argv, ExecError},
        pipe::PipeSet,
        status::PipelineOutcome,
    },
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{program}: {source}")]
    Prepare {
        program: String,
        #[source]
        source: ExecError,
    },
    #[error("failed to create pipe: {0}")]
    Pipe(#[source] Errno),
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: Errno,
    },
}

/// Replacements for the first stage's input and the last stage's output.
/// `None` inherits the orchestrating process's descriptor.
#[derive(Debug, Default)]
pub struct StageIo {
    pub stdin: Option<OwnedFd>,
    pub stdout: Option<OwnedFd>,
}

impl ExecutionPlan {
    /// Runs every stage with inherited input and output and waits for all of
    /// them.
    pub fn execute(&self) -> Result<PipelineOutcome, PipelineError> {
        self.execute_with(StageIo::default())
    }

    /// Runs every stage as its own process, stage `i` writing into stage
    /// `i + 1`, and waits for all of them.
    ///
    /// If a fork fails partway through, the stages already running are still
    /// reaped before the error is returned.
    pub fn execute_with(&self, io: StageIo) -> Result<PipelineOutcome, PipelineError> {
        if self.is_empty() {
            return Ok(PipelineOutcome::default());
        }

        let argvs = self
            .stages()
            .iter()
            .map(|stage| {
                Argv::new(stage.as_slice()).map_err(|source| PipelineError::Prepare {
                    program: stage.program().to_owned(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut pipes =
            PipeSet::new(self.len(), io.stdin, io.stdout).map_err(PipelineError::Pipe)?;
        trace!(stages = self.len(), descriptors = pipes.descriptors(), "pipes ready");

        let mut children = Vec::with_capacity(self.len());
        let mut spawn_error = None;

        for (stage, argv) in argvs.iter().enumerate() {
            match ChildProcess::spawn(argv, stage, &mut pipes) {
                Ok(child) => children.push(child),
                Err(err) => {
                    error!(stage, %err, "failed to spawn stage");
                    spawn_error = Some(err);
                    break;
                }
            }
        }

        // the orchestrator itself reads and writes none of the pipes
        drop(pipes);

        let mut outcome = PipelineOutcome::with_capacity(children.len());
        let mut wait_error = None;

        for child in children {
            let program = child.program().to_owned();
            match child.wait() {
                Ok(status) => outcome.push(program, status),
                Err(source) => {
                    error!(%program, %source, "failed to wait for stage");
                    if wait_error.is_none() {
                        wait_error = Some(PipelineError::Wait { program, source });
                    }
                }
            }
        }

        if let Some(err) = spawn_error {
            return Err(err.into());
        }
        if let Some(err) = wait_error {
            return Err(err);
        }

        debug!(?outcome, "pipeline finished");

        Ok(outcome)
    }
}
