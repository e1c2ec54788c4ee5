use nix::{
    fcntl::{fcntl, FcntlArg, FdFlag},
    libc::{STDIN_FILENO, STDOUT_FILENO},
    sys::{
        signal::{signal, SigHandler, Signal},
        wait::waitpid,
    },
    unistd::{self, ForkResult},
};
use thiserror::Error;

use crate::prelude::*;

use super::{
    exec::{Argv, ExecError},
    pipe::{PipeEnds, PipeSet},
    status::{launch_exit_code, ExitOutcome},
};

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("failed to create pipe: {0}")]
    Pipe(#[source] Errno),
    #[error("fork failed: {0}")]
    Fork(#[source] Errno),
}

/// A forked pipeline stage. Consumed by [`ChildProcess::wait`], so each
/// child is reaped exactly once.
#[derive(Debug)]
#[must_use = "a spawned child has to be waited on"]
pub struct ChildProcess {
    pid: Pid,
    program: String,
    /// Read end of the launch report pipe. The child writes its errno here
    /// when exec fails; a successful exec closes the write end silently.
    report: OwnedFd,
}

impl ChildProcess {
    /// Forks stage `stage`, wires its input and output from `pipes` and
    /// replaces the child with `argv`.
    pub fn spawn(argv: &Argv, stage: usize, pipes: &mut PipeSet) -> Result<Self, SpawnError> {
        let report = PipeEnds::new().map_err(SpawnError::Pipe)?;
        let stdin = pipes.stdin_for(stage);
        let stdout = pipes.stdout_for(stage);

        // SAFETY: the child only calls async-signal-safe functions before
        // exec or _exit
        match unsafe { unistd::fork() }.map_err(SpawnError::Fork)? {
            ForkResult::Parent { child } => {
                drop(report.write);

                let program = argv.program_name();
                trace!(pid = %child, stage, program = %program, "spawned stage");

                Ok(Self {
                    pid: child,
                    program,
                    report: report.read,
                })
            }
            ForkResult::Child => run_stage(argv, stdin, stdout, pipes, report),
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Blocks until the child has terminated and returns how it ended.
    pub fn wait(self) -> Result<ExitOutcome, Errno> {
        let launch_error = read_report(&self.report);

        let status = loop {
            match waitpid(self.pid, None) {
                Ok(status) => match ExitOutcome::from_wait_status(status) {
                    Some(outcome) => break outcome,
                    None => continue,
                },
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(errno),
            }
        };

        debug!(
            pid = %self.pid,
            program = %self.program,
            ?status,
            ?launch_error,
            "stage finished"
        );

        Ok(match launch_error {
            Some(errno) => ExitOutcome::LaunchFailed(errno),
            None => status,
        })
    }
}

/// Runs in the forked child: redirects standard input and output, closes
/// every pipe descriptor and execs. Never returns.
fn run_stage(
    argv: &Argv,
    stdin: Option<RawFd>,
    stdout: Option<RawFd>,
    pipes: &mut PipeSet,
    report: PipeEnds,
) -> ! {
    let PipeEnds { read, write } = report;
    drop(read);

    let err = match prepare_stage(stdin, stdout) {
        Ok(()) => {
            // whatever now sits on a redirected standard stream belongs to
            // the stage, even if the set still owns that descriptor number
            pipes.close_all_except(|fd| {
                (stdin.is_some() && fd == STDIN_FILENO)
                    || (stdout.is_some() && fd == STDOUT_FILENO)
            });
            argv.exec()
        }
        Err(errno) => ExecError::Launch(errno),
    };

    let errno = err.errno();
    let _ = unistd::write(write.as_raw_fd(), &(errno as i32).to_ne_bytes());

    // SAFETY: _exit skips the atexit handlers and buffered output inherited
    // from the parent
    unsafe { nix::libc::_exit(launch_exit_code(errno)) }
}

/// Restores the default SIGPIPE disposition and moves the stage's pipe ends
/// onto standard input and output. Failures are reported like exec failures.
fn prepare_stage(stdin: Option<RawFd>, stdout: Option<RawFd>) -> Result<(), Errno> {
    // the shell ignores SIGPIPE; programs it launches get the default back
    // SAFETY: installs no handler, only resets the disposition
    unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) }?;

    if let Some(fd) = stdin {
        redirect(fd, STDIN_FILENO)?;
    }
    if let Some(fd) = stdout {
        redirect(fd, STDOUT_FILENO)?;
    }
    Ok(())
}

/// Makes `target` refer to `fd` and survive exec.
fn redirect(fd: RawFd, target: RawFd) -> Result<(), Errno> {
    if fd == target {
        // dup2 onto itself is a no-op that keeps close-on-exec set
        fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty()))?;
    } else {
        unistd::dup2(fd, target)?;
    }
    Ok(())
}

/// Reads the errno a child reports when exec fails. End of stream without a
/// report means the program was loaded.
fn read_report(report: &OwnedFd) -> Option<Errno> {
    let mut buf = [0u8; std::mem::size_of::<i32>()];
    let mut filled = 0;

    while filled < buf.len() {
        match unistd::read(report.as_raw_fd(), &mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(Errno::EINTR) => continue,
            Err(errno) => {
                warn!(%errno, "failed to read launch report");
                break;
            }
        }
    }

    (filled == buf.len()).then(|| Errno::from_i32(i32::from_ne_bytes(buf)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close_on_exec(fd: RawFd) -> bool {
        let flags = fcntl(fd, FcntlArg::F_GETFD).unwrap();
        FdFlag::from_bits_truncate(flags).contains(FdFlag::FD_CLOEXEC)
    }

    #[test]
    fn redirect_onto_itself_clears_close_on_exec() {
        let PipeEnds { read, write: _write } = PipeEnds::new().unwrap();
        let fd = read.as_raw_fd();
        assert!(close_on_exec(fd));

        redirect(fd, fd).unwrap();
        assert!(!close_on_exec(fd));
    }
}
