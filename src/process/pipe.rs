use std::os::fd::{FromRawFd, IntoRawFd};

use nix::{fcntl::OFlag, unistd};

use crate::prelude::*;

/// Both ends of one pipe. Dropping an end closes it.
#[derive(Debug)]
pub struct PipeEnds {
    pub read: OwnedFd,
    pub write: OwnedFd,
}

impl PipeEnds {
    /// Creates a close-on-exec pipe.
    pub fn new() -> Result<Self, Errno> {
        let (read, write) = unistd::pipe2(OFlag::O_CLOEXEC)?;

        // SAFETY: both descriptors were just returned by pipe2 and have no other owner
        let (read, write) = unsafe { (OwnedFd::from_raw_fd(read), OwnedFd::from_raw_fd(write)) };

        Ok(Self { read, write })
    }
}

/// Every descriptor a pipeline's stages are wired to: the boundary pipes
/// between adjacent stages plus optional replacements for the first stage's
/// input and the last stage's output.
#[derive(Debug)]
pub struct PipeSet {
    input: Option<OwnedFd>,
    output: Option<OwnedFd>,
    boundaries: Vec<PipeEnds>,
}

impl PipeSet {
    pub fn new(
        stages: usize,
        input: Option<OwnedFd>,
        output: Option<OwnedFd>,
    ) -> Result<Self, Errno> {
        let boundaries = (1..stages)
            .map(|_| PipeEnds::new())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            input,
            output,
            boundaries,
        })
    }

    pub fn stages(&self) -> usize {
        self.boundaries.len() + 1
    }

    /// Descriptor stage `stage` should read from, or `None` to inherit.
    pub fn stdin_for(&self, stage: usize) -> Option<RawFd> {
        match stage {
            0 => self.input.as_ref().map(AsRawFd::as_raw_fd),
            _ => self.boundaries.get(stage - 1).map(|pipe| pipe.read.as_raw_fd()),
        }
    }

    /// Descriptor stage `stage` should write to, or `None` to inherit.
    pub fn stdout_for(&self, stage: usize) -> Option<RawFd> {
        if stage + 1 == self.stages() {
            self.output.as_ref().map(AsRawFd::as_raw_fd)
        } else {
            self.boundaries.get(stage).map(|pipe| pipe.write.as_raw_fd())
        }
    }

    /// Closes every descriptor in the set.
    pub fn close_all(&mut self) {
        self.close_all_except(|_| false);
    }

    /// Empties the set, closing every descriptor except those `keep` accepts.
    /// Kept descriptors are released without being closed.
    pub fn close_all_except(&mut self, keep: impl Fn(RawFd) -> bool) {
        let release = |fd: OwnedFd| {
            if keep(fd.as_raw_fd()) {
                let _ = fd.into_raw_fd();
            }
        };

        if let Some(fd) = self.input.take() {
            release(fd);
        }
        if let Some(fd) = self.output.take() {
            release(fd);
        }
        for PipeEnds { read, write } in self.boundaries.drain(..) {
            release(read);
            release(write);
        }
    }

    pub fn descriptors(&self) -> usize {
        self.input.iter().count() + self.output.iter().count() + self.boundaries.len() * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_stage_inherits_everything() {
        let pipes = PipeSet::new(1, None, None).unwrap();
        assert_eq!(pipes.stages(), 1);
        assert_eq!(pipes.descriptors(), 0);
        assert_eq!(pipes.stdin_for(0), None);
        assert_eq!(pipes.stdout_for(0), None);
    }

    #[test]
    fn boundaries_connect_adjacent_stages() {
        let pipes = PipeSet::new(3, None, None).unwrap();
        assert_eq!(pipes.descriptors(), 4);

        assert_eq!(pipes.stdin_for(0), None);
        assert_eq!(pipes.stdout_for(2), None);

        assert_eq!(pipes.stdout_for(0), Some(pipes.boundaries[0].write.as_raw_fd()));
        assert_eq!(pipes.stdin_for(1), Some(pipes.boundaries[0].read.as_raw_fd()));
        assert_eq!(pipes.stdout_for(1), Some(pipes.boundaries[1].write.as_raw_fd()));
        assert_eq!(pipes.stdin_for(2), Some(pipes.boundaries[1].read.as_raw_fd()));
    }

    #[test]
    fn replacements_apply_to_the_ends() {
        let input = PipeEnds::new().unwrap();
        let output = PipeEnds::new().unwrap();
        let input_fd = input.read.as_raw_fd();
        let output_fd = output.write.as_raw_fd();

        let mut pipes = PipeSet::new(2, Some(input.read), Some(output.write)).unwrap();
        assert_eq!(pipes.stdin_for(0), Some(input_fd));
        assert_eq!(pipes.stdout_for(1), Some(output_fd));
        assert_eq!(pipes.descriptors(), 4);

        pipes.close_all();
        assert_eq!(pipes.descriptors(), 0);
    }

    #[test]
    fn kept_descriptors_stay_open() {
        let mut pipes = PipeSet::new(2, None, None).unwrap();
        let kept = pipes.stdin_for(1).unwrap();

        pipes.close_all_except(|fd| fd == kept);
        assert_eq!(pipes.descriptors(), 0);

        // still open, so it can be adopted and closed here
        assert!(nix::fcntl::fcntl(kept, nix::fcntl::FcntlArg::F_GETFD).is_ok());
        drop(unsafe { OwnedFd::from_raw_fd(kept) });
    }

    #[test]
    fn closing_the_write_end_signals_end_of_stream() {
        let PipeEnds { read, write } = PipeEnds::new().unwrap();
        unistd::write(write.as_raw_fd(), b"x").unwrap();
        drop(write);

        let mut buf = [0u8; 4];
        assert_eq!(unistd::read(read.as_raw_fd(), &mut buf).unwrap(), 1);
        assert_eq!(unistd::read(read.as_raw_fd(), &mut buf).unwrap(), 0);
    }
}
