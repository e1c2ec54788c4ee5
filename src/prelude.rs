pub use std::os::fd::{AsRawFd, OwnedFd, RawFd};

pub use nix::{errno::Errno, unistd::Pid};
