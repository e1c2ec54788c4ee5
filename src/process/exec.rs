use std::{
    ffi::{CStr, CString, NulError},
    os::raw::c_char,
    ptr,
};

use thiserror::Error;

use crate::prelude::*;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("empty argument list")]
    InvalidArgument,
    #[error("argument contains a nul byte: {0}")]
    Nul(#[from] NulError),
    #[error("{}", .0.desc())]
    Launch(Errno),
}

impl ExecError {
    /// The OS classification of this error.
    pub fn errno(&self) -> Errno {
        match self {
            Self::InvalidArgument | Self::Nul(_) => Errno::EINVAL,
            Self::Launch(errno) => *errno,
        }
    }
}

/// An owned, null-terminated argument vector ready to be handed to `execvp`.
///
/// Everything is allocated up front so that [`Argv::exec`] can run in a
/// freshly forked child without touching the allocator.
#[derive(Debug)]
pub struct Argv {
    args: Vec<CString>,
    ptrs: Vec<*const c_char>,
}

impl Argv {
    pub fn new<S: AsRef<str>>(args: &[S]) -> Result<Self, ExecError> {
        if args.is_empty() {
            return Err(ExecError::InvalidArgument);
        }

        let args = args
            .iter()
            .map(|arg| CString::new(arg.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let ptrs = args
            .iter()
            .map(|arg| arg.as_ptr())
            .chain(std::iter::once(ptr::null()))
            .collect();

        Ok(Self { args, ptrs })
    }

    pub fn program(&self) -> &CStr {
        &self.args[0]
    }

    pub fn program_name(&self) -> String {
        self.program().to_string_lossy().into_owned()
    }

    /// Replaces the current process image, searching `PATH` for the program.
    /// Standard input and output are inherited as they are.
    ///
    /// Only returns if the program could not be loaded.
    pub fn exec(&self) -> ExecError {
        // SAFETY: `ptrs` points into `args`, which outlives this call, and is
        // terminated by a null pointer
        unsafe { nix::libc::execvp(self.program().as_ptr(), self.ptrs.as_ptr()) };

        ExecError::Launch(Errno::last())
    }
}

/// Replaces the current process with `args[0]`, passing the rest as its
/// arguments. Returns only on failure; the argument buffers are released
/// before it does.
pub fn execute<S: AsRef<str>>(args: &[S]) -> ExecError {
    match Argv::new(args) {
        Ok(argv) => argv.exec(),
        Err(err) => err,
    }
}
