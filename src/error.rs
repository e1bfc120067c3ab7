use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to launch `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` exited with status {code}")]
    ToolFailed { program: String, code: i32 },

    #[error("staging {} failed", path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn staging(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Error::Staging { path, source }
    }

    /// Process exit code for this failure. A failed tool hands its own code through.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ToolFailed { code, .. } => *code,
            Error::Spawn { .. } | Error::Staging { .. } => 1,
        }
    }
}
