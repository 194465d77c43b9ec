use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The process exited (or became a zombie) between discovery and query.
    #[error("process {pid} does not exist anymore")]
    NoSuchProcess { pid: u32 },

    #[error("no command given to trace")]
    InvalidInvocation,

    #[error("failed to write session record {}: {source}", path.display())]
    StorageFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("sampling started without an attached root process")]
    RootNotAttached,

    #[error("no system.csv record found in {}", dir.display())]
    MissingSystemRecord { dir: PathBuf },

    #[error("malformed record {}: {reason}", path.display())]
    MalformedRecord { path: PathBuf, reason: String },

    #[error("config error in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::StorageFailure {
            path: path.into(),
            source,
        }
    }

    pub fn is_no_such_process(&self) -> bool {
        matches!(self, Error::NoSuchProcess { .. })
    }
}
