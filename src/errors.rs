use thiserror::Error;
use crate::shell::ShellError;

/// Failure of a whole listing. Per-line problems never surface here.
#[derive(Error, Debug)]
pub enum ListError {
    /// The shell could not run the listing command; carries its diagnostic verbatim
    #[error("{0}")]
    Execution(String),
}

impl From<ShellError> for ListError {
    fn from(e: ShellError) -> Self {
        ListError::Execution(e.to_string())
    }
}

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Shell error: {0}")]
    Shell(#[from] ShellError),

    #[error("Listing failed: {0}")]
    List(#[from] ListError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type AppResult<T> = Result<T, AppError>;
