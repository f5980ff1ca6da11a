use std::path::PathBuf;

/// Errors raised by storage, configuration and commands.
///
/// The scheduling core (periods, materialization, zones, sorting) never fails;
/// bad template data there degrades to "nothing produced" instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid date '{0}', use YYYY-MM-DD")]
    InvalidDate(String),

    #[error("task {0} not found")]
    TaskNotFound(u64),

    #[error("template {0} not found")]
    TemplateNotFound(u64),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
