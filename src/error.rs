use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipdeckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{description} failed ({status}): {stderr}")]
    ExternalTool {
        description: String,
        status: String,
        stderr: String,
    },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),
}

pub type Result<T> = std::result::Result<T, ClipdeckError>;
