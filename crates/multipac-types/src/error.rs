use thiserror::Error;

#[derive(Error, Debug)]
pub enum MultipacError {
    #[error("Malformed record in {path} at line {line}: {message}")]
    FormatError {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Data integrity violated for particle {particle_id}: {message}")]
    DataIntegrity { particle_id: u64, message: String },

    #[error("Shape mismatch ({left} vs {right}): {message}")]
    ShapeMismatch {
        left: usize,
        right: usize,
        message: String,
    },

    #[error("Mandatory file {file} not found in {folder}")]
    MissingFile { file: String, folder: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Linear algebra error: {0}")]
    LinAlg(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type MultipacResult<T> = Result<T, MultipacError>;
