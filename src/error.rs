use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Department pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid settings: {message}")]
    InvalidSettings { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
