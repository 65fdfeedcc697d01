use thiserror::Error;

/// Failures of the event callback machinery
#[derive(Debug, Error)]
pub enum EventError {
    #[error("No free callback port in {start}-{end}")]
    NoFreePort { start: u16, end: u16 },

    #[error("Could not determine a local address devices can reach")]
    NoLocalAddress,

    #[error("Callback server failed to start: {0}")]
    ServerStart(String),

    #[error("Invalid event configuration: {0}")]
    InvalidConfig(String),

    #[error("Event runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EventError>;
