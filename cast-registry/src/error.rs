use thiserror::Error;

/// Errors that can occur in the device registry
///
/// Intake never fails; these only surface from lifecycle calls.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The dispatch worker thread could not be started
    #[error("Failed to spawn dispatch worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    /// The dispatch worker has stopped
    #[error("Dispatch worker is not running")]
    WorkerDisconnected,

    /// Blocking on the dispatch worker from one of its own callbacks
    #[error("Cannot wait for the dispatch worker from an observer callback")]
    CalledFromObserver,
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
