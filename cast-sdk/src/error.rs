use cast_device::DeviceId;
use cast_events::EventError;
use cast_registry::RegistryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Failed to start action executor: {0}")]
    Executor(#[from] std::io::Error),

    #[error("Event delivery error: {0}")]
    Events(#[from] EventError),

    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceId),
}

pub type Result<T> = std::result::Result<T, SdkError>;
