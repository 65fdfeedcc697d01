use cast_device::{Capability, DeviceId};
use thiserror::Error;

use crate::operation::ValidationError;
use crate::transport::TransportFailure;

/// Fault codes that mean the device cannot handle the requested content
const UNSUPPORTED_MEDIA_FAULTS: &[u16] = &[703, 704, 707, 714, 716, 719, 720, 721];

/// Failures a control action can resolve with
///
/// Every [`PendingAction`](crate::PendingAction) completes with either a value
/// or exactly one of these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The exchange with the device failed, or the device answered with
    /// something that could not be understood.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The device rejected the command in its current state
    #[error("Invalid state (fault {code}): {description}")]
    InvalidState { code: u16, description: String },

    /// The device refused the content (format, URI or metadata)
    #[error("Unsupported media (fault {code}): {description}")]
    UnsupportedMedia { code: u16, description: String },

    /// An argument was out of range; no exchange took place
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The bound device is no longer listed as present
    #[error("Device {0} is unavailable")]
    DeviceUnavailable(DeviceId),

    /// The device does not declare the capability this command needs
    #[error("Device {device} does not support {capability}")]
    UnsupportedCapability {
        device: DeviceId,
        capability: Capability,
    },

    /// The device does not advertise events for the service, or the session
    /// was created without an event subscriber
    #[error("Device {device} offers no events for {capability}")]
    EventsUnsupported {
        device: DeviceId,
        capability: Capability,
    },
}

impl ControlError {
    /// Whether issuing the same command again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ControlError::Transport(_))
    }

    /// Map a device fault code onto the command taxonomy
    pub fn from_fault(code: u16, description: impl Into<String>) -> Self {
        let description = description.into();
        if UNSUPPORTED_MEDIA_FAULTS.contains(&code) {
            ControlError::UnsupportedMedia { code, description }
        } else {
            ControlError::InvalidState { code, description }
        }
    }

    pub(crate) fn worker_terminated() -> Self {
        ControlError::Transport("action worker terminated before completion".to_string())
    }
}

/// How transport failures of an action are reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Device faults go through the fault table
    Command,
    /// Every failure is a transport error
    Query,
}

impl FailurePolicy {
    pub fn map(self, failure: TransportFailure) -> ControlError {
        match (self, failure) {
            (FailurePolicy::Command, TransportFailure::Fault { code, description }) => {
                ControlError::from_fault(code, description)
            }
            (_, failure) => ControlError::Transport(failure.to_string()),
        }
    }
}

/// Type alias for results of control actions
pub type Result<T> = std::result::Result<T, ControlError>;

impl From<ValidationError> for ControlError {
    fn from(validation_error: ValidationError) -> Self {
        ControlError::InvalidArgument(validation_error.to_string())
    }
}
