//! Operation framework for renderer actions
//!
//! Every UPnP action is a zero-sized operation type with a typed request and
//! response. Requests validate themselves before any arguments are built, so
//! an invalid request never reaches a transport.

pub mod macros;

use crate::error::ControlError;
use crate::service::Service;
use crate::transport::{ActionArgs, ActionResponse};

/// Validation error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Parameter '{parameter}' value '{value}' is out of range ({min}..={max})")]
    RangeError {
        parameter: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("Parameter '{parameter}' value '{value}' is invalid: {reason}")]
    InvalidValue {
        parameter: String,
        value: String,
        reason: String,
    },
}

impl ValidationError {
    pub fn range_error(
        parameter: &str,
        min: impl std::fmt::Display,
        max: impl std::fmt::Display,
        value: impl std::fmt::Display,
    ) -> Self {
        Self::RangeError {
            parameter: parameter.to_string(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    pub fn invalid_value(parameter: &str, value: impl std::fmt::Display, reason: &str) -> Self {
        Self::InvalidValue {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Trait for request types that can be checked before sending
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// A UPnP action with typed request and response
pub trait UPnPOperation {
    type Request: Validate + Send + 'static;

    type Response: Send + 'static;

    /// The UPnP service this operation belongs to
    const SERVICE: Service;

    /// The SOAP action name for this operation
    const ACTION: &'static str;

    /// Validate the request and build its ordered argument list
    fn build_args(request: &Self::Request) -> Result<ActionArgs, ValidationError>;

    /// Extract the typed response from the device's output arguments
    fn parse_response(response: &ActionResponse) -> Result<Self::Response, ControlError>;
}

/// Build one `(name, value)` action argument
pub fn arg(name: &str, value: impl ToString) -> (String, String) {
    (name.to_string(), value.to_string())
}

/// Look up a required output argument and parse it
pub fn required<T: std::str::FromStr>(
    response: &ActionResponse,
    action: &str,
    name: &str,
) -> Result<T, ControlError> {
    let raw = response.get(name).ok_or_else(|| {
        ControlError::Transport(format!("{} response is missing {}", action, name))
    })?;
    raw.trim().parse().map_err(|_| {
        ControlError::Transport(format!("{} response has malformed {}: '{}'", action, name, raw))
    })
}
