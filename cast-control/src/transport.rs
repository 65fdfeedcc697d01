//! The request/response seam between sessions and devices

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use cast_device::ServiceEndpoint;
use soap_client::{SoapClient, SoapError};

/// Ordered `(name, value)` arguments of one action
pub type ActionArgs = Vec<(String, String)>;

/// Output arguments returned by a device for one action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionResponse {
    values: HashMap<String, String>,
}

impl ActionResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Category of a communication failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Network,
    Timeout,
    Protocol,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Network => "network",
            FailureKind::Timeout => "timeout",
            FailureKind::Protocol => "protocol",
        };
        f.write_str(name)
    }
}

/// Why an exchange did not produce a response
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFailure {
    #[error("{kind} failure: {message}")]
    Communication { kind: FailureKind, message: String },

    #[error("device fault {code}: {description}")]
    Fault { code: u16, description: String },
}

impl From<SoapError> for TransportFailure {
    fn from(error: SoapError) -> Self {
        match error {
            SoapError::Network(message) => TransportFailure::Communication {
                kind: FailureKind::Network,
                message,
            },
            SoapError::Timeout(message) => TransportFailure::Communication {
                kind: FailureKind::Timeout,
                message,
            },
            SoapError::Parse(message) => TransportFailure::Communication {
                kind: FailureKind::Protocol,
                message,
            },
            SoapError::Fault { code, description } => TransportFailure::Fault { code, description },
        }
    }
}

/// A single blocking request/response exchange against a control endpoint
///
/// Implementations must be safe to call from several threads at once; each
/// call owns its own request and response.
pub trait ActionTransport: Send + Sync {
    fn invoke(
        &self,
        endpoint: &ServiceEndpoint,
        action: &str,
        args: &ActionArgs,
    ) -> Result<ActionResponse, TransportFailure>;
}

/// [`ActionTransport`] that speaks SOAP over HTTP
#[derive(Debug, Clone, Default)]
pub struct SoapTransport {
    client: SoapClient,
}

impl SoapTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeouts(connect: Duration, read: Duration) -> Self {
        Self {
            client: SoapClient::with_timeouts(connect, read),
        }
    }

    pub fn with_client(client: SoapClient) -> Self {
        Self { client }
    }
}

impl ActionTransport for SoapTransport {
    fn invoke(
        &self,
        endpoint: &ServiceEndpoint,
        action: &str,
        args: &ActionArgs,
    ) -> Result<ActionResponse, TransportFailure> {
        let response = self
            .client
            .call(&endpoint.control_url, &endpoint.service_type, action, args)?;
        Ok(ActionResponse::from_pairs(soap_client::response_values(&response)))
    }
}
