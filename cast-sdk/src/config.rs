//! Configuration for a [`CastSystem`](crate::CastSystem)

use std::net::IpAddr;
use std::time::Duration;

use cast_events::EventConfig;

use crate::error::SdkError;

/// Settings for the transport, the action executor, liveness sweeps and
/// event subscriptions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastConfig {
    /// Time allowed to open a connection to a device
    /// Default: 5 seconds
    pub connect_timeout: Duration,

    /// Time allowed for a device to answer an action
    /// Default: 10 seconds
    pub read_timeout: Duration,

    /// Worker threads of the action executor
    /// Default: 4
    pub worker_threads: usize,

    /// Devices not re-announced within this age are expired by
    /// [`CastSystem::expire_stale`](crate::CastSystem::expire_stale)
    /// Default: 1800 seconds (the usual SSDP max-age)
    pub max_age: Duration,

    /// Ports the event callback server may bind
    /// Default: 3400-3500
    pub event_port_range: (u16, u16),

    /// Address renderers should send events to; detected when unset
    pub callback_host: Option<IpAddr>,

    /// Timeout requested for event subscriptions, renewed automatically
    /// Default: 1800 seconds
    pub subscription_timeout: Duration,
}

impl Default for CastConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            worker_threads: 4,
            max_age: Duration::from_secs(1800),
            event_port_range: (3400, 3500),
            callback_host: None,
            subscription_timeout: Duration::from_secs(1800),
        }
    }
}

impl CastConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Short timeouts and fast expiry, for interactive controllers
    pub fn responsive() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            read_timeout: Duration::from_secs(4),
            max_age: Duration::from_secs(120),
            ..Default::default()
        }
    }

    /// A single executor thread, for constrained hosts
    pub fn resource_efficient() -> Self {
        Self {
            worker_threads: 1,
            ..Default::default()
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_event_port_range(mut self, start: u16, end: u16) -> Self {
        self.event_port_range = (start, end);
        self
    }

    pub fn with_callback_host(mut self, host: IpAddr) -> Self {
        self.callback_host = Some(host);
        self
    }

    pub fn with_subscription_timeout(mut self, timeout: Duration) -> Self {
        self.subscription_timeout = timeout;
        self
    }

    /// Settings handed to the event hub
    pub fn event_config(&self) -> EventConfig {
        EventConfig {
            port_range: self.event_port_range,
            callback_host: self.callback_host,
            subscription_timeout: self.subscription_timeout,
            ..EventConfig::default()
        }
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<(), SdkError> {
        if self.connect_timeout == Duration::ZERO {
            return Err(SdkError::Configuration(
                "Connect timeout must be greater than 0".to_string(),
            ));
        }

        if self.read_timeout == Duration::ZERO {
            return Err(SdkError::Configuration(
                "Read timeout must be greater than 0".to_string(),
            ));
        }

        if self.worker_threads == 0 {
            return Err(SdkError::Configuration(
                "Worker threads must be greater than 0".to_string(),
            ));
        }

        if self.max_age == Duration::ZERO {
            return Err(SdkError::Configuration(
                "Max age must be greater than 0".to_string(),
            ));
        }

        self.event_config()
            .validate()
            .map_err(|e| SdkError::Configuration(e.to_string()))?;

        Ok(())
    }
}
