//! CastSystem - Main entry point for the SDK
//!
//! Wires the device registry, the SOAP transport, the action executor and
//! the event hub together behind a sync-first API.

use std::sync::Arc;

use cast_control::{ActionExecutor, ActionTransport, ControlSession, SoapTransport};
use cast_device::{DeviceDescriptor, DeviceId, RawDevice};
use cast_events::EventHub;
use cast_registry::{DeviceRegistry, RegistryObserver};
use soap_client::SoapClient;

use crate::config::CastConfig;
use crate::error::{Result, SdkError};

/// Main system entry point
///
/// A discovery provider feeds [`on_device_appeared`](Self::on_device_appeared)
/// and [`on_device_disappeared`](Self::on_device_disappeared); the
/// application observes the registry and opens sessions on devices it picks.
///
/// # Example
///
/// ```rust,no_run
/// use dlna_cast::{CastConfig, CastSystem, RawDevice, RawService};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let system = CastSystem::new(CastConfig::default())?;
///
///     let tv = RawDevice::new("uuid:tv-1", "Living Room TV")
///         .with_location("http://192.168.1.20:49152/description.xml")
///         .with_service(RawService::new(
///             "urn:schemas-upnp-org:service:AVTransport:1",
///             "urn:upnp-org:serviceId:AVTransport",
///             "/AVTransport/control",
///         ));
///     system.on_device_appeared(&tv);
///
///     let session = system.session_by_id(&"tv-1".into())?;
///     session.cast("http://192.168.1.5/movie.mp4", "").wait()?;
///     session.play().wait()?;
///     Ok(())
/// }
/// ```
pub struct CastSystem {
    config: CastConfig,
    registry: DeviceRegistry,
    transport: Arc<dyn ActionTransport>,
    executor: ActionExecutor,
    events: Arc<EventHub>,
}

impl CastSystem {
    /// Create a system that talks SOAP over HTTP
    pub fn new(config: CastConfig) -> Result<Self> {
        let transport = Arc::new(SoapTransport::with_timeouts(
            config.connect_timeout,
            config.read_timeout,
        ));
        Self::with_transport(config, transport)
    }

    /// Create a system with a custom action transport
    pub fn with_transport(config: CastConfig, transport: Arc<dyn ActionTransport>) -> Result<Self> {
        config.validate()?;

        let registry = DeviceRegistry::new()?;
        let executor = ActionExecutor::new(config.worker_threads)?;
        let events = Arc::new(EventHub::with_client(
            config.event_config(),
            SoapClient::with_timeouts(config.connect_timeout, config.read_timeout),
        )?);

        tracing::info!(
            "Cast system ready ({} executor threads, max age {:?})",
            config.worker_threads,
            config.max_age
        );

        Ok(Self {
            config,
            registry,
            transport,
            executor,
            events,
        })
    }

    pub fn config(&self) -> &CastConfig {
        &self.config
    }

    /// Event hub shared by all sessions of this system
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Currently visible devices, ordered by identity
    pub fn devices(&self) -> Vec<DeviceDescriptor> {
        self.registry.devices()
    }

    pub fn device(&self, id: &DeviceId) -> Option<DeviceDescriptor> {
        self.registry.device(id)
    }

    pub fn add_observer(&self, observer: Arc<dyn RegistryObserver>) {
        self.registry.add_observer(observer);
    }

    pub fn remove_observer(&self, observer: &Arc<dyn RegistryObserver>) {
        self.registry.remove_observer(observer);
    }

    /// Discovery intake; never fails
    pub fn on_device_appeared(&self, raw: &RawDevice) {
        self.registry.on_device_appeared(raw);
    }

    /// Discovery intake; never fails
    pub fn on_device_disappeared(&self, raw: &RawDevice) {
        self.registry.on_device_disappeared(raw);
    }

    /// Expire devices not re-announced within the configured max age
    pub fn expire_stale(&self) -> Vec<DeviceDescriptor> {
        self.registry.expire_stale(self.config.max_age)
    }

    /// Open a session bound to `descriptor`
    ///
    /// The descriptor does not have to be registered; commands fail with
    /// `DeviceUnavailable` while it is absent from the registry. Sessions
    /// subscribe to events through the system's [`EventHub`].
    pub fn session(&self, descriptor: &DeviceDescriptor) -> ControlSession {
        ControlSession::with_events(
            descriptor.clone(),
            Arc::clone(&self.transport),
            Arc::new(self.registry.presence()),
            self.executor.handle(),
            self.events.clone(),
        )
    }

    /// Open a session for a registered device
    pub fn session_by_id(&self, id: &DeviceId) -> Result<ControlSession> {
        let descriptor = self
            .registry
            .device(id)
            .ok_or_else(|| SdkError::DeviceNotFound(id.clone()))?;
        Ok(self.session(&descriptor))
    }
}
