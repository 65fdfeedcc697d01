//! # dlna-cast - control point core for DLNA media renderers
//!
//! Tracks renderers reported by a discovery provider and drives playback and
//! output settings on them through asynchronous, typed actions. Sessions can
//! also subscribe to renderer state changes with
//! [`ControlSession::subscribe`]:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dlna_cast::prelude::*;
//!
//! struct Picker;
//!
//! impl RegistryObserver for Picker {
//!     fn on_device_added(&self, device: &DeviceDescriptor) {
//!         println!("found {}", device);
//!     }
//!     fn on_device_removed(&self, device: &DeviceDescriptor) {
//!         println!("lost {}", device);
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     dlna_cast::logging::init_logging_from_env()?;
//!
//!     let system = CastSystem::new(CastConfig::responsive())?;
//!     system.add_observer(Arc::new(Picker));
//!
//!     // ... a discovery provider calls system.on_device_appeared(&raw) ...
//!
//!     for device in system.devices() {
//!         let session = system.session(&device);
//!         session.set_volume(20).on_complete(|result| println!("volume: {:?}", result));
//!         session
//!             .subscribe(Service::RenderingControl, |event: &ServiceEvent| {
//!                 println!("volume now {:?}", event.changes.volume());
//!             })
//!             .wait()?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! discovery provider
//!     ↓ on_device_appeared / on_device_disappeared
//! cast-registry (device set, observer fan-out)
//!     ↓ observers pick a device
//! cast-control (ControlSession → ActionTransport, EventSubscriber)
//!     ↓                               ↓
//! soap-client (SOAP over HTTP)    cast-events (NOTIFY server, renewals)
//!                                     ↓
//!                                 soap-client (GENA SUBSCRIBE)
//! ```

pub mod config;
pub mod error;
pub mod logging;
mod system;

pub use config::CastConfig;
pub use error::{Result, SdkError};
pub use system::CastSystem;

pub use cast_control::{
    ActionArgs, ActionResponse, ActionTransport, CommandSlot, ContentHandle, ControlError,
    ControlSession, EventListener, EventSubscriber, FailureKind, LastChange, MediaInfo,
    PendingAction, PlaybackState, PositionInfo, Service, ServiceEvent, SoapTransport,
    StateVariable, Subscription, TransportFailure,
};
pub use cast_events::{EventConfig, EventError, EventHub};
pub use cast_device::{
    Capability, DeviceDescriptor, DeviceId, DevicePresence, RawDevice, RawService, ServiceEndpoint,
};
pub use cast_registry::{DeviceRegistry, RegistryError, RegistryObserver, RegistryPresence};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CastConfig, CastSystem, Capability, ControlError, ControlSession, DeviceDescriptor,
        DeviceId, PendingAction, PlaybackState, RawDevice, RawService, RegistryObserver, SdkError,
        Service, ServiceEvent, Subscription,
    };
}
