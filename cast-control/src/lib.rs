//! Typed, asynchronous control actions for DLNA media renderers
//!
//! A [`ControlSession`] binds one [`DeviceDescriptor`](cast_device::DeviceDescriptor)
//! to an [`ActionTransport`]. Each command returns a [`PendingAction`] right
//! away and resolves exactly once with a value or a [`ControlError`].
//! Sessions built with an [`EventSubscriber`] can also follow renderer state
//! through [`ControlSession::subscribe`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cast_control::{ActionExecutor, ControlSession, SoapTransport};
//! use cast_device::{DeviceDescriptor, DeviceId, RawDevice, RawService};
//!
//! let raw = RawDevice::new("uuid:tv-1", "Living Room TV").with_service(RawService::new(
//!     "urn:schemas-upnp-org:service:RenderingControl:1",
//!     "urn:upnp-org:serviceId:RenderingControl",
//!     "http://192.168.1.20:49152/RenderingControl/control",
//! ));
//! let descriptor = DeviceDescriptor::from_raw(&raw)?;
//!
//! let executor = ActionExecutor::new(2)?;
//! let session = ControlSession::new(
//!     descriptor,
//!     Arc::new(SoapTransport::new()),
//!     Arc::new(|_: &DeviceId| true),
//!     executor.handle(),
//! );
//!
//! let level = session.set_volume(30).wait()?;
//! assert_eq!(level, 30);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod events;
mod executor;
pub mod operation;
mod pending;
pub mod service;
pub mod services;
mod session;
pub mod time;
pub mod transport;
mod types;

pub use error::{ControlError, FailurePolicy, Result};
pub use events::{
    EventListener, EventSubscriber, LastChange, ServiceEvent, StateVariable, Subscription,
};
pub use executor::{ActionExecutor, ExecutorHandle};
pub use operation::{UPnPOperation, Validate, ValidationError};
pub use pending::PendingAction;
pub use service::Service;
pub use session::{CommandSlot, ControlSession};
pub use transport::{
    ActionArgs, ActionResponse, ActionTransport, FailureKind, SoapTransport, TransportFailure,
};
pub use types::{ContentHandle, MediaInfo, PlaybackState, PositionInfo};
