//! Renderer event delivery
//!
//! [`EventHub`] implements [`cast_control::EventSubscriber`]: it runs an HTTP
//! callback server for NOTIFY requests, opens GENA subscriptions through the
//! SOAP client, renews them ahead of expiry and hands parsed `LastChange`
//! state to each subscription's listener.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cast_control::{EventSubscriber, ServiceEvent, Service};
//! use cast_device::{Capability, DeviceDescriptor, RawDevice, RawService};
//! use cast_events::{EventConfig, EventHub};
//!
//! let raw = RawDevice::new("uuid:tv-1", "Living Room TV")
//!     .with_location("http://192.168.1.20:49152/description.xml")
//!     .with_service(
//!         RawService::new(
//!             "urn:schemas-upnp-org:service:AVTransport:1",
//!             "urn:upnp-org:serviceId:AVTransport",
//!             "/AVTransport/control",
//!         )
//!         .with_event_sub_url("/AVTransport/event"),
//!     );
//! let descriptor = DeviceDescriptor::from_raw(&raw)?;
//! let endpoint = descriptor.endpoint(Capability::AvControl).unwrap();
//!
//! let hub = EventHub::new(EventConfig::default())?;
//! let subscription = hub.subscribe(
//!     descriptor.id(),
//!     Service::AVTransport,
//!     endpoint,
//!     Arc::new(|event: &ServiceEvent| println!("{:?}", event.changes.transport_state())),
//! )?;
//! hub.unsubscribe(&subscription)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
mod hub;
pub mod router;
mod server;

pub use config::EventConfig;
pub use error::{EventError, Result};
pub use hub::EventHub;
pub use router::{EventRouter, NotificationPayload, RouteOutcome};
pub use server::{detect_local_ip, CallbackServer};
