//! Device model for DLNA media renderers
//!
//! This crate holds the leaf data types shared by the registry and the control
//! layer: the raw records a discovery provider reports, and the immutable
//! [`DeviceDescriptor`] built from them.
//!
//! # Quick Start
//!
//! ```
//! use cast_device::{Capability, DeviceDescriptor, RawDevice, RawService};
//!
//! let raw = RawDevice::new("uuid:5f9ec1b3-ed59", "Living Room TV")
//!     .with_location("http://192.168.1.20:49152/description.xml")
//!     .with_service(RawService::new(
//!         "urn:schemas-upnp-org:service:AVTransport:1",
//!         "urn:upnp-org:serviceId:AVTransport",
//!         "/AVTransport/control",
//!     ));
//!
//! let device = DeviceDescriptor::from_raw(&raw).unwrap();
//! assert!(device.supports(Capability::AvControl));
//! assert!(!device.supports(Capability::RendererControl));
//! ```
//!
//! Description documents fetched by a provider can be turned into records
//! directly with [`RawDevice::from_description_xml`].

mod descriptor;
pub mod device;
mod error;

pub use descriptor::{Capability, DeviceDescriptor, DeviceId, ServiceEndpoint};
pub use device::{RawDevice, RawService};
pub use error::{DeviceError, Result};

/// Answers whether a device is currently listed as present.
///
/// The registry implements this so control sessions can fail fast for
/// devices that have gone away, without depending on the registry itself.
pub trait DevicePresence: Send + Sync {
    fn is_present(&self, id: &DeviceId) -> bool;
}

impl<F> DevicePresence for F
where
    F: Fn(&DeviceId) -> bool + Send + Sync,
{
    fn is_present(&self, id: &DeviceId) -> bool {
        self(id)
    }
}
