//! # Device Registry
//!
//! A sync-first registry of visible DLNA renderers with debounced observer
//! fan-out.
//!
//! A discovery provider reports raw appearance and disappearance
//! notifications from its own threads. The registry deduplicates them and
//! hands the resulting stable `added`/`removed` events to observers on one
//! background dispatch thread.
//!
//! ## Guarantees
//!
//! - Per device, observers see `added` and `removed` alternate, starting with
//!   `added`
//! - Observers registered while an event is being delivered receive later
//!   events only
//! - A panicking observer is skipped for that event and logged; other
//!   observers and the device set are unaffected

pub mod error;
mod observer;
mod registry;
mod worker;

// Re-export main types for convenience
pub use error::{RegistryError, Result};
pub use observer::RegistryObserver;
pub use registry::{DeviceRegistry, RegistryPresence};

// Re-export commonly used types from dependencies
pub use cast_device::{DeviceDescriptor, DeviceId, RawDevice};

/// Prelude module for convenient imports
///
/// ```rust
/// use cast_registry::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        DeviceDescriptor, DeviceId, DeviceRegistry, RawDevice, RegistryError, RegistryObserver,
        RegistryPresence, Result,
    };
}
