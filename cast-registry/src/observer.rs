use std::sync::{Arc, PoisonError, RwLock};

use cast_device::DeviceDescriptor;

/// Receives stable device presence changes
///
/// All callbacks run on the registry's single dispatch thread, one event at a
/// time. Per device, `added` and `removed` strictly alternate, starting with
/// `added`.
pub trait RegistryObserver: Send + Sync {
    fn on_device_added(&self, device: &DeviceDescriptor);

    fn on_device_removed(&self, device: &DeviceDescriptor);

    /// A present device re-announced itself with different content
    fn on_device_updated(&self, _previous: &DeviceDescriptor, _current: &DeviceDescriptor) {}
}

/// Registered observers, compared by allocation
#[derive(Clone, Default)]
pub(crate) struct Observers {
    list: Arc<RwLock<Vec<Arc<dyn RegistryObserver>>>>,
}

impl Observers {
    /// Returns false if the observer was already registered
    pub fn add(&self, observer: Arc<dyn RegistryObserver>) -> bool {
        let mut list = self.list.write().unwrap_or_else(PoisonError::into_inner);
        if list.iter().any(|existing| same_observer(existing, &observer)) {
            return false;
        }
        list.push(observer);
        true
    }

    /// Returns false if the observer was not registered
    pub fn remove(&self, observer: &Arc<dyn RegistryObserver>) -> bool {
        let mut list = self.list.write().unwrap_or_else(PoisonError::into_inner);
        let before = list.len();
        list.retain(|existing| !same_observer(existing, observer));
        list.len() != before
    }

    pub fn snapshot(&self) -> Vec<Arc<dyn RegistryObserver>> {
        self.list
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.list.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

fn same_observer(a: &Arc<dyn RegistryObserver>, b: &Arc<dyn RegistryObserver>) -> bool {
    // Data pointers only; vtable pointers may differ across codegen units
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
