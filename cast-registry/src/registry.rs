//! Sync-first device registry
//!
//! Tracks which renderers are currently visible and turns the raw, possibly
//! repetitive notifications of a discovery provider into stable
//! added/removed events.

use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use cast_device::{DeviceDescriptor, DeviceId, DevicePresence, RawDevice};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{RegistryError, Result};
use crate::observer::{Observers, RegistryObserver};
use crate::worker::{spawn_dispatch_worker, Command};

#[derive(Debug, Clone)]
struct RegistryEntry {
    descriptor: DeviceDescriptor,
    last_seen: Instant,
}

type Entries = Arc<DashMap<DeviceId, RegistryEntry>>;

/// The set of currently visible devices
///
/// Intake methods may be called from any number of provider threads and
/// never fail. Each entry is mutated and its event enqueued under the same
/// per-device lock, so the dispatch order always matches the order of the
/// state changes.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use cast_device::{DeviceDescriptor, RawDevice};
/// use cast_registry::{DeviceRegistry, RegistryObserver};
///
/// struct Printer;
///
/// impl RegistryObserver for Printer {
///     fn on_device_added(&self, device: &DeviceDescriptor) {
///         println!("+ {}", device);
///     }
///     fn on_device_removed(&self, device: &DeviceDescriptor) {
///         println!("- {}", device);
///     }
/// }
///
/// let registry = DeviceRegistry::new()?;
/// registry.add_observer(Arc::new(Printer));
///
/// let tv = RawDevice::new("uuid:tv-1", "Living Room TV");
/// registry.on_device_appeared(&tv);
/// registry.on_device_appeared(&tv); // refresh only, no second event
/// registry.flush()?;
///
/// assert_eq!(registry.len(), 1);
/// # Ok::<(), cast_registry::RegistryError>(())
/// ```
pub struct DeviceRegistry {
    entries: Entries,
    observers: Observers,
    command_tx: mpsc::Sender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_thread: ThreadId,
}

impl DeviceRegistry {
    /// Create a registry and start its dispatch worker
    pub fn new() -> Result<Self> {
        let observers = Observers::default();
        let (command_tx, command_rx) = mpsc::channel();
        let worker = spawn_dispatch_worker(observers.clone(), command_rx)?;
        let worker_thread = worker.thread().id();

        Ok(Self {
            entries: Arc::new(DashMap::new()),
            observers,
            command_tx,
            worker: Mutex::new(Some(worker)),
            worker_thread,
        })
    }

    /// Register an observer; registering the same one twice has no effect
    ///
    /// The observer receives events enqueued after the dispatch worker picks
    /// up the change, never the event being delivered right now.
    pub fn add_observer(&self, observer: Arc<dyn RegistryObserver>) {
        if !self.observers.add(observer) {
            tracing::debug!("Observer already registered");
        }
    }

    /// Unregister an observer; unknown observers are ignored
    pub fn remove_observer(&self, observer: &Arc<dyn RegistryObserver>) {
        if !self.observers.remove(observer) {
            tracing::debug!("Observer was not registered");
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Intake: a provider saw `raw`
    ///
    /// A new identity is added and announced. A known identity has its
    /// last-seen time refreshed and its descriptor replaced; observers hear
    /// about it only if the content changed.
    pub fn on_device_appeared(&self, raw: &RawDevice) {
        let descriptor = match DeviceDescriptor::from_raw(raw) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                tracing::warn!("Dropping device record '{}': {}", raw.friendly_name, e);
                return;
            }
        };
        let now = Instant::now();

        match self.entries.entry(descriptor.id().clone()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.last_seen = now;
                if entry.descriptor.same_content(&descriptor) {
                    tracing::debug!("Refreshed {}", descriptor);
                    entry.descriptor = descriptor;
                } else {
                    let previous = std::mem::replace(&mut entry.descriptor, descriptor.clone());
                    self.enqueue(Command::Updated {
                        previous,
                        current: descriptor,
                    });
                }
            }
            Entry::Vacant(vacant) => {
                tracing::debug!("Device appeared: {}", descriptor);
                vacant.insert(RegistryEntry {
                    descriptor: descriptor.clone(),
                    last_seen: now,
                });
                self.enqueue(Command::Added(descriptor));
            }
        }
    }

    /// Intake: a provider reported `raw` gone
    ///
    /// Unknown identities are ignored.
    pub fn on_device_disappeared(&self, raw: &RawDevice) {
        let id = DeviceId::new(raw.udn.as_str());
        if id.as_str().is_empty() {
            tracing::warn!("Dropping disappearance without device identity");
            return;
        }

        match self.entries.entry(id) {
            Entry::Occupied(occupied) => {
                tracing::debug!("Device disappeared: {}", occupied.get().descriptor);
                self.enqueue(Command::Removed(occupied.get().descriptor.clone()));
                occupied.remove();
            }
            Entry::Vacant(vacant) => {
                tracing::debug!("Ignoring disappearance of unknown device {}", vacant.key());
            }
        }
    }

    /// Remove every entry not seen within `max_age`, announcing each removal
    pub fn expire_stale(&self, max_age: Duration) -> Vec<DeviceDescriptor> {
        let candidates: Vec<DeviceId> = self
            .entries
            .iter()
            .filter(|entry| entry.last_seen.elapsed() > max_age)
            .map(|entry| entry.key().clone())
            .collect();

        let mut expired = Vec::new();
        for id in candidates {
            // Re-check under the entry lock; it may have been refreshed since
            if let Entry::Occupied(occupied) = self.entries.entry(id) {
                if occupied.get().last_seen.elapsed() > max_age {
                    let descriptor = occupied.get().descriptor.clone();
                    tracing::debug!("Expiring stale device {}", descriptor);
                    self.enqueue(Command::Removed(descriptor.clone()));
                    occupied.remove();
                    expired.push(descriptor);
                }
            }
        }
        expired
    }

    /// Snapshot of the current devices, ordered by identity
    pub fn devices(&self) -> Vec<DeviceDescriptor> {
        let mut devices: Vec<DeviceDescriptor> = self
            .entries
            .iter()
            .map(|entry| entry.descriptor.clone())
            .collect();
        devices.sort_by(|a, b| a.id().cmp(b.id()));
        devices
    }

    pub fn device(&self, id: &DeviceId) -> Option<DeviceDescriptor> {
        self.entries.get(id).map(|entry| entry.descriptor.clone())
    }

    pub fn contains(&self, id: &DeviceId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn last_seen(&self, id: &DeviceId) -> Option<Instant> {
        self.entries.get(id).map(|entry| entry.last_seen)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A presence view sessions can hold without owning the registry
    pub fn presence(&self) -> RegistryPresence {
        RegistryPresence {
            entries: Arc::clone(&self.entries),
        }
    }

    /// Block until every event enqueued before this call has been delivered
    pub fn flush(&self) -> Result<()> {
        if thread::current().id() == self.worker_thread {
            return Err(RegistryError::CalledFromObserver);
        }
        let (ack_tx, ack_rx) = mpsc::channel();
        self.command_tx
            .send(Command::Flush(ack_tx))
            .map_err(|_| RegistryError::WorkerDisconnected)?;
        ack_rx.recv().map_err(|_| RegistryError::WorkerDisconnected)
    }

    /// Deliver pending events, then stop the dispatch worker
    ///
    /// Later intake still updates the device set but notifies nobody.
    pub fn shutdown(&self) -> Result<()> {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return Ok(());
        };

        let _ = self.command_tx.send(Command::Shutdown);
        if thread::current().id() == self.worker_thread {
            // Dropped from inside a callback; the loop exits on its own
            return Ok(());
        }
        handle
            .join()
            .map_err(|_| RegistryError::WorkerDisconnected)
    }

    fn enqueue(&self, command: Command) {
        if self.command_tx.send(command).is_err() {
            tracing::debug!("Dispatch worker stopped; event not delivered");
        }
    }
}

impl Drop for DeviceRegistry {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::warn!("Registry shutdown failed: {}", e);
        }
    }
}

/// Cloneable [`DevicePresence`] view over a registry's entries
#[derive(Clone)]
pub struct RegistryPresence {
    entries: Entries,
}

impl DevicePresence for RegistryPresence {
    fn is_present(&self, id: &DeviceId) -> bool {
        self.entries.contains_key(id)
    }
}
