//! Background dispatch thread for observer fan-out
//!
//! Intake threads enqueue commands; this thread delivers them to a fresh
//! snapshot of the observer list, one event at a time, in channel order.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use cast_device::DeviceDescriptor;

use crate::observer::{Observers, RegistryObserver};

/// Commands sent from the registry to the dispatch worker
pub(crate) enum Command {
    Added(DeviceDescriptor),
    Removed(DeviceDescriptor),
    Updated {
        previous: DeviceDescriptor,
        current: DeviceDescriptor,
    },
    /// Acknowledge once everything queued before it has been delivered
    Flush(mpsc::Sender<()>),
    Shutdown,
}

pub(crate) fn spawn_dispatch_worker(
    observers: Observers,
    command_rx: mpsc::Receiver<Command>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("dlna-cast-registry".to_string())
        .spawn(move || run_dispatch_loop(observers, command_rx))
}

fn run_dispatch_loop(observers: Observers, command_rx: mpsc::Receiver<Command>) {
    tracing::info!("Registry dispatch worker started");

    while let Ok(command) = command_rx.recv() {
        match command {
            Command::Added(device) => {
                tracing::debug!("Dispatching added: {}", device);
                deliver(&observers, "added", |o| o.on_device_added(&device));
            }
            Command::Removed(device) => {
                tracing::debug!("Dispatching removed: {}", device);
                deliver(&observers, "removed", |o| o.on_device_removed(&device));
            }
            Command::Updated { previous, current } => {
                tracing::debug!("Dispatching updated: {}", current);
                deliver(&observers, "updated", |o| o.on_device_updated(&previous, &current));
            }
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
            Command::Shutdown => {
                tracing::info!("Dispatch worker received shutdown command");
                break;
            }
        }
    }

    tracing::info!("Registry dispatch worker shut down");
}

fn deliver<F>(observers: &Observers, event: &str, callback: F)
where
    F: Fn(&dyn RegistryObserver),
{
    for observer in observers.snapshot() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(observer.as_ref())));
        if outcome.is_err() {
            tracing::warn!("Observer panicked while handling {} event; skipped", event);
        }
    }
}
