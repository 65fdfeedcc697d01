//! Runtime that runs blocking exchanges off the caller's thread

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, info};

/// Owns the tokio runtime that action exchanges run on
///
/// Sessions only hold an [`ExecutorHandle`]. Once the executor is dropped,
/// actions still in flight resolve with a transport error.
pub struct ActionExecutor {
    runtime: Option<Runtime>,
    alive: Arc<AtomicBool>,
}

impl ActionExecutor {
    pub fn new(worker_threads: usize) -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("dlna-cast-action")
            .enable_all()
            .build()?;

        info!("Action executor started with {} worker threads", worker_threads.max(1));
        Ok(Self {
            runtime: Some(runtime),
            alive: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn handle(&self) -> ExecutorHandle {
        ExecutorHandle {
            handle: self
                .runtime
                .as_ref()
                .map(|runtime| runtime.handle().clone()),
            alive: Arc::clone(&self.alive),
        }
    }
}

impl Drop for ActionExecutor {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        if let Some(runtime) = self.runtime.take() {
            debug!("Shutting down action executor");
            runtime.shutdown_background();
        }
    }
}

/// Cloneable handle used to spawn work on an [`ActionExecutor`]
#[derive(Clone, Debug)]
pub struct ExecutorHandle {
    handle: Option<Handle>,
    alive: Arc<AtomicBool>,
}

impl ExecutorHandle {
    /// Whether the owning executor still accepts work
    pub fn is_running(&self) -> bool {
        self.handle.is_some() && self.alive.load(Ordering::SeqCst)
    }

    /// Spawn a task; returns false when the executor is gone
    ///
    /// A refused future is dropped without being polled. A future accepted
    /// just before shutdown may also be dropped unpolled, so anything that
    /// must run exactly once has to finish its work in `Drop` too.
    pub(crate) fn spawn<F>(&self, future: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match &self.handle {
            Some(handle) if self.alive.load(Ordering::SeqCst) => {
                handle.spawn(future);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_handle_tracks_executor_lifetime() {
        let executor = ActionExecutor::new(1).unwrap();
        let handle = executor.handle();
        assert!(handle.is_running());

        let (tx, rx) = mpsc::channel();
        assert!(handle.spawn(async move {
            let _ = tx.send(());
        }));
        rx.recv_timeout(Duration::from_secs(2)).unwrap();

        drop(executor);
        assert!(!handle.is_running());
        assert!(!handle.spawn(async {}));
    }
}
