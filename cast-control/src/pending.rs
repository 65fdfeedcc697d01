//! Completion tokens for control actions

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use cast_device::DeviceId;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{ControlError, Result};
use crate::executor::ExecutorHandle;

/// The outcome of one issued command, resolved exactly once
///
/// Await it, block on it with [`wait`](Self::wait), poll it with
/// [`try_result`](Self::try_result) or hand it a callback with
/// [`on_complete`](Self::on_complete). Dropping it discards the result; the
/// command itself still runs.
#[derive(Debug)]
pub struct PendingAction<T> {
    command: &'static str,
    device: DeviceId,
    created_at: Instant,
    receiver: oneshot::Receiver<Result<T>>,
    executor: ExecutorHandle,
    delivered: bool,
}

/// Sending half held by the exchange task
pub(crate) type Completion<T> = oneshot::Sender<Result<T>>;

impl<T: Send + 'static> PendingAction<T> {
    pub(crate) fn channel(
        command: &'static str,
        device: DeviceId,
        executor: ExecutorHandle,
    ) -> (Completion<T>, Self) {
        let (sender, receiver) = oneshot::channel();
        let pending = Self {
            command,
            device,
            created_at: Instant::now(),
            receiver,
            executor,
            delivered: false,
        };
        (sender, pending)
    }

    /// A token that is already resolved with `error`
    pub(crate) fn failed(
        command: &'static str,
        device: DeviceId,
        executor: ExecutorHandle,
        error: ControlError,
    ) -> Self {
        let (sender, pending) = Self::channel(command, device, executor);
        let _ = sender.send(Err(error));
        pending
    }

    /// The command name, e.g. "set_volume"
    pub fn command(&self) -> &'static str {
        self.command
    }

    /// The device the command was issued to
    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Block the current thread until the command resolves
    ///
    /// Must not be called from within an async context, including
    /// [`on_complete`](Self::on_complete) callbacks; `.await` instead.
    pub fn wait(self) -> Result<T> {
        self.receiver
            .blocking_recv()
            .unwrap_or_else(|_| Err(ControlError::worker_terminated()))
    }

    /// Take the result if the command has resolved
    ///
    /// Returns `None` while the command is running and after the result has
    /// been taken once.
    pub fn try_result(&mut self) -> Option<Result<T>> {
        if self.delivered {
            return None;
        }
        let result = match self.receiver.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => Err(ControlError::worker_terminated()),
        };
        self.delivered = true;
        Some(result)
    }

    /// Run `callback` with the result once the command resolves
    ///
    /// The callback runs exactly once. Normally that happens on an executor
    /// thread. When the executor is already gone, or shuts down before the
    /// callback gets its turn, it runs on whichever thread notices: with the
    /// result if one was already delivered, otherwise with a transport error.
    ///
    /// Callbacks should not block for long, and must not call
    /// [`wait`](Self::wait) on another action: executor threads are async
    /// context, where blocking on a result panics.
    pub fn on_complete<F>(self, callback: F)
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        let command = self.command;
        let mut guard = CallbackGuard {
            receiver: self.receiver,
            callback: Some(callback),
        };

        if !self.executor.is_running() {
            debug!("Action executor is gone; running {} callback inline", command);
            guard.finish_now();
            return;
        }

        let task = async move {
            let result = (&mut guard.receiver)
                .await
                .unwrap_or_else(|_| Err(ControlError::worker_terminated()));
            guard.fire(result);
        };
        if !self.executor.spawn(task) {
            debug!("Action executor refused {} callback", command);
        }
    }
}

/// Owns an `on_complete` callback until it has run
///
/// If the task holding it is dropped unpolled, `Drop` delivers whatever the
/// receiver already holds.
struct CallbackGuard<T, F>
where
    F: FnOnce(Result<T>),
{
    receiver: oneshot::Receiver<Result<T>>,
    callback: Option<F>,
}

impl<T, F> CallbackGuard<T, F>
where
    F: FnOnce(Result<T>),
{
    fn fire(&mut self, result: Result<T>) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }

    fn finish_now(&mut self) {
        if self.callback.is_none() {
            return;
        }
        let result = match self.receiver.try_recv() {
            Ok(result) => result,
            Err(_) => Err(ControlError::worker_terminated()),
        };
        self.fire(result);
    }
}

impl<T, F> Drop for CallbackGuard<T, F>
where
    F: FnOnce(Result<T>),
{
    fn drop(&mut self) {
        self.finish_now();
    }
}

impl<T> Future for PendingAction<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|received| {
            received.unwrap_or_else(|_| Err(ControlError::worker_terminated()))
        })
    }
}
