//! Per-device command surface

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use cast_device::{DeviceDescriptor, DeviceId, DevicePresence, ServiceEndpoint};
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{ControlError, FailurePolicy, Result};
use crate::events::{EventListener, EventSubscriber, Subscription};
use crate::executor::ExecutorHandle;
use crate::operation::{UPnPOperation, Validate};
use crate::pending::PendingAction;
use crate::service::Service;
use crate::services::av_transport::{
    get_media_info_operation, get_position_info_operation, get_transport_info_operation,
    pause_operation, play_operation, seek_operation, set_av_transport_uri_operation,
    stop_operation, GetMediaInfoOperation, GetPositionInfoOperation, GetTransportInfoOperation,
    PauseOperation, PlayOperation, SeekOperation, SetAvTransportUriOperation, StopOperation,
};
use crate::services::rendering_control::{
    get_brightness_operation, get_mute_operation, get_volume_operation, parse_upnp_bool,
    set_brightness_operation, set_mute_operation, set_volume_operation, GetBrightnessOperation,
    GetMuteOperation, GetVolumeOperation, SetBrightnessOperation, SetMuteOperation,
    SetVolumeOperation, MASTER_CHANNEL,
};
use crate::time::{is_unreported, parse_rel_time};
use crate::transport::ActionTransport;
use crate::types::{ContentHandle, MediaInfo, PlaybackState, PositionInfo};

/// Unit of per-session serialization
///
/// Commands on the same slot run one at a time in issue order; commands on
/// different slots may be in flight together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandSlot {
    Load,
    Transport,
    Seek,
    Position,
    Media,
    TransportState,
    Volume,
    Mute,
    Brightness,
    Events,
}

/// Commands for one renderer, bound to it for life
///
/// Every method returns at once with a [`PendingAction`]. Checks run in a
/// fixed order: arguments, declared capability, presence, and only then the
/// exchange. A failed check resolves the action without touching the network.
#[derive(Clone)]
pub struct ControlSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    descriptor: DeviceDescriptor,
    transport: Arc<dyn ActionTransport>,
    presence: Arc<dyn DevicePresence>,
    executor: ExecutorHandle,
    events: Option<Arc<dyn EventSubscriber>>,
    slots: Mutex<HashMap<CommandSlot, oneshot::Receiver<()>>>,
}

impl ControlSession {
    pub fn new(
        descriptor: DeviceDescriptor,
        transport: Arc<dyn ActionTransport>,
        presence: Arc<dyn DevicePresence>,
        executor: ExecutorHandle,
    ) -> Self {
        Self::build(descriptor, transport, presence, executor, None)
    }

    /// A session that can also subscribe to renderer events through `events`
    pub fn with_events(
        descriptor: DeviceDescriptor,
        transport: Arc<dyn ActionTransport>,
        presence: Arc<dyn DevicePresence>,
        executor: ExecutorHandle,
        events: Arc<dyn EventSubscriber>,
    ) -> Self {
        Self::build(descriptor, transport, presence, executor, Some(events))
    }

    fn build(
        descriptor: DeviceDescriptor,
        transport: Arc<dyn ActionTransport>,
        presence: Arc<dyn DevicePresence>,
        executor: ExecutorHandle,
        events: Option<Arc<dyn EventSubscriber>>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                descriptor,
                transport,
                presence,
                executor,
                events,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.inner.descriptor
    }

    pub fn device_id(&self) -> &DeviceId {
        self.inner.descriptor.id()
    }

    // AV control

    /// Load `uri` with DIDL-Lite `metadata` for playback
    pub fn cast(&self, uri: &str, metadata: &str) -> PendingAction<ContentHandle> {
        let handle = ContentHandle::new(uri);
        self.submit::<SetAvTransportUriOperation, _, _>(
            "cast",
            CommandSlot::Load,
            set_av_transport_uri_operation(uri.to_string(), metadata.to_string()),
            FailurePolicy::Command,
            move |()| Ok(handle),
        )
    }

    pub fn play(&self) -> PendingAction<()> {
        self.submit::<PlayOperation, _, _>(
            "play",
            CommandSlot::Transport,
            play_operation("1".to_string()),
            FailurePolicy::Command,
            Ok,
        )
    }

    pub fn pause(&self) -> PendingAction<()> {
        self.submit::<PauseOperation, _, _>(
            "pause",
            CommandSlot::Transport,
            pause_operation(),
            FailurePolicy::Command,
            Ok,
        )
    }

    pub fn stop(&self) -> PendingAction<()> {
        self.submit::<StopOperation, _, _>(
            "stop",
            CommandSlot::Transport,
            stop_operation(),
            FailurePolicy::Command,
            Ok,
        )
    }

    /// Seek to `position_millis` and resolve with the position the device
    /// reports afterwards
    ///
    /// Falls back to the requested position when the device cannot report
    /// one.
    pub fn seek(&self, position_millis: i64) -> PendingAction<u64> {
        let request = seek_operation(position_millis);
        if let Err(error) = request.validate() {
            return self.fail("seek", error.into());
        }
        let requested = position_millis.max(0) as u64;

        self.dispatch("seek", CommandSlot::Seek, Service::AVTransport, move |transport, endpoint| {
            execute::<SeekOperation>(transport, endpoint, &request, FailurePolicy::Command)?;

            let readback = execute::<GetPositionInfoOperation>(
                transport,
                endpoint,
                &get_position_info_operation(),
                FailurePolicy::Query,
            );
            let effective = match readback {
                Ok(info) if !is_unreported(&info.rel_time) => {
                    parse_rel_time(&info.rel_time).unwrap_or(requested)
                }
                Ok(_) => requested,
                Err(error) => {
                    debug!("Position read-back after seek failed: {}", error);
                    requested
                }
            };
            Ok(effective)
        })
    }

    pub fn get_position_info(&self) -> PendingAction<PositionInfo> {
        self.submit::<GetPositionInfoOperation, _, _>(
            "get_position_info",
            CommandSlot::Position,
            get_position_info_operation(),
            FailurePolicy::Query,
            |response| {
                Ok(PositionInfo {
                    elapsed_millis: time_value("RelTime", &response.rel_time)?,
                    duration_millis: time_value("TrackDuration", &response.track_duration)?,
                })
            },
        )
    }

    pub fn get_media_info(&self) -> PendingAction<MediaInfo> {
        self.submit::<GetMediaInfoOperation, _, _>(
            "get_media_info",
            CommandSlot::Media,
            get_media_info_operation(),
            FailurePolicy::Query,
            |response| {
                Ok(MediaInfo {
                    duration_millis: time_value("MediaDuration", &response.media_duration)?,
                    uri: response.current_uri,
                    metadata: response.current_uri_meta_data,
                })
            },
        )
    }

    pub fn get_transport_info(&self) -> PendingAction<PlaybackState> {
        self.submit::<GetTransportInfoOperation, _, _>(
            "get_transport_info",
            CommandSlot::TransportState,
            get_transport_info_operation(),
            FailurePolicy::Query,
            |response| Ok(PlaybackState::from_transport_state(&response.current_transport_state)),
        )
    }

    // Renderer control

    /// Set the master volume; `level` must be within `0..=100`
    pub fn set_volume(&self, level: i32) -> PendingAction<u16> {
        self.submit::<SetVolumeOperation, _, _>(
            "set_volume",
            CommandSlot::Volume,
            set_volume_operation(MASTER_CHANNEL.to_string(), level),
            FailurePolicy::Command,
            move |()| Ok(level as u16),
        )
    }

    pub fn get_volume(&self) -> PendingAction<u16> {
        self.submit::<GetVolumeOperation, _, _>(
            "get_volume",
            CommandSlot::Volume,
            get_volume_operation(MASTER_CHANNEL.to_string()),
            FailurePolicy::Query,
            |response| Ok(response.current_volume),
        )
    }

    pub fn set_mute(&self, muted: bool) -> PendingAction<bool> {
        self.submit::<SetMuteOperation, _, _>(
            "set_mute",
            CommandSlot::Mute,
            set_mute_operation(MASTER_CHANNEL.to_string(), muted),
            FailurePolicy::Command,
            move |()| Ok(muted),
        )
    }

    pub fn is_mute(&self) -> PendingAction<bool> {
        self.submit::<GetMuteOperation, _, _>(
            "is_mute",
            CommandSlot::Mute,
            get_mute_operation(MASTER_CHANNEL.to_string()),
            FailurePolicy::Query,
            |response| {
                parse_upnp_bool(&response.current_mute).ok_or_else(|| {
                    ControlError::Transport(format!(
                        "GetMute response has malformed CurrentMute: '{}'",
                        response.current_mute
                    ))
                })
            },
        )
    }

    /// Set display brightness; `percent` must be within `0..=100`
    pub fn set_brightness(&self, percent: i32) -> PendingAction<u16> {
        self.submit::<SetBrightnessOperation, _, _>(
            "set_brightness",
            CommandSlot::Brightness,
            set_brightness_operation(percent),
            FailurePolicy::Command,
            move |()| Ok(percent as u16),
        )
    }

    pub fn get_brightness(&self) -> PendingAction<u16> {
        self.submit::<GetBrightnessOperation, _, _>(
            "get_brightness",
            CommandSlot::Brightness,
            get_brightness_operation(),
            FailurePolicy::Query,
            |response| Ok(response.current_brightness),
        )
    }

    // Events

    /// Subscribe to state changes of `service`
    ///
    /// Resolves once the device has granted the subscription. From then on
    /// `listener` receives every change the device reports, starting with the
    /// initial event carrying the full state, until
    /// [`unsubscribe`](Self::unsubscribe) or the subscription is lost.
    pub fn subscribe<L>(&self, service: Service, listener: L) -> PendingAction<Subscription>
    where
        L: EventListener + 'static,
    {
        let device = self.device_id().clone();
        let capability = service.capability();

        let endpoint = match self.endpoint(service) {
            Ok(endpoint) => endpoint,
            Err(error) => return self.fail("subscribe", error),
        };
        let subscriber = match (&self.inner.events, &endpoint.event_sub_url) {
            (Some(subscriber), Some(_)) => Arc::clone(subscriber),
            _ => {
                return self.fail(
                    "subscribe",
                    ControlError::EventsUnsupported { device, capability },
                )
            }
        };
        if !self.inner.presence.is_present(&device) {
            return self.fail("subscribe", ControlError::DeviceUnavailable(device));
        }

        let listener: Arc<dyn EventListener> = Arc::new(listener);
        self.run("subscribe", CommandSlot::Events, move || {
            subscriber
                .subscribe(&device, service, &endpoint, listener)
                .map_err(|failure| FailurePolicy::Query.map(failure))
        })
    }

    /// Cancel a subscription opened by [`subscribe`](Self::subscribe)
    ///
    /// Events stop even if the device is gone; the device is still told when
    /// it can be reached.
    pub fn unsubscribe(&self, subscription: &Subscription) -> PendingAction<()> {
        let device = self.device_id();
        if subscription.device() != device {
            return self.fail(
                "unsubscribe",
                ControlError::InvalidArgument(format!(
                    "subscription {} belongs to {}",
                    subscription.sid(),
                    subscription.device()
                )),
            );
        }
        let Some(subscriber) = self.inner.events.clone() else {
            return self.fail(
                "unsubscribe",
                ControlError::EventsUnsupported {
                    device: device.clone(),
                    capability: subscription.service().capability(),
                },
            );
        };

        let subscription = subscription.clone();
        self.run("unsubscribe", CommandSlot::Events, move || {
            subscriber
                .unsubscribe(&subscription)
                .map_err(|failure| FailurePolicy::Query.map(failure))
        })
    }

    /// Validate, then run one operation and convert its response
    fn submit<Op, T, F>(
        &self,
        command: &'static str,
        slot: CommandSlot,
        request: Op::Request,
        policy: FailurePolicy,
        finish: F,
    ) -> PendingAction<T>
    where
        Op: UPnPOperation,
        T: Send + 'static,
        F: FnOnce(Op::Response) -> Result<T> + Send + 'static,
    {
        if let Err(error) = request.validate() {
            return self.fail(command, error.into());
        }

        self.dispatch(command, slot, Op::SERVICE, move |transport, endpoint| {
            execute::<Op>(transport, endpoint, &request, policy).and_then(finish)
        })
    }

    /// Check capability and presence, then queue `exchange` on `slot`
    fn dispatch<T, F>(
        &self,
        command: &'static str,
        slot: CommandSlot,
        service: Service,
        exchange: F,
    ) -> PendingAction<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn ActionTransport, &ServiceEndpoint) -> Result<T> + Send + 'static,
    {
        let endpoint = match self.endpoint(service) {
            Ok(endpoint) => endpoint,
            Err(error) => return self.fail(command, error),
        };

        let device = self.device_id();
        if !self.inner.presence.is_present(device) {
            return self.fail(command, ControlError::DeviceUnavailable(device.clone()));
        }

        let transport = Arc::clone(&self.inner.transport);
        let device = device.clone();
        self.run(command, slot, move || {
            debug!("Running {} on {} via {}", command, device, endpoint.control_url);
            exchange(transport.as_ref(), &endpoint)
        })
    }

    fn endpoint(&self, service: Service) -> Result<ServiceEndpoint> {
        let capability = service.capability();
        self.inner
            .descriptor
            .endpoint(capability)
            .cloned()
            .ok_or_else(|| ControlError::UnsupportedCapability {
                device: self.device_id().clone(),
                capability,
            })
    }

    /// Queue a blocking `job` on `slot` behind earlier commands on it
    fn run<T, F>(&self, command: &'static str, slot: CommandSlot, job: F) -> PendingAction<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let device = self.device_id().clone();
        let (completion, pending) =
            PendingAction::channel(command, device.clone(), self.inner.executor.clone());
        let (slot_done, previous) = self.claim_slot(slot);

        let task = async move {
            if let Some(previous) = previous {
                // Resolves on completion or cancellation of the earlier command
                let _ = previous.await;
            }

            let result = tokio::task::spawn_blocking(job).await.unwrap_or_else(|e| {
                Err(ControlError::Transport(format!("{} exchange aborted: {}", command, e)))
            });

            let _ = slot_done.send(());
            if completion.send(result).is_err() {
                debug!("Result of {} on {} dropped by caller", command, device);
            }
        };

        if !self.inner.executor.spawn(task) {
            debug!("Action executor is gone; {} resolves as terminated", command);
        }
        pending
    }

    fn claim_slot(&self, slot: CommandSlot) -> (oneshot::Sender<()>, Option<oneshot::Receiver<()>>) {
        let (done, next) = oneshot::channel();
        let previous = self
            .inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(slot, next);
        (done, previous)
    }

    fn fail<T: Send + 'static>(&self, command: &'static str, error: ControlError) -> PendingAction<T> {
        debug!("{} on {} rejected: {}", command, self.device_id(), error);
        PendingAction::failed(
            command,
            self.device_id().clone(),
            self.inner.executor.clone(),
            error,
        )
    }
}

impl fmt::Debug for ControlSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlSession")
            .field("device", self.device_id())
            .field("name", &self.inner.descriptor.name())
            .finish()
    }
}

fn execute<Op: UPnPOperation>(
    transport: &dyn ActionTransport,
    endpoint: &ServiceEndpoint,
    request: &Op::Request,
    policy: FailurePolicy,
) -> Result<Op::Response> {
    let args = Op::build_args(request)?;
    let response = transport
        .invoke(endpoint, Op::ACTION, &args)
        .map_err(|failure| policy.map(failure))?;
    Op::parse_response(&response)
}

fn time_value(name: &str, value: &str) -> Result<u64> {
    parse_rel_time(value)
        .ok_or_else(|| ControlError::Transport(format!("malformed {} value '{}'", name, value)))
}
