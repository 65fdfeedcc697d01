//! Subscription upkeep: opening, renewing, dispatching and closing

use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use cast_control::{
    EventListener, EventSubscriber, FailureKind, LastChange, Service, ServiceEvent, Subscription,
    TransportFailure,
};
use cast_device::{DeviceId, ServiceEndpoint};
use dashmap::DashMap;
use soap_client::SoapClient;
use tokio::runtime::{Builder, Runtime};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::config::EventConfig;
use crate::error::{EventError, Result};
use crate::router::{EventRouter, NotificationPayload};
use crate::server::{detect_local_ip, CallbackServer};

type Subscriptions = Arc<DashMap<String, ActiveSubscription>>;

struct ActiveSubscription {
    subscription: Subscription,
    event_sub_url: String,
    listener: Arc<dyn EventListener>,
    renewal: Option<AbortHandle>,
}

struct HubShared {
    config: EventConfig,
    client: SoapClient,
    router: Arc<EventRouter>,
    subscriptions: Subscriptions,
}

/// Owns every event subscription of a process
///
/// The callback server starts with the first subscription. Subscriptions are
/// renewed ahead of expiry until unsubscribed; one that cannot be renewed is
/// reported through [`EventListener::on_subscription_lost`]. Listeners are
/// called on a single event thread in arrival order.
pub struct EventHub {
    shared: Arc<HubShared>,
    runtime: Option<Runtime>,
    server: Mutex<Option<CallbackServer>>,
}

impl EventHub {
    pub fn new(config: EventConfig) -> Result<Self> {
        Self::with_client(config, SoapClient::new())
    }

    /// Hub sending GENA requests through `client`
    pub fn with_client(config: EventConfig, client: SoapClient) -> Result<Self> {
        config.validate()?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("dlna-cast-events-rt")
            .enable_all()
            .build()?;

        let (sender, receiver) = mpsc::channel();
        let subscriptions: Subscriptions = Arc::new(DashMap::new());
        let dispatched = Arc::clone(&subscriptions);
        thread::Builder::new()
            .name("dlna-cast-events".to_string())
            .spawn(move || dispatch_events(receiver, dispatched))?;

        Ok(Self {
            shared: Arc::new(HubShared {
                config,
                client,
                router: Arc::new(EventRouter::new(sender)),
                subscriptions,
            }),
            runtime: Some(runtime),
            server: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &EventConfig {
        &self.shared.config
    }

    /// Callback URL once the server runs
    pub fn callback_url(&self) -> Option<String> {
        self.server
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|server| server.callback_url().to_string())
    }

    pub fn subscription_count(&self) -> usize {
        self.shared.subscriptions.len()
    }

    fn runtime(&self) -> Result<&Runtime> {
        self.runtime
            .as_ref()
            .ok_or_else(|| EventError::ServerStart("event runtime stopped".to_string()))
    }

    /// Start the callback server unless it runs; returns its URL
    fn ensure_server(&self) -> Result<String> {
        let mut server = self.server.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(running) = server.as_ref() {
            return Ok(running.callback_url().to_string());
        }

        let host = match self.shared.config.callback_host {
            Some(host) => host,
            None => detect_local_ip()?,
        };
        let port_range = self.shared.config.port_range;
        let router = Arc::clone(&self.shared.router);

        // Callers may sit on another runtime's blocking pool, so no block_on
        let (started_tx, started_rx) = mpsc::channel();
        self.runtime()?.spawn(async move {
            let _ = started_tx.send(CallbackServer::start(port_range, host, router).await);
        });
        let started = started_rx
            .recv()
            .map_err(|_| EventError::ServerStart("event runtime stopped".to_string()))??;

        let url = started.callback_url().to_string();
        *server = Some(started);
        Ok(url)
    }
}

impl EventSubscriber for EventHub {
    fn subscribe(
        &self,
        device: &DeviceId,
        service: Service,
        endpoint: &ServiceEndpoint,
        listener: Arc<dyn EventListener>,
    ) -> std::result::Result<Subscription, TransportFailure> {
        let event_sub_url = endpoint.event_sub_url.clone().ok_or_else(|| {
            TransportFailure::Communication {
                kind: FailureKind::Protocol,
                message: format!("{} has no event subscription URL", endpoint.service_id),
            }
        })?;
        let callback_url = self
            .ensure_server()
            .map_err(|e| TransportFailure::Communication {
                kind: FailureKind::Network,
                message: e.to_string(),
            })?;

        let granted = self
            .shared
            .client
            .subscribe(&event_sub_url, &callback_url, self.shared.requested_seconds())
            .map_err(TransportFailure::from)?;
        let timeout = Duration::from_secs(granted.timeout_seconds.into());
        let subscription = Subscription::new(granted.sid, device.clone(), service, timeout);
        let sid = subscription.sid().to_string();

        self.shared.subscriptions.insert(
            sid.clone(),
            ActiveSubscription {
                subscription: subscription.clone(),
                event_sub_url,
                listener,
                renewal: None,
            },
        );
        if let Ok(runtime) = self.runtime() {
            let renewal = runtime
                .spawn(keep_alive(Arc::clone(&self.shared), sid.clone(), timeout))
                .abort_handle();
            if let Some(mut active) = self.shared.subscriptions.get_mut(&sid) {
                active.renewal = Some(renewal);
            }
        }
        self.shared.router.register(&sid);

        info!(
            "Subscribed to {} on {} as {} for {}s",
            service.name(),
            device,
            sid,
            granted.timeout_seconds
        );
        Ok(subscription)
    }

    fn unsubscribe(&self, subscription: &Subscription) -> std::result::Result<(), TransportFailure> {
        let Some(active) = self.shared.forget(subscription.sid()) else {
            debug!("Subscription {} already closed", subscription.sid());
            return Ok(());
        };

        self.shared
            .client
            .unsubscribe(&active.event_sub_url, subscription.sid())
            .map_err(TransportFailure::from)?;
        info!("Unsubscribed {}", subscription.sid());
        Ok(())
    }
}

impl Drop for EventHub {
    fn drop(&mut self) {
        let sids: Vec<String> = self
            .shared
            .subscriptions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for sid in sids {
            if let Some(active) = self.shared.forget(&sid) {
                if let Err(e) = self.shared.client.unsubscribe(&active.event_sub_url, &sid) {
                    debug!("Could not unsubscribe {} on shutdown: {}", sid, e);
                }
            }
        }

        self.server
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(runtime) = self.runtime.take() {
            debug!("Shutting down event hub");
            runtime.shutdown_background();
        }
    }
}

impl HubShared {
    fn requested_seconds(&self) -> u32 {
        u32::try_from(self.config.subscription_timeout.as_secs()).unwrap_or(u32::MAX)
    }

    /// Drop local state of `sid`; delivery stops immediately
    fn forget(&self, sid: &str) -> Option<ActiveSubscription> {
        let (_, active) = self.subscriptions.remove(sid)?;
        if let Some(renewal) = &active.renewal {
            renewal.abort();
        }
        self.router.unregister(sid);
        Some(active)
    }

    /// Renew `sid`; `None` once it is closed or lost
    fn renew(&self, sid: &str) -> Option<Duration> {
        let event_sub_url = self.subscriptions.get(sid)?.event_sub_url.clone();

        match self
            .client
            .renew_subscription(&event_sub_url, sid, self.requested_seconds())
        {
            Ok(seconds) => {
                debug!("Renewed {} for {}s", sid, seconds);
                Some(Duration::from_secs(seconds.into()))
            }
            Err(e) => {
                let reason = format!("renewal failed: {}", e);
                warn!("Subscription {} lost: {}", sid, reason);
                let (_, active) = self.subscriptions.remove(sid)?;
                self.router.unregister(sid);
                let listener = Arc::clone(&active.listener);
                if panic::catch_unwind(AssertUnwindSafe(|| {
                    listener.on_subscription_lost(&active.subscription, &reason)
                }))
                .is_err()
                {
                    warn!("Event listener of {} panicked", sid);
                }
                None
            }
        }
    }
}

async fn keep_alive(shared: Arc<HubShared>, sid: String, mut granted: Duration) {
    loop {
        tokio::time::sleep(shared.config.renew_after(granted)).await;

        let renewing = Arc::clone(&shared);
        let renewed_sid = sid.clone();
        match tokio::task::spawn_blocking(move || renewing.renew(&renewed_sid)).await {
            Ok(Some(next)) => granted = next,
            _ => return,
        }
    }
}

fn dispatch_events(receiver: mpsc::Receiver<NotificationPayload>, subscriptions: Subscriptions) {
    for payload in receiver {
        let sid = payload.subscription_id;
        let Some((subscription, listener)) = subscriptions
            .get(&sid)
            .map(|active| (active.subscription.clone(), Arc::clone(&active.listener)))
        else {
            debug!("Event {} for closed subscription {}", payload.sequence, sid);
            continue;
        };

        let changes = match LastChange::parse(&payload.event_xml) {
            Ok(changes) => changes,
            Err(e) => {
                warn!("Skipping event {} of {}: {}", payload.sequence, sid, e);
                continue;
            }
        };
        let event = ServiceEvent {
            subscription,
            sequence: payload.sequence,
            changes,
        };

        if panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(&event))).is_err() {
            warn!("Event listener of {} panicked", sid);
        }
    }
    debug!("Event dispatch stopped");
}
