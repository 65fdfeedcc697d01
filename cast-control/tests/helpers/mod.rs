//! Shared fixtures for session tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cast_control::{
    ActionArgs, ActionExecutor, ActionResponse, ActionTransport, ControlSession, EventListener,
    EventSubscriber, LastChange, Service, ServiceEvent, Subscription, TransportFailure,
};
use cast_device::{DeviceDescriptor, DeviceId, DevicePresence, RawDevice, RawService, ServiceEndpoint};

pub const AV_TRANSPORT: &str = "urn:schemas-upnp-org:service:AVTransport:1";
pub const RENDERING_CONTROL: &str = "urn:schemas-upnp-org:service:RenderingControl:1";

type Responder = dyn Fn(&str, &ActionArgs) -> Result<ActionResponse, TransportFailure> + Send + Sync;

/// One recorded transport call
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub action: String,
    pub args: ActionArgs,
    pub control_url: String,
}

impl Invocation {
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Transport that records every call and answers through a closure
pub struct MockTransport {
    calls: Mutex<Vec<Invocation>>,
    responder: Box<Responder>,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&str, &ActionArgs) -> Result<ActionResponse, TransportFailure> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        })
    }

    /// Answers every action with an empty response
    pub fn succeeding() -> Arc<Self> {
        Self::new(|_, _| Ok(ActionResponse::new()))
    }

    /// Answers every action with the same failure
    pub fn failing(failure: TransportFailure) -> Arc<Self> {
        Self::new(move |_, _| Err(failure.clone()))
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ActionTransport for MockTransport {
    fn invoke(
        &self,
        endpoint: &ServiceEndpoint,
        action: &str,
        args: &ActionArgs,
    ) -> Result<ActionResponse, TransportFailure> {
        self.calls.lock().unwrap().push(Invocation {
            action: action.to_string(),
            args: args.clone(),
            control_url: endpoint.control_url.clone(),
        });
        (self.responder)(action, args)
    }
}

/// Presence that tests can flip
#[derive(Clone)]
pub struct Presence(Arc<AtomicBool>);

impl Presence {
    pub fn present() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn set(&self, present: bool) {
        self.0.store(present, Ordering::SeqCst);
    }
}

impl DevicePresence for Presence {
    fn is_present(&self, _id: &DeviceId) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A TV exposing both AVTransport and RenderingControl
pub fn tv_descriptor() -> DeviceDescriptor {
    let raw = RawDevice::new("uuid:tv-0001", "Living Room TV")
        .with_location("http://192.168.1.20:49152/description.xml")
        .with_service(RawService::new(
            AV_TRANSPORT,
            "urn:upnp-org:serviceId:AVTransport",
            "/AVTransport/control",
        ).with_event_sub_url("/AVTransport/event"))
        .with_service(RawService::new(
            RENDERING_CONTROL,
            "urn:upnp-org:serviceId:RenderingControl",
            "/RenderingControl/control",
        ).with_event_sub_url("/RenderingControl/event"));
    DeviceDescriptor::from_raw(&raw).unwrap()
}

/// A receiver with only AVTransport
pub fn av_only_descriptor() -> DeviceDescriptor {
    let raw = RawDevice::new("uuid:stream-0002", "Streamer")
        .with_location("http://192.168.1.21:8080/desc.xml")
        .with_service(RawService::new(
            AV_TRANSPORT,
            "urn:upnp-org:serviceId:AVTransport",
            "/AVTransport/control",
        ));
    DeviceDescriptor::from_raw(&raw).unwrap()
}

/// Subscriber that hands out sequential SIDs and lets tests push events
pub struct MockSubscriber {
    next: Mutex<u32>,
    failure: Mutex<Option<TransportFailure>>,
    active: Mutex<Vec<(Subscription, Arc<dyn EventListener>)>>,
    /// Event URLs of every SUBSCRIBE, in order
    pub subscribed: Mutex<Vec<String>>,
    /// SIDs of every UNSUBSCRIBE, in order
    pub unsubscribed: Mutex<Vec<String>>,
}

impl MockSubscriber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next: Mutex::new(1),
            failure: Mutex::new(None),
            active: Mutex::new(Vec::new()),
            subscribed: Mutex::new(Vec::new()),
            unsubscribed: Mutex::new(Vec::new()),
        })
    }

    /// Fail every following SUBSCRIBE
    pub fn fail_with(&self, failure: TransportFailure) {
        *self.failure.lock().unwrap() = Some(failure);
    }

    pub fn active(&self) -> usize {
        self.active.lock().unwrap().len()
    }

    /// Deliver a NOTIFY body to the listener of `sid`
    pub fn notify(&self, sid: &str, sequence: u32, body: &str) {
        let active = self.active.lock().unwrap();
        let (subscription, listener) = active
            .iter()
            .find(|(subscription, _)| subscription.sid() == sid)
            .expect("no such subscription");
        listener.on_event(&ServiceEvent {
            subscription: subscription.clone(),
            sequence,
            changes: LastChange::parse(body).unwrap(),
        });
    }
}

impl EventSubscriber for MockSubscriber {
    fn subscribe(
        &self,
        device: &DeviceId,
        service: Service,
        endpoint: &ServiceEndpoint,
        listener: Arc<dyn EventListener>,
    ) -> Result<Subscription, TransportFailure> {
        self.subscribed
            .lock()
            .unwrap()
            .push(endpoint.event_sub_url.clone().unwrap_or_default());
        if let Some(failure) = self.failure.lock().unwrap().clone() {
            return Err(failure);
        }

        let mut next = self.next.lock().unwrap();
        let subscription = Subscription::new(
            format!("uuid:sub-{}", *next),
            device.clone(),
            service,
            Duration::from_secs(1800),
        );
        *next += 1;
        self.active.lock().unwrap().push((subscription.clone(), listener));
        Ok(subscription)
    }

    fn unsubscribe(&self, subscription: &Subscription) -> Result<(), TransportFailure> {
        self.unsubscribed.lock().unwrap().push(subscription.sid().to_string());
        self.active
            .lock()
            .unwrap()
            .retain(|(active, _)| active.sid() != subscription.sid());
        Ok(())
    }
}

/// Session plus the pieces tests poke at; keep the executor alive
pub struct Harness {
    pub session: ControlSession,
    pub transport: Arc<MockTransport>,
    pub presence: Presence,
    pub events: Arc<MockSubscriber>,
    pub executor: ActionExecutor,
}

impl Harness {
    pub fn new(descriptor: DeviceDescriptor, transport: Arc<MockTransport>) -> Self {
        let executor = ActionExecutor::new(2).unwrap();
        let presence = Presence::present();
        let events = MockSubscriber::new();
        let session = ControlSession::with_events(
            descriptor,
            transport.clone(),
            Arc::new(presence.clone()),
            executor.handle(),
            events.clone(),
        );
        Self {
            session,
            transport,
            presence,
            events,
            executor,
        }
    }

    pub fn tv(transport: Arc<MockTransport>) -> Self {
        Self::new(tv_descriptor(), transport)
    }
}
