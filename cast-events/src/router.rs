//! Routing of NOTIFY bodies to the subscriptions that asked for them

use std::collections::VecDeque;
use std::sync::{mpsc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use dashmap::DashSet;
use tracing::{debug, trace};

/// How long a NOTIFY for a not yet registered SID is kept
const HOLD_WINDOW: Duration = Duration::from_secs(30);

/// Most NOTIFY requests kept for not yet registered SIDs
const HOLD_CAPACITY: usize = 32;

/// An unparsed event notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    /// The subscription ID from the `SID` header
    pub subscription_id: String,
    /// The `SEQ` header
    pub sequence: u32,
    /// The raw `<e:propertyset>` body
    pub event_xml: String,
}

/// What happened to a routed notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Sent on to the event channel
    Delivered,
    /// SID not registered yet; kept until it is or the hold window passes
    Held,
    /// SID unknown and nothing more can be held
    Rejected,
}

/// Forwards notifications of registered subscriptions to a channel
///
/// A device sends its initial NOTIFY right after answering SUBSCRIBE, which
/// can be before the SID is registered here. Such notifications are held
/// briefly and replayed on [`register`](Self::register).
pub struct EventRouter {
    subscriptions: DashSet<String>,
    held: Mutex<VecDeque<(Instant, NotificationPayload)>>,
    sender: mpsc::Sender<NotificationPayload>,
}

impl EventRouter {
    pub fn new(sender: mpsc::Sender<NotificationPayload>) -> Self {
        Self {
            subscriptions: DashSet::new(),
            held: Mutex::new(VecDeque::new()),
            sender,
        }
    }

    /// Start routing `subscription_id` and replay anything held for it
    pub fn register(&self, subscription_id: &str) {
        self.subscriptions.insert(subscription_id.to_string());

        let replay: Vec<NotificationPayload> = {
            let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
            prune(&mut held);
            let (matching, rest): (VecDeque<_>, VecDeque<_>) = held
                .drain(..)
                .partition(|(_, payload)| payload.subscription_id == subscription_id);
            *held = rest;
            matching.into_iter().map(|(_, payload)| payload).collect()
        };

        for payload in replay {
            debug!(
                "Replaying held event {} for {}",
                payload.sequence, payload.subscription_id
            );
            let _ = self.sender.send(payload);
        }
    }

    pub fn unregister(&self, subscription_id: &str) {
        self.subscriptions.remove(subscription_id);
    }

    pub fn is_registered(&self, subscription_id: &str) -> bool {
        self.subscriptions.contains(subscription_id)
    }

    pub fn route_event(&self, payload: NotificationPayload) -> RouteOutcome {
        if self.subscriptions.contains(&payload.subscription_id) {
            // Receiver gone means the hub is shutting down
            let _ = self.sender.send(payload);
            return RouteOutcome::Delivered;
        }

        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        prune(&mut held);
        if held.len() >= HOLD_CAPACITY {
            trace!("Dropping event for unknown subscription {}", payload.subscription_id);
            return RouteOutcome::Rejected;
        }
        held.push_back((Instant::now(), payload));
        RouteOutcome::Held
    }
}

fn prune(held: &mut VecDeque<(Instant, NotificationPayload)>) {
    while held
        .front()
        .is_some_and(|(received, _)| received.elapsed() > HOLD_WINDOW)
    {
        held.pop_front();
    }
}
