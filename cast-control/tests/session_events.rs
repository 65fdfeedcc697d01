mod helpers;

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use cast_control::{
    ActionExecutor, ControlError, ControlSession, FailureKind, PlaybackState, Service,
    ServiceEvent, Subscription, TransportFailure,
};
use cast_device::{Capability, DeviceId};
use helpers::{av_only_descriptor, tv_descriptor, Harness, MockTransport, Presence};

const PLAYING: &str = r#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0"><e:property><LastChange>&lt;Event xmlns="urn:schemas-upnp-org:metadata-1-0/AVT/"&gt;&lt;InstanceID val="0"&gt;&lt;TransportState val="PLAYING"/&gt;&lt;/InstanceID&gt;&lt;/Event&gt;</LastChange></e:property></e:propertyset>"#;

#[test]
fn subscribed_listener_receives_state_changes() {
    let harness = Harness::tv(MockTransport::succeeding());
    let (tx, rx) = mpsc::channel();
    let tx = std::sync::Mutex::new(tx);

    let subscription = harness
        .session
        .subscribe(Service::AVTransport, move |event: &ServiceEvent| {
            let _ = tx.lock().unwrap().send((event.sequence, event.changes.transport_state()));
        })
        .wait()
        .unwrap();

    assert_eq!(subscription.service(), Service::AVTransport);
    assert_eq!(subscription.device().as_str(), "tv-0001");
    assert_eq!(
        *harness.events.subscribed.lock().unwrap(),
        vec!["http://192.168.1.20:49152/AVTransport/event".to_string()]
    );

    harness.events.notify(subscription.sid(), 0, PLAYING);
    let (sequence, state) = rx.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(sequence, 0);
    assert_eq!(state, Some(PlaybackState::Playing));
    assert_eq!(harness.transport.count(), 0);
}

#[test]
fn unsubscribe_stops_delivery_on_the_device() {
    let harness = Harness::tv(MockTransport::succeeding());
    let subscription = harness
        .session
        .subscribe(Service::RenderingControl, |_: &ServiceEvent| {})
        .wait()
        .unwrap();
    assert_eq!(harness.events.active(), 1);

    harness.session.unsubscribe(&subscription).wait().unwrap();

    assert_eq!(harness.events.active(), 0);
    assert_eq!(
        *harness.events.unsubscribed.lock().unwrap(),
        vec![subscription.sid().to_string()]
    );
}

#[test]
fn unsubscribe_proceeds_after_the_device_disappears() {
    let harness = Harness::tv(MockTransport::succeeding());
    let subscription = harness
        .session
        .subscribe(Service::AVTransport, |_: &ServiceEvent| {})
        .wait()
        .unwrap();

    harness.presence.set(false);

    assert_eq!(harness.session.unsubscribe(&subscription).wait(), Ok(()));
    assert_eq!(harness.events.active(), 0);
}

#[test]
fn subscribing_to_an_absent_device_fails_without_io() {
    let harness = Harness::tv(MockTransport::succeeding());
    harness.presence.set(false);

    let result = harness
        .session
        .subscribe(Service::AVTransport, |_: &ServiceEvent| {})
        .wait();

    assert!(matches!(result, Err(ControlError::DeviceUnavailable(_))));
    assert!(harness.events.subscribed.lock().unwrap().is_empty());
}

#[test]
fn undeclared_capability_wins_over_events() {
    let harness = Harness::new(av_only_descriptor(), MockTransport::succeeding());

    let result = harness
        .session
        .subscribe(Service::RenderingControl, |_: &ServiceEvent| {})
        .wait();

    assert_eq!(
        result,
        Err(ControlError::UnsupportedCapability {
            device: DeviceId::new("stream-0002"),
            capability: Capability::RendererControl,
        })
    );
}

#[test]
fn service_without_event_url_is_not_subscribable() {
    // av_only_descriptor declares no eventSubURL
    let harness = Harness::new(av_only_descriptor(), MockTransport::succeeding());

    let result = harness
        .session
        .subscribe(Service::AVTransport, |_: &ServiceEvent| {})
        .wait();

    assert!(matches!(
        result,
        Err(ControlError::EventsUnsupported {
            capability: Capability::AvControl,
            ..
        })
    ));
    assert!(harness.events.subscribed.lock().unwrap().is_empty());
}

#[test]
fn sessions_without_a_subscriber_reject_events() {
    let executor = ActionExecutor::new(1).unwrap();
    let session = ControlSession::new(
        tv_descriptor(),
        MockTransport::succeeding(),
        Arc::new(Presence::present()),
        executor.handle(),
    );

    let subscribed = session.subscribe(Service::AVTransport, |_: &ServiceEvent| {}).wait();
    let stray = Subscription::new(
        "uuid:sub-9",
        DeviceId::new("tv-0001"),
        Service::AVTransport,
        Duration::from_secs(60),
    );
    let unsubscribed = session.unsubscribe(&stray).wait();

    assert!(matches!(subscribed, Err(ControlError::EventsUnsupported { .. })));
    assert!(matches!(unsubscribed, Err(ControlError::EventsUnsupported { .. })));
}

#[test]
fn refused_subscription_is_a_transport_error() {
    let harness = Harness::tv(MockTransport::succeeding());
    harness.events.fail_with(TransportFailure::Communication {
        kind: FailureKind::Network,
        message: "SUBSCRIBE failed: HTTP 503".to_string(),
    });

    let result = harness
        .session
        .subscribe(Service::AVTransport, |_: &ServiceEvent| {})
        .wait();

    match result {
        Err(ControlError::Transport(msg)) => assert!(msg.contains("503")),
        other => panic!("Expected Transport, got {:?}", other),
    }
}

#[test]
fn foreign_subscriptions_are_rejected() {
    let harness = Harness::tv(MockTransport::succeeding());
    let foreign = Subscription::new(
        "uuid:sub-1",
        DeviceId::new("other-device"),
        Service::AVTransport,
        Duration::from_secs(60),
    );

    let result = harness.session.unsubscribe(&foreign).wait();

    assert!(matches!(result, Err(ControlError::InvalidArgument(_))));
    assert!(harness.events.unsubscribed.lock().unwrap().is_empty());
}
