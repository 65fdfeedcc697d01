//! Evented renderer state (GENA `LastChange`)
//!
//! A session subscribes through an [`EventSubscriber`]; each NOTIFY the device
//! sends reaches the [`EventListener`] as a [`ServiceEvent`].

use std::sync::Arc;
use std::time::Duration;

use cast_device::{DeviceId, ServiceEndpoint};
use xmltree::{Element, XMLNode};

use crate::error::{ControlError, Result};
use crate::service::Service;
use crate::services::rendering_control::{parse_upnp_bool, MASTER_CHANNEL};
use crate::transport::TransportFailure;
use crate::types::PlaybackState;

/// One state variable reported in an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateVariable {
    pub name: String,
    /// `channel` attribute of RenderingControl variables, e.g. "Master"
    pub channel: Option<String>,
    pub value: String,
}

/// State variables carried by one event notification
///
/// AVTransport and RenderingControl report changes through a single
/// `LastChange` variable holding an escaped `<Event>` document. Services
/// that event plain variables are read as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LastChange {
    instance_id: u32,
    variables: Vec<StateVariable>,
}

impl LastChange {
    /// Parse the body of a NOTIFY request (`<e:propertyset>`)
    pub fn parse(propertyset: &str) -> Result<Self> {
        let root = Element::parse(propertyset.as_bytes())
            .map_err(|e| malformed(format!("propertyset: {}", e)))?;

        let mut plain = Vec::new();
        for property in child_elements(&root).filter(|e| e.name == "property") {
            for variable in child_elements(property) {
                let value = text_of(variable);
                if variable.name == "LastChange" {
                    return Self::parse_event(&value);
                }
                plain.push(StateVariable {
                    name: variable.name.clone(),
                    channel: None,
                    value,
                });
            }
        }

        Ok(Self {
            instance_id: 0,
            variables: plain,
        })
    }

    /// Parse an unescaped `LastChange` `<Event>` document
    ///
    /// Only the first `InstanceID` is kept; renderers controlled through
    /// instance 0 report nothing else.
    pub fn parse_event(event: &str) -> Result<Self> {
        let event = event.trim();
        if event.is_empty() {
            return Ok(Self::default());
        }
        let root = Element::parse(event.as_bytes())
            .map_err(|e| malformed(format!("LastChange: {}", e)))?;

        let Some(instance) = child_elements(&root).find(|e| e.name == "InstanceID") else {
            return Ok(Self::default());
        };
        let instance_id = instance
            .attributes
            .get("val")
            .and_then(|val| val.trim().parse().ok())
            .unwrap_or(0);

        let variables = child_elements(instance)
            .map(|variable| StateVariable {
                name: variable.name.clone(),
                channel: variable.attributes.get("channel").cloned(),
                value: variable.attributes.get("val").cloned().unwrap_or_default(),
            })
            .collect();

        Ok(Self {
            instance_id,
            variables,
        })
    }

    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    pub fn variables(&self) -> &[StateVariable] {
        &self.variables
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Value of `name`, preferring the master channel when channels are given
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_channel(name, MASTER_CHANNEL).or_else(|| {
            self.variables
                .iter()
                .find(|v| v.name == name && v.channel.is_none())
                .map(|v| v.value.as_str())
        })
    }

    pub fn get_channel(&self, name: &str, channel: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|v| v.name == name && v.channel.as_deref() == Some(channel))
            .map(|v| v.value.as_str())
    }

    pub fn transport_state(&self) -> Option<PlaybackState> {
        self.get("TransportState").map(PlaybackState::from_transport_state)
    }

    pub fn current_uri(&self) -> Option<&str> {
        self.get("AVTransportURI").or_else(|| self.get("CurrentTrackURI"))
    }

    pub fn volume(&self) -> Option<u16> {
        self.get("Volume").and_then(|v| v.trim().parse().ok())
    }

    pub fn mute(&self) -> Option<bool> {
        self.get("Mute").and_then(parse_upnp_bool)
    }

    pub fn brightness(&self) -> Option<u16> {
        self.get("Brightness").and_then(|v| v.trim().parse().ok())
    }
}

/// An open event subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    sid: String,
    device: DeviceId,
    service: Service,
    timeout: Duration,
}

impl Subscription {
    pub fn new(sid: impl Into<String>, device: DeviceId, service: Service, timeout: Duration) -> Self {
        Self {
            sid: sid.into(),
            device,
            service,
            timeout,
        }
    }

    /// Subscription ID assigned by the device
    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    pub fn service(&self) -> Service {
        self.service
    }

    /// Timeout granted when the subscription was opened
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// One NOTIFY from a subscribed service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEvent {
    pub subscription: Subscription,
    /// `SEQ` header; 0 for the initial event carrying the full state
    pub sequence: u32,
    pub changes: LastChange,
}

/// Receives events of one subscription
///
/// `on_event` runs on a dedicated event thread, one call at a time and in
/// the order notifications arrived.
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &ServiceEvent);

    /// The subscription ended without `unsubscribe`, e.g. a failed renewal;
    /// may be called from any thread
    fn on_subscription_lost(&self, _subscription: &Subscription, _reason: &str) {}
}

impl<F> EventListener for F
where
    F: Fn(&ServiceEvent) + Send + Sync,
{
    fn on_event(&self, event: &ServiceEvent) {
        self(event)
    }
}

/// Opens and closes subscriptions on behalf of sessions
///
/// Both calls block until the device has answered.
pub trait EventSubscriber: Send + Sync {
    fn subscribe(
        &self,
        device: &DeviceId,
        service: Service,
        endpoint: &ServiceEndpoint,
        listener: Arc<dyn EventListener>,
    ) -> std::result::Result<Subscription, TransportFailure>;

    /// Stop delivery and cancel the subscription on the device
    ///
    /// Delivery stops even when the device cannot be reached.
    fn unsubscribe(&self, subscription: &Subscription) -> std::result::Result<(), TransportFailure>;
}

fn child_elements(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(|node| match node {
        XMLNode::Element(child) => Some(child),
        _ => None,
    })
}

fn text_of(element: &Element) -> String {
    element
        .get_text()
        .map(|text| text.into_owned())
        .unwrap_or_default()
}

fn malformed(detail: String) -> ControlError {
    ControlError::Transport(format!("malformed event {}", detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    const AV_NOTIFY: &str = r#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0"><e:property><LastChange>&lt;Event xmlns="urn:schemas-upnp-org:metadata-1-0/AVT/"&gt;&lt;InstanceID val="0"&gt;&lt;TransportState val="PLAYING"/&gt;&lt;AVTransportURI val="http://192.168.1.5/movie.mp4"/&gt;&lt;/InstanceID&gt;&lt;/Event&gt;</LastChange></e:property></e:propertyset>"#;

    const RC_NOTIFY: &str = r#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0"><e:property><LastChange><![CDATA[<Event xmlns="urn:schemas-upnp-org:metadata-1-0/RCS/"><InstanceID val="0"><Volume channel="LF" val="10"/><Volume channel="Master" val="35"/><Mute channel="Master" val="1"/></InstanceID></Event>]]></LastChange></e:property></e:propertyset>"#;

    #[test]
    fn test_parse_escaped_av_transport_change() {
        let change = LastChange::parse(AV_NOTIFY).unwrap();

        assert_eq!(change.instance_id(), 0);
        assert_eq!(change.transport_state(), Some(PlaybackState::Playing));
        assert_eq!(change.current_uri(), Some("http://192.168.1.5/movie.mp4"));
        assert_eq!(change.volume(), None);
    }

    #[test]
    fn test_parse_rendering_control_channels() {
        let change = LastChange::parse(RC_NOTIFY).unwrap();

        assert_eq!(change.volume(), Some(35));
        assert_eq!(change.get_channel("Volume", "LF"), Some("10"));
        assert_eq!(change.mute(), Some(true));
        assert_eq!(change.variables().len(), 3);
    }

    #[test]
    fn test_plain_evented_variables() {
        let xml = r#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0"><e:property><Brightness>70</Brightness></e:property></e:propertyset>"#;
        let change = LastChange::parse(xml).unwrap();

        assert_eq!(change.brightness(), Some(70));
        assert_eq!(change.variables()[0].channel, None);
    }

    #[test]
    fn test_empty_last_change() {
        let xml = r#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0"><e:property><LastChange></LastChange></e:property></e:propertyset>"#;
        assert!(LastChange::parse(xml).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_notify_is_transport_error() {
        assert!(matches!(
            LastChange::parse("<e:propertyset"),
            Err(ControlError::Transport(_))
        ));
        assert!(matches!(
            LastChange::parse_event("<Event><InstanceID"),
            Err(ControlError::Transport(_))
        ));
    }

    #[test]
    fn test_closures_are_listeners() {
        let seen = std::sync::Mutex::new(Vec::new());
        let listener = |event: &ServiceEvent| seen.lock().unwrap().push(event.sequence);
        let event = ServiceEvent {
            subscription: Subscription::new(
                "uuid:sub-1",
                DeviceId::new("tv"),
                Service::AVTransport,
                Duration::from_secs(300),
            ),
            sequence: 4,
            changes: LastChange::default(),
        };

        listener.on_event(&event);
        assert_eq!(*seen.lock().unwrap(), vec![4]);
    }
}
