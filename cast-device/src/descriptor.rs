//! Immutable device descriptors built from raw discovery records.

use std::fmt;

use url::Url;

use crate::device::{RawDevice, RawService};
use crate::error::{DeviceError, Result};

/// Unique identifier for a renderer device.
///
/// This is the UDN from the UPnP device description, normalized to strip the
/// "uuid:" prefix if present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a new DeviceId, normalizing the format
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let trimmed = id.trim();
        let normalized = trimmed.strip_prefix("uuid:").unwrap_or(trimmed);
        Self(normalized.to_string())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        DeviceId::new(s)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        DeviceId::new(s)
    }
}

/// Capability groups a renderer can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Transport control: load media, play, pause, stop, seek, position queries
    AvControl,
    /// Output control: volume, mute, brightness
    RendererControl,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::AvControl, Capability::RendererControl];

    /// Whether a UPnP service type URN provides this capability
    pub fn matches_service_type(&self, service_type: &str) -> bool {
        match self {
            Capability::AvControl => service_type.contains(":AVTransport:"),
            Capability::RendererControl => service_type.contains(":RenderingControl:"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Capability::AvControl => "AV control",
            Capability::RendererControl => "renderer control",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved control endpoint for one capability of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub capability: Capability,
    /// Service type URN used as the SOAP namespace
    pub service_type: String,
    pub service_id: String,
    /// Absolute control URL
    pub control_url: String,
    /// Absolute event subscription URL, when advertised
    pub event_sub_url: Option<String>,
}

/// Immutable snapshot of a discovered renderer.
///
/// Two descriptors compare equal when they describe the same device identity,
/// even if names or endpoints differ. Use [`DeviceDescriptor::same_content`]
/// to compare everything.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    id: DeviceId,
    name: String,
    device_type: String,
    manufacturer: String,
    model_name: String,
    location: Option<String>,
    endpoints: Vec<ServiceEndpoint>,
}

impl DeviceDescriptor {
    /// Build a descriptor from a raw discovery record.
    ///
    /// Relative control URLs are resolved against `url_base`, falling back to
    /// `location`. Services whose control URL cannot be resolved are left out,
    /// and with them the capability they would have provided.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::MissingIdentity` when the record has no UDN.
    pub fn from_raw(raw: &RawDevice) -> Result<Self> {
        let id = DeviceId::new(raw.udn.as_str());
        if id.as_str().is_empty() {
            return Err(DeviceError::MissingIdentity);
        }

        let base = raw
            .url_base
            .as_deref()
            .or(raw.location.as_deref())
            .and_then(|u| Url::parse(u).ok());

        let mut endpoints: Vec<ServiceEndpoint> = Vec::new();
        for capability in Capability::ALL {
            let Some(service) = raw
                .services
                .iter()
                .find(|s| capability.matches_service_type(&s.service_type))
            else {
                continue;
            };

            match resolve_endpoint(capability, service, base.as_ref()) {
                Ok(endpoint) => endpoints.push(endpoint),
                Err(e) => {
                    tracing::debug!("Dropping {} service of {}: {}", capability, id, e);
                }
            }
        }

        let name = [raw.friendly_name.trim(), raw.model_name.trim()]
            .into_iter()
            .find(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string());

        Ok(Self {
            id,
            name,
            device_type: raw.device_type.clone(),
            manufacturer: raw.manufacturer.clone(),
            model_name: raw.model_name.clone(),
            location: raw.location.clone(),
            endpoints,
        })
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Display name of the device
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Whether the device declared the given capability group
    pub fn supports(&self, capability: Capability) -> bool {
        self.endpoint(capability).is_some()
    }

    /// All declared capabilities
    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        self.endpoints.iter().map(|e| e.capability)
    }

    /// Control endpoint serving the given capability, if declared
    pub fn endpoint(&self, capability: Capability) -> Option<&ServiceEndpoint> {
        self.endpoints.iter().find(|e| e.capability == capability)
    }

    pub fn endpoints(&self) -> &[ServiceEndpoint] {
        &self.endpoints
    }

    /// Field-by-field comparison, unlike `==` which compares identity only
    pub fn same_content(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.device_type == other.device_type
            && self.manufacturer == other.manufacturer
            && self.model_name == other.model_name
            && self.location == other.location
            && self.endpoints == other.endpoints
    }
}

impl PartialEq for DeviceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DeviceDescriptor {}

impl std::hash::Hash for DeviceDescriptor {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

fn resolve_endpoint(
    capability: Capability,
    service: &RawService,
    base: Option<&Url>,
) -> Result<ServiceEndpoint> {
    let control_url = resolve_url(&service.control_url, base)?;
    let event_sub_url = service
        .event_sub_url
        .as_deref()
        .and_then(|u| resolve_url(u, base).ok());

    Ok(ServiceEndpoint {
        capability,
        service_type: service.service_type.clone(),
        service_id: service.service_id.clone(),
        control_url,
        event_sub_url,
    })
}

fn resolve_url(raw: &str, base: Option<&Url>) -> Result<String> {
    match Url::parse(raw) {
        Ok(url) => Ok(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = base.ok_or_else(|| DeviceError::InvalidUrl {
                url: raw.to_string(),
                reason: "relative URL without a base".to_string(),
            })?;
            base.join(raw)
                .map(|u| u.to_string())
                .map_err(|e| DeviceError::InvalidUrl {
                    url: raw.to_string(),
                    reason: e.to_string(),
                })
        }
        Err(e) => Err(DeviceError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn av_service(control_url: &str) -> RawService {
        RawService::new(
            "urn:schemas-upnp-org:service:AVTransport:1",
            "urn:upnp-org:serviceId:AVTransport",
            control_url,
        )
    }

    fn rc_service(control_url: &str) -> RawService {
        RawService::new(
            "urn:schemas-upnp-org:service:RenderingControl:1",
            "urn:upnp-org:serviceId:RenderingControl",
            control_url,
        )
    }

    #[test]
    fn test_device_id_strips_uuid_prefix() {
        assert_eq!(DeviceId::new("uuid:abc-123").as_str(), "abc-123");
        assert_eq!(DeviceId::new(" abc-123 ").as_str(), "abc-123");
        assert_eq!(DeviceId::from("uuid:x"), DeviceId::from("x".to_string()));
    }

    #[test]
    fn test_relative_urls_resolve_against_location() {
        let raw = RawDevice::new("uuid:tv", "TV")
            .with_location("http://192.168.1.20:49152/description.xml")
            .with_service(av_service("/AVTransport/control"))
            .with_service(rc_service("RenderingControl/control"));

        let descriptor = DeviceDescriptor::from_raw(&raw).unwrap();

        assert!(descriptor.supports(Capability::AvControl));
        assert!(descriptor.supports(Capability::RendererControl));
        assert_eq!(
            descriptor.endpoint(Capability::AvControl).unwrap().control_url,
            "http://192.168.1.20:49152/AVTransport/control"
        );
        assert_eq!(
            descriptor.endpoint(Capability::RendererControl).unwrap().control_url,
            "http://192.168.1.20:49152/RenderingControl/control"
        );
    }

    #[test]
    fn test_event_urls_resolve_like_control_urls() {
        let raw = RawDevice::new("uuid:tv", "TV")
            .with_location("http://192.168.1.20:49152/description.xml")
            .with_service(av_service("/AVTransport/control").with_event_sub_url("/AVTransport/event"))
            .with_service(rc_service("/RenderingControl/control"));

        let descriptor = DeviceDescriptor::from_raw(&raw).unwrap();

        assert_eq!(
            descriptor.endpoint(Capability::AvControl).unwrap().event_sub_url.as_deref(),
            Some("http://192.168.1.20:49152/AVTransport/event")
        );
        assert_eq!(
            descriptor.endpoint(Capability::RendererControl).unwrap().event_sub_url,
            None
        );
    }

    #[test]
    fn test_url_base_wins_over_location() {
        let mut raw = RawDevice::new("uuid:tv", "TV")
            .with_location("http://192.168.1.20:49152/description.xml")
            .with_service(av_service("/ctl"));
        raw.url_base = Some("http://192.168.1.21:8080/".to_string());

        let descriptor = DeviceDescriptor::from_raw(&raw).unwrap();
        assert_eq!(
            descriptor.endpoint(Capability::AvControl).unwrap().control_url,
            "http://192.168.1.21:8080/ctl"
        );
    }

    #[test]
    fn test_unresolvable_service_drops_capability() {
        let raw = RawDevice::new("uuid:tv", "TV")
            .with_service(av_service("/AVTransport/control"))
            .with_service(rc_service("http://10.0.0.2/rc"));

        let descriptor = DeviceDescriptor::from_raw(&raw).unwrap();
        assert!(!descriptor.supports(Capability::AvControl));
        assert!(descriptor.supports(Capability::RendererControl));
        assert_eq!(descriptor.capabilities().count(), 1);
    }

    #[test]
    fn test_missing_identity() {
        let raw = RawDevice::new("  ", "Nameless");
        assert_eq!(DeviceDescriptor::from_raw(&raw), Err(DeviceError::MissingIdentity));

        let raw = RawDevice::new("uuid:", "Prefix only");
        assert_eq!(DeviceDescriptor::from_raw(&raw), Err(DeviceError::MissingIdentity));
    }

    #[test]
    fn test_name_fallbacks() {
        let raw = RawDevice::new("uuid:abc", "").with_model("Acme", "Speaker One");
        assert_eq!(DeviceDescriptor::from_raw(&raw).unwrap().name(), "Speaker One");

        let raw = RawDevice::new("uuid:abc", " ");
        assert_eq!(DeviceDescriptor::from_raw(&raw).unwrap().name(), "abc");
    }

    #[test]
    fn test_equality_is_by_identity() {
        let first = DeviceDescriptor::from_raw(
            &RawDevice::new("uuid:tv", "TV")
                .with_location("http://10.0.0.1/d.xml")
                .with_service(av_service("/a")),
        )
        .unwrap();
        let second = DeviceDescriptor::from_raw(
            &RawDevice::new("tv", "Renamed TV")
                .with_location("http://10.0.0.2/d.xml")
                .with_service(av_service("/a")),
        )
        .unwrap();

        assert_eq!(first, second);
        assert!(!first.same_content(&second));
        assert!(first.same_content(&first.clone()));
    }
}
