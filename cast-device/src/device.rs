//! Raw device records and UPnP device description parsing.
//!
//! A [`RawDevice`] is what a discovery provider hands to the registry: the
//! metadata it learned about a device, with URLs exactly as advertised. The
//! description parser turns a UPnP device description document into one.

use crate::error::{DeviceError, Result};
use serde::Deserialize;

/// One service advertised in a device's service list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawService {
    /// Service type URN, e.g. "urn:schemas-upnp-org:service:AVTransport:1"
    pub service_type: String,
    /// Service id, e.g. "urn:upnp-org:serviceId:AVTransport"
    pub service_id: String,
    /// Control URL, possibly relative to the device base URL
    pub control_url: String,
    /// Event subscription URL, possibly relative
    pub event_sub_url: Option<String>,
}

impl RawService {
    pub fn new(
        service_type: impl Into<String>,
        service_id: impl Into<String>,
        control_url: impl Into<String>,
    ) -> Self {
        Self {
            service_type: service_type.into(),
            service_id: service_id.into(),
            control_url: control_url.into(),
            event_sub_url: None,
        }
    }

    pub fn with_event_sub_url(mut self, event_sub_url: impl Into<String>) -> Self {
        self.event_sub_url = Some(event_sub_url.into());
        self
    }
}

/// Raw metadata for a device as reported by a discovery provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawDevice {
    /// Unique device name, e.g. "uuid:5f9ec1b3-ed59-1900-4530-00a0dea1d1c5"
    pub udn: String,
    /// Human readable name
    pub friendly_name: String,
    /// Device type URN
    pub device_type: String,
    pub manufacturer: String,
    pub model_name: String,
    /// URL the description document was fetched from
    pub location: Option<String>,
    /// Explicit `URLBase` from the description, overrides `location` for resolution
    pub url_base: Option<String>,
    /// Services of the device and its embedded devices, depth-first
    pub services: Vec<RawService>,
}

impl RawDevice {
    /// Create a record with an identity and a name and nothing else.
    pub fn new(udn: impl Into<String>, friendly_name: impl Into<String>) -> Self {
        Self {
            udn: udn.into(),
            friendly_name: friendly_name.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_model(mut self, manufacturer: impl Into<String>, model_name: impl Into<String>) -> Self {
        self.manufacturer = manufacturer.into();
        self.model_name = model_name.into();
        self
    }

    pub fn with_service(mut self, service: RawService) -> Self {
        self.services.push(service);
        self
    }

    /// Parse a UPnP device description document.
    ///
    /// # Arguments
    ///
    /// * `xml` - device description XML
    /// * `location` - URL the document was fetched from, used to resolve relative URLs
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::ParseError` if the XML is malformed or missing required fields.
    pub fn from_description_xml(xml: &str, location: Option<&str>) -> Result<Self> {
        let root: Root = quick_xml::de::from_str(xml)
            .map_err(|e| DeviceError::ParseError(format!("Failed to parse device XML: {}", e)))?;

        let mut services = Vec::new();
        collect_services(&root.device, &mut services);

        let device = root.device;
        Ok(Self {
            udn: device.udn.trim().to_string(),
            friendly_name: device.friendly_name.trim().to_string(),
            device_type: device.device_type.trim().to_string(),
            manufacturer: device.manufacturer.unwrap_or_default().trim().to_string(),
            model_name: device.model_name.unwrap_or_default().trim().to_string(),
            location: location.map(str::to_string),
            url_base: root.url_base.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()),
            services,
        })
    }
}

/// UPnP device description root element.
#[derive(Debug, Deserialize)]
struct Root {
    #[serde(rename = "URLBase")]
    url_base: Option<String>,
    device: DeviceDescription,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceDescription {
    device_type: String,
    friendly_name: String,
    manufacturer: Option<String>,
    model_name: Option<String>,
    #[serde(rename = "UDN")]
    udn: String,
    service_list: Option<ServiceList>,
    device_list: Option<DeviceList>,
}

#[derive(Debug, Deserialize)]
struct ServiceList {
    #[serde(rename = "service", default)]
    services: Vec<ServiceDescription>,
}

#[derive(Debug, Deserialize)]
struct DeviceList {
    #[serde(rename = "device", default)]
    devices: Vec<DeviceDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceDescription {
    service_type: String,
    service_id: String,
    #[serde(rename = "controlURL")]
    control_url: String,
    #[serde(rename = "eventSubURL")]
    event_sub_url: Option<String>,
}

fn collect_services(device: &DeviceDescription, out: &mut Vec<RawService>) {
    if let Some(list) = &device.service_list {
        out.extend(list.services.iter().map(|s| RawService {
            service_type: s.service_type.trim().to_string(),
            service_id: s.service_id.trim().to_string(),
            control_url: s.control_url.trim().to_string(),
            event_sub_url: s
                .event_sub_url
                .as_ref()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
        }));
    }
    if let Some(list) = &device.device_list {
        for embedded in &list.devices {
            collect_services(embedded, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RENDERER_XML: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
    <friendlyName>Living Room TV</friendlyName>
    <manufacturer>Acme</manufacturer>
    <modelName>Screen 9000</modelName>
    <UDN>uuid:5f9ec1b3-ed59-1900-4530-00a0dea1d1c5</UDN>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:AVTransport:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:AVTransport</serviceId>
        <SCPDURL>/AVTransport/scpd.xml</SCPDURL>
        <controlURL>/AVTransport/control</controlURL>
        <eventSubURL>/AVTransport/event</eventSubURL>
      </service>
      <service>
        <serviceType>urn:schemas-upnp-org:service:RenderingControl:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:RenderingControl</serviceId>
        <SCPDURL>/RenderingControl/scpd.xml</SCPDURL>
        <controlURL>/RenderingControl/control</controlURL>
        <eventSubURL>/RenderingControl/event</eventSubURL>
      </service>
    </serviceList>
  </device>
</root>"#;

    #[test]
    fn test_device_from_xml() {
        let raw = RawDevice::from_description_xml(
            RENDERER_XML,
            Some("http://192.168.1.20:49152/description.xml"),
        )
        .unwrap();

        assert_eq!(raw.udn, "uuid:5f9ec1b3-ed59-1900-4530-00a0dea1d1c5");
        assert_eq!(raw.friendly_name, "Living Room TV");
        assert_eq!(raw.manufacturer, "Acme");
        assert_eq!(raw.model_name, "Screen 9000");
        assert_eq!(raw.services.len(), 2);
        assert_eq!(raw.services[0].control_url, "/AVTransport/control");
        assert_eq!(raw.services[1].event_sub_url.as_deref(), Some("/RenderingControl/event"));
        assert_eq!(raw.url_base, None);
    }

    #[test]
    fn test_embedded_devices_are_walked() {
        let xml = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <URLBase>http://10.0.0.5:8080/</URLBase>
  <device>
    <deviceType>urn:schemas-upnp-org:device:Basic:1</deviceType>
    <friendlyName>Receiver</friendlyName>
    <UDN>uuid:root-device</UDN>
    <deviceList>
      <device>
        <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
        <friendlyName>Receiver Renderer</friendlyName>
        <UDN>uuid:embedded-renderer</UDN>
        <serviceList>
          <service>
            <serviceType>urn:schemas-upnp-org:service:RenderingControl:1</serviceType>
            <serviceId>urn:upnp-org:serviceId:RenderingControl</serviceId>
            <controlURL>rc/control</controlURL>
          </service>
        </serviceList>
      </device>
    </deviceList>
  </device>
</root>"#;

        let raw = RawDevice::from_description_xml(xml, None).unwrap();
        assert_eq!(raw.udn, "uuid:root-device");
        assert_eq!(raw.url_base.as_deref(), Some("http://10.0.0.5:8080/"));
        assert_eq!(raw.services.len(), 1);
        assert_eq!(raw.services[0].event_sub_url, None);
        assert_eq!(raw.manufacturer, "");
    }

    #[test]
    fn test_malformed_xml_is_a_parse_error() {
        let err = RawDevice::from_description_xml("<root><device>", None).unwrap_err();
        assert!(matches!(err, DeviceError::ParseError(_)));
    }

    #[test]
    fn test_builder_helpers() {
        let raw = RawDevice::new("uuid:abc", "Kitchen")
            .with_location("http://10.0.0.9/desc.xml")
            .with_model("Acme", "Speaker")
            .with_service(RawService::new(
                "urn:schemas-upnp-org:service:RenderingControl:1",
                "urn:upnp-org:serviceId:RenderingControl",
                "/rc",
            ));

        assert_eq!(raw.location.as_deref(), Some("http://10.0.0.9/desc.xml"));
        assert_eq!(raw.model_name, "Speaker");
        assert_eq!(raw.services.len(), 1);
    }
}
