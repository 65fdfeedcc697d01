//! Device description fixtures for integration tests

/// A renderer description document together with where it was fetched from
#[derive(Debug, Clone)]
pub struct DescriptionFixture {
    pub name: &'static str,
    pub location: &'static str,
    pub xml: &'static str,
}

/// Full renderer with both AVTransport and RenderingControl, relative URLs
pub const TV_RENDERER: DescriptionFixture = DescriptionFixture {
    name: "tv_renderer",
    location: "http://192.168.1.20:49152/description.xml",
    xml: r#"<?xml version="1.0" encoding="utf-8"?>
<root xmlns="urn:schemas-upnp-org:device-1-0" xmlns:dlna="urn:schemas-dlna-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
    <friendlyName>Living Room TV</friendlyName>
    <manufacturer>Acme Displays</manufacturer>
    <modelName>Screen 9000</modelName>
    <UDN>uuid:5f9ec1b3-ed59-1900-4530-00a0dea1d1c5</UDN>
    <dlna:X_DLNADOC>DMR-1.50</dlna:X_DLNADOC>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:ConnectionManager:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:ConnectionManager</serviceId>
        <SCPDURL>/ConnectionManager/scpd.xml</SCPDURL>
        <controlURL>/ConnectionManager/control</controlURL>
        <eventSubURL>/ConnectionManager/event</eventSubURL>
      </service>
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
</root>"#,
};

/// Audio-only renderer exposing just RenderingControl, absolute URLs
pub const VOLUME_ONLY: DescriptionFixture = DescriptionFixture {
    name: "volume_only",
    location: "http://192.168.1.30/desc.xml",
    xml: r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <device>
    <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
    <friendlyName>Kitchen Amp</friendlyName>
    <manufacturer>Acme Audio</manufacturer>
    <modelName>Amp 2</modelName>
    <UDN>uuid:amp-0002</UDN>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:RenderingControl:2</serviceType>
        <serviceId>urn:upnp-org:serviceId:RenderingControl</serviceId>
        <controlURL>http://192.168.1.30:1400/rc/control</controlURL>
      </service>
    </serviceList>
  </device>
</root>"#,
};

/// Media server: no renderer services at all
pub const MEDIA_SERVER: DescriptionFixture = DescriptionFixture {
    name: "media_server",
    location: "http://192.168.1.40:8200/rootDesc.xml",
    xml: r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <device>
    <deviceType>urn:schemas-upnp-org:device:MediaServer:1</deviceType>
    <friendlyName>NAS</friendlyName>
    <manufacturer>Acme Storage</manufacturer>
    <modelName>NAS 1</modelName>
    <UDN>uuid:nas-0001</UDN>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:ContentDirectory:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:ContentDirectory</serviceId>
        <controlURL>/ctl/ContentDir</controlURL>
      </service>
    </serviceList>
  </device>
</root>"#,
};

pub fn all() -> Vec<DescriptionFixture> {
    vec![TV_RENDERER, VOLUME_ONLY, MEDIA_SERVER]
}
