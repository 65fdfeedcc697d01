//! Fixture-based tests turning description documents into descriptors

mod helpers;

use cast_device::{Capability, DeviceDescriptor, DeviceId, RawDevice};
use helpers::{DescriptionFixture, MEDIA_SERVER, TV_RENDERER, VOLUME_ONLY};
use rstest::rstest;

fn descriptor(fixture: &DescriptionFixture) -> DeviceDescriptor {
    let raw = RawDevice::from_description_xml(fixture.xml, Some(fixture.location))
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", fixture.name, e));
    DeviceDescriptor::from_raw(&raw)
        .unwrap_or_else(|e| panic!("Failed to build descriptor for {}: {}", fixture.name, e))
}

#[rstest]
#[case(TV_RENDERER, "5f9ec1b3-ed59-1900-4530-00a0dea1d1c5", "Living Room TV", true, true)]
#[case(VOLUME_ONLY, "amp-0002", "Kitchen Amp", false, true)]
#[case(MEDIA_SERVER, "nas-0001", "NAS", false, false)]
fn test_fixture_capabilities(
    #[case] fixture: DescriptionFixture,
    #[case] expected_id: &str,
    #[case] expected_name: &str,
    #[case] av: bool,
    #[case] renderer: bool,
) {
    let device = descriptor(&fixture);

    assert_eq!(device.id(), &DeviceId::new(expected_id));
    assert_eq!(device.name(), expected_name);
    assert_eq!(device.supports(Capability::AvControl), av);
    assert_eq!(device.supports(Capability::RendererControl), renderer);
    assert_eq!(device.location(), Some(fixture.location));
}

#[test]
fn test_tv_endpoints_are_absolute() {
    let device = descriptor(&TV_RENDERER);

    let av = device.endpoint(Capability::AvControl).unwrap();
    assert_eq!(av.control_url, "http://192.168.1.20:49152/AVTransport/control");
    assert_eq!(av.service_type, "urn:schemas-upnp-org:service:AVTransport:1");
    assert_eq!(
        av.event_sub_url.as_deref(),
        Some("http://192.168.1.20:49152/AVTransport/event")
    );
    assert_eq!(device.endpoints().len(), 2);
}

#[test]
fn test_rendering_control_v2_is_recognised() {
    let device = descriptor(&VOLUME_ONLY);
    let rc = device.endpoint(Capability::RendererControl).unwrap();
    assert_eq!(rc.control_url, "http://192.168.1.30:1400/rc/control");
    assert!(rc.service_type.ends_with(":2"));
}

#[test]
fn test_all_fixtures_parse() {
    for fixture in helpers::all() {
        let device = descriptor(&fixture);
        assert!(!device.id().as_str().is_empty(), "{} has an id", fixture.name);
    }
}

#[test]
fn test_rediscovery_keeps_identity() {
    let first = descriptor(&TV_RENDERER);
    let moved = TV_RENDERER.xml.replace("Living Room TV", "Bedroom TV");
    let raw = RawDevice::from_description_xml(&moved, Some("http://192.168.1.99:49152/description.xml")).unwrap();
    let second = DeviceDescriptor::from_raw(&raw).unwrap();

    assert_eq!(first, second);
    assert!(!first.same_content(&second));
    assert_eq!(
        second.endpoint(Capability::AvControl).unwrap().control_url,
        "http://192.168.1.99:49152/AVTransport/control"
    );
}
