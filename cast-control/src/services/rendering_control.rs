use crate::operation::{arg, ValidationError};
use crate::{define_operation_with_response, define_upnp_operation, Validate};
use paste::paste;

/// Channel every renderer implements
pub const MASTER_CHANNEL: &str = "Master";

fn validate_percent(parameter: &str, value: i32) -> Result<(), ValidationError> {
    if !(0..=100).contains(&value) {
        return Err(ValidationError::range_error(parameter, 0, 100, value));
    }
    Ok(())
}

define_operation_with_response! {
    operation: GetVolumeOperation,
    action: "GetVolume",
    service: RenderingControl,
    request: {
        channel: String => "Channel",
    },
    response: GetVolumeResponse {
        current_volume: u16,
    },
    xml_mapping: {
        current_volume: "CurrentVolume",
    },
}

impl Validate for GetVolumeOperationRequest {}

define_upnp_operation! {
    operation: SetVolumeOperation,
    action: "SetVolume",
    service: RenderingControl,
    request: {
        channel: String,
        desired_volume: i32,
    },
    response: (),
    args: |req| vec![
        arg("Channel", &req.channel),
        arg("DesiredVolume", req.desired_volume),
    ],
    parse: |_response| Ok(()),
}

impl Validate for SetVolumeOperationRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_percent("DesiredVolume", self.desired_volume)
    }
}

define_operation_with_response! {
    operation: GetMuteOperation,
    action: "GetMute",
    service: RenderingControl,
    request: {
        channel: String => "Channel",
    },
    response: GetMuteResponse {
        current_mute: String,
    },
    xml_mapping: {
        current_mute: "CurrentMute",
    },
}

impl Validate for GetMuteOperationRequest {}

define_upnp_operation! {
    operation: SetMuteOperation,
    action: "SetMute",
    service: RenderingControl,
    request: {
        channel: String,
        desired_mute: bool,
    },
    response: (),
    args: |req| vec![
        arg("Channel", &req.channel),
        arg("DesiredMute", if req.desired_mute { "1" } else { "0" }),
    ],
    parse: |_response| Ok(()),
}

impl Validate for SetMuteOperationRequest {}

define_operation_with_response! {
    operation: GetBrightnessOperation,
    action: "GetBrightness",
    service: RenderingControl,
    request: {},
    response: GetBrightnessResponse {
        current_brightness: u16,
    },
    xml_mapping: {
        current_brightness: "CurrentBrightness",
    },
}

impl Validate for GetBrightnessOperationRequest {}

define_upnp_operation! {
    operation: SetBrightnessOperation,
    action: "SetBrightness",
    service: RenderingControl,
    request: {
        desired_brightness: i32,
    },
    response: (),
    args: |req| vec![arg("DesiredBrightness", req.desired_brightness)],
    parse: |_response| Ok(()),
}

impl Validate for SetBrightnessOperationRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_percent("DesiredBrightness", self.desired_brightness)
    }
}

/// Read a UPnP boolean (`1`/`0`/`true`/`false`)
pub fn parse_upnp_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
