use crate::operation::{arg, ValidationError};
use crate::time::format_rel_time;
use crate::{define_operation_with_response, define_upnp_operation, Validate};
use paste::paste;

define_upnp_operation! {
    operation: SetAvTransportUriOperation,
    action: "SetAVTransportURI",
    service: AVTransport,
    request: {
        current_uri: String,
        current_uri_meta_data: String,
    },
    response: (),
    args: |req| vec![
        arg("CurrentURI", &req.current_uri),
        arg("CurrentURIMetaData", &req.current_uri_meta_data),
    ],
    parse: |_response| Ok(()),
}

impl Validate for SetAvTransportUriOperationRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.current_uri.trim().is_empty() {
            return Err(ValidationError::invalid_value(
                "CurrentURI",
                &self.current_uri,
                "content URI must not be empty",
            ));
        }
        Ok(())
    }
}

define_upnp_operation! {
    operation: PlayOperation,
    action: "Play",
    service: AVTransport,
    request: {
        speed: String,
    },
    response: (),
    args: |req| vec![arg("Speed", &req.speed)],
    parse: |_response| Ok(()),
}

impl Validate for PlayOperationRequest {}

define_upnp_operation! {
    operation: PauseOperation,
    action: "Pause",
    service: AVTransport,
    request: {},
    response: (),
    args: |_req| Vec::new(),
    parse: |_response| Ok(()),
}

impl Validate for PauseOperationRequest {}

define_upnp_operation! {
    operation: StopOperation,
    action: "Stop",
    service: AVTransport,
    request: {},
    response: (),
    args: |_req| Vec::new(),
    parse: |_response| Ok(()),
}

impl Validate for StopOperationRequest {}

define_upnp_operation! {
    operation: SeekOperation,
    action: "Seek",
    service: AVTransport,
    request: {
        target_millis: i64,
    },
    response: (),
    args: |req| vec![
        arg("Unit", "REL_TIME"),
        arg("Target", format_rel_time(req.target_millis.max(0) as u64)),
    ],
    parse: |_response| Ok(()),
}

impl Validate for SeekOperationRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.target_millis < 0 {
            return Err(ValidationError::invalid_value(
                "Target",
                self.target_millis,
                "position must not be negative",
            ));
        }
        Ok(())
    }
}

define_operation_with_response! {
    operation: GetPositionInfoOperation,
    action: "GetPositionInfo",
    service: AVTransport,
    request: {},
    response: GetPositionInfoResponse {
        track_duration: String,
        rel_time: String,
    },
    xml_mapping: {
        track_duration: "TrackDuration",
        rel_time: "RelTime",
    },
}

impl Validate for GetPositionInfoOperationRequest {}

define_operation_with_response! {
    operation: GetMediaInfoOperation,
    action: "GetMediaInfo",
    service: AVTransport,
    request: {},
    response: GetMediaInfoResponse {
        media_duration: String,
        current_uri: String,
        current_uri_meta_data: String,
    },
    xml_mapping: {
        media_duration: "MediaDuration",
        current_uri: "CurrentURI",
        current_uri_meta_data: "CurrentURIMetaData",
    },
}

impl Validate for GetMediaInfoOperationRequest {}

define_operation_with_response! {
    operation: GetTransportInfoOperation,
    action: "GetTransportInfo",
    service: AVTransport,
    request: {},
    response: GetTransportInfoResponse {
        current_transport_state: String,
    },
    xml_mapping: {
        current_transport_state: "CurrentTransportState",
    },
}

impl Validate for GetTransportInfoOperationRequest {}
