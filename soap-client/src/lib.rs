//! Private SOAP client for UPnP renderer control
//!
//! This crate provides a minimal SOAP client for invoking UPnP actions on
//! media renderers, plus the GENA requests that open and close event
//! subscriptions. Each call is one independent HTTP exchange; the client
//! holds no per-call state, so clones can be used from many threads.

mod error;
mod subscription;

pub use error::SoapError;
pub use subscription::SubscriptionResponse;

use std::time::Duration;
use xmltree::{Element, XMLNode};

/// Error code reported when a fault carries no parsable UPnP error code
pub const DEFAULT_FAULT_CODE: u16 = 500;

/// A minimal SOAP client for UPnP device communication
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
}

impl SoapClient {
    /// Create a new SOAP client with default timeouts (5s connect, 10s read)
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(5), Duration::from_secs(10))
    }

    /// Create a SOAP client with explicit connect and read timeouts
    pub fn with_timeouts(connect: Duration, read: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(connect)
                .timeout_read(read)
                .build(),
        }
    }

    /// Send a SOAP request and return the `<action>Response` element
    ///
    /// # Arguments
    /// * `control_url` - Absolute control URL of the service
    /// * `service_type` - Service type URN, used as the action namespace
    /// * `action` - Action name, e.g. "Play"
    /// * `args` - Ordered action arguments; values are XML-escaped
    pub fn call(
        &self,
        control_url: &str,
        service_type: &str,
        action: &str,
        args: &[(String, String)],
    ) -> Result<Element, SoapError> {
        let body = build_envelope(service_type, action, args);
        let soap_action = format!("\"{}#{}\"", service_type, action);

        let result = self
            .agent
            .post(control_url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap_action)
            .send_string(&body);

        let xml_text = match result {
            Ok(response) => response
                .into_string()
                .map_err(|e| SoapError::Network(e.to_string()))?,
            Err(ureq::Error::Status(status, response)) => {
                // UPnP devices report action errors as HTTP 500 with a SOAP fault body
                let text = response.into_string().unwrap_or_default();
                return Err(match Element::parse(text.as_bytes()) {
                    Ok(xml) => fault_from(&xml)
                        .unwrap_or_else(|| SoapError::Network(format!("HTTP {}", status))),
                    Err(_) => SoapError::Network(format!("HTTP {}", status)),
                });
            }
            Err(ureq::Error::Transport(transport)) => return Err(transport_error(transport)),
        };

        let xml = Element::parse(xml_text.as_bytes()).map_err(|e| SoapError::Parse(e.to_string()))?;

        extract_response(&xml, action)
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten a response element into `(name, text)` pairs of its direct children
pub fn response_values(response: &Element) -> Vec<(String, String)> {
    response
        .children
        .iter()
        .filter_map(|node| match node {
            XMLNode::Element(child) => Some((
                child.name.clone(),
                child.get_text().map(|t| t.into_owned()).unwrap_or_default(),
            )),
            _ => None,
        })
        .collect()
}

fn build_envelope(service_type: &str, action: &str, args: &[(String, String)]) -> String {
    let payload: String = args
        .iter()
        .map(|(name, value)| {
            format!(
                "<{name}>{value}</{name}>",
                name = name,
                value = quick_xml::escape::escape(value.as_str())
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{action} xmlns:u="{service_type}">{payload}</u:{action}></s:Body></s:Envelope>"#,
        action = action,
        service_type = service_type,
        payload = payload
    )
}

pub(crate) fn transport_error(transport: ureq::Transport) -> SoapError {
    let timed_out = std::error::Error::source(&transport)
        .and_then(|source| source.downcast_ref::<std::io::Error>())
        .map(|io| {
            matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            )
        })
        .unwrap_or(false);

    if timed_out {
        SoapError::Timeout(transport.to_string())
    } else {
        SoapError::Network(transport.to_string())
    }
}

fn extract_response(xml: &Element, action: &str) -> Result<Element, SoapError> {
    let body = xml
        .get_child("Body")
        .ok_or_else(|| SoapError::Parse("Missing SOAP Body".to_string()))?;

    // Check for SOAP fault first
    if let Some(fault) = fault_from(xml) {
        return Err(fault);
    }

    let response_name = format!("{}Response", action);
    body.get_child(response_name.as_str())
        .cloned()
        .ok_or_else(|| SoapError::Parse(format!("Missing {} element", response_name)))
}

fn fault_from(xml: &Element) -> Option<SoapError> {
    let fault = xml.get_child("Body")?.get_child("Fault")?;

    let upnp_error = fault.get_child("detail").and_then(|detail| {
        detail.children.iter().find_map(|node| match node {
            XMLNode::Element(e) if e.name.eq_ignore_ascii_case("UPnPError") => Some(e),
            _ => None,
        })
    });

    let code = upnp_error
        .and_then(|e| e.get_child("errorCode"))
        .and_then(|c| c.get_text())
        .and_then(|t| t.trim().parse::<u16>().ok())
        .unwrap_or(DEFAULT_FAULT_CODE);

    let description = upnp_error
        .and_then(|e| e.get_child("errorDescription"))
        .and_then(|d| d.get_text())
        .or_else(|| fault.get_child("faultstring").and_then(|f| f.get_text()))
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    Some(SoapError::Fault { code, description })
}
