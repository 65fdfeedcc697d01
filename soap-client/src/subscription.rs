//! GENA event subscription requests (SUBSCRIBE / UNSUBSCRIBE)

use crate::{transport_error, SoapClient, SoapError};

/// A subscription granted by a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionResponse {
    /// Subscription ID from the `SID` header
    pub sid: String,
    /// Timeout granted by the device, in seconds
    pub timeout_seconds: u32,
}

impl SoapClient {
    /// Open an event subscription
    ///
    /// # Arguments
    /// * `event_sub_url` - Absolute event subscription URL of the service
    /// * `callback_url` - URL the device should send NOTIFY requests to
    /// * `timeout_seconds` - Requested subscription timeout
    pub fn subscribe(
        &self,
        event_sub_url: &str,
        callback_url: &str,
        timeout_seconds: u32,
    ) -> Result<SubscriptionResponse, SoapError> {
        let response = self
            .agent
            .request("SUBSCRIBE", event_sub_url)
            .set("CALLBACK", &format!("<{}>", callback_url))
            .set("NT", "upnp:event")
            .set("TIMEOUT", &format!("Second-{}", timeout_seconds))
            .call()
            .map_err(|e| gena_error("SUBSCRIBE", e))?;

        let sid = response
            .header("SID")
            .map(str::trim)
            .filter(|sid| !sid.is_empty())
            .ok_or_else(|| SoapError::Parse("Missing SID header in SUBSCRIBE response".to_string()))?
            .to_string();

        Ok(SubscriptionResponse {
            sid,
            timeout_seconds: granted_timeout(response.header("TIMEOUT"), timeout_seconds),
        })
    }

    /// Renew a subscription; returns the timeout granted by the device
    pub fn renew_subscription(
        &self,
        event_sub_url: &str,
        sid: &str,
        timeout_seconds: u32,
    ) -> Result<u32, SoapError> {
        let response = self
            .agent
            .request("SUBSCRIBE", event_sub_url)
            .set("SID", sid)
            .set("TIMEOUT", &format!("Second-{}", timeout_seconds))
            .call()
            .map_err(|e| gena_error("SUBSCRIBE renewal", e))?;

        Ok(granted_timeout(response.header("TIMEOUT"), timeout_seconds))
    }

    /// Cancel a subscription
    pub fn unsubscribe(&self, event_sub_url: &str, sid: &str) -> Result<(), SoapError> {
        self.agent
            .request("UNSUBSCRIBE", event_sub_url)
            .set("SID", sid)
            .call()
            .map_err(|e| gena_error("UNSUBSCRIBE", e))?;
        Ok(())
    }
}

fn gena_error(request: &str, error: ureq::Error) -> SoapError {
    match error {
        ureq::Error::Status(status, _) => {
            SoapError::Network(format!("{} failed: HTTP {}", request, status))
        }
        ureq::Error::Transport(transport) => transport_error(transport),
    }
}

/// Parse a `Second-N` timeout header, falling back to the requested value
///
/// `infinite` and malformed values fall back too; subscriptions are always
/// renewed on a finite schedule.
fn granted_timeout(header: Option<&str>, requested: u32) -> u32 {
    header
        .and_then(|value| {
            let value = value.trim();
            let seconds = value.get(..7)?.eq_ignore_ascii_case("Second-").then(|| &value[7..])?;
            seconds.parse::<u32>().ok()
        })
        .filter(|seconds| *seconds > 0)
        .unwrap_or(requested)
}
