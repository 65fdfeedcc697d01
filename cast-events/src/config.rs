use std::net::IpAddr;
use std::time::Duration;

use crate::error::{EventError, Result};

/// Settings of the callback server and subscription upkeep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventConfig {
    /// Inclusive range of ports the callback server may bind; `(0, 0)` lets
    /// the OS pick one
    pub port_range: (u16, u16),

    /// Address advertised in CALLBACK headers; detected when unset
    pub callback_host: Option<IpAddr>,

    /// Timeout requested in SUBSCRIBE
    pub subscription_timeout: Duration,

    /// How long before expiry a subscription is renewed
    pub renewal_margin: Duration,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            port_range: (3400, 3500),
            callback_host: None,
            subscription_timeout: Duration::from_secs(1800),
            renewal_margin: Duration::from_secs(60),
        }
    }
}

impl EventConfig {
    pub fn with_port_range(mut self, start: u16, end: u16) -> Self {
        self.port_range = (start, end);
        self
    }

    pub fn with_callback_host(mut self, host: IpAddr) -> Self {
        self.callback_host = Some(host);
        self
    }

    pub fn with_subscription_timeout(mut self, timeout: Duration) -> Self {
        self.subscription_timeout = timeout;
        self
    }

    pub fn with_renewal_margin(mut self, margin: Duration) -> Self {
        self.renewal_margin = margin;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let (start, end) = self.port_range;
        if start > end {
            return Err(EventError::InvalidConfig(format!(
                "port range {}-{} is empty",
                start, end
            )));
        }
        if self.subscription_timeout.as_secs() == 0 {
            return Err(EventError::InvalidConfig(
                "subscription_timeout must be at least one second".to_string(),
            ));
        }
        if self.subscription_timeout.as_secs() > u64::from(u32::MAX) {
            return Err(EventError::InvalidConfig(
                "subscription_timeout is too large".to_string(),
            ));
        }
        Ok(())
    }

    /// Delay before renewing a subscription granted for `granted`
    ///
    /// Renews `renewal_margin` before expiry, but never later than halfway
    /// through short grants.
    pub fn renew_after(&self, granted: Duration) -> Duration {
        granted
            .saturating_sub(self.renewal_margin)
            .max(granted / 2)
            .max(Duration::from_millis(100))
    }
}
