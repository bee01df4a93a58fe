use std::time::Duration;

/// Tunables for a ConBee coordinator session: request timeout, bring-up
/// timeout, and the watchdog TTL/refresh cadence, mirroring the teacher's
/// `RadioConfig` shape.
#[derive(Debug, Clone)]
pub struct ConbeeSettings {
    /// How long a request waits for its response before timing out.
    pub request_timeout: Duration,
    /// How long each step of the bring-up sequence is allowed to take.
    pub bringup_timeout: Duration,
    /// Watchdog TTL (seconds) written on bring-up and refresh.
    pub watchdog_ttl_secs: u32,
    /// How often the watchdog TTL is rewritten to the dongle.
    pub watchdog_refresh_interval: Duration,
}

impl Default for ConbeeSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(1),
            bringup_timeout: Duration::from_secs(10),
            watchdog_ttl_secs: 3600,
            watchdog_refresh_interval: Duration::from_secs(30 * 60),
        }
    }
}
