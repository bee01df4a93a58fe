use std::time::Duration;

/// Tunables for a ZNP coordinator session, mirroring the shape of the
/// teacher's `RadioConfig` (connection-level knobs with a sensible
/// `Default`) rather than the fixed constants a minimal port would hardcode.
#[derive(Debug, Clone)]
pub struct ZnpSettings {
    /// How long a synchronous request waits for its SRSP before timing out.
    pub request_timeout: Duration,
    /// How long each step of the bring-up sequence is allowed to take.
    pub bringup_timeout: Duration,
}

impl Default for ZnpSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(1),
            bringup_timeout: Duration::from_secs(10),
        }
    }
}
