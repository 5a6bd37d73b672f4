//! Dial configuration.

use std::time::Duration;

/// Default number of dial attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
/// Default pause between failed dial attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(125);

/// Controls how persistently [`crate::Client::connect_with`] dials.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Total dial attempts, including the first.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.retry_delay, Duration::from_millis(125));
    }
}
