//! Session configuration.

use std::time::Duration;

/// Default server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default server port.
pub const DEFAULT_PORT: u16 = 13050;

/// Default bound on correlated request/response exchanges.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where to connect and how to size the session's channels.
///
/// ```
/// use std::time::Duration;
/// use lobbyist_session::SessionConfig;
///
/// let config = SessionConfig::default()
///     .with_host("game.example.org")
///     .with_request_timeout(Duration::from_secs(3));
/// assert_eq!(config.port, 13050);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server host name or address.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// How long a correlated request (prepare-game) may wait for its
    /// response before failing with `SessionError::Timeout`.
    pub request_timeout: Duration,

    /// Capacity of the inbound event channel. When full, the reader task
    /// waits, so events are never dropped or reordered.
    pub event_channel_capacity: usize,

    /// Capacity of the outbound frame queue feeding the writer task.
    pub outbound_channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            event_channel_capacity: 256,
            outbound_channel_capacity: 64,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_outbound_channel_capacity(mut self, capacity: usize) -> Self {
        self.outbound_channel_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 13050);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_capacities_are_clamped() {
        let config = SessionConfig::default()
            .with_event_channel_capacity(0)
            .with_outbound_channel_capacity(0);
        assert_eq!(config.event_channel_capacity, 1);
        assert_eq!(config.outbound_channel_capacity, 1);
    }
}
