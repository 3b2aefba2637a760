//! Gateway connection settings.
//!
//! Settings are read from a YAML file; every field is optional:
//!
//! ```yaml
//! host: 192.168.1.220
//! port: 11235
//! connect_timeout: 5000    # ms
//! attribute_timeout: 1000  # ms
//! attribute_poll: 40       # ms
//! transition_time: 10      # tenths of a second
//! discover_on_connect: true
//! unknown_frame: disconnect
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use srpc_protocol::{DEFAULT_GATEWAY_PORT, DEFAULT_TRANSITION_TIME};

use crate::error::{GatewayError, GatewayResult};

/// What the receive loop does when a frame starts with an id it does not know.
///
/// The stream has no delimiter, so the length byte of an unknown frame is
/// meaningless and nothing after it can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownFramePolicy {
    /// Stop reading and end the session with a protocol error.
    #[default]
    Disconnect,
    /// Throw away everything buffered, log it and keep reading.
    DiscardBuffer,
}

/// Settings for one gateway connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Gateway host name or IP address.
    pub host: String,
    /// Gateway TCP port.
    pub port: u16,
    /// Connect timeout in milliseconds.
    pub connect_timeout: u64,
    /// Overall bound on an attribute wait, in milliseconds.
    pub attribute_timeout: u64,
    /// Recheck interval during an attribute wait, in milliseconds.
    pub attribute_poll: u64,
    /// Transition time sent with level and colour changes (tenths of a second).
    pub transition_time: u16,
    /// Ask for devices, groups and scenes as soon as the link is up.
    pub discover_on_connect: bool,
    /// Handling of frames with an unknown command id.
    pub unknown_frame: UnknownFramePolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_GATEWAY_PORT,
            connect_timeout: 5000,
            attribute_timeout: 1000,
            attribute_poll: 40,
            transition_time: DEFAULT_TRANSITION_TIME,
            discover_on_connect: true,
            unknown_frame: UnknownFramePolicy::Disconnect,
        }
    }
}

impl GatewayConfig {
    /// Settings for `host` with everything else defaulted.
    pub fn new(host: impl Into<String>) -> Self {
        GatewayConfig {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Parse settings from YAML text.
    pub fn from_yaml_str(text: &str) -> GatewayResult<Self> {
        serde_yaml::from_str(text).map_err(|e| GatewayError::Config(e.to_string()))
    }

    /// Load settings from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> GatewayResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
    }

    /// `host:port` as dialled.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout)
    }

    /// Attribute wait bounds.
    pub fn attribute_wait(&self) -> AttributeWait {
        AttributeWait {
            timeout: Duration::from_millis(self.attribute_timeout),
            poll: Duration::from_millis(self.attribute_poll.max(1)),
        }
    }
}

/// Bounds for [`Gateway::wait_for_attributes`](crate::Gateway::wait_for_attributes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeWait {
    /// Give up after this long.
    pub timeout: Duration,
    /// Recheck at least this often.
    pub poll: Duration,
}

impl Default for AttributeWait {
    fn default() -> Self {
        AttributeWait {
            timeout: Duration::from_secs(1),
            poll: Duration::from_millis(40),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::new("10.0.0.5");
        assert_eq!(config.address(), "10.0.0.5:11235");
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.attribute_wait(), AttributeWait::default());
        assert_eq!(config.transition_time, 10);
        assert!(config.discover_on_connect);
        assert_eq!(config.unknown_frame, UnknownFramePolicy::Disconnect);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = GatewayConfig::from_yaml_str(
            "host: 192.168.1.220\nunknown_frame: discard-buffer\nattribute_timeout: 250\n",
        )
        .unwrap();

        assert_eq!(config.host, "192.168.1.220");
        assert_eq!(config.port, DEFAULT_GATEWAY_PORT);
        assert_eq!(config.unknown_frame, UnknownFramePolicy::DiscardBuffer);
        assert_eq!(config.attribute_wait().timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_bad_yaml_is_a_config_error() {
        let err = GatewayConfig::from_yaml_str("port: not-a-number").unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }
}
