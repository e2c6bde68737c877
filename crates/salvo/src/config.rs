//! Client configuration and its builder.

use std::time::Duration;

use salvo_protocol::{Codec, TextCodec};
use salvo_session::SessionConfig;
use serde::{Deserialize, Serialize};

use crate::SalvoClient;

/// Settings for a [`SalvoClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub session: SessionConfig,

    /// Capacity of the command channel between handles and the actor.
    pub command_buffer: usize,

    /// Capacity of the channel the receive loop hands reports through.
    /// When full, the receive loop waits, which pushes back on the socket.
    pub inbound_buffer: usize,

    /// How often pending requests are checked against their deadline.
    pub expiry_check_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            command_buffer: 64,
            inbound_buffer: 256,
            expiry_check_interval: Duration::from_millis(250),
        }
    }
}

/// Builder for configuring and starting a client.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use salvo::SalvoClient;
///
/// # async fn example() {
/// let client = SalvoClient::builder()
///     .request_timeout(Duration::from_secs(5))
///     .build();
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SalvoClientBuilder {
    config: ClientConfig,
}

impl SalvoClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.session.request_timeout = timeout;
        self
    }

    pub fn command_buffer(mut self, capacity: usize) -> Self {
        self.config.command_buffer = capacity.max(1);
        self
    }

    pub fn inbound_buffer(mut self, capacity: usize) -> Self {
        self.config.inbound_buffer = capacity.max(1);
        self
    }

    pub fn expiry_check_interval(mut self, interval: Duration) -> Self {
        self.config.expiry_check_interval = interval;
        self
    }

    /// Spawns the client actor with the text codec.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> SalvoClient {
        self.build_with_codec(TextCodec)
    }

    /// Spawns the client actor with another body codec.
    pub fn build_with_codec<C: Codec + Clone>(self, codec: C) -> SalvoClient {
        SalvoClient::start(self.config, codec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.command_buffer, 64);
        assert_eq!(config.inbound_buffer, 256);
        assert_eq!(config.session.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_client_config_from_partial_json() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"command_buffer": 8}"#).unwrap();
        assert_eq!(config.command_buffer, 8);
        assert_eq!(config.inbound_buffer, 256);
    }

    #[test]
    fn test_builder_clamps_zero_buffers() {
        let builder = SalvoClientBuilder::new().command_buffer(0).inbound_buffer(0);
        assert_eq!(builder.config.command_buffer, 1);
        assert_eq!(builder.config.inbound_buffer, 1);
    }
}
