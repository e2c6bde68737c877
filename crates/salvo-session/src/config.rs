use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a [`ClientSession`](crate::ClientSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a join, create, placement or turn action may wait for the
    /// server's answer before it is resolved as a failure.
    ///
    /// Default: 10 seconds.
    pub request_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}
