use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::identifiers::PlatformCode;

/// Profile prefix shared by every versioned wiki REST content type.
pub const ACCEPT_HEADER_PREFIX: &str =
    "application/json; charset=utf-8; profile=\"https://www.mediawiki.org/wiki/Specs/";

/// Announcements schema version this client understands.
pub const ANNOUNCEMENTS_SCHEMA_VERSION: &str = "0.1.0";

// Serializable, comparable, explicit defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL template; `{scheme}` and `{authority}` are substituted from
    /// the wiki. Must end in `/`.
    pub endpoint_format: String,
    pub accept_header: String,
    pub platforms: Vec<PlatformCode>,
    pub timeout_ms: u64,
    /// `None` delivers on the completion task; `Some` posts the result after
    /// the given delay.
    pub post_delay_ms: Option<u64>,
}

impl ClientConfig {
    pub fn v0() -> Self {
        Self {
            endpoint_format: "{scheme}://{authority}/".into(),
            accept_header: format!(
                "{ACCEPT_HEADER_PREFIX}announcements/{ANNOUNCEMENTS_SCHEMA_VERSION}\""
            ),
            platforms: PlatformCode::defaults(),
            timeout_ms: 15_000,
            post_delay_ms: Some(0),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::v0()
    }
}
