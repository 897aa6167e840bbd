use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque announcement identifier, as authored upstream.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnouncementId(String);

impl AnnouncementId {
    pub fn new(id: impl Into<String>) -> Self {
        AnnouncementId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnouncementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ISO 3166 country code.
///
/// Comparison is exact and case-sensitive; upstream authors codes in
/// uppercase and the geo lookup reports them the same way.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    /// Returns `None` for an empty code, which can never match an announcement.
    pub fn new(code: impl Into<String>) -> Option<Self> {
        let code = code.into();
        if code.is_empty() {
            None
        } else {
            Some(CountryCode(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Platform code an announcement targets, e.g. `AndroidApp`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformCode(String);

impl PlatformCode {
    pub const ANDROID_APP: &'static str = "AndroidApp";
    pub const ANDROID_APP_V2: &'static str = "AndroidAppV2";

    pub fn new(code: impl Into<String>) -> Self {
        PlatformCode(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The codes this client answers to unless configured otherwise.
    pub fn defaults() -> Vec<PlatformCode> {
        vec![
            PlatformCode::new(Self::ANDROID_APP),
            PlatformCode::new(Self::ANDROID_APP_V2),
        ]
    }
}
