//! Device and user facts the selection engine evaluates against.
//!
//! A [`HostContext`] is captured once per request and never re-read while
//! filtering. Hosts supply one through a [`HostContextProvider`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::identifiers::CountryCode;

/// Immutable snapshot of the host at request time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostContext {
    pub country: Option<CountryCode>,
    pub now: DateTime<Utc>,
    pub version_code: i64,
    pub is_pre_prod_release: bool,
    pub is_logged_in: bool,
    pub is_reading_list_sync_enabled: bool,
}

impl HostContext {
    /// A logged-out production host in `country` at `now`.
    ///
    /// An empty `country` yields a context that matches nothing.
    pub fn new(country: impl Into<String>, now: DateTime<Utc>, version_code: i64) -> Self {
        HostContext {
            country: CountryCode::new(country),
            now,
            version_code,
            is_pre_prod_release: false,
            is_logged_in: false,
            is_reading_list_sync_enabled: false,
        }
    }

    pub fn pre_prod_release(mut self, value: bool) -> Self {
        self.is_pre_prod_release = value;
        self
    }

    pub fn logged_in(mut self, value: bool) -> Self {
        self.is_logged_in = value;
        self
    }

    pub fn reading_list_sync_enabled(mut self, value: bool) -> Self {
        self.is_reading_list_sync_enabled = value;
        self
    }
}

/// Source of fresh [`HostContext`] snapshots.
pub trait HostContextProvider: Send + Sync {
    fn snapshot(&self) -> HostContext;
}

/// A fixed context; every snapshot is identical.
impl HostContextProvider for HostContext {
    fn snapshot(&self) -> HostContext {
        self.clone()
    }
}

impl<F> HostContextProvider for F
where
    F: Fn() -> HostContext + Send + Sync,
{
    fn snapshot(&self) -> HostContext {
        self()
    }
}

/// Host facts held by the embedding, stamped with the wall clock on snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HostSettings {
    #[serde(default)]
    pub country: String,
    pub version_code: i64,
    #[serde(default)]
    pub is_pre_prod_release: bool,
    #[serde(default)]
    pub is_logged_in: bool,
    #[serde(default)]
    pub is_reading_list_sync_enabled: bool,
}

impl HostSettings {
    pub fn context_at(&self, now: DateTime<Utc>) -> HostContext {
        HostContext {
            country: CountryCode::new(self.country.clone()),
            now,
            version_code: self.version_code,
            is_pre_prod_release: self.is_pre_prod_release,
            is_logged_in: self.is_logged_in,
            is_reading_list_sync_enabled: self.is_reading_list_sync_enabled,
        }
    }
}

impl HostContextProvider for HostSettings {
    fn snapshot(&self) -> HostContext {
        self.context_at(Utc::now())
    }
}
