use chrono::{DateTime, Utc};

use crate::announcement::Announcement;
use crate::host::HostContext;
use crate::types::identifiers::PlatformCode;
use crate::types::selection_result::Rejection;

/// Decides whether one announcement may be shown under a host snapshot.
pub trait Eligibility {
    /// `Err` carries the first gate that failed.
    fn check(&self, announcement: &Announcement, ctx: &HostContext) -> Result<(), Rejection>;

    fn is_eligible(&self, announcement: &Announcement, ctx: &HostContext) -> bool {
        self.check(announcement, ctx).is_ok()
    }
}

/// Platform, country, time window, version and account-state gates, in that
/// order.
#[derive(Debug, Clone)]
pub struct StandardEligibility {
    platforms: Vec<PlatformCode>,
}

impl StandardEligibility {
    pub fn new(platforms: Vec<PlatformCode>) -> Self {
        Self { platforms }
    }

    pub fn platforms(&self) -> &[PlatformCode] {
        &self.platforms
    }
}

impl Default for StandardEligibility {
    fn default() -> Self {
        Self::new(PlatformCode::defaults())
    }
}

impl Eligibility for StandardEligibility {
    fn check(&self, announcement: &Announcement, ctx: &HostContext) -> Result<(), Rejection> {
        if !matches_platforms(announcement, &self.platforms) {
            return Err(Rejection::Platform);
        }
        if !matches_country(announcement, ctx) {
            return Err(Rejection::Country);
        }
        if !has_started(announcement, ctx.now) {
            return Err(Rejection::NotStarted);
        }
        if has_ended(announcement, ctx.now) {
            return Err(Rejection::Expired);
        }
        if !matches_version_codes(
            announcement.min_version.as_deref(),
            announcement.max_version.as_deref(),
            ctx.version_code,
        ) {
            return Err(Rejection::Version);
        }
        if !matches_conditions(announcement, ctx) {
            return Err(Rejection::Conditions);
        }
        Ok(())
    }
}

pub fn matches_platforms(announcement: &Announcement, platforms: &[PlatformCode]) -> bool {
    announcement
        .platforms
        .iter()
        .any(|p| platforms.iter().any(|code| code.as_str() == p))
}

/// No known country matches nothing.
pub fn matches_country(announcement: &Announcement, ctx: &HostContext) -> bool {
    match &ctx.country {
        Some(country) if !country.as_str().is_empty() => {
            announcement.countries.iter().any(|c| c == country.as_str())
        }
        _ => false,
    }
}

/// Inclusive: an announcement starting exactly at `now` has started.
pub fn has_started(announcement: &Announcement, now: DateTime<Utc>) -> bool {
    announcement.start_time.map_or(true, |start| start <= now)
}

/// Inclusive: an announcement ending exactly at `now` is still live.
pub fn has_ended(announcement: &Announcement, now: DateTime<Utc>) -> bool {
    announcement.end_time.map_or(false, |end| end < now)
}

/// Each bound applies only when it parses as an integer; a malformed bound
/// is dropped on its own and never rejects.
pub fn matches_version_codes(min: Option<&str>, max: Option<&str>, version_code: i64) -> bool {
    if let Some(min) = parse_bound(min) {
        if min > version_code {
            return false;
        }
    }
    if let Some(max) = parse_bound(max) {
        if max < version_code {
            return false;
        }
    }
    true
}

fn parse_bound(bound: Option<&str>) -> Option<i64> {
    bound.filter(|b| !b.is_empty()).and_then(|b| b.parse().ok())
}

/// Every condition the announcement states must match the host.
pub fn matches_conditions(announcement: &Announcement, ctx: &HostContext) -> bool {
    let conditions = [
        (announcement.beta, ctx.is_pre_prod_release),
        (announcement.logged_in, ctx.is_logged_in),
        (announcement.reading_list_sync_enabled, ctx.is_reading_list_sync_enabled),
    ];
    conditions
        .iter()
        .all(|(wanted, actual)| wanted.map_or(true, |wanted| wanted == *actual))
}
