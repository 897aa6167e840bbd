use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields;
use super::payload::{Action, Payload};
use crate::types::identifiers::AnnouncementId;

/// Which card an announcement renders as.
///
/// The wire tag is open; anything unrecognized, including non-string values,
/// `null` or absent, decodes to `Generic` instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<Value>", into = "Option<String>")]
pub enum AnnouncementKind {
    Survey,
    Fundraising,
    #[default]
    Generic,
}

impl AnnouncementKind {
    pub const SURVEY: &'static str = "survey";
    pub const FUNDRAISING: &'static str = "fundraising";

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            Self::SURVEY => AnnouncementKind::Survey,
            Self::FUNDRAISING => AnnouncementKind::Fundraising,
            _ => AnnouncementKind::Generic,
        }
    }

    pub fn tag(&self) -> Option<&'static str> {
        match self {
            AnnouncementKind::Survey => Some(Self::SURVEY),
            AnnouncementKind::Fundraising => Some(Self::FUNDRAISING),
            AnnouncementKind::Generic => None,
        }
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, AnnouncementKind::Generic)
    }
}

impl From<Option<Value>> for AnnouncementKind {
    fn from(tag: Option<Value>) -> Self {
        match tag {
            Some(Value::String(tag)) => AnnouncementKind::from_tag(&tag),
            _ => AnnouncementKind::Generic,
        }
    }
}

impl From<AnnouncementKind> for Option<String> {
    fn from(kind: AnnouncementKind) -> Self {
        kind.tag().map(str::to_string)
    }
}

/// A remotely authored message plus the metadata deciding who sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: AnnouncementId,

    #[serde(rename = "type", default, skip_serializing_if = "AnnouncementKind::is_generic")]
    pub kind: AnnouncementKind,

    #[serde(default, deserialize_with = "fields::null_as_default")]
    pub platforms: Vec<String>,
    #[serde(default, deserialize_with = "fields::null_as_default")]
    pub countries: Vec<String>,

    #[serde(default, deserialize_with = "fields::timestamp", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "fields::timestamp", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// Kept as authored; an empty or non-numeric bound is ignored at selection.
    #[serde(default, deserialize_with = "fields::version_bound", skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    #[serde(default, deserialize_with = "fields::version_bound", skip_serializing_if = "Option::is_none")]
    pub max_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logged_in: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_list_sync_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Dropped rather than failing the list when malformed.
    #[serde(default, deserialize_with = "fields::lenient_u32", skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_text: Option<String>,
    #[serde(rename = "caption_HTML", default, skip_serializing_if = "Option::is_none")]
    pub caption_html: Option<String>,

    #[serde(flatten)]
    pub payload: Payload,
}

impl Announcement {
    /// An announcement with no targeting at all: it matches no platform and
    /// no country until those are filled in.
    pub fn new(id: impl Into<String>) -> Self {
        Announcement {
            id: AnnouncementId::new(id),
            kind: AnnouncementKind::Generic,
            platforms: Vec::new(),
            countries: Vec::new(),
            start_time: None,
            end_time: None,
            min_version: None,
            max_version: None,
            beta: None,
            logged_in: None,
            reading_list_sync_enabled: None,
            text: None,
            image_url: None,
            image_height: None,
            action: None,
            negative_text: None,
            caption_html: None,
            payload: Payload::new(),
        }
    }
}

/// The decoded `feed/announcements` response. Order is as served; `null`
/// entries are skipped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnouncementList {
    #[serde(default, deserialize_with = "fields::skip_null_items")]
    pub items: Vec<Announcement>,
}

impl AnnouncementList {
    pub fn new(items: Vec<Announcement>) -> Self {
        AnnouncementList { items }
    }

    /// Decode a response body. A blank body is an empty list.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(AnnouncementList::default());
        }
        serde_json::from_slice(body)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Announcement> {
        self.items.iter()
    }
}

impl From<Vec<Announcement>> for AnnouncementList {
    fn from(items: Vec<Announcement>) -> Self {
        AnnouncementList::new(items)
    }
}

impl IntoIterator for AnnouncementList {
    type Item = Announcement;
    type IntoIter = std::vec::IntoIter<Announcement>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
