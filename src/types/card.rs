use serde::Serialize;

use crate::announcement::{Announcement, AnnouncementKind};

/// A UI-ready wrapper around an eligible announcement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "card", content = "announcement", rename_all = "snake_case")]
pub enum Card {
    Survey(Announcement),
    Fundraising(Announcement),
    Generic(Announcement),
}

impl Card {
    /// Wrap `announcement` in the variant its kind calls for.
    pub fn from_announcement(announcement: Announcement) -> Self {
        match announcement.kind {
            AnnouncementKind::Survey => Card::Survey(announcement),
            AnnouncementKind::Fundraising => Card::Fundraising(announcement),
            AnnouncementKind::Generic => Card::Generic(announcement),
        }
    }

    pub fn announcement(&self) -> &Announcement {
        match self {
            Card::Survey(a) | Card::Fundraising(a) | Card::Generic(a) => a,
        }
    }

    pub fn into_announcement(self) -> Announcement {
        match self {
            Card::Survey(a) | Card::Fundraising(a) | Card::Generic(a) => a,
        }
    }

    pub fn kind(&self) -> AnnouncementKind {
        match self {
            Card::Survey(_) => AnnouncementKind::Survey,
            Card::Fundraising(_) => AnnouncementKind::Fundraising,
            Card::Generic(_) => AnnouncementKind::Generic,
        }
    }
}
