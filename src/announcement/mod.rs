pub mod announcement;
pub mod fields;
pub mod payload;

pub use crate::types::identifiers::AnnouncementId;
pub use announcement::{Announcement, AnnouncementKind, AnnouncementList};
pub use fields::parse_timestamp;
pub use payload::{Action, Payload};
