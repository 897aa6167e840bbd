pub mod card;
pub mod identifiers;
pub mod selection_result;

pub use card::Card;
pub use identifiers::{AnnouncementId, CountryCode, PlatformCode};
pub use selection_result::{Exclusions, Rejection, SelectionMetadata, SelectionResult};
