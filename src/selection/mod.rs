pub mod filters;

use tracing::debug;

use crate::announcement::{Announcement, AnnouncementList};
use crate::host::HostContext;
use crate::types::card::Card;
use crate::types::identifiers::PlatformCode;
use crate::types::selection_result::{Exclusions, Rejection, SelectionMetadata, SelectionResult};
pub use filters::{
	matches_conditions, matches_country, matches_platforms, matches_version_codes, Eligibility,
	StandardEligibility,
};

/// Select the cards to show for `list` under `ctx` with the default gates.
pub fn select_cards(list: AnnouncementList, ctx: &HostContext) -> Vec<Card> {
	CardSelector::default().select(list, ctx).cards
}

pub struct CardSelector<E> {
	eligibility: E,
}

impl Default for CardSelector<StandardEligibility> {
	fn default() -> Self {
		Self {
			eligibility: StandardEligibility::default(),
		}
	}
}

impl CardSelector<StandardEligibility> {
	/// Default gates answering to `platforms` instead of the built-in codes.
	pub fn with_platforms(platforms: Vec<PlatformCode>) -> Self {
		Self::new(StandardEligibility::new(platforms))
	}
}

impl<E> CardSelector<E>
where
	E: Eligibility,
{
	pub fn new(eligibility: E) -> Self {
		Self { eligibility }
	}

	pub fn check(&self, announcement: &Announcement, ctx: &HostContext) -> Result<(), Rejection> {
		self.eligibility.check(announcement, ctx)
	}

	/// Filter `list` down to its eligible announcements, in input order, and
	/// wrap each in its card.
	///
	/// Pure: the same list and context always give the same result.
	pub fn select(&self, list: AnnouncementList, ctx: &HostContext) -> SelectionResult {
		let announcements_considered = list.len();
		let mut excluded = Exclusions::default();
		let mut cards = Vec::with_capacity(announcements_considered);

		for announcement in list {
			match self.eligibility.check(&announcement, ctx) {
				Ok(()) => cards.push(Card::from_announcement(announcement)),
				Err(reason) => {
					debug!(id = %announcement.id, %reason, "announcement excluded");
					excluded.record(reason);
				}
			}
		}

		debug_assert_eq!(cards.len() + excluded.total(), announcements_considered);

		let selection = SelectionMetadata {
			announcements_considered,
			cards_selected: cards.len(),
			excluded,
		};

		SelectionResult { cards, selection }
	}
}
