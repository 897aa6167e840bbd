//! Deterministic announcement selection engine for wiki feed clients.
//!
//! `announcement-core` fetches the announcements a wiki publishes, filters
//! them against a snapshot of the host (country, clock, app version, release
//! channel, account state) and turns the survivors into typed feed cards.
//! Selection is pure: identical announcement lists and host snapshots always
//! produce identical, identically ordered cards.

pub mod announcement;
pub mod client;
pub mod config;
pub mod host;
pub mod selection;
pub mod transport;
pub mod types;

pub use announcement::{Announcement, AnnouncementKind, AnnouncementList};
pub use client::{AnnouncementClient, Delivery, FeedCallback};
pub use config::ClientConfig;
pub use host::{HostContext, HostContextProvider, HostSettings};
pub use selection::{select_cards, CardSelector};
pub use transport::{AnnouncementTransport, HttpTransport, TransportError, WikiSite};
pub use types::Card;
