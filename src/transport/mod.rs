//! Fetching the announcement list for a wiki.

pub mod http;
pub mod wiki_site;

use async_trait::async_trait;
use thiserror::Error;

use crate::announcement::AnnouncementList;
pub use http::HttpTransport;
pub use wiki_site::{WikiSite, WikiSiteError};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid wiki site: {0}")]
    InvalidWiki(#[from] WikiSiteError),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Announcement list decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A single GET of `feed/announcements`, decoded.
///
/// Cancellation is the caller's concern: dropping the returned future must
/// abandon the request.
#[async_trait]
pub trait AnnouncementTransport: Send + Sync {
    async fn fetch(&self, wiki: &WikiSite) -> Result<AnnouncementList, TransportError>;
}
