use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WikiSiteError {
    #[error("Invalid wiki URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Wiki URL has no host: {0}")]
    MissingHost(String),
    #[error("Wiki scheme and authority must be non-empty")]
    Empty,
}

/// The scheme and authority a wiki is served from, e.g. `https` and
/// `en.wikipedia.org`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WikiSite {
    scheme: String,
    authority: String,
}

impl WikiSite {
    pub fn new(scheme: impl Into<String>, authority: impl Into<String>) -> Result<Self, WikiSiteError> {
        let scheme = scheme.into();
        let authority = authority.into();
        if scheme.is_empty() || authority.is_empty() {
            return Err(WikiSiteError::Empty);
        }
        Ok(Self { scheme, authority })
    }

    /// Parse a wiki URL. A bare host is taken to be `https`.
    pub fn parse(url: &str) -> Result<Self, WikiSiteError> {
        let with_scheme = if url.contains("://") {
            url.to_string()
        } else {
            format!("https://{url}")
        };
        let parsed = Url::parse(&with_scheme).map_err(|e| WikiSiteError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let host = parsed
            .host_str()
            .ok_or_else(|| WikiSiteError::MissingHost(url.to_string()))?;
        let authority = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Self::new(parsed.scheme(), authority)
    }

    /// The Wikipedia for a language code, e.g. `en`.
    pub fn for_language(code: &str) -> Self {
        Self {
            scheme: "https".into(),
            authority: format!("{code}.wikipedia.org"),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Render an endpoint template with `{scheme}` and `{authority}` holes.
    pub fn endpoint_base(&self, format: &str) -> String {
        format
            .replace("{scheme}", &self.scheme)
            .replace("{authority}", &self.authority)
    }
}
