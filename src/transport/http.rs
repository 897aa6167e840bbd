//! HTTP transport for the wiki `feed/announcements` endpoint.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::info;

use super::{AnnouncementTransport, TransportError, WikiSite};
use crate::announcement::AnnouncementList;
use crate::config::ClientConfig;

const ANNOUNCEMENTS_PATH: &str = "feed/announcements";

pub struct HttpTransport {
    client: reqwest::Client,
    endpoint_format: String,
    accept_header: String,
}

impl HttpTransport {
    /// Build a transport with the endpoint template, accept header and
    /// timeout from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            endpoint_format: config.endpoint_format.clone(),
            accept_header: config.accept_header.clone(),
        })
    }

    pub fn endpoint(&self, wiki: &WikiSite) -> String {
        format!("{}{}", wiki.endpoint_base(&self.endpoint_format), ANNOUNCEMENTS_PATH)
    }
}

#[async_trait]
impl AnnouncementTransport for HttpTransport {
    async fn fetch(&self, wiki: &WikiSite) -> Result<AnnouncementList, TransportError> {
        let url = self.endpoint(wiki);

        info!(url = %url, "fetching announcements");
        let resp = self
            .client
            .get(&url)
            .header(ACCEPT, &self.accept_header)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.bytes().await?;
        let list = AnnouncementList::from_slice(&body)?;
        info!(count = list.len(), "fetched announcements");
        Ok(list)
    }
}
