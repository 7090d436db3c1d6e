// Portal client module: a small blocking HTTP client that posts publication
// envelopes to a ChemSem portal.

use clap::ValueEnum;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable that replaces the selected portal's base URL.
pub const PORTAL_URL_ENV: &str = "CSX2PORTAL_PORTAL_URL";

/// Path of the publish endpoint below a portal's base URL.
pub const PUBLISH_PATH: &str = "/cs/Services/WCF/PublicationPublish.svc/PublishWithValues";

/// The portals this tool knows how to publish to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Portal {
    Portable,
    Cloud,
}

impl Portal {
    pub fn base_url(self) -> &'static str {
        match self {
            Portal::Portable => "http://portable.chemsem.com",
            Portal::Cloud => "http://chemsemplus.cloudapp.net",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Portal::Portable => "portable",
            Portal::Cloud => "cloud",
        }
    }
}

impl fmt::Display for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A non-success answer from the portal, kept whole so it can be shown to
/// the user.
#[derive(Debug)]
pub struct HttpFailure {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.status.as_u16())?;
        writeln!(f, "{}", self.status.canonical_reason().unwrap_or(""))?;
        for (name, value) in &self.headers {
            writeln!(f, "{}: {}", name, value.to_str().unwrap_or("<binary>"))?;
        }
        write!(f, "{}", self.body)
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("portal answered with an error:\n{0}")]
    Http(Box<HttpFailure>),
    #[error("failed to reach portal: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Blocking client bound to one portal's publish endpoint.
#[derive(Clone)]
pub struct PortalClient {
    client: Client,
    base_url: String,
}

impl PortalClient {
    /// Client for `portal`, unless `CSX2PORTAL_PORTAL_URL` names another base.
    pub fn for_portal(portal: Portal) -> Result<Self, PublishError> {
        let base_url = std::env::var(PORTAL_URL_ENV).unwrap_or_else(|_| portal.base_url().into());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, PublishError> {
        let client = Client::builder().build()?;
        Ok(Self::from_client(client, base_url))
    }

    /// Wrap an already configured `reqwest` client.
    pub fn from_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(%base_url, "portal client ready");
        PortalClient { client, base_url }
    }

    pub fn publish_url(&self) -> String {
        format!("{}{}", self.base_url, PUBLISH_PATH)
    }

    /// POST one serialized envelope. Returns the response body on success.
    pub fn publish(&self, envelope_xml: String) -> Result<String, PublishError> {
        let url = self.publish_url();
        info!(%url, bytes = envelope_xml.len(), "posting envelope");
        let res = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/xml")
            .body(envelope_xml)
            .send()?;

        let status = res.status();
        if !status.is_success() {
            let headers = res.headers().clone();
            let body = res.text().unwrap_or_default();
            return Err(PublishError::Http(Box::new(HttpFailure {
                status,
                headers,
                body,
            })));
        }
        Ok(res.text()?)
    }
}
