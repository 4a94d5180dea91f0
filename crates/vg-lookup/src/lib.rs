//! # vg-lookup
//!
//! Email OSINT: checks the Gravatar profile endpoint for a hashed address
//! and scrapes a web search for public mentions. Both halves are
//! independent; a failure in one is logged and reported as empty rather
//! than aborting the other.

pub mod gravatar;
pub mod search;

use serde::Serialize;

use vg_core::config::LookupConfig;
use vg_core::{Error, Result};

pub use gravatar::{email_hash, GravatarInfo};

/// Combined result of both lookup halves.
#[derive(Debug, Clone, Serialize)]
pub struct LookupReport {
    /// The address that was looked up.
    pub email: String,
    /// Gravatar profile, when one exists.
    pub gravatar: Option<GravatarInfo>,
    /// Public links mentioning the address.
    pub links: Vec<String>,
}

/// Client owning the HTTP connection pool and lookup endpoints.
pub struct LookupClient {
    http: reqwest::Client,
    config: LookupConfig,
}

impl LookupClient {
    /// Build a client from the lookup configuration.
    pub fn new(config: LookupConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Run both lookup halves for `email`.
    ///
    /// Only address validation fails the call; transport errors in either
    /// half degrade to an empty result for that half.
    pub async fn run(&self, email: &str) -> Result<LookupReport> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(Error::Validation(format!(
                "not an email address: {email:?}"
            )));
        }

        let gravatar = match gravatar::check_gravatar(&self.http, &self.config.gravatar_base, email)
            .await
        {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Gravatar lookup failed: {e}");
                None
            }
        };

        let links = match search::search_email(
            &self.http,
            &self.config.search_base,
            email,
            self.config.result_count,
        )
        .await
        {
            Ok(links) => links,
            Err(e) => {
                tracing::warn!("Web search failed: {e}");
                Vec::new()
            }
        };

        Ok(LookupReport {
            email: email.to_string(),
            gravatar,
            links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_addresses() {
        let client = LookupClient::new(LookupConfig::default()).unwrap();
        assert!(client.run("").await.is_err());
        assert!(client.run("   ").await.is_err());
        assert!(client.run("not-an-email").await.is_err());
    }
}
