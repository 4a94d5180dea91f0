//! Gravatar profile lookup.
//!
//! Gravatar keys profiles on the MD5 of the lowercased address; the JSON
//! profile endpoint returns an `entry` array whose first element carries
//! the public profile fields.

use md5::{Digest, Md5};
use serde::Serialize;

use vg_core::{Error, Result};

/// Public profile fields extracted from a Gravatar entry.
#[derive(Debug, Clone, Serialize)]
pub struct GravatarInfo {
    /// Canonical profile URL.
    pub profile_url: Option<String>,
    /// Formatted display name.
    pub name: Option<String>,
    /// The hash the profile was found under.
    pub hash: String,
}

/// Gravatar's address hash: MD5 of the trimmed, lowercased email.
pub fn email_hash(email: &str) -> String {
    hex::encode(Md5::digest(email.trim().to_lowercase().as_bytes()))
}

/// Fetch the Gravatar profile for `email`, if one exists.
///
/// A non-success status (no profile) is `Ok(None)`; only transport
/// failures are errors.
pub async fn check_gravatar(
    http: &reqwest::Client,
    base: &str,
    email: &str,
) -> Result<Option<GravatarInfo>> {
    let hash = email_hash(email);
    let url = format!("{}/{hash}.json", base.trim_end_matches('/'));

    let response = http
        .get(&url)
        .send()
        .await
        .map_err(|e| Error::Http(format!("gravatar request failed: {e}")))?;

    if !response.status().is_success() {
        tracing::debug!("No Gravatar profile for hash {hash} ({})", response.status());
        return Ok(None);
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| Error::Http(format!("gravatar response was not JSON: {e}")))?;

    Ok(parse_profile(&body, hash))
}

/// Pull the interesting fields out of the first profile entry.
///
/// The payload shape is loose (e.g. `name` is `[]` when unset), so fields
/// are navigated defensively instead of deserialized strictly.
fn parse_profile(body: &serde_json::Value, hash: String) -> Option<GravatarInfo> {
    let entry = body.get("entry")?.as_array()?.first()?;

    let profile_url = entry
        .get("profileUrl")
        .and_then(|v| v.as_str())
        .map(String::from);
    let name = entry
        .get("name")
        .and_then(|n| n.get("formatted"))
        .and_then(|v| v.as_str())
        .map(String::from);

    Some(GravatarInfo {
        profile_url,
        name,
        hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_documented_example() {
        // The example hash from Gravatar's own documentation.
        assert_eq!(
            email_hash("MyEmailAddress@example.com "),
            "0bc83cb571cd1c50ba6f3e8a78ef1346"
        );
    }

    #[test]
    fn hash_normalizes_case_and_whitespace() {
        let canonical = email_hash("user@example.com");
        assert_eq!(email_hash("  USER@Example.COM  "), canonical);
        assert_eq!(canonical.len(), 32);
        assert!(canonical.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn parse_full_entry() {
        let body = serde_json::json!({
            "entry": [{
                "profileUrl": "https://gravatar.com/user",
                "name": {"formatted": "Some User"}
            }]
        });
        let info = parse_profile(&body, "h".into()).unwrap();
        assert_eq!(info.profile_url.as_deref(), Some("https://gravatar.com/user"));
        assert_eq!(info.name.as_deref(), Some("Some User"));
    }

    #[test]
    fn parse_entry_with_empty_name_array() {
        // Gravatar sends `"name": []` for profiles without a display name.
        let body = serde_json::json!({
            "entry": [{"profileUrl": "https://gravatar.com/user", "name": []}]
        });
        let info = parse_profile(&body, "h".into()).unwrap();
        assert!(info.name.is_none());
        assert!(info.profile_url.is_some());
    }

    #[test]
    fn parse_missing_entry_is_none() {
        assert!(parse_profile(&serde_json::json!({}), "h".into()).is_none());
        assert!(parse_profile(&serde_json::json!({"entry": []}), "h".into()).is_none());
    }
}
