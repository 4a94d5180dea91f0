//! Extractor failure classification.
//!
//! The extractor reports failures as prose on stderr. This module maps the
//! known message shapes onto [`FetchErrorKind`] so the retry layer and the
//! HTTP error mapping can treat them uniformly.

use vg_core::FetchErrorKind;

/// Classify an extractor stderr dump into a [`FetchErrorKind`].
///
/// Matching is case-insensitive and substring-based; the first matching
/// rule wins, unknown messages fall through to [`FetchErrorKind::Extractor`].
pub fn classify_stderr(stderr: &str) -> FetchErrorKind {
    let text = stderr.to_lowercase();

    // Order matters: the bot-challenge message also contains "sign in",
    // so it is tested before the age-restriction patterns.
    if text.contains("sign in to confirm you're not a bot")
        || text.contains("confirm you are not a bot")
    {
        return FetchErrorKind::BotChallenge;
    }

    if text.contains("is not a valid url") || text.contains("unsupported url") {
        return FetchErrorKind::UnsupportedUrl;
    }

    if text.contains("video unavailable")
        || text.contains("this video is not available")
        || text.contains("has been removed")
    {
        return FetchErrorKind::Unavailable;
    }

    if text.contains("private video") {
        return FetchErrorKind::Private;
    }

    if text.contains("sign in to confirm your age") || text.contains("age-restricted") {
        return FetchErrorKind::AgeRestricted;
    }

    if text.contains("http error 429") || text.contains("rate-limited") || text.contains("too many requests") {
        return FetchErrorKind::RateLimited;
    }

    if text.contains("requested format is not available") {
        return FetchErrorKind::ResolutionUnavailable;
    }

    if text.contains("timed out")
        || text.contains("connection reset")
        || text.contains("connection refused")
        || text.contains("getaddrinfo")
        || text.contains("temporary failure in name resolution")
    {
        return FetchErrorKind::Network;
    }

    FetchErrorKind::Extractor
}
