//! Web search for public mentions of an address.
//!
//! Queries an HTML search endpoint (DuckDuckGo's by default) with the
//! quoted address and collects result links. Redirect-wrapped hrefs are
//! unwrapped to their target URL.

use scraper::{Html, Selector};

use vg_core::{Error, Result};

/// Search for the quoted `email` and return up to `limit` result URLs.
pub async fn search_email(
    http: &reqwest::Client,
    base: &str,
    email: &str,
    limit: usize,
) -> Result<Vec<String>> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let response = http
        .get(base)
        .query(&[("q", format!("\"{email}\""))])
        .send()
        .await
        .map_err(|e| Error::Http(format!("search request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Http(format!("search returned {status}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| Error::Http(format!("failed to read search response: {e}")))?;

    Ok(parse_result_links(&body, limit))
}

/// Extract result links from the search page.
fn parse_result_links(html: &str, limit: usize) -> Vec<String> {
    let selector = match Selector::parse("a.result__a") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(normalize_href)
        .take(limit)
        .collect()
}

/// Resolve a result href to the target URL.
///
/// The endpoint wraps targets in a scheme-relative redirect carrying the
/// real URL in a `uddg` query parameter; direct http(s) links pass through.
fn normalize_href(href: &str) -> Option<String> {
    let absolute = if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        href.to_string()
    };

    let url = reqwest::Url::parse(&absolute).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    if let Some((_, target)) = url.query_pairs().find(|(k, _)| k == "uddg") {
        return Some(target.into_owned());
    }

    Some(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
        <html><body>
          <div class="result">
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fforum.example%2Fuser&amp;rut=abc">Forum profile</a>
          </div>
          <div class="result">
            <a class="result__a" href="https://pastebin.example/leak">Direct link</a>
          </div>
          <div class="result">
            <a class="result__a" href="javascript:void(0)">Not a link</a>
          </div>
          <a href="https://unrelated.example">Unrelated anchor</a>
        </body></html>
    "#;

    #[test]
    fn parses_and_unwraps_redirects() {
        let links = parse_result_links(RESULTS_PAGE, 5);
        assert_eq!(
            links,
            vec![
                "https://forum.example/user".to_string(),
                "https://pastebin.example/leak".to_string(),
            ]
        );
    }

    #[test]
    fn limit_truncates_results() {
        let links = parse_result_links(RESULTS_PAGE, 1);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0], "https://forum.example/user");
    }

    #[test]
    fn empty_page_yields_nothing() {
        assert!(parse_result_links("<html></html>", 5).is_empty());
    }

    #[test]
    fn normalize_rejects_non_http_schemes() {
        assert!(normalize_href("javascript:void(0)").is_none());
        assert!(normalize_href("mailto:a@b.c").is_none());
        assert_eq!(
            normalize_href("https://a.example/x").as_deref(),
            Some("https://a.example/x")
        );
    }
}
