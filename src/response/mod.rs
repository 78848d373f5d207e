//! API response wrapper and header parsing.

use crate::config::{HEADER_FROM_CACHE, HEADER_RATE_RESET, HEADER_RETRY_AFTER, HEADER_TOKEN_EXPIRATION};
use crate::pagination::PageValues;
use crate::rate_limit::Rate;
use crate::transport::HttpResponse;
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use std::ops::Deref;
use std::time::Duration;

/// A GitHub API response.
///
/// Wraps the buffered HTTP response with pagination values, the rate
/// snapshot from its headers and the token expiration, when sent.
#[derive(Debug, Clone)]
pub struct Response {
    http: HttpResponse,
    /// Next page number, zero when absent.
    pub next_page: u32,
    /// Previous page number, zero when absent.
    pub prev_page: u32,
    /// First page number, zero when absent.
    pub first_page: u32,
    /// Last page number, zero when absent.
    pub last_page: u32,
    /// Non-numeric page token of the next link.
    pub next_page_token: Option<String>,
    /// Cursor of the next link.
    pub cursor: Option<String>,
    /// Cursor for the previous page.
    pub before: Option<String>,
    /// Cursor for the next page.
    pub after: Option<String>,
    /// Rate snapshot parsed from the response headers.
    pub rate: Rate,
    /// Expiration of the token used for the request.
    pub token_expiration: Option<DateTime<Local>>,
}

impl Response {
    /// Wraps an HTTP response and parses its metadata.
    pub fn new(http: HttpResponse) -> Self {
        let pages = PageValues::from_headers(&http.headers);
        let rate = parse_rate(&http.headers);
        let token_expiration = parse_token_expiration(&http.headers);

        Self {
            next_page: pages.next_page,
            prev_page: pages.prev_page,
            first_page: pages.first_page,
            last_page: pages.last_page,
            next_page_token: pages.next_page_token,
            cursor: pages.cursor,
            before: pages.before,
            after: pages.after,
            rate,
            token_expiration,
            http,
        }
    }

    /// Gets the underlying HTTP response.
    pub fn http(&self) -> &HttpResponse {
        &self.http
    }

    /// Unwraps the underlying HTTP response.
    pub fn into_http(self) -> HttpResponse {
        self.http
    }

    /// Reports whether a caching transport served this response.
    pub fn is_from_cache(&self) -> bool {
        self.http
            .header(HEADER_FROM_CACHE)
            .is_some_and(|v| !v.is_empty())
    }
}

impl Deref for Response {
    type Target = HttpResponse;

    fn deref(&self) -> &HttpResponse {
        &self.http
    }
}

/// Parses the `x-ratelimit-*` headers.
pub fn parse_rate(headers: &HeaderMap) -> Rate {
    Rate::from_headers(headers)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Parses how long to wait out a secondary rate limit.
///
/// `Retry-After` seconds win; otherwise the time left until
/// `x-ratelimit-reset`. Empty headers count as absent; unparseable values
/// count as zero.
pub fn parse_secondary_rate(headers: &HeaderMap) -> Option<Duration> {
    let header = |name: &str| header(headers, name).filter(|v| !v.is_empty());

    if let Some(v) = header(HEADER_RETRY_AFTER) {
        let secs = v.trim().parse::<i64>().unwrap_or(0);
        return Some(Duration::from_secs(secs.max(0) as u64));
    }

    if let Some(v) = header(HEADER_RATE_RESET) {
        let epoch = v.trim().parse::<i64>().unwrap_or(0);
        let reset = Utc.timestamp_opt(epoch, 0).single().unwrap_or_default();
        return Some((reset - Utc::now()).to_std().unwrap_or(Duration::ZERO));
    }

    None
}

/// Parses `github-authentication-token-expiration`.
///
/// Accepts `2006-01-02 15:04:05 UTC` and `2006-01-02 15:04:05 -0700`. A
/// zone abbreviation is read as a zero offset.
pub fn parse_token_expiration(headers: &HeaderMap) -> Option<DateTime<Local>> {
    let value = header(headers, HEADER_TOKEN_EXPIRATION)?.trim();
    parse_expiration_value(value).map(|t| t.with_timezone(&Local))
}

fn parse_expiration_value(value: &str) -> Option<DateTime<FixedOffset>> {
    if let Some((stamp, zone)) = value.rsplit_once(' ') {
        if !zone.is_empty() && zone.chars().all(|c| c.is_ascii_alphabetic()) {
            let naive = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").ok()?;
            return Some(Utc.from_utc_datetime(&naive).into());
        }
    }
    DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S %z").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockResponse;
    use reqwest::Method;
    use url::Url;

    fn response(mock: MockResponse) -> Response {
        let url = Url::parse("https://api.github.com/user/repos").unwrap();
        Response::new(mock.into_http(Method::GET, url))
    }

    #[test]
    fn test_pagination_and_rate_populated() {
        let r = response(
            MockResponse::ok(serde_json::json!([]))
                .with_link(r#"<https://api.github.com/x?page=2>; rel="next", <https://api.github.com/x?page=5>; rel="last""#)
                .with_rate(5000, 4999, 1_700_000_000),
        );
        assert_eq!(r.next_page, 2);
        assert_eq!(r.last_page, 5);
        assert_eq!(r.prev_page, 0);
        assert_eq!(r.rate.limit, 5000);
        assert_eq!(r.rate.remaining, 4999);
        assert_eq!(r.rate.used, 1);
        assert_eq!(r.rate.resource, "core");
        assert_eq!(r.rate.reset.map(|t| t.timestamp()), Some(1_700_000_000));
        assert_eq!(r.status.as_u16(), 200);
    }

    #[test]
    fn test_token_expiration_formats() {
        let r = response(MockResponse::no_content().with_header(HEADER_TOKEN_EXPIRATION, "2024-03-01 10:00:00 UTC"));
        assert_eq!(r.token_expiration.map(|t| t.timestamp()), Some(1_709_287_200));

        let r = response(MockResponse::no_content().with_header(HEADER_TOKEN_EXPIRATION, "2024-03-01 12:00:00 +0200"));
        assert_eq!(r.token_expiration.map(|t| t.timestamp()), Some(1_709_287_200));

        let r = response(MockResponse::no_content().with_header(HEADER_TOKEN_EXPIRATION, "next tuesday"));
        assert_eq!(r.token_expiration, None);
    }

    #[test]
    fn test_secondary_rate_prefers_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_secondary_rate(&headers), None);

        let reset = Utc::now().timestamp() + 120;
        headers.insert(HEADER_RATE_RESET, reset.to_string().parse().unwrap());
        let wait = parse_secondary_rate(&headers).unwrap();
        assert!(wait > Duration::from_secs(100) && wait <= Duration::from_secs(120));

        headers.insert(HEADER_RETRY_AFTER, "30".parse().unwrap());
        assert_eq!(parse_secondary_rate(&headers), Some(Duration::from_secs(30)));

        headers.insert(HEADER_RETRY_AFTER, "soon".parse().unwrap());
        assert_eq!(parse_secondary_rate(&headers), Some(Duration::ZERO));
    }

    #[test]
    fn test_secondary_rate_skips_empty_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_RETRY_AFTER, "".parse().unwrap());
        headers.insert(HEADER_RATE_RESET, "".parse().unwrap());
        assert_eq!(parse_secondary_rate(&headers), None);

        let reset = Utc::now().timestamp() + 60;
        headers.insert(HEADER_RATE_RESET, reset.to_string().parse().unwrap());
        let wait = parse_secondary_rate(&headers).unwrap();
        assert!(wait > Duration::from_secs(50) && wait <= Duration::from_secs(60));
    }

    #[test]
    fn test_from_cache() {
        assert!(!response(MockResponse::no_content()).is_from_cache());
        assert!(response(MockResponse::no_content().with_header(HEADER_FROM_CACHE, "1")).is_from_cache());
    }
}
