//! Pagination handling for GitHub API.
//!
//! List endpoints take one of the option structs below, encoded into the
//! query string by [`add_options`]. Responses carry the parsed `Link`
//! header as [`PageValues`].

use crate::config::DEFAULT_BASE_URL;
use crate::errors::{GitHubError, GitHubResult};
use reqwest::header::{HeaderMap, LINK};
use serde::Serialize;
use url::Url;

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// Offset pagination options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListOptions {
    /// Page of results to retrieve.
    #[serde(skip_serializing_if = "is_zero")]
    pub page: u32,
    /// Number of results per page.
    #[serde(skip_serializing_if = "is_zero")]
    pub per_page: u32,
}

impl ListOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Sets the page size.
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }
}

/// Cursor pagination options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListCursorOptions {
    /// Opaque page token.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub page: String,
    /// Number of results per page.
    #[serde(skip_serializing_if = "is_zero")]
    pub per_page: u32,
    /// Results per page counted from the first match. Not combinable with `last`.
    #[serde(skip_serializing_if = "is_zero")]
    pub first: u32,
    /// Results per page counted from the last match. Not combinable with `first`.
    #[serde(skip_serializing_if = "is_zero")]
    pub last: u32,
    /// Return results after this cursor.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub after: String,
    /// Return results before this cursor.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub before: String,
    /// Continue from this cursor.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cursor: String,
}

/// Upload query options. `media_type` becomes the Content-Type header,
/// never a query parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadOptions {
    /// Asset file name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Asset label.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    /// Content type of the upload.
    #[serde(skip)]
    pub media_type: String,
}

/// Encodes `opts` as the query string of the relative URL `s`.
///
/// `None` returns `s` unchanged. Otherwise any existing query on `s` is
/// replaced. Option types must be flat structs of scalars; sequences are
/// rejected by the encoder.
pub fn add_options<O: Serialize + ?Sized>(s: &str, opts: Option<&O>) -> GitHubResult<String> {
    let Some(opts) = opts else {
        return Ok(s.to_string());
    };

    Url::parse(DEFAULT_BASE_URL)
        .and_then(|base| base.join(s))
        .map_err(GitHubError::invalid_url)?;

    let query = serde_urlencoded::to_string(opts).map_err(GitHubError::serialization)?;
    let path = s.split_once('?').map_or(s, |(path, _)| path);

    Ok(if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    })
}

/// Pagination values parsed from a `Link` header.
///
/// Page numbers are zero when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageValues {
    /// Next page number.
    pub next_page: u32,
    /// Previous page number.
    pub prev_page: u32,
    /// First page number.
    pub first_page: u32,
    /// Last page number.
    pub last_page: u32,
    /// Non-numeric next page token.
    pub next_page_token: Option<String>,
    /// Cursor of the next page.
    pub cursor: Option<String>,
    /// Cursor for the previous page.
    pub before: Option<String>,
    /// Cursor for the next page.
    pub after: Option<String>,
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

impl PageValues {
    /// Parses the first `Link` header of a response.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(Self::from_header)
            .unwrap_or_default()
    }

    /// Parses a `Link` header value (RFC 8288). Malformed links are skipped.
    pub fn from_header(header_value: &str) -> Self {
        let mut values = Self::default();

        for link in header_value.split(',') {
            let segments: Vec<&str> = link.trim().split(';').collect();
            if segments.len() < 2 {
                continue;
            }

            let href = segments[0];
            let Some(href) = href.strip_prefix('<').and_then(|h| h.strip_suffix('>')) else {
                continue;
            };
            let Some(url) = parse_link_url(href) else {
                continue;
            };

            let query = |key: &str| {
                url.query_pairs()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.into_owned())
                    .unwrap_or_default()
            };
            let rels: Vec<&str> = segments[1..].iter().map(|s| s.trim()).collect();

            let cursor = query("cursor");
            if !cursor.is_empty() {
                if rels.contains(&r#"rel="next""#) {
                    values.cursor = Some(cursor);
                }
                continue;
            }

            let mut page = query("page");
            let since = query("since");
            let before = query("before");
            let after = query("after");

            if page.is_empty() && before.is_empty() && after.is_empty() && since.is_empty() {
                continue;
            }
            if page.is_empty() {
                page = since;
            }

            for rel in rels {
                match rel {
                    r#"rel="next""# => {
                        match page.parse::<u32>() {
                            Ok(n) => values.next_page = n,
                            Err(_) => values.next_page_token = non_empty(page.clone()),
                        }
                        values.after = non_empty(after.clone());
                    }
                    r#"rel="prev""# => {
                        values.prev_page = page.parse().unwrap_or(0);
                        values.before = non_empty(before.clone());
                    }
                    r#"rel="first""# => values.first_page = page.parse().unwrap_or(0),
                    r#"rel="last""# => values.last_page = page.parse().unwrap_or(0),
                    _ => {}
                }
            }
        }

        values
    }

    /// Returns true if there is a next page.
    pub fn has_next(&self) -> bool {
        self.next_page != 0 || self.next_page_token.is_some() || self.cursor.is_some() || self.after.is_some()
    }
}

fn parse_link_url(href: &str) -> Option<Url> {
    match Url::parse(href) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(DEFAULT_BASE_URL).ok()?.join(href).ok()
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_parse_offset_links() {
        let header = r#"<https://api.github.com/user/repos?page=3&per_page=100>; rel="next", <https://api.github.com/user/repos?page=1&per_page=100>; rel="prev", <https://api.github.com/user/repos?page=1&per_page=100>; rel="first", <https://api.github.com/user/repos?page=50&per_page=100>; rel="last""#;
        let values = PageValues::from_header(header);

        assert_eq!(
            values,
            PageValues {
                next_page: 3,
                prev_page: 1,
                first_page: 1,
                last_page: 50,
                ..Default::default()
            }
        );
        assert!(values.has_next());
    }

    #[test]
    fn test_parse_cursor_link() {
        let header = r#"<https://api.github.com/orgs/o/audit-log?cursor=v1_abc&per_page=30>; rel="next""#;
        let values = PageValues::from_header(header);
        assert_eq!(values.cursor.as_deref(), Some("v1_abc"));
        assert_eq!(values.next_page, 0);
    }

    #[test]
    fn test_parse_cursor_on_prev_is_ignored() {
        let header = r#"<https://api.github.com/x?cursor=abc>; rel="prev""#;
        assert_eq!(PageValues::from_header(header), PageValues::default());
    }

    #[test]
    fn test_parse_non_numeric_page_is_token() {
        let header = r#"<https://api.github.com/orgs/o/team-sync/groups?page=NEXT_TOKEN>; rel="next""#;
        let values = PageValues::from_header(header);
        assert_eq!(values.next_page, 0);
        assert_eq!(values.next_page_token.as_deref(), Some("NEXT_TOKEN"));
    }

    #[test]
    fn test_parse_since_used_as_page() {
        let header = r#"<https://api.github.com/users?since=135>; rel="next""#;
        assert_eq!(PageValues::from_header(header).next_page, 135);
    }

    #[test]
    fn test_parse_before_after() {
        let header = r#"<https://api.github.com/x?after=a1>; rel="next", <https://api.github.com/x?before=b1>; rel="prev""#;
        let values = PageValues::from_header(header);
        assert_eq!(values.after.as_deref(), Some("a1"));
        assert_eq!(values.before.as_deref(), Some("b1"));
        assert_eq!(values.next_page_token, None);
    }

    #[test_case("" ; "empty")]
    #[test_case("https://api.github.com/x?page=2; rel=\"next\"" ; "no angle brackets")]
    #[test_case("<https://api.github.com/x?page=2>" ; "no rel")]
    #[test_case("<https://api.github.com/x?per_page=2>; rel=\"next\"" ; "no page keys")]
    #[test_case("<https://api.github.com/x?page=2>; rel=\"related\"" ; "unknown rel")]
    fn test_malformed_links_are_skipped(header: &str) {
        assert_eq!(PageValues::from_header(header), PageValues::default());
    }

    #[test]
    fn test_add_options_none_is_identity() {
        let url = add_options::<ListOptions>("repos/o/r/issues?state=open", None).unwrap();
        assert_eq!(url, "repos/o/r/issues?state=open");
    }

    #[test]
    fn test_add_options_encodes_and_replaces_query() {
        let opts = ListOptions::new().with_page(2).with_per_page(50);
        let url = add_options("repos/o/r/issues?old=1", Some(&opts)).unwrap();
        assert_eq!(url, "repos/o/r/issues?page=2&per_page=50");
    }

    #[test]
    fn test_add_options_omits_zero_values() {
        let url = add_options("user/repos", Some(&ListOptions::default())).unwrap();
        assert_eq!(url, "user/repos");

        let opts = ListCursorOptions {
            cursor: "abc def".to_string(),
            ..Default::default()
        };
        assert_eq!(add_options("x", Some(&opts)).unwrap(), "x?cursor=abc+def");
    }

    #[test]
    fn test_upload_options_skip_media_type() {
        let opts = UploadOptions {
            name: "report.sarif".to_string(),
            media_type: "application/sarif+json".to_string(),
            ..Default::default()
        };
        assert_eq!(add_options("assets", Some(&opts)).unwrap(), "assets?name=report.sarif");
    }
}
