//! Redirect-following transport decorator.

use super::{HttpRequest, HttpResponse, RequestBody, Transport, TransportError, TransportErrorKind};
use crate::errors::{sanitize_url, GitHubResult};
use crate::observability::TracingHooks;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, LOCATION, WWW_AUTHENTICATE};
use reqwest::{Method, StatusCode};
use std::sync::Arc;

/// Follows 301/302/303/307/308 responses up to a hop limit.
///
/// 301 and 302 turn a POST into a GET and 303 turns anything but HEAD
/// into a GET; those hops drop the body. 307 and 308 replay method and
/// body, and are returned unfollowed when the body is a one-shot stream.
/// Credentials set on the request are not forwarded to another host.
pub struct FollowRedirects {
    inner: Arc<dyn Transport>,
    max_redirects: usize,
}

impl FollowRedirects {
    /// Wraps `inner`.
    pub fn new(inner: Arc<dyn Transport>, max_redirects: usize) -> Self {
        Self {
            inner,
            max_redirects,
        }
    }

    /// Gets the wrapped transport.
    pub fn inner(&self) -> &Arc<dyn Transport> {
        &self.inner
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

fn strip_credentials(headers: &mut HeaderMap) {
    headers.remove(AUTHORIZATION);
    headers.remove(WWW_AUTHENTICATE);
    headers.remove(COOKIE);
}

#[async_trait]
impl Transport for FollowRedirects {
    async fn round_trip(&self, request: HttpRequest) -> GitHubResult<HttpResponse> {
        let mut request = request;
        let mut hops = 0;

        loop {
            let method = request.method.clone();
            let url = request.url.clone();
            let mut headers = request.headers.clone();
            let replay_body = request.body.try_clone();

            let response = self.inner.round_trip(request).await?;
            if !is_redirect(response.status) {
                return Ok(response);
            }

            let Some(location) = response.header(LOCATION.as_str()).filter(|l| !l.is_empty()) else {
                return Ok(response);
            };
            let next_url = url.join(location).map_err(|e| {
                TransportError::new(
                    TransportErrorKind::Redirect,
                    method.clone(),
                    url.clone(),
                    format!("failed to parse Location header {location:?}: {e}"),
                )
            })?;

            let status = response.status;
            let (next_method, next_body) = match status {
                StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT => match replay_body {
                    Some(body) => (method.clone(), body),
                    None => return Ok(response),
                },
                StatusCode::SEE_OTHER if method != Method::HEAD => (Method::GET, RequestBody::Empty),
                StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND if method == Method::POST => {
                    (Method::GET, RequestBody::Empty)
                }
                _ => (method.clone(), RequestBody::Empty),
            };

            if hops >= self.max_redirects {
                return Err(TransportError::new(
                    TransportErrorKind::Redirect,
                    method,
                    url,
                    format!("stopped after {} redirects", self.max_redirects),
                )
                .into());
            }
            hops += 1;

            if next_body.is_empty() {
                headers.remove(CONTENT_TYPE);
                headers.remove(CONTENT_LENGTH);
            }
            if next_url.host_str() != url.host_str() {
                strip_credentials(&mut headers);
            }

            TracingHooks::on_redirect(
                status.as_u16(),
                sanitize_url(&url).as_str(),
                sanitize_url(&next_url).as_str(),
            );

            request = HttpRequest {
                method: next_method,
                url: next_url,
                headers,
                body: next_body,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockResponse, MockTransport};
    use url::Url;

    fn request(method: Method, path: &str) -> HttpRequest {
        HttpRequest::new(method, Url::parse("https://api.github.com/").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_follows_to_final_response() {
        let mock = Arc::new(MockTransport::new());
        mock.push(MockResponse::redirect(301, "/repos/new/name"));
        mock.push(MockResponse::ok(serde_json::json!({"id": 1})));

        let transport = FollowRedirects::new(mock.clone(), 10);
        let response = transport.round_trip(request(Method::GET, "repos/old/name")).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        let seen = mock.requests();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].url.path(), "/repos/new/name");
    }

    #[tokio::test]
    async fn test_post_becomes_get_on_302() {
        let mock = Arc::new(MockTransport::new());
        mock.push(MockResponse::redirect(302, "/elsewhere"));
        mock.push(MockResponse::no_content());

        let mut req = request(Method::POST, "things");
        req.body = RequestBody::from(b"{}".to_vec());
        FollowRedirects::new(mock.clone(), 10).round_trip(req).await.unwrap();

        let seen = mock.requests();
        assert_eq!(seen[1].method, Method::GET);
        assert!(seen[1].body.is_none());
    }

    #[tokio::test]
    async fn test_307_replays_body() {
        let mock = Arc::new(MockTransport::new());
        mock.push(MockResponse::redirect(307, "/elsewhere"));
        mock.push(MockResponse::no_content());

        let mut req = request(Method::PUT, "things");
        req.body = RequestBody::from(b"payload".to_vec());
        FollowRedirects::new(mock.clone(), 10).round_trip(req).await.unwrap();

        let seen = mock.requests();
        assert_eq!(seen[1].method, Method::PUT);
        assert_eq!(seen[1].body.as_deref(), Some(&b"payload"[..]));
    }

    #[tokio::test]
    async fn test_cross_host_drops_authorization() {
        let mock = Arc::new(MockTransport::new());
        mock.push(MockResponse::redirect(302, "https://objects.example.com/blob"));
        mock.push(MockResponse::ok(serde_json::json!({})));

        let mut req = request(Method::GET, "download");
        req.set_basic_auth("user", "pass");
        FollowRedirects::new(mock.clone(), 10).round_trip(req).await.unwrap();

        let seen = mock.requests();
        assert!(seen[0].headers.contains_key(AUTHORIZATION));
        assert!(!seen[1].headers.contains_key(AUTHORIZATION));
    }

    #[tokio::test]
    async fn test_hop_limit() {
        let mock = Arc::new(MockTransport::new());
        for _ in 0..3 {
            mock.push(MockResponse::redirect(301, "/loop"));
        }

        let err = FollowRedirects::new(mock.clone(), 2)
            .round_trip(request(Method::GET, "loop"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("stopped after 2 redirects"));
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_location_returned_as_is() {
        let mock = Arc::new(MockTransport::new());
        mock.push(MockResponse::new(302));

        let response = FollowRedirects::new(mock, 10)
            .round_trip(request(Method::GET, "x"))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::FOUND);
    }
}
