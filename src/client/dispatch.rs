//! The dispatch pipeline: pre-flight rate checks, the round trip, ledger
//! update and classification.

use super::GitHubClient;
use super::request::NO_BODY;
use crate::context::{sleep_until_reset_with_buffer, wait_until_reset, Context};
use crate::errors::{
    check_response, sanitize_url, AbuseRateLimitError, GitHubError, GitHubResult, RateLimitError,
};
use crate::observability::TracingHooks;
use crate::rate_limit::RateLimitCategory;
use crate::response::Response;
use crate::transport::{HttpRequest, HttpResponse, Transport};
use reqwest::header::LOCATION;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Instant;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use url::Url;

#[derive(Clone, Copy)]
enum Redirects {
    Follow,
    Surface,
}

impl GitHubClient {
    /// Sends an API request and returns the classified response.
    ///
    /// Redirects are followed. The response body is buffered on the
    /// returned [`Response`].
    pub async fn bare_do(&self, ctx: &Context, request: HttpRequest) -> GitHubResult<Response> {
        self.dispatch(ctx, request, Redirects::Follow).await
    }

    /// Like [`bare_do`](Self::bare_do) but any 3xx surfaces as
    /// [`GitHubError::Redirection`].
    pub async fn bare_do_ignore_redirects(
        &self,
        ctx: &Context,
        request: HttpRequest,
    ) -> GitHubResult<Response> {
        self.dispatch(ctx, request, Redirects::Surface).await
    }

    /// Sends an API request and decodes the JSON body into `T`.
    ///
    /// An empty body is not an error and yields `T::default()`.
    pub async fn do_json<T: DeserializeOwned + Default>(
        &self,
        ctx: &Context,
        request: HttpRequest,
    ) -> GitHubResult<(T, Response)> {
        let response = self.bare_do(ctx, request).await?;
        if response.body.is_empty() {
            return Ok((T::default(), response));
        }
        let value = serde_json::from_slice(&response.body).map_err(GitHubError::deserialization)?;
        Ok((value, response))
    }

    /// Sends an API request and copies the body into `writer`.
    pub async fn do_to_writer<W: AsyncWrite + Unpin + Send>(
        &self,
        ctx: &Context,
        request: HttpRequest,
        writer: &mut W,
    ) -> GitHubResult<Response> {
        let response = self.bare_do(ctx, request).await?;
        writer.write_all(&response.body).await?;
        writer.flush().await?;
        Ok(response)
    }

    /// Follows 301 responses until a 302 reveals the final location.
    ///
    /// Returns the 302 Location resolved against the base URL together
    /// with the 302 response. A non-redirect success returns no location.
    /// A 301 past `max_redirects` hops is [`GitHubError::TooManyRedirects`];
    /// any other redirect is [`GitHubError::UnexpectedRedirect`].
    pub async fn bare_do_until_found(
        &self,
        ctx: &Context,
        request: HttpRequest,
        max_redirects: usize,
    ) -> GitHubResult<(Option<Url>, Response)> {
        let mut request = request;
        let mut remaining = max_redirects;

        loop {
            let replay = request.try_clone();
            let redirect = match self.bare_do_ignore_redirects(ctx, request).await {
                Ok(response) => return Ok((None, response)),
                Err(GitHubError::Redirection(redirect)) => redirect,
                Err(e) => return Err(e),
            };

            let status = redirect.response.status;
            if status != StatusCode::FOUND && status != StatusCode::MOVED_PERMANENTLY {
                return Err(GitHubError::UnexpectedRedirect(redirect));
            }
            if status == StatusCode::MOVED_PERMANENTLY && remaining == 0 {
                return Err(GitHubError::TooManyRedirects(redirect));
            }

            let location = self.resolve_location(&redirect.response)?;
            if status == StatusCode::FOUND {
                return Ok((Some(location), Response::new(*redirect.response)));
            }

            let Some(mut next) = replay else {
                return Err(GitHubError::UnexpectedRedirect(redirect));
            };
            next.url = location;
            request = next;
            remaining -= 1;
        }
    }

    /// Resolves a response's Location header against the base URL.
    fn resolve_location(&self, response: &HttpResponse) -> GitHubResult<Url> {
        response
            .header(LOCATION.as_str())
            .filter(|l| !l.is_empty())
            .and_then(|l| self.base_url.join(l).ok())
            .ok_or(GitHubError::InvalidLocation)
    }

    /// Sends a GET without rate accounting or classification, following
    /// only 301 responses up to `max_redirects` times.
    pub async fn round_trip_with_optional_follow_redirect(
        &self,
        ctx: &Context,
        url: &str,
        max_redirects: usize,
    ) -> GitHubResult<HttpResponse> {
        let mut url = url.to_string();
        let mut remaining = max_redirects;

        loop {
            let request = self.new_request(Method::GET, &url, NO_BODY, &[])?;
            let response = self.round_trip(ctx, self.transport.as_ref(), request).await?;

            if remaining == 0 || response.status != StatusCode::MOVED_PERMANENTLY {
                return Ok(response);
            }
            url = response.header(LOCATION.as_str()).unwrap_or_default().to_string();
            remaining -= 1;
        }
    }

    /// Resolves a download link: the Location of the 302 the endpoint at
    /// `url` answers with. Goes through rate accounting only when the
    /// client is configured to.
    pub(crate) async fn redirect_location(
        &self,
        ctx: &Context,
        url: &str,
        max_redirects: usize,
    ) -> GitHubResult<(Url, Response)> {
        if self.rate_limit_redirectional_endpoints {
            let request = self.new_request(Method::GET, url, NO_BODY, &[])?;
            return match self.bare_do_until_found(ctx, request, max_redirects).await? {
                (Some(location), response) => Ok((location, response)),
                (None, response) => Err(GitHubError::UnexpectedStatus {
                    status: response.status,
                    response: Box::new(response),
                }),
            };
        }

        let http = self
            .round_trip_with_optional_follow_redirect(ctx, url, max_redirects)
            .await?;
        let response = Response::new(http);
        if response.status != StatusCode::FOUND {
            return Err(GitHubError::UnexpectedStatus {
                status: response.status,
                response: Box::new(response),
            });
        }
        let location = self.resolve_location(&response)?;
        Ok((location, response))
    }

    async fn dispatch(
        &self,
        ctx: &Context,
        request: HttpRequest,
        redirects: Redirects,
    ) -> GitHubResult<Response> {
        let category = self.category_of(&request);
        self.preflight(ctx, &request, category).await?;
        if !ctx.sleeps_until_primary_rate_limit_reset() {
            return self.send(ctx, request, category, redirects).await;
        }

        let replay = request.try_clone();
        match self.send(ctx, request, category, redirects).await {
            Err(GitHubError::RateLimit(e)) => {
                let Some(request) = replay else {
                    return Err(GitHubError::RateLimit(e));
                };
                TracingHooks::on_rate_limit_sleep(category, wait_until_reset(e.rate.reset));
                sleep_until_reset_with_buffer(ctx, e.rate.reset).await?;

                let ctx = ctx.clone().without_primary_rate_limit_sleep();
                self.preflight(&ctx, &request, category).await?;
                self.send(&ctx, request, category, redirects).await
            }
            result => result,
        }
    }

    async fn preflight(
        &self,
        ctx: &Context,
        request: &HttpRequest,
        category: RateLimitCategory,
    ) -> GitHubResult<()> {
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }
        if ctx.bypasses_rate_limit_check() {
            return Ok(());
        }
        self.check_primary(ctx, request, category).await?;
        self.check_secondary(request)
    }

    async fn send(
        &self,
        ctx: &Context,
        request: HttpRequest,
        category: RateLimitCategory,
        redirects: Redirects,
    ) -> GitHubResult<Response> {
        let method = request.method.clone();
        let log_url = sanitize_url(&request.url);
        TracingHooks::on_request_start(method.as_str(), log_url.as_str(), category);
        let started = Instant::now();

        let transport: &dyn Transport = match redirects {
            Redirects::Follow => &self.follow,
            Redirects::Surface => self.transport.as_ref(),
        };
        let http = match self.round_trip(ctx, transport, request).await {
            Ok(http) => http,
            Err(e) => {
                TracingHooks::on_request_error(method.as_str(), log_url.as_str(), &e.to_string());
                return Err(e);
            }
        };

        TracingHooks::on_request_complete(
            method.as_str(),
            log_url.as_str(),
            http.status.as_u16(),
            started.elapsed(),
        );

        let response = Response::new(http);
        if !response.is_from_cache() {
            self.ledger.record(category, response.rate.clone());
        }

        match check_response(&response) {
            Ok(()) => Ok(response),
            Err(GitHubError::AbuseRateLimit(mut e)) => {
                if let Some(retry_after) = e.retry_after {
                    let retry_after = match self.max_secondary_rate_limit_retry_after {
                        Some(max) if !max.is_zero() && retry_after > max => max,
                        _ => retry_after,
                    };
                    e.retry_after = Some(retry_after);
                    self.ledger.record_secondary(retry_after);
                }
                Err(GitHubError::AbuseRateLimit(e))
            }
            Err(e) => Err(e),
        }
    }

    /// Runs the transport, letting the context's end win.
    async fn round_trip(
        &self,
        ctx: &Context,
        transport: &dyn Transport,
        request: HttpRequest,
    ) -> GitHubResult<HttpResponse> {
        let result = tokio::select! {
            err = ctx.done() => Err(GitHubError::from(err)),
            result = transport.round_trip(request) => result,
        };

        result.map_err(|e| {
            if let Some(err) = ctx.err() {
                return err.into();
            }
            match e {
                GitHubError::Transport(e) => GitHubError::Transport(e.sanitized()),
                other => other,
            }
        })
    }

    /// Rate category of a request. The base URL path is stripped first so
    /// enterprise prefixes like `/api/v3` do not hide the API path.
    fn category_of(&self, request: &HttpRequest) -> RateLimitCategory {
        let path = request.url.path();
        let base = self.base_url.path().trim_end_matches('/');
        let path = if base.is_empty() {
            path
        } else {
            path.strip_prefix(base).unwrap_or(path)
        };
        RateLimitCategory::of(&request.method, path)
    }

    async fn check_primary(
        &self,
        ctx: &Context,
        request: &HttpRequest,
        category: RateLimitCategory,
    ) -> GitHubResult<()> {
        let Some(rate) = self.ledger.exhausted(category, chrono::Utc::now()) else {
            return Ok(());
        };
        let reset = rate
            .reset
            .map(|r| r.to_string())
            .unwrap_or_default();

        if ctx.sleeps_until_primary_rate_limit_reset() {
            TracingHooks::on_rate_limit_sleep(category, wait_until_reset(rate.reset));
            if sleep_until_reset_with_buffer(ctx, rate.reset).await.is_ok() {
                return Ok(());
            }
            return Err(GitHubError::RateLimit(RateLimitError {
                message: format!(
                    "Context cancelled while waiting for rate limit to reset until {reset}, not making remote request."
                ),
                response: Box::new(synthetic_forbidden(request)),
                rate,
            }));
        }

        TracingHooks::on_rate_limit_exceeded(category, &rate);
        Err(GitHubError::RateLimit(RateLimitError {
            message: format!(
                "API rate limit of {} still exceeded until {reset}, not making remote request.",
                rate.limit
            ),
            response: Box::new(synthetic_forbidden(request)),
            rate,
        }))
    }

    fn check_secondary(&self, request: &HttpRequest) -> GitHubResult<()> {
        let now = chrono::Utc::now();
        let Some(until) = self.ledger.secondary_in_force(now) else {
            return Ok(());
        };

        TracingHooks::on_secondary_rate_limit(until);
        Err(GitHubError::AbuseRateLimit(AbuseRateLimitError {
            message: format!(
                "API secondary rate limit exceeded until {until}, not making remote request."
            ),
            response: Box::new(synthetic_forbidden(request)),
            retry_after: (until - now).to_std().ok(),
        }))
    }
}

fn synthetic_forbidden(request: &HttpRequest) -> HttpResponse {
    HttpResponse::new(StatusCode::FORBIDDEN, request.method.clone(), request.url.clone())
}
