use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, debug, error, field, info_span, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;
use crate::domain::credits::UserId;

use super::extract::{USER_ID_HEADER, parse_user_id};

/// Response header echoing the id every log line of the request carries.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Per-request identity, available to handlers as an extension.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub request_id: Uuid,
    /// Parsed from the gateway header; `None` for anonymous or malformed callers.
    pub user_id: Option<UserId>,
}

impl RequestContext {
    fn from_request(request: &Request<Body>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            user_id: request.headers().get(USER_ID_HEADER).and_then(parse_user_id),
        }
    }
}

/// Open the `request` span that scopes all handler, ledger and feed events.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext::from_request(&request);
    request.extensions_mut().insert(ctx);

    let span = info_span!(
        target: "creator_dashboard::http",
        "request",
        request_id = %ctx.request_id,
        method = %request.method(),
        path = request.uri().path(),
        user_id = field::Empty,
    );
    if let Some(user_id) = ctx.user_id {
        span.record("user_id", user_id);
    }

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&ctx.request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

/// Log failed requests with the diagnostic chain the handler attached.
///
/// Runs inside the `request` span, so identity fields are not repeated here.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();

    if !status.is_client_error() && !status.is_server_error() {
        debug!(
            target = "creator_dashboard::http::response",
            status = status.as_u16(),
            elapsed_ms,
            "request served"
        );
        return response;
    }

    let (source, chain) = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => (report.source, report.messages),
        None => ("unknown", Vec::new()),
    };
    let detail = chain.first().map(String::as_str).unwrap_or("no diagnostic available");

    if status.is_server_error() {
        error!(
            target = "creator_dashboard::http::response",
            status = status.as_u16(),
            elapsed_ms,
            source,
            detail,
            chain = ?chain,
            "request failed"
        );
    } else {
        warn!(
            target = "creator_dashboard::http::response",
            status = status.as_u16(),
            elapsed_ms,
            source,
            detail,
            "request rejected"
        );
    }

    response
}
