use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

const CACHE_NO_STORE: &str = "no-store";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmxRequest {
    pub is_hx_request: bool,
    pub boosted: bool,
}

pub fn classify_request(headers: &HeaderMap) -> HtmxRequest {
    HtmxRequest {
        is_hx_request: header_is_true(headers, "hx-request"),
        boosted: header_is_true(headers, "hx-boosted"),
    }
}

/// Partial swap requested by htmx, as opposed to a full navigation.
pub fn wants_fragment(headers: &HeaderMap) -> bool {
    let request = classify_request(headers);
    request.is_hx_request && !request.boosted
}

pub fn fragment_response(fragment_html: String, http_status: StatusCode) -> Response {
    (
        http_status,
        [
            (CONTENT_TYPE, HTML_CONTENT_TYPE),
            (CACHE_CONTROL, CACHE_NO_STORE),
        ],
        fragment_html,
    )
        .into_response()
}

pub fn page_response(page_html: String) -> Response {
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, HTML_CONTENT_TYPE),
            (CACHE_CONTROL, CACHE_NO_STORE),
        ],
        page_html,
    )
        .into_response()
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

fn header_is_true(headers: &HeaderMap, name: &str) -> bool {
    header_text(headers, name)
        .map(|value| value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
