// ABOUTME: Request parsing and conditional response helpers shared by the route modules
// ABOUTME: Turns malformed bodies, ids and paging input into JSON 400 errors instead of rejections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::conditional::{format_http_date, parse_http_date, Conditional, Conditions};
use crate::errors::{AppError, AppResult, ErrorCode};
use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use std::str::FromStr;

/// Deserialize a JSON body from raw bytes
///
/// Any empty or malformed body is a `400`, regardless of content type.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> AppResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::new(ErrorCode::InvalidFormat, "request body is empty"));
    }
    serde_json::from_slice(body).map_err(|e| {
        AppError::new(ErrorCode::InvalidFormat, format!("malformed request body: {e}"))
    })
}

/// Parse a required numeric value taken from the path or query string
pub(crate) fn parse_number<T: FromStr>(field: &str, raw: &str) -> AppResult<T> {
    raw.trim().parse().map_err(|_| {
        AppError::new(
            ErrorCode::InvalidFormat,
            format!("'{field}' must be an integer, got '{raw}'"),
        )
    })
}

/// Parse an optional numeric query value; empty strings count as absent
pub(crate) fn parse_optional<T: FromStr>(field: &str, raw: Option<&str>) -> AppResult<Option<T>> {
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| parse_number(field, value))
        .transpose()
}

/// Read `If-Modified-Since` and `If-None-Match`
pub(crate) fn conditions(headers: &HeaderMap) -> Conditions {
    let text = |name: HeaderName| headers.get(name).and_then(|v| v.to_str().ok());
    Conditions {
        if_modified_since: text(header::IF_MODIFIED_SINCE).and_then(parse_http_date),
        if_none_match: text(header::IF_NONE_MATCH).map(str::to_owned),
    }
}

/// Render a conditional outcome with `Last-Modified` and `ETag` headers
///
/// `NotModified` becomes a `304` without a body.
pub(crate) fn conditional<T>(
    outcome: Conditional<T>,
    render: impl FnOnce(T) -> Response,
) -> Response {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&format_http_date(outcome.last_modified())) {
        headers.insert(header::LAST_MODIFIED, value);
    }

    match outcome {
        Conditional::NotModified { etag, .. } => {
            insert_etag(&mut headers, etag.as_deref());
            (StatusCode::NOT_MODIFIED, headers).into_response()
        }
        Conditional::Fresh { body, etag, .. } => {
            insert_etag(&mut headers, etag.as_deref());
            let mut response = render(body);
            response.headers_mut().extend(headers);
            response
        }
    }
}

fn insert_etag(headers: &mut HeaderMap, etag: Option<&str>) {
    if let Some(value) = etag.and_then(|e| HeaderValue::from_str(e).ok()) {
        headers.insert(header::ETAG, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileParameterRequest;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_empty_and_malformed_bodies_are_invalid_format() {
        let err = parse_body::<ProfileParameterRequest>(&Bytes::from_static(b"  ")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
        let err = parse_body::<ProfileParameterRequest>(&Bytes::from_static(b"{")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }

    #[test]
    fn test_optional_numbers() {
        assert_eq!(parse_optional::<i64>("profileId", None).unwrap(), None);
        assert_eq!(parse_optional::<i64>("profileId", Some("")).unwrap(), None);
        assert_eq!(parse_optional::<i64>("profileId", Some("7")).unwrap(), Some(7));
        let err = parse_optional::<i64>("profileId", Some("seven")).unwrap_err();
        assert!(err.message.contains("profileId"));
    }

    #[test]
    fn test_not_modified_has_no_body_and_keeps_validators() {
        let last_modified = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let outcome: Conditional<()> = Conditional::NotModified {
            last_modified,
            etag: Some("\"abc\"".to_owned()),
        };
        let response = conditional(outcome, |()| StatusCode::OK.into_response());

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(
            response.headers()[header::LAST_MODIFIED],
            "Fri, 01 Mar 2024 12:00:00 GMT"
        );
        assert_eq!(response.headers()[header::ETAG], "\"abc\"");
    }
}
