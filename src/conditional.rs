// ABOUTME: Conditional retrieval primitives for If-Modified-Since and If-None-Match
// ABOUTME: Parses and formats RFC 1123 dates and decides between 304 and a fresh body
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::cache::HTTP_DATE_FORMAT;
use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse an HTTP date
///
/// Accepts the RFC 1123 form (`Sun, 06 Nov 1994 08:49:37 GMT`) and other RFC 2822
/// variants. Unparseable values yield `None` and are treated as absent.
#[must_use]
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value)
        .map(|at| at.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT)
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Format a time as an RFC 1123 HTTP date
#[must_use]
pub fn format_http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE_FORMAT).to_string()
}

/// Whether an `If-None-Match` header value matches an entity tag
///
/// Comparison is weak: a `W/` prefix on either side is ignored.
#[must_use]
pub fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    let etag = etag.trim_start_matches("W/");
    if_none_match
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
}

/// Validators supplied by a client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions {
    /// Parsed `If-Modified-Since`
    pub if_modified_since: Option<DateTime<Utc>>,
    /// Raw `If-None-Match`
    pub if_none_match: Option<String>,
}

impl Conditions {
    /// No validators
    #[must_use]
    pub const fn none() -> Self {
        Self {
            if_modified_since: None,
            if_none_match: None,
        }
    }

    /// Only an `If-Modified-Since` time
    #[must_use]
    pub const fn modified_since(at: DateTime<Utc>) -> Self {
        Self {
            if_modified_since: Some(at),
            if_none_match: None,
        }
    }

    /// Whether the client's copy is still current
    ///
    /// `If-None-Match` is evaluated first when the resource has an entity tag;
    /// `If-Modified-Since` is then ignored. Otherwise the copy is current when
    /// `If-Modified-Since >= last_modified`.
    #[must_use]
    pub fn not_modified(&self, last_modified: DateTime<Utc>, etag: Option<&str>) -> bool {
        if let (Some(header), Some(etag)) = (self.if_none_match.as_deref(), etag) {
            return etag_matches(header, etag);
        }
        self.if_modified_since
            .is_some_and(|since| since >= last_modified)
    }
}

/// Outcome of a conditional read
#[derive(Debug, Clone)]
pub enum Conditional<T> {
    /// The client's copy is current; respond without a body
    NotModified {
        /// Modification time of the current state
        last_modified: DateTime<Utc>,
        /// Entity tag of the current state, if the resource has one
        etag: Option<String>,
    },
    /// The client needs the body
    Fresh {
        /// Current representation
        body: T,
        /// Modification time of `body`
        last_modified: DateTime<Utc>,
        /// Entity tag of `body`, if the resource has one
        etag: Option<String>,
    },
}

impl<T> Conditional<T> {
    /// Decide between `NotModified` and `Fresh`, building the body only when needed
    pub fn evaluate(
        conditions: &Conditions,
        last_modified: DateTime<Utc>,
        etag: Option<String>,
        body: impl FnOnce() -> T,
    ) -> Self {
        if conditions.not_modified(last_modified, etag.as_deref()) {
            Self::NotModified {
                last_modified,
                etag,
            }
        } else {
            Self::Fresh {
                body: body(),
                last_modified,
                etag,
            }
        }
    }

    /// Whether this is a `304` outcome
    #[must_use]
    pub const fn is_not_modified(&self) -> bool {
        matches!(self, Self::NotModified { .. })
    }

    /// `Last-Modified` of the outcome
    #[must_use]
    pub const fn last_modified(&self) -> DateTime<Utc> {
        match self {
            Self::NotModified { last_modified, .. } | Self::Fresh { last_modified, .. } => {
                *last_modified
            }
        }
    }

    /// The body, if one is sent
    pub fn into_body(self) -> Option<T> {
        match self {
            Self::NotModified { .. } => None,
            Self::Fresh { body, .. } => Some(body),
        }
    }

    /// Transform the body
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Conditional<U> {
        match self {
            Self::NotModified {
                last_modified,
                etag,
            } => Conditional::NotModified {
                last_modified,
                etag,
            },
            Self::Fresh {
                body,
                last_modified,
                etag,
            } => Conditional::Fresh {
                body: f(body),
                last_modified,
                etag,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_rfc1123_round_trip() {
        let parsed = parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap());
        assert_eq!(format_http_date(parsed), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_garbage_date_is_absent() {
        assert!(parse_http_date("yesterday-ish").is_none());
        assert!(parse_http_date("").is_none());
    }

    #[test]
    fn test_modified_since_boundary() {
        let conditions = Conditions::modified_since(at(1_000));
        assert!(conditions.not_modified(at(1_000), None));
        assert!(conditions.not_modified(at(999), None));
        assert!(!conditions.not_modified(at(1_001), None));
        assert!(!Conditions::none().not_modified(at(0), None));
    }

    #[test]
    fn test_etag_takes_precedence() {
        let conditions = Conditions {
            if_modified_since: Some(at(5_000)),
            if_none_match: Some("\"abc\"".to_owned()),
        };
        assert!(!conditions.not_modified(at(1_000), Some("\"def\"")));
        assert!(conditions.not_modified(at(9_000), Some("\"abc\"")));
        // No entity tag on the resource: fall back to the date
        assert!(conditions.not_modified(at(1_000), None));
    }

    #[test]
    fn test_etag_list_and_wildcard() {
        assert!(etag_matches("\"a\", W/\"b\"", "\"b\""));
        assert!(etag_matches("*", "\"x\""));
        assert!(!etag_matches("\"a\"", "\"b\""));
    }

    #[test]
    fn test_body_only_built_when_fresh() {
        let outcome: Conditional<i32> =
            Conditional::evaluate(&Conditions::modified_since(at(10)), at(5), None, || {
                panic!("body must not be built")
            });
        assert!(outcome.is_not_modified());
        let outcome = Conditional::evaluate(&Conditions::none(), at(5), None, || 7);
        assert_eq!(outcome.last_modified(), at(5));
        assert_eq!(outcome.into_body(), Some(7));
    }
}
