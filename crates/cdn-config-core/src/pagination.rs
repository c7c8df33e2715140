// ABOUTME: Cursor-based pagination module for association listings
// ABOUTME: Provides opaque keyset cursors over the (profile, parameter) ordering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{self, Display, Formatter};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::constants::limits::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{AssociationKey, PageInfo, ParameterId, ProfileId};

/// Opaque pagination cursor containing the last key of the previous page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Create a cursor positioned after `key`
    #[must_use]
    pub fn after(key: AssociationKey) -> Self {
        let cursor_data = format!("{}:{}", key.profile_id, key.parameter_id);
        let encoded = base64::Engine::encode(&URL_SAFE_NO_PAD, cursor_data.as_bytes());
        Self(encoded)
    }

    /// Decode cursor into the key it points after
    ///
    /// Returns `None` if cursor is invalid or malformed
    #[must_use]
    pub fn decode(&self) -> Option<AssociationKey> {
        let decoded = base64::Engine::decode(&URL_SAFE_NO_PAD, &self.0).ok()?;
        let decoded_str = String::from_utf8(decoded).ok()?;
        let (profile, parameter) = decoded_str.split_once(':')?;

        Some(AssociationKey::new(
            ProfileId(profile.parse().ok()?),
            ParameterId(parameter.parse().ok()?),
        ))
    }

    /// Get the raw cursor string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create cursor from raw string (for deserialization)
    #[must_use]
    pub const fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Display for Cursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Paginated response containing items and pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage<T> {
    /// The items in this page
    pub items: Vec<T>,

    /// Cursor pointing to the next page (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Cursor>,

    /// Whether there are more items after this page
    pub has_more: bool,

    /// Total number of items in this page
    pub count: usize,
}

impl<T> CursorPage<T> {
    /// Create a new cursor page
    #[must_use]
    pub const fn new(items: Vec<T>, next_cursor: Option<Cursor>, has_more: bool) -> Self {
        let count = items.len();
        Self {
            items,
            next_cursor,
            has_more,
            count,
        }
    }

    /// Create an empty page
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
            has_more: false,
            count: 0,
        }
    }

    /// Paging metadata for the response envelope
    #[must_use]
    pub fn page_info(&self) -> PageInfo {
        PageInfo {
            next_cursor: self.next_cursor.as_ref().map(|c| c.as_str().to_owned()),
            has_more: self.has_more,
            count: self.count,
        }
    }

    /// Transform every item while keeping the page metadata
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> CursorPage<U> {
        CursorPage {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            has_more: self.has_more,
            count: self.count,
        }
    }
}

/// Validated pagination parameters for keyset queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    /// Key to start after (exclusive)
    pub after: Option<AssociationKey>,

    /// Maximum number of items to return
    pub limit: usize,
}

impl PaginationParams {
    /// Build parameters from raw query values
    ///
    /// A missing limit uses `default_limit`; larger limits are clamped to
    /// `max_limit`.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_FORMAT` if the cursor does not decode and
    /// `VALUE_OUT_OF_RANGE` for a zero limit
    pub fn parse(
        cursor: Option<&str>,
        limit: Option<usize>,
        default_limit: usize,
        max_limit: usize,
    ) -> AppResult<Self> {
        let after = match cursor.filter(|c| !c.is_empty()) {
            Some(raw) => Some(
                Cursor::from_string(raw.to_owned())
                    .decode()
                    .ok_or_else(|| AppError::new(ErrorCode::InvalidFormat, "malformed cursor"))?,
            ),
            None => None,
        };

        let limit = match limit {
            Some(0) => {
                return Err(AppError::new(
                    ErrorCode::ValueOutOfRange,
                    "'limit' must be at least 1",
                ))
            }
            Some(n) => n.min(max_limit),
            None => default_limit,
        };

        Ok(Self { after, limit })
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            after: None,
            limit: DEFAULT_PAGE_LIMIT.min(MAX_PAGE_LIMIT),
        }
    }
}
