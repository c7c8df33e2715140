// ABOUTME: API response envelope shared by every successful HTTP response
// ABOUTME: Wraps payloads as {"response": ..., "alerts": [...]} for existing API clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// Severity of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// Operation succeeded
    Success,
    /// Informational
    Info,
    /// Something worth a look
    Warning,
    /// Operation failed
    Error,
}

/// A human-readable message attached to a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Message text
    pub text: String,
    /// Severity
    pub level: AlertLevel,
}

impl Alert {
    /// Success alert
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: AlertLevel::Success,
        }
    }
}

/// Position of a listing page within the full result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Cursor to pass back for the next page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    /// Whether more rows follow this page
    pub has_more: bool,
    /// Rows in this page
    pub count: usize,
}

/// Success response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Payload
    pub response: T,
    /// Alerts describing what happened
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<Alert>,
    /// Paging metadata for keyset-paginated listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageInfo>,
}

impl<T> ApiEnvelope<T> {
    /// Payload without alerts
    pub const fn new(response: T) -> Self {
        Self {
            response,
            alerts: Vec::new(),
            page: None,
        }
    }

    /// Payload with a single success alert
    pub fn with_success(response: T, text: impl Into<String>) -> Self {
        Self {
            response,
            alerts: vec![Alert::success(text)],
            page: None,
        }
    }

    /// Attach paging metadata
    #[must_use]
    pub fn with_page(mut self, page: PageInfo) -> Self {
        self.page = Some(page);
        self
    }
}
