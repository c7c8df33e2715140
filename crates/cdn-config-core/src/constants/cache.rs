// ABOUTME: Snapshot cache constants for capacity and conditional retrieval
// ABOUTME: Shared by the snapshot publisher and the HTTP conditional GET helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Default maximum number of profile snapshots kept in memory
pub const DEFAULT_SNAPSHOT_CACHE_CAPACITY: usize = 4_096;

/// Fallback capacity when configuration asks for zero entries
pub const MIN_SNAPSHOT_CACHE_CAPACITY: usize = 16;

/// RFC 1123 date format used by `Last-Modified` and `If-Modified-Since`
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
