// ABOUTME: Pure validation and planning of association batches before anything is written
// ABOUTME: Produces either an apply plan or every violation found, in field/reference/duplicate order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Two-phase batch creation, phase one.
//!
//! Validation runs in three passes and stops at the first pass that finds anything:
//!
//! 1. every pair names both a profile and a parameter;
//! 2. every referenced profile and parameter exists;
//! 3. no pair repeats within the batch or already exists in the store.
//!
//! All violations of the failing pass are reported together.

use crate::errors::{AppError, ErrorCode};
use crate::models::{AssociationKey, ParameterId, ProfileId, ProfileParameterRequest};
use crate::store::BatchLookup;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// One rejected pair of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Position of the pair in the submitted batch
    pub index: usize,
    /// Submitted profile id, if any
    pub profile_id: Option<i64>,
    /// Submitted parameter id, if any
    pub parameter_id: Option<i64>,
    /// Error class of this violation
    pub code: ErrorCode,
    /// Human-readable reason
    pub reason: String,
}

/// Validated batch ready to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    /// Pairs to insert, in submission order
    pub keys: Vec<AssociationKey>,
    /// Profiles whose snapshots the batch invalidates, ascending
    pub profiles: Vec<ProfileId>,
}

/// Reject an empty or oversized batch
///
/// # Errors
///
/// `INVALID_INPUT` for an empty batch, `VALUE_OUT_OF_RANGE` above `max_batch_size`
pub fn check_size(len: usize, max_batch_size: usize) -> Result<(), AppError> {
    if len == 0 {
        return Err(AppError::invalid_input(
            "at least one profile parameter is required",
        ));
    }
    if len > max_batch_size {
        return Err(AppError::new(
            ErrorCode::ValueOutOfRange,
            format!("batch of {len} exceeds the maximum of {max_batch_size} profile parameters"),
        ));
    }
    Ok(())
}

/// Pass 1: every pair carries both ids
///
/// An absent or zero id counts as missing.
///
/// # Errors
///
/// Returns every pair with a missing field
pub fn check_fields(
    requests: &[ProfileParameterRequest],
) -> Result<Vec<AssociationKey>, Vec<Violation>> {
    let mut keys = Vec::with_capacity(requests.len());
    let mut violations = Vec::new();

    for (index, request) in requests.iter().enumerate() {
        let profile = request.profile_id.filter(|id| *id != 0);
        let parameter = request.parameter_id.filter(|id| *id != 0);
        match (profile, parameter) {
            (Some(profile), Some(parameter)) => {
                keys.push(AssociationKey::new(ProfileId(profile), ParameterId(parameter)));
            }
            (profile, parameter) => {
                let field = if profile.is_none() {
                    "profileId"
                } else {
                    "parameterId"
                };
                violations.push(Violation {
                    index,
                    profile_id: request.profile_id,
                    parameter_id: request.parameter_id,
                    code: ErrorCode::MissingRequiredField,
                    reason: if profile.is_none() && parameter.is_none() {
                        "'profileId' and 'parameterId' are required".to_owned()
                    } else {
                        format!("'{field}' is required")
                    },
                });
            }
        }
    }

    if violations.is_empty() {
        Ok(keys)
    } else {
        Err(violations)
    }
}

fn violation(index: usize, key: AssociationKey, code: ErrorCode, reason: String) -> Violation {
    Violation {
        index,
        profile_id: Some(key.profile_id.get()),
        parameter_id: Some(key.parameter_id.get()),
        code,
        reason,
    }
}

/// Passes 2 and 3: references exist, no duplicate pairs
///
/// # Errors
///
/// Returns every violation of the first failing pass
pub fn plan_batch(
    keys: &[AssociationKey],
    lookup: &BatchLookup,
) -> Result<BatchPlan, Vec<Violation>> {
    let missing: Vec<Violation> = keys
        .iter()
        .enumerate()
        .filter_map(|(index, key)| {
            let reason = if !lookup.profiles.contains(&key.profile_id) {
                format!("profile {} does not exist", key.profile_id)
            } else if !lookup.parameters.contains(&key.parameter_id) {
                format!("parameter {} does not exist", key.parameter_id)
            } else {
                return None;
            };
            Some(violation(index, *key, ErrorCode::ReferenceNotFound, reason))
        })
        .collect();
    if !missing.is_empty() {
        return Err(missing);
    }

    let mut seen = HashSet::with_capacity(keys.len());
    let duplicates: Vec<Violation> = keys
        .iter()
        .enumerate()
        .filter_map(|(index, key)| {
            let reason = if lookup.existing.contains(key) {
                format!(
                    "parameter {} is already associated with profile {}",
                    key.parameter_id, key.profile_id
                )
            } else if !seen.insert(*key) {
                format!(
                    "pair ({}, {}) appears more than once in the batch",
                    key.profile_id, key.parameter_id
                )
            } else {
                return None;
            };
            Some(violation(index, *key, ErrorCode::ResourceAlreadyExists, reason))
        })
        .collect();
    if !duplicates.is_empty() {
        return Err(duplicates);
    }

    let profiles: BTreeSet<ProfileId> = keys.iter().map(|k| k.profile_id).collect();
    Ok(BatchPlan {
        keys: keys.to_vec(),
        profiles: profiles.into_iter().collect(),
    })
}

/// Fold violations into one client error carrying all of them in `details.violations`
///
/// The error takes the code and message of the first violation.
#[must_use]
pub fn into_error(violations: Vec<Violation>) -> AppError {
    let (code, message) = violations.first().map_or_else(
        || (ErrorCode::InvalidInput, "invalid profile parameters".to_owned()),
        |first| {
            let message = if violations.len() == 1 {
                first.reason.clone()
            } else {
                format!("{} (and {} more)", first.reason, violations.len() - 1)
            };
            (first.code, message)
        },
    );
    AppError::new(code, message).with_details(serde_json::json!({ "violations": violations }))
}
