// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collapsing equivalent executions of a test case.
//!
//! Two candidates in the same bucket are *equivalent* if they tested the same device with the
//! same AP and STA role sequences (see [`Candidate::is_equivalent`]). Under the
//! [`First`](DedupPolicy::First) and [`Last`](DedupPolicy::Last) policies, exactly one member of
//! each equivalence class survives: the earliest or the latest by timestamp. Among candidates with
//! the same timestamp, the one that appears first in the bucket wins.

use crate::{
    errors::DedupPolicyParseError,
    filter::FilterSummary,
    material::{Candidate, Material, remove_indexes},
};
use std::{collections::BTreeSet, fmt, str::FromStr};
use tracing::debug;

/// Which members of an equivalence class to keep.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Keep every candidate.
    All,

    /// Keep the earliest candidate of each equivalence class.
    First,

    /// Keep the latest candidate of each equivalence class.
    #[default]
    Last,
}

impl DedupPolicy {
    /// Returns string representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &["all", "first", "last"]
    }

    /// Returns true if the candidate at `b_index` means the one at `a_index` should be removed.
    ///
    /// Both candidates must be equivalent and have timestamps.
    fn supersedes(self, a_index: usize, a_ts: i64, b_index: usize, b_ts: i64) -> bool {
        let earlier_tie = a_ts == b_ts && b_index < a_index;
        match self {
            Self::All => false,
            Self::First => b_ts < a_ts || earlier_tie,
            Self::Last => b_ts > a_ts || earlier_tie,
        }
    }
}

impl FromStr for DedupPolicy {
    type Err = DedupPolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            other => Err(DedupPolicyParseError::new(other)),
        }
    }
}

impl fmt::Display for DedupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::First => write!(f, "first"),
            Self::Last => write!(f, "last"),
        }
    }
}

/// Removes all but one member of each equivalence class, according to `policy`.
///
/// [`DedupPolicy::All`] leaves `material` untouched.
pub fn dedupe(material: &mut Material, policy: DedupPolicy) -> FilterSummary {
    if policy == DedupPolicy::All {
        return FilterSummary {
            kept: material.candidate_count(),
            removed: 0,
        };
    }

    let mut summary = FilterSummary::default();
    for (test_case, bucket) in material.iter_mut() {
        let remove = superseded_indexes(bucket, policy);
        if !remove.is_empty() {
            debug!(
                "{test_case}: {policy} policy removes {} of {} candidates",
                remove.len(),
                bucket.len()
            );
        }
        summary.removed += remove.len();
        remove_indexes(bucket, &remove);
        summary.kept += bucket.len();
    }
    summary
}

/// Computes the removal set for a bucket without mutating it.
fn superseded_indexes(bucket: &[Candidate], policy: DedupPolicy) -> BTreeSet<usize> {
    let mut remove = BTreeSet::new();
    for (a_index, a) in bucket.iter().enumerate() {
        let Some(a_ts) = a.timestamp else {
            continue;
        };
        let superseded = bucket.iter().enumerate().any(|(b_index, b)| {
            if a_index == b_index || !a.is_equivalent(b) {
                return false;
            }
            // Without a timestamp there's nothing to compare.
            b.timestamp
                .is_some_and(|b_ts| policy.supersedes(a_index, a_ts, b_index, b_ts))
        });
        if superseded {
            remove.insert(a_index);
        }
    }
    remove
}
