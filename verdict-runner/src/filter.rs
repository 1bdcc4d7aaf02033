// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Removing candidates whose extracted result doesn't match the expected one.

use crate::material::{Material, remove_indexes, results_match};
use std::collections::BTreeSet;
use tracing::debug;

/// Counts produced by a pruning stage.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSummary {
    /// Candidates left after the stage.
    pub kept: usize,

    /// Candidates removed by the stage.
    pub removed: usize,
}

/// Removes candidates whose extracted result is missing, or differs from `expected`
/// (case-insensitively).
pub fn filter_result(material: &mut Material, expected: &str) -> FilterSummary {
    let mut summary = FilterSummary::default();

    for (test_case, bucket) in material.iter_mut() {
        let remove: BTreeSet<usize> = bucket
            .iter()
            .enumerate()
            .filter(|(_, candidate)| {
                !candidate
                    .result()
                    .is_some_and(|result| results_match(result, expected))
            })
            .map(|(index, _)| index)
            .collect();

        for &index in &remove {
            debug!(
                "{test_case}: removing {} (result {:?}, expected {expected})",
                bucket[index].path,
                bucket[index].result(),
            );
        }

        summary.removed += remove.len();
        remove_indexes(bucket, &remove);
        summary.kept += bucket.len();
    }

    summary
}
