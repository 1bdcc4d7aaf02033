// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The material store: candidate executions grouped by test case.

use crate::extract::Verdict;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use verdict_metadata::ExecutionRecord;

/// One execution of a test case, before or after decoration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// The ordering key. Set at insertion if timestamps come from records, and during decoration
    /// if they come from logs.
    pub timestamp: Option<i64>,

    /// The cached archive for this execution.
    pub path: Utf8PathBuf,

    /// The extracted verdict, once decorated.
    pub verdict: Option<Verdict>,

    /// The device under test as reported by the execution record. Used during decoration if the
    /// log has no DUT status line.
    pub record_dut: Option<String>,
}

impl Candidate {
    /// Creates an undecorated candidate for the archive at `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            timestamp: None,
            path: path.into(),
            verdict: None,
            record_dut: None,
        }
    }

    /// Sets the timestamp for this candidate.
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the verdict for this candidate.
    pub fn with_verdict(mut self, verdict: Verdict) -> Self {
        self.verdict = Some(verdict);
        self
    }

    /// Returns the extracted result, if any.
    pub fn result(&self) -> Option<&str> {
        self.verdict.as_ref()?.result.as_deref()
    }

    /// Returns true if `self` and `other` are decorated and share the device under test and both
    /// role lists, in order.
    pub fn is_equivalent(&self, other: &Candidate) -> bool {
        match (&self.verdict, &other.verdict) {
            (Some(a), Some(b)) => a.dut == b.dut && a.ap == b.ap && a.sta == b.sta,
            _ => false,
        }
    }
}

/// Candidates grouped by test-case name.
///
/// Test cases are kept in insertion order, as are the candidates within each bucket.
#[derive(Clone, Debug, Default)]
pub struct Material {
    buckets: IndexMap<String, Vec<Candidate>>,
}

impl Material {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the execution described by `record` should be fetched.
    ///
    /// If `expected_result` is set, only records whose declared result matches it
    /// (case-insensitively) are wanted.
    pub fn is_wanted(record: &ExecutionRecord, expected_result: Option<&str>) -> bool {
        expected_result.is_none_or(|expected| results_match(&record.result, expected))
    }

    /// Appends `candidate` to the bucket for `test_case`.
    pub fn insert(&mut self, test_case: impl Into<String>, candidate: Candidate) {
        self.buckets
            .entry(test_case.into())
            .or_default()
            .push(candidate);
    }

    /// Returns the candidates for `test_case`.
    pub fn bucket(&self, test_case: &str) -> Option<&[Candidate]> {
        self.buckets.get(test_case).map(|bucket| bucket.as_slice())
    }

    /// Iterates over test cases and their candidates.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Candidate])> {
        self.buckets
            .iter()
            .map(|(name, bucket)| (name.as_str(), bucket.as_slice()))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Vec<Candidate>)> {
        self.buckets
            .iter_mut()
            .map(|(name, bucket)| (name.as_str(), bucket))
    }

    /// Returns the number of test cases, including ones whose candidates were all removed.
    pub fn test_case_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the number of candidates across all test cases.
    pub fn candidate_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Returns true if there are no candidates left.
    pub fn is_empty(&self) -> bool {
        self.candidate_count() == 0
    }

    /// Reorders test cases lexicographically. Candidates within a bucket keep their order.
    pub fn sort_test_cases(&mut self) {
        self.buckets.sort_unstable_keys();
    }

    /// Returns the archive paths of every candidate.
    pub fn paths(&self) -> impl Iterator<Item = &Utf8Path> {
        self.buckets
            .values()
            .flatten()
            .map(|candidate| candidate.path.as_path())
    }
}

/// Compares two results case-insensitively, with full Unicode case folding.
pub(crate) fn results_match(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Removes the candidates at `indexes` from `bucket` in a single pass.
///
/// Indexes refer to positions before removal. Out-of-range indexes are ignored.
pub(crate) fn remove_indexes(bucket: &mut Vec<Candidate>, indexes: &BTreeSet<usize>) {
    if indexes.is_empty() {
        return;
    }
    let mut index = 0;
    bucket.retain(|_| {
        let keep = !indexes.contains(&index);
        index += 1;
        keep
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_metadata::RecordId;

    fn record(result: &str) -> ExecutionRecord {
        ExecutionRecord {
            id: RecordId::Number(1),
            result: result.to_owned(),
            timestamp: 0,
            log_file_name: "run.zip".to_owned(),
            test_case: "tc".to_owned(),
            dut: None,
        }
    }

    #[test]
    fn wanted_records() {
        assert!(Material::is_wanted(&record("Pass"), Some("pass")));
        assert!(Material::is_wanted(&record("PASS"), Some("Pass")));
        assert!(Material::is_wanted(&record("RÉUSSI"), Some("réussi")));
        assert!(!Material::is_wanted(&record("Fail"), Some("Pass")));
        assert!(!Material::is_wanted(&record("Passed"), Some("Pass")));
        assert!(Material::is_wanted(&record("Fail"), None));
    }

    #[test]
    fn insertion_order() {
        let mut material = Material::new();
        material.insert("b", Candidate::new("b1.zip"));
        material.insert("a", Candidate::new("a1.zip"));
        material.insert("b", Candidate::new("b2.zip"));

        let order: Vec<_> = material.paths().map(|p| p.as_str()).collect();
        assert_eq!(order, ["b1.zip", "b2.zip", "a1.zip"]);
        assert_eq!(material.test_case_count(), 2);
        assert_eq!(material.candidate_count(), 3);

        material.sort_test_cases();
        let order: Vec<_> = material.iter().map(|(name, _)| name).collect();
        assert_eq!(order, ["a", "b"]);
    }

    #[test]
    fn remove_indexes_in_one_pass() {
        let mut bucket: Vec<_> = (0..5)
            .map(|i| Candidate::new(format!("{i}.zip")))
            .collect();
        let indexes: BTreeSet<_> = [0, 2, 3, 9].into_iter().collect();
        remove_indexes(&mut bucket, &indexes);

        let left: Vec<_> = bucket.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(left, ["1.zip", "4.zip"]);
    }

    #[test]
    fn equivalence_requires_verdicts() {
        let verdict = Verdict {
            dut: Some("D1".to_owned()),
            ap: vec!["a".to_owned()],
            ..Verdict::default()
        };
        let a = Candidate::new("a.zip").with_verdict(verdict.clone());
        let b = Candidate::new("b.zip").with_verdict(verdict);
        let undecorated = Candidate::new("c.zip");

        assert!(a.is_equivalent(&b));
        assert!(b.is_equivalent(&a));
        assert!(!a.is_equivalent(&undecorated));
        assert!(!undecorated.is_equivalent(&undecorated.clone()));
    }
}
