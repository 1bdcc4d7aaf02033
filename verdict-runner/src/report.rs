// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering surviving candidates as a textual report.
//!
//! Each candidate becomes one record of fields separated by `"; "`:
//!
//! ```text
//! <result>; <test case>; <timestamp>; <elapsed>; <dut>; [<ap>,...]; [<sta>,...]; <M or empty>
//! ```
//!
//! Role identifiers are replaced by their display names. For test cases listed in the
//! permutation table, role elements that don't line up with the expected sequence are suffixed
//! with `*`, and the record ends with `M`.

use crate::{
    extract::RoleKind,
    material::{Candidate, Material},
    tables::{NamingTable, Permutation, PermutationTable},
};
use itertools::Itertools;
use swrite::{SWrite, swrite};

/// Separates fields within a record.
pub const FIELD_SEPARATOR: &str = "; ";

/// Suffix for role elements that don't match the expected permutation.
pub const MISMATCH_MARKER: char = '*';

/// Trailing flag for test cases with a permutation entry.
pub const PERMUTED_MARKER: &str = "M";

/// The default record delimiter.
pub const DEFAULT_DELIMITER: &str = "\n";

/// Formats a [`Material`] as a report.
#[derive(Clone, Debug)]
pub struct ReportFormatter<'a> {
    naming: &'a NamingTable,
    permutations: &'a PermutationTable,
    expected_result: &'a str,
    delimiter: &'a str,
}

impl<'a> ReportFormatter<'a> {
    /// Creates a formatter. `expected_result` is printed for candidates with no extracted result.
    pub fn new(
        naming: &'a NamingTable,
        permutations: &'a PermutationTable,
        expected_result: &'a str,
    ) -> Self {
        Self {
            naming,
            permutations,
            expected_result,
            delimiter: DEFAULT_DELIMITER,
        }
    }

    /// Sets the string placed between records.
    pub fn with_delimiter(mut self, delimiter: &'a str) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Renders every candidate, in bucket order then list order.
    pub fn format(&self, material: &Material) -> String {
        material
            .iter()
            .flat_map(|(test_case, bucket)| {
                let permutation = self.permutations.get(test_case);
                bucket
                    .iter()
                    .map(move |candidate| self.format_record(test_case, candidate, permutation))
            })
            .join(self.delimiter)
    }

    fn format_record(
        &self,
        test_case: &str,
        candidate: &Candidate,
        permutation: Option<&Permutation>,
    ) -> String {
        let verdict = candidate.verdict.as_ref();
        let result = candidate.result().unwrap_or(self.expected_result);
        let timestamp = candidate
            .timestamp
            .map_or_else(String::new, |ts| ts.to_string());
        let elapsed = verdict.and_then(|v| v.elapsed.as_deref()).unwrap_or("");
        let dut = verdict.and_then(|v| v.dut.as_deref()).unwrap_or("");

        let mut out = String::new();
        swrite!(
            out,
            "{result}{FIELD_SEPARATOR}{test_case}{FIELD_SEPARATOR}{timestamp}\
             {FIELD_SEPARATOR}{elapsed}{FIELD_SEPARATOR}{dut}"
        );
        for kind in RoleKind::ALL {
            out.push_str(FIELD_SEPARATOR);
            let roles = verdict.map_or(&[][..], |v| v.roles(kind));
            self.write_roles(
                &mut out,
                kind,
                roles,
                permutation.map(|p| p.expected(kind)),
            );
        }
        out.push_str(FIELD_SEPARATOR);
        if permutation.is_some() {
            out.push_str(PERMUTED_MARKER);
        }
        out
    }

    fn write_roles(
        &self,
        out: &mut String,
        kind: RoleKind,
        roles: &[String],
        expected: Option<&[String]>,
    ) {
        out.push('[');
        for (index, agent) in roles.iter().enumerate() {
            if index > 0 {
                out.push(',');
            }
            let alias = self.naming.alias(kind, agent);
            out.push_str(alias);
            if let Some(expected) = expected {
                let matches = roles.len() == expected.len() && expected[index] == alias;
                if !matches {
                    out.push(MISMATCH_MARKER);
                }
            }
        }
        out.push(']');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Verdict;
    use pretty_assertions::assert_eq;

    fn candidate(ts: i64, ap: &[&str], sta: &[&str]) -> Candidate {
        Candidate::new("run.zip").with_timestamp(ts).with_verdict(Verdict {
            result: Some("Pass".to_owned()),
            elapsed: Some("0:01:02".to_owned()),
            dut: Some("Acme".to_owned()),
            ap: ap.iter().map(|s| s.to_string()).collect(),
            sta: sta.iter().map(|s| s.to_string()).collect(),
            ..Verdict::default()
        })
    }

    fn permutation(ap: &[&str], sta: &[&str]) -> Permutation {
        Permutation {
            ap: ap.iter().map(|s| s.to_string()).collect(),
            sta: sta.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn alias_matches_permutation() {
        let mut naming = NamingTable::new();
        naming.insert(RoleKind::Ap, "agent1", "AP-1");
        let mut permutations = PermutationTable::new();
        permutations.insert("tc", permutation(&["AP-1"], &[]));

        let mut material = Material::new();
        material.insert("tc", candidate(100, &["agent1"], &[]));

        let report = ReportFormatter::new(&naming, &permutations, "Pass").format(&material);
        assert_eq!(report, "Pass; tc; 100; 0:01:02; Acme; [AP-1]; []; M");

        let mut naming = NamingTable::new();
        naming.insert(RoleKind::Ap, "agent1", "AP-2");
        let report = ReportFormatter::new(&naming, &permutations, "Pass").format(&material);
        assert_eq!(report, "Pass; tc; 100; 0:01:02; Acme; [AP-2*]; []; M");
    }

    #[test]
    fn length_mismatch_marks_every_element() {
        let naming = NamingTable::new();
        let mut permutations = PermutationTable::new();
        permutations.insert("tc", permutation(&["a", "b", "c"], &["s"]));

        let mut material = Material::new();
        material.insert("tc", candidate(1, &["a", "b"], &["s"]));

        let report = ReportFormatter::new(&naming, &permutations, "Pass").format(&material);
        assert_eq!(report, "Pass; tc; 1; 0:01:02; Acme; [a*,b*]; [s]; M");
    }

    #[test]
    fn unpermuted_records_and_delimiter() {
        let mut naming = NamingTable::new();
        naming.insert(RoleKind::Sta, "sta1", "STA-1");
        let permutations = PermutationTable::new();

        let mut material = Material::new();
        material.insert("tc2", candidate(2, &["x"], &["sta1", "sta2"]));
        material.insert("tc1", candidate(1, &[], &[]));

        let report = ReportFormatter::new(&naming, &permutations, "Pass")
            .with_delimiter("\r\n")
            .format(&material);
        assert_eq!(
            report,
            "Pass; tc2; 2; 0:01:02; Acme; [x]; [STA-1,sta2]; \r\n\
             Pass; tc1; 1; 0:01:02; Acme; []; []; "
        );
    }

    #[test]
    fn missing_fields_are_empty() {
        let naming = NamingTable::new();
        let permutations = PermutationTable::new();

        let mut material = Material::new();
        material.insert(
            "tc",
            Candidate::new("run.zip").with_verdict(Verdict::default()),
        );

        let report = ReportFormatter::new(&naming, &permutations, "Pass").format(&material);
        assert_eq!(report, "Pass; tc; ; ; ; []; []; ");
    }

    #[test]
    fn empty_material() {
        let naming = NamingTable::new();
        let permutations = PermutationTable::new();
        let report = ReportFormatter::new(&naming, &permutations, "Pass").format(&Material::new());
        assert_eq!(report, "");
    }
}
