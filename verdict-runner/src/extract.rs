// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extracting a structured [`Verdict`] from an execution log.
//!
//! Execution logs are free-form text written by the test suite. The extractor makes a single
//! forward pass over the lines and recognizes two kinds of fields:
//!
//! * *One-time* fields (core version, start time, elapsed time, final result, device under test)
//!   are captured by the first line that matches, and never overwritten.
//! * *Multi-time* fields (the AP and STA role lists) accumulate the agents configured through
//!   `*_set_security` commands, in first-seen order, without duplicates.
//!
//! When the suite runs test streams in parallel, lines carry a `[parallel…]` tag in front of the
//! agent name. Such lines are matched against the tagged form of each pattern first.

use crate::{archive::InnerLog, errors::ExtractError};
use regex::{Captures, Regex};
use std::{fmt, fs, sync::LazyLock};
use tracing::debug;

/// Marks a line written by a parallel test stream.
const PARALLEL_TAG: &str = "[parallel";

/// Prefix for the parallel form of a pattern.
const PARALLEL_PREFIX: &str = r"\[parallel[^\]]*\]\s*";

/// Only lines containing both of these are considered for role capture.
const TRANSITION_MARKER: &str = "--->";
const SET_SECURITY_MARKER: &str = "_set_security";

/// The device under test shows up as an agent named `DUT`. It isn't a named role.
const DUT_SENTINEL: &str = "DUT";

/// The kind of role a network agent plays in a test.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoleKind {
    /// An access point.
    Ap,
    /// A station.
    Sta,
}

impl RoleKind {
    /// All role kinds, in report order.
    pub const ALL: [RoleKind; 2] = [RoleKind::Ap, RoleKind::Sta];

    /// Returns the lowercase name used in tables and config files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ap => "ap",
            Self::Sta => "sta",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fields extracted from a single execution log.
///
/// One-time fields that never matched are `None`. Role lists that never matched are empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Verdict {
    /// The version of the test-suite core, e.g. `10.3.0`.
    pub core_ver: Option<String>,

    /// The raw start time of the test.
    pub begin: Option<String>,

    /// The elapsed time of the test, as written by the suite.
    pub elapsed: Option<String>,

    /// The final result, e.g. `PASS`.
    pub result: Option<String>,

    /// The vendor of the device under test.
    pub dut: Option<String>,

    /// Agents that acted as access points, in first-seen order.
    pub ap: Vec<String>,

    /// Agents that acted as stations, in first-seen order.
    pub sta: Vec<String>,
}

impl Verdict {
    /// Returns the role list for `kind`.
    pub fn roles(&self, kind: RoleKind) -> &[String] {
        match kind {
            RoleKind::Ap => &self.ap,
            RoleKind::Sta => &self.sta,
        }
    }

    fn roles_mut(&mut self, kind: RoleKind) -> &mut Vec<String> {
        match kind {
            RoleKind::Ap => &mut self.ap,
            RoleKind::Sta => &mut self.sta,
        }
    }

    /// Appends `agent` to the role list for `kind`, unless it is the DUT sentinel or already
    /// present.
    fn push_role(&mut self, kind: RoleKind, agent: &str) {
        if agent == DUT_SENTINEL {
            return;
        }
        let roles = self.roles_mut(kind);
        if !roles.iter().any(|existing| existing == agent) {
            debug!("captured {kind} role: {agent}");
            roles.push(agent.to_owned());
        }
    }
}

/// A pattern with a plain and a parallel-tagged form. Both forms have the same capture groups.
#[derive(Debug)]
struct LinePattern {
    plain: Regex,
    parallel: Regex,
}

impl LinePattern {
    fn new(body: &str) -> Self {
        Self {
            plain: Regex::new(body).expect("plain pattern is valid"),
            parallel: Regex::new(&format!("{PARALLEL_PREFIX}{body}"))
                .expect("parallel pattern is valid"),
        }
    }

    fn captures<'h>(&self, line: &'h str, parallel: bool) -> Option<Captures<'h>> {
        if parallel {
            self.parallel
                .captures(line)
                .or_else(|| self.plain.captures(line))
        } else {
            self.plain.captures(line)
        }
    }
}

#[derive(Debug)]
struct ExtractPatterns {
    core_ver: Regex,
    begin: Regex,
    elapsed: Regex,
    result: Regex,
    // Group 2 is the vendor.
    dut: LinePattern,
    ap: LinePattern,
    sta: LinePattern,
}

static PATTERNS: LazyLock<ExtractPatterns> = LazyLock::new(|| ExtractPatterns {
    core_ver: Regex::new(r"UCC Core Version[^\[]*\[([^\]]+)\]").expect("core_ver is valid"),
    begin: Regex::new(r"Test Start Time:?(.*)$").expect("begin is valid"),
    elapsed: Regex::new(r"Execution Time[^\[]*\[([^\]]+)\]").expect("elapsed is valid"),
    result: Regex::new(r"FINAL TEST RESULT\s*--->(.*)$").expect("result is valid"),
    dut: LinePattern::new(
        r"DUT\s*\([^)]*\)\s*<--\s*status,([^,]*),vendor,([^,]*),model,([^,]*),version,(.*)$",
    ),
    ap: LinePattern::new(r"(\S+)\s*\([^)]*\)\s*--->\s*ap_set_security\b"),
    sta: LinePattern::new(r"(\S+)\s*\([^)]*\)\s*--->\s*sta_set_security\b"),
});

/// Scans execution logs for a [`Verdict`].
#[derive(Clone, Copy, Debug)]
pub struct VerdictExtractor {
    patterns: &'static ExtractPatterns,
}

impl Default for VerdictExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl VerdictExtractor {
    /// Creates a new extractor.
    pub fn new() -> Self {
        Self {
            patterns: &PATTERNS,
        }
    }

    /// Reads an extracted log from disk and scans it.
    ///
    /// Logs are not guaranteed to be UTF-8; invalid sequences are replaced.
    pub fn extract(&self, log: &InnerLog) -> Result<Verdict, ExtractError> {
        let bytes = fs::read(&log.path).map_err(|error| ExtractError::new(&log.path, error))?;
        let text = String::from_utf8_lossy(&bytes);
        debug!("scanning {} ({} bytes)", log.path, bytes.len());
        Ok(self.scan(text.lines()))
    }

    /// Scans lines of a log, in order.
    pub fn scan<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> Verdict {
        let mut verdict = Verdict::default();
        for line in lines {
            self.scan_line(&mut verdict, line);
        }
        verdict
    }

    fn scan_line(&self, verdict: &mut Verdict, line: &str) {
        let patterns = self.patterns;
        let parallel = line.contains(PARALLEL_TAG);

        capture_once(&mut verdict.core_ver, "core_ver", || {
            patterns.core_ver.captures(line).map(|c| group(&c, 1))
        });
        capture_once(&mut verdict.begin, "begin", || {
            patterns.begin.captures(line).map(|c| group(&c, 1))
        });
        capture_once(&mut verdict.elapsed, "elapsed", || {
            patterns.elapsed.captures(line).map(|c| group(&c, 1))
        });
        capture_once(&mut verdict.result, "result", || {
            patterns.result.captures(line).map(|c| group(&c, 1))
        });
        capture_once(&mut verdict.dut, "dut", || {
            patterns.dut.captures(line, parallel).map(|c| group(&c, 2))
        });

        if line.contains(TRANSITION_MARKER) && line.contains(SET_SECURITY_MARKER) {
            if let Some(c) = patterns.ap.captures(line, parallel) {
                verdict.push_role(RoleKind::Ap, &group(&c, 1));
            } else if let Some(c) = patterns.sta.captures(line, parallel) {
                verdict.push_role(RoleKind::Sta, &group(&c, 1));
            }
        }
    }
}

/// Sets `field` from `capture` if it is still unset. Empty captures don't count as a match.
fn capture_once(field: &mut Option<String>, name: &str, capture: impl FnOnce() -> Option<String>) {
    if field.is_some() {
        return;
    }
    if let Some(value) = capture().filter(|value| !value.is_empty()) {
        debug!("captured {name}: {value}");
        *field = Some(value);
    }
}

fn group(captures: &Captures<'_>, index: usize) -> String {
    captures
        .get(index)
        .map_or("", |m| m.as_str())
        .trim()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn scan(log: &str) -> Verdict {
        VerdictExtractor::new().scan(log.lines())
    }

    #[test]
    fn full_log() {
        let log = indoc! {"
            ====== UCC Core Version [10.3.0] ======
            Test Start Time: 2022-04-15 08:30:00
            DUT (192.168.250.2:9000) <-- status,COMPLETE,vendor,Acme,model,X1,version,2.0
            agentA (192.168.250.10:9000) ---> ap_set_security,NAME,AP1,KEYMGNT,WPA2-PSK
            DUT (192.168.250.2:9000) ---> sta_set_security,interface,wlan0,type,PSK
            agentS (192.168.250.20:9000) ---> sta_set_security,interface,wlan0,type,PSK
            agentB (192.168.250.11:9000) ---> ap_set_security,NAME,AP2,KEYMGNT,WPA2-PSK
            ====== Execution Time [00:04:12] ======
            FINAL TEST RESULT ---> PASS
        "};
        assert_eq!(
            scan(log),
            Verdict {
                core_ver: Some("10.3.0".to_owned()),
                begin: Some("2022-04-15 08:30:00".to_owned()),
                elapsed: Some("00:04:12".to_owned()),
                result: Some("PASS".to_owned()),
                dut: Some("Acme".to_owned()),
                ap: vec!["agentA".to_owned(), "agentB".to_owned()],
                sta: vec!["agentS".to_owned()],
            }
        );
    }

    #[test]
    fn two_aps_and_result() {
        let log = indoc! {"
            agentA (10.0.0.1:9000) ---> ap_set_security,NAME,AP1
            agentB (10.0.0.2:9000) ---> ap_set_security,NAME,AP2
            FINAL TEST RESULT ---> Pass
        "};
        let verdict = scan(log);
        assert_eq!(verdict.ap, vec!["agentA", "agentB"]);
        assert_eq!(verdict.result.as_deref(), Some("Pass"));
        assert!(verdict.sta.is_empty());
    }

    #[test]
    fn role_accumulation_is_idempotent() {
        let line = "agentA (10.0.0.1:9000) ---> ap_set_security,NAME,AP1\n";
        let once = scan(line);
        let thrice = scan(&line.repeat(3));
        assert_eq!(once.ap, thrice.ap);
        assert_eq!(thrice.ap.len(), 1);
    }

    #[test]
    fn role_order_is_first_seen() {
        let log = indoc! {"
            zeta (1) ---> sta_set_security,x
            alpha (2) ---> sta_set_security,x
            zeta (1) ---> sta_set_security,x
            mid (3) ---> sta_set_security,x
        "};
        assert_eq!(scan(log).sta, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn first_match_wins() {
        let log = indoc! {"
            FINAL TEST RESULT ---> FAIL
            FINAL TEST RESULT ---> PASS
            Execution Time [00:01:00]
            Execution Time [00:02:00]
        "};
        let verdict = scan(log);
        assert_eq!(verdict.result.as_deref(), Some("FAIL"));
        assert_eq!(verdict.elapsed.as_deref(), Some("00:01:00"));
    }

    #[test]
    fn empty_capture_is_not_a_match() {
        let log = indoc! {"
            Test Start Time:
            Test Start Time: Fri Apr 15 08:30:00 2022
        "};
        assert_eq!(
            scan(log).begin.as_deref(),
            Some("Fri Apr 15 08:30:00 2022")
        );
    }

    #[test]
    fn unmatched_fields_stay_unset() {
        let verdict = scan("nothing interesting here\n");
        assert_eq!(verdict, Verdict::default());
    }

    #[test_case(
        "[parallel-1] agentP (10.0.0.5:9000) ---> ap_set_security,NAME,AP1",
        RoleKind::Ap,
        "agentP";
        "parallel ap"
    )]
    #[test_case(
        "[parallel] agentQ (10.0.0.6:9000) ---> sta_set_security,type,PSK",
        RoleKind::Sta,
        "agentQ";
        "parallel sta"
    )]
    #[test_case(
        "12:00:01 agentR (10.0.0.7:9000) ---> ap_set_security,NAME,AP1",
        RoleKind::Ap,
        "agentR";
        "plain with timestamp"
    )]
    fn role_line_variants(line: &str, kind: RoleKind, expected: &str) {
        let verdict = scan(line);
        assert_eq!(verdict.roles(kind), [expected.to_owned()]);
    }

    #[test]
    fn parallel_dut() {
        let log = indoc! {"
            [parallel-2] DUT (192.168.250.2:9000) <-- status,COMPLETE,vendor,Globex,model,G7,version,1.1
            DUT (192.168.250.2:9000) <-- status,COMPLETE,vendor,Acme,model,X1,version,2.0
        "};
        assert_eq!(scan(log).dut.as_deref(), Some("Globex"));
    }

    #[test]
    fn dut_sentinel_is_discarded() {
        let log = indoc! {"
            DUT (192.168.250.2:9000) ---> ap_set_security,NAME,SoftAP
            [parallel-1] DUT (192.168.250.2:9000) ---> sta_set_security,type,PSK
        "};
        let verdict = scan(log);
        assert!(verdict.ap.is_empty());
        assert!(verdict.sta.is_empty());
    }

    #[test]
    fn role_lines_need_both_markers() {
        // No transition arrow: a response line, not a command.
        let log = "agentA (10.0.0.1:9000) <--- ap_set_security,status,COMPLETE\n";
        assert!(scan(log).ap.is_empty());
    }
}
