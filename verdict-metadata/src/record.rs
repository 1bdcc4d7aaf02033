// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single test execution, as reported by the test-management service.
///
/// Records are read from a JSON dump of the service's test-result listing. Keys are camelCase, and
/// unknown keys are ignored.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    /// The service-assigned identifier for this execution.
    pub id: RecordId,

    /// The result the service declared for this execution, e.g. `Pass`.
    pub result: String,

    /// When the execution happened. The unit is whatever the service uses, but it is consistent
    /// across a dump.
    pub timestamp: i64,

    /// A reference to the log bundle for this execution, as a remote path.
    pub log_file_name: String,

    /// The name of the test case that was executed.
    pub test_case: String,

    /// The device under test, if the service knows it. Execution logs take precedence; this is
    /// only used for logs without a DUT status line.
    #[serde(default)]
    pub dut: Option<String>,
}

impl ExecutionRecord {
    /// Returns the final path component of [`Self::log_file_name`].
    ///
    /// Both `/` and `\` are treated as separators, since the service is not consistent about
    /// which one it uses.
    pub fn artifact_file_name(&self) -> &str {
        self.log_file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.log_file_name)
    }
}

/// The identifier of an [`ExecutionRecord`].
///
/// The service emits numeric identifiers, but older dumps quote them.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RecordId {
    /// A numeric identifier.
    Number(u64),
    /// A textual identifier.
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}
