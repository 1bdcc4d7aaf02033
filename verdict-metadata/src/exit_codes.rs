// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `verdict` failures.
///
/// `verdict` runs may fail for a variety of reasons. This structure documents the exit codes
/// that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum VerdictExitCode {}

impl VerdictExitCode {
    /// No errors occurred and verdict exited normally.
    pub const OK: i32 = 0;

    /// Every candidate was filtered out, so the report is empty.
    pub const NO_CANDIDATES: i32 = 4;

    /// A user issue happened while setting up a verdict invocation.
    pub const SETUP_ERROR: i32 = 96;

    /// The naming or permutation table could not be loaded.
    pub const TABLE_LOAD_FAILED: i32 = 97;

    /// The execution-record dump could not be read.
    pub const RECORDS_LOAD_FAILED: i32 = 98;

    /// A single archive passed to `verdict extract` could not be decoded.
    pub const EXTRACT_FAILED: i32 = 99;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
