// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by verdict.

use crate::{dedupe::DedupPolicy, pipeline::TimestampSource};
use camino::Utf8PathBuf;
use config::ConfigError;
use std::io;
use thiserror::Error;
use zip::result::ZipError;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse verdict config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<ConfigError>),

    /// The config named an invalid dedup policy.
    #[error(transparent)]
    DedupPolicy(#[from] DedupPolicyParseError),

    /// The config named an invalid timestamp source.
    #[error(transparent)]
    TimestampSource(#[from] TimestampSourceParseError),
}

/// Error returned while parsing a [`DedupPolicy`] value from a string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized value for dedup policy: {input}\n(known values: {})",
    DedupPolicy::variants().join(", "),
)]
pub struct DedupPolicyParseError {
    input: String,
}

impl DedupPolicyParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Error returned while parsing a [`TimestampSource`] value from a string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized value for timestamp source: {input}\n(known values: {})",
    TimestampSource::variants().join(", "),
)]
pub struct TimestampSourceParseError {
    input: String,
}

impl TimestampSourceParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// An error that occurred while locating and extracting the inner log of an archive.
///
/// These errors only affect the candidate the archive belongs to.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LocateError {
    /// The archive could not be opened or read.
    #[error("failed to read archive `{path}`")]
    Read {
        /// The archive path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The archive looked like a zip file, but its directory could not be parsed.
    #[error("archive `{path}` is corrupt")]
    Corrupt {
        /// The archive path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: ZipError,
    },

    /// An entry in the archive could not be decompressed.
    #[error("failed to read entry `{entry}` from archive `{path}`")]
    ReadEntry {
        /// The archive path.
        path: Utf8PathBuf,

        /// The entry name.
        entry: String,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The scratch directory could not be created.
    #[error("failed to create scratch directory `{dir}`")]
    ScratchDirCreate {
        /// The scratch directory.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The extracted log could not be written.
    #[error("failed to write extracted log to `{path}`")]
    Write {
        /// The destination path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

/// An error that occurred while reading an extracted log.
#[derive(Debug, Error)]
#[error("failed to read extracted log `{path}`")]
pub struct ExtractError {
    path: Utf8PathBuf,
    #[source]
    error: io::Error,
}

impl ExtractError {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, error: io::Error) -> Self {
        Self {
            path: path.into(),
            error,
        }
    }
}

/// The reason a candidate was dropped from its bucket during decoration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecorateError {
    /// The archive could not be decoded.
    #[error(transparent)]
    Locate(#[from] LocateError),

    /// The extracted log could not be read.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The artifact is not an archive, or contains no matching log.
    #[error("no execution log found in `{archive}`")]
    NoInnerLog {
        /// The archive path.
        archive: Utf8PathBuf,
    },

    /// Timestamps come from the log, but the log has no start time.
    #[error("no test start time found in `{archive}`")]
    MissingStartTime {
        /// The archive path.
        archive: Utf8PathBuf,
    },

    /// Timestamps come from the log, but the start time could not be parsed.
    #[error("unrecognized test start time `{begin}` in `{archive}`")]
    InvalidStartTime {
        /// The archive path.
        archive: Utf8PathBuf,

        /// The raw start time.
        begin: String,
    },
}

/// An error that occurred while reading the execution-record dump as a whole.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The record dump could not be read.
    #[error("failed to read execution records from `{path}`")]
    ReadRecords {
        /// The path to the dump.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The record dump is not a JSON array.
    #[error("execution records at `{path}` are not a JSON array")]
    ParseRecords {
        /// The path to the dump.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },
}

/// A structural error in a single execution record.
///
/// Only the record at `index` is skipped.
#[derive(Debug, Error)]
#[error("execution record {index} is malformed")]
pub struct RecordError {
    index: usize,
    #[source]
    error: serde_json::Error,
}

impl RecordError {
    pub(crate) fn new(index: usize, error: serde_json::Error) -> Self {
        Self { index, error }
    }

    /// Returns the position of the malformed record in the dump.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// An error that occurred while parsing a naming table.
#[derive(Clone, Debug, Error)]
#[error("line {line_number}: expected `<agent>!<ap-name>!<sta-name>`, found `{line}`")]
pub struct NamingParseError {
    line_number: usize,
    line: String,
}

impl NamingParseError {
    pub(crate) fn new(line_number: usize, line: impl Into<String>) -> Self {
        Self {
            line_number,
            line: line.into(),
        }
    }

    /// Returns the 1-based line number the error occurred on.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

/// An error that occurred while parsing a permutation table.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PermutationParseError {
    /// The document is not well-formed XML.
    #[error("invalid XML at byte {position}")]
    Xml {
        /// Byte offset of the error.
        position: u64,

        /// The underlying error.
        #[source]
        error: quick_xml::Error,
    },

    /// A `testcase` element has no `name` attribute.
    #[error("`testcase` element at byte {position} has no `name` attribute")]
    MissingTestCaseName {
        /// Byte offset of the element.
        position: u64,
    },

    /// A role element appears outside a `testcase` element.
    #[error("`{element}` element at byte {position} is not inside a `testcase`")]
    OrphanRole {
        /// The element name.
        element: String,

        /// Byte offset of the element.
        position: u64,
    },

    /// A role element has no `name` attribute.
    #[error("`{element}` element at byte {position} has no `name` attribute")]
    MissingRoleName {
        /// The element name.
        element: String,

        /// Byte offset of the element.
        position: u64,
    },
}

/// An error that occurred while loading a naming or permutation table from disk.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TableLoadError {
    /// The table file could not be read.
    #[error("failed to read table `{path}`")]
    Read {
        /// The table path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The naming table is malformed.
    #[error("failed to parse naming table `{path}`")]
    Naming {
        /// The table path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: NamingParseError,
    },

    /// The permutation table is malformed.
    #[error("failed to parse permutation table `{path}`")]
    Permutation {
        /// The table path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: PermutationParseError,
    },
}
