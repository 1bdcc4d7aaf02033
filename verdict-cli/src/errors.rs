// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::{FromPathBufError, Utf8PathBuf};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::error;
use verdict_metadata::VerdictExitCode;
use verdict_runner::errors::*;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An error that verdict reports to the user, as opposed to a bug.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine the current directory")]
    CurrentDirFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 {
        #[source]
        err: FromPathBufError,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("table load error")]
    TableLoadError {
        #[from]
        err: TableLoadError,
    },
    #[error("execution records could not be loaded")]
    FetchError {
        #[from]
        err: FetchError,
    },
    #[error("archive could not be decoded")]
    LocateError {
        #[from]
        err: LocateError,
    },
    #[error("no execution log found")]
    NoInnerLog { archive: Utf8PathBuf },
    #[error("extracted log could not be read")]
    ExtractError {
        #[from]
        err: ExtractError,
    },
    #[error("no candidates left")]
    NoCandidates { test_cases: usize },
    #[error("error writing output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn write_output_error(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::ConfigParseError { .. } => VerdictExitCode::SETUP_ERROR,
            Self::TableLoadError { .. } => VerdictExitCode::TABLE_LOAD_FAILED,
            Self::FetchError { .. } => VerdictExitCode::RECORDS_LOAD_FAILED,
            Self::LocateError { .. } | Self::NoInnerLog { .. } | Self::ExtractError { .. } => {
                VerdictExitCode::EXTRACT_FAILED
            }
            Self::NoCandidates { .. } => VerdictExitCode::NO_CANDIDATES,
            Self::WriteOutputError { .. } => VerdictExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::CurrentDirFailed { err } => {
                error!("could not determine the current directory");
                Some(err as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { err } => {
                error!(
                    "current directory `{}` is not valid UTF-8",
                    err.as_path().display().style(styles.bold)
                );
                None
            }
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse verdict config at `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::TableLoadError { err } => {
                error!("{err}");
                err.source()
            }
            Self::FetchError { err } => {
                error!("{err}");
                err.source()
            }
            Self::LocateError { err } => {
                error!("{err}");
                err.source()
            }
            Self::NoInnerLog { archive } => {
                error!(
                    "no execution log found in `{}`",
                    archive.style(styles.bold)
                );
                None
            }
            Self::ExtractError { err } => {
                error!("{err}");
                err.source()
            }
            Self::NoCandidates { test_cases } => {
                error!(
                    "no candidates left to report (across {} test cases)",
                    test_cases.style(styles.bold)
                );
                None
            }
            Self::WriteOutputError { err } => {
                error!("error writing output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
