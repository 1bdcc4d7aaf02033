// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locating execution logs inside cached artifact bundles.
//!
//! Every execution uploads a zip bundle containing the test-suite log alongside packet captures
//! and tool output. The [`ArchiveLocator`] picks out the single execution log and extracts it to a
//! scratch directory so that it can be scanned by the
//! [`VerdictExtractor`](crate::extract::VerdictExtractor).

use crate::errors::LocateError;
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::{
    fs::{self, File},
    io::{self, BufWriter, Read, Write},
    sync::LazyLock,
};
use tracing::debug;
use zip::ZipArchive;

/// Matches execution logs: a version- or build-qualified `.log` suffix, such as
/// `5.2.1_10.3.0.log` or `run-v2.log`.
static LOG_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_]v?\d+(?:\.\d+)*\.log$").expect("log name regex is valid"));

/// Packet-capture tools write logs that match the pattern too.
const SNIFFER_PREFIX: &str = "sniffer";

/// Local file header, empty archive and spanned archive signatures.
const ZIP_SIGNATURES: [[u8; 4]; 3] = [
    [b'P', b'K', 0x03, 0x04],
    [b'P', b'K', 0x05, 0x06],
    [b'P', b'K', 0x07, 0x08],
];

/// An execution log that was extracted from an archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InnerLog {
    /// The archive the log came from.
    pub archive: Utf8PathBuf,

    /// The name of the entry within the archive.
    pub entry_name: String,

    /// Where the log was extracted to.
    pub path: Utf8PathBuf,
}

/// Finds and extracts the execution log within a cached artifact.
#[derive(Clone, Debug)]
pub struct ArchiveLocator {
    scratch_dir: Utf8PathBuf,
}

impl ArchiveLocator {
    /// Creates a new locator which extracts logs into `scratch_dir`.
    ///
    /// The directory is created on first use.
    pub fn new(scratch_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Returns the directory logs are extracted into.
    pub fn scratch_dir(&self) -> &Utf8Path {
        &self.scratch_dir
    }

    /// Locates the execution log in `archive` and extracts it.
    ///
    /// Returns `Ok(None)` if `archive` is not a zip file, or if no entry in it looks like an
    /// execution log. Returns an error if the archive is corrupt or if extraction fails. A file
    /// that starts with a zip signature but can't be opened is corrupt.
    pub fn locate(&self, archive: &Utf8Path) -> Result<Option<InnerLog>, LocateError> {
        let mut file = File::open(archive).map_err(|error| LocateError::Read {
            path: archive.to_owned(),
            error,
        })?;

        let signed = has_zip_signature(&mut file).map_err(|error| LocateError::Read {
            path: archive.to_owned(),
            error,
        })?;

        // ZipArchive::new seeks to the end of the file, so the signature read above doesn't matter.
        // Archives with leading data (self-extracting stubs) have no signature but still open.
        let mut zip = match ZipArchive::new(file) {
            Ok(zip) => zip,
            Err(error) if signed => {
                return Err(LocateError::Corrupt {
                    path: archive.to_owned(),
                    error,
                });
            }
            Err(error) => {
                debug!("{archive} is not a zip archive: {error}");
                return Ok(None);
            }
        };

        let Some((index, entry_name)) = find_log_entry(&zip) else {
            debug!("{archive}: no entry matches the execution log pattern");
            return Ok(None);
        };

        let dest = self.dest_path(archive, &entry_name);
        fs::create_dir_all(&self.scratch_dir).map_err(|error| LocateError::ScratchDirCreate {
            dir: self.scratch_dir.clone(),
            error,
        })?;

        let mut entry = zip.by_index(index).map_err(|error| LocateError::Corrupt {
            path: archive.to_owned(),
            error,
        })?;
        let out = File::create(&dest).map_err(|error| LocateError::Write {
            path: dest.clone(),
            error,
        })?;
        let mut out = BufWriter::new(out);
        io::copy(&mut entry, &mut out).map_err(|error| LocateError::ReadEntry {
            path: archive.to_owned(),
            entry: entry_name.clone(),
            error,
        })?;
        out.flush().map_err(|error| LocateError::Write {
            path: dest.clone(),
            error,
        })?;

        debug!("{archive}: extracted `{entry_name}` to {dest}");
        Ok(Some(InnerLog {
            archive: archive.to_owned(),
            entry_name,
            path: dest,
        }))
    }

    /// The destination is derived from the archive's own file name, since inner log names are
    /// shared between executions of the same test case.
    fn dest_path(&self, archive: &Utf8Path, entry_name: &str) -> Utf8PathBuf {
        let archive_name = archive.file_name().unwrap_or(archive.as_str());
        self.scratch_dir
            .join(format!("{archive_name}.{}", entry_file_name(entry_name)))
    }
}

/// Returns true if `name` (an archive entry name) looks like an execution log.
pub fn is_log_entry(name: &str) -> bool {
    let file_name = entry_file_name(name);
    !name.starts_with(SNIFFER_PREFIX)
        && !file_name.starts_with(SNIFFER_PREFIX)
        && LOG_NAME_REGEX.is_match(file_name)
}

fn entry_file_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

fn find_log_entry<R: Read + io::Seek>(zip: &ZipArchive<R>) -> Option<(usize, String)> {
    (0..zip.len()).find_map(|index| {
        let name = zip.name_for_index(index)?;
        is_log_entry(name).then(|| (index, name.to_owned()))
    })
}

fn has_zip_signature(file: &mut File) -> io::Result<bool> {
    let mut signature = [0u8; 4];
    match file.read_exact(&mut signature) {
        Ok(()) => Ok(ZIP_SIGNATURES.contains(&signature)),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(error) => Err(error),
    }
}
