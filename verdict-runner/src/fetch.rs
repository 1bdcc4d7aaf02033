// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sources of execution records and their artifacts.

use crate::errors::{FetchError, RecordError};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};
use verdict_metadata::ExecutionRecord;

/// Supplies execution records and the local artifact for each one.
pub trait ArtifactSource {
    /// Returns every record, in source order.
    ///
    /// A malformed record is reported in place, and doesn't affect the others.
    fn records(&mut self) -> Result<Vec<Result<ExecutionRecord, RecordError>>, FetchError>;

    /// Returns the local path to the artifact for `record`, or `None` if none is available.
    ///
    /// `wanted` is false if the record will be discarded anyway, in which case the source may
    /// skip retrieval.
    fn fetch(&mut self, record: &ExecutionRecord, wanted: bool) -> Option<Utf8PathBuf>;
}

/// Artifacts already present in a local cache directory, described by a JSON record dump.
///
/// The dump is a JSON array of [`ExecutionRecord`] objects. Artifacts are looked up by the file
/// name of each record's `logFileName`.
#[derive(Clone, Debug)]
pub struct CachedArtifacts {
    records_path: Utf8PathBuf,
    cache_dir: Utf8PathBuf,
}

impl CachedArtifacts {
    /// Creates a new source.
    pub fn new(records_path: impl Into<Utf8PathBuf>, cache_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            records_path: records_path.into(),
            cache_dir: cache_dir.into(),
        }
    }

    /// Returns the path to the record dump.
    pub fn records_path(&self) -> &Utf8Path {
        &self.records_path
    }

    /// Returns the cache directory.
    pub fn cache_dir(&self) -> &Utf8Path {
        &self.cache_dir
    }

    /// Parses a record dump.
    pub fn parse_records(
        path: &Utf8Path,
        contents: &str,
    ) -> Result<Vec<Result<ExecutionRecord, RecordError>>, FetchError> {
        let values: Vec<serde_json::Value> =
            serde_json::from_str(contents).map_err(|error| FetchError::ParseRecords {
                path: path.to_owned(),
                error,
            })?;
        Ok(values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value(value).map_err(|error| RecordError::new(index, error))
            })
            .collect())
    }
}

impl ArtifactSource for CachedArtifacts {
    fn records(&mut self) -> Result<Vec<Result<ExecutionRecord, RecordError>>, FetchError> {
        let contents =
            std::fs::read_to_string(&self.records_path).map_err(|error| FetchError::ReadRecords {
                path: self.records_path.clone(),
                error,
            })?;
        let records = Self::parse_records(&self.records_path, &contents)?;
        debug!(
            "read {} execution records from {}",
            records.len(),
            self.records_path
        );
        Ok(records)
    }

    fn fetch(&mut self, record: &ExecutionRecord, wanted: bool) -> Option<Utf8PathBuf> {
        if !wanted {
            debug!(
                "record {}: skipping unwanted artifact (declared result {})",
                record.id, record.result
            );
            return None;
        }

        let path = self.cache_dir.join(record.artifact_file_name());
        if path.is_file() {
            Some(path)
        } else {
            warn!("record {}: artifact {path} is not in the cache", record.id);
            None
        }
    }
}
