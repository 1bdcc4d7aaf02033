// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Populating and decorating the material store.
//!
//! A run goes through these stages, in order:
//!
//! 1. [`populate`] reads records from an [`ArtifactSource`] and inserts one undecorated
//!    [`Candidate`] per available artifact.
//! 2. [`decorate`] locates the inner log of each candidate's archive and extracts its
//!    [`Verdict`]. Candidates that can't be decorated are dropped.
//! 3. [`filter_result`](crate::filter::filter_result) and [`dedupe`](crate::dedupe::dedupe) prune
//!    the store.
//! 4. [`ReportFormatter`](crate::report::ReportFormatter) renders what's left.

use crate::{
    archive::ArchiveLocator,
    errors::{DecorateError, FetchError, TimestampSourceParseError},
    extract::{Verdict, VerdictExtractor},
    fetch::ArtifactSource,
    material::{Candidate, Material, remove_indexes},
};
use chrono::NaiveDateTime;
use std::{collections::BTreeSet, fmt, str::FromStr};
use tracing::{debug, info, warn};

/// Formats accepted for the test start time, tried in order. Times are taken to be UTC.
const BEGIN_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%a %b %e %H:%M:%S %Y",
    "%b-%d-%Y__%H-%M-%S",
];

/// Where candidate timestamps come from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TimestampSource {
    /// The execution record's own timestamp, known when the candidate is inserted.
    #[default]
    Record,

    /// The test start time in the extracted log, known after decoration.
    Log,
}

impl TimestampSource {
    /// Returns string representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &["record", "log"]
    }
}

impl FromStr for TimestampSource {
    type Err = TimestampSourceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "record" => Ok(Self::Record),
            "log" => Ok(Self::Log),
            other => Err(TimestampSourceParseError::new(other)),
        }
    }
}

impl fmt::Display for TimestampSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record => write!(f, "record"),
            Self::Log => write!(f, "log"),
        }
    }
}

/// Counts produced by [`populate`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PopulateSummary {
    /// Records read from the source, including malformed ones.
    pub records: usize,

    /// Records skipped because they were malformed.
    pub malformed: usize,

    /// Records skipped because their declared result wasn't wanted.
    pub unwanted: usize,

    /// Wanted records whose artifact wasn't available.
    pub missing: usize,

    /// Candidates inserted into the store.
    pub inserted: usize,
}

/// Reads every record from `source` and inserts a candidate for each available artifact.
///
/// Malformed records are logged and skipped. Fails only if the source can't produce records at
/// all.
pub fn populate(
    material: &mut Material,
    source: &mut impl ArtifactSource,
    expected_result: Option<&str>,
    timestamp_source: TimestampSource,
) -> Result<PopulateSummary, FetchError> {
    let records = source.records()?;
    let mut summary = PopulateSummary {
        records: records.len(),
        ..PopulateSummary::default()
    };

    for record in records {
        let record = match record {
            Ok(record) => record,
            Err(error) => {
                warn!("skipping record: {error}{}", DisplaySource(&error));
                summary.malformed += 1;
                continue;
            }
        };

        let wanted = Material::is_wanted(&record, expected_result);
        let Some(path) = source.fetch(&record, wanted) else {
            if wanted {
                summary.missing += 1;
            } else {
                summary.unwanted += 1;
            }
            continue;
        };

        let mut candidate = Candidate::new(path);
        if timestamp_source == TimestampSource::Record {
            candidate.timestamp = Some(record.timestamp);
        }
        debug!(
            "{}: inserting {} from record {}",
            record.test_case, candidate.path, record.id
        );
        candidate.record_dut = record.dut;
        material.insert(record.test_case, candidate);
        summary.inserted += 1;
    }

    info!(
        "read {} records: {} candidates, {} unwanted, {} missing, {} malformed",
        summary.records, summary.inserted, summary.unwanted, summary.missing, summary.malformed
    );
    Ok(summary)
}

/// Counts produced by [`decorate`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DecorateSummary {
    /// Candidates that now carry a verdict and a timestamp.
    pub decorated: usize,

    /// Candidates removed because they couldn't be decorated.
    pub dropped: usize,
}

/// Extracts a verdict for every candidate.
///
/// Afterwards, every remaining candidate has its verdict set, and its timestamp set if it comes
/// from `timestamp_source`. Failures drop only the candidate concerned.
pub fn decorate(
    material: &mut Material,
    locator: &ArchiveLocator,
    extractor: &VerdictExtractor,
    timestamp_source: TimestampSource,
) -> DecorateSummary {
    let mut summary = DecorateSummary::default();

    for (test_case, bucket) in material.iter_mut() {
        let mut remove = BTreeSet::new();
        for (index, candidate) in bucket.iter_mut().enumerate() {
            match decorate_one(candidate, locator, extractor, timestamp_source) {
                Ok(()) => summary.decorated += 1,
                Err(error) => {
                    warn!(
                        "{test_case}: dropping {}: {error}{}",
                        candidate.path,
                        DisplaySource(&error)
                    );
                    remove.insert(index);
                }
            }
        }
        summary.dropped += remove.len();
        remove_indexes(bucket, &remove);
    }

    info!(
        "decorated {} candidates, dropped {}",
        summary.decorated, summary.dropped
    );
    summary
}

fn decorate_one(
    candidate: &mut Candidate,
    locator: &ArchiveLocator,
    extractor: &VerdictExtractor,
    timestamp_source: TimestampSource,
) -> Result<(), DecorateError> {
    let log = locator
        .locate(&candidate.path)?
        .ok_or_else(|| DecorateError::NoInnerLog {
            archive: candidate.path.clone(),
        })?;
    let mut verdict = extractor.extract(&log)?;
    if verdict.dut.is_none() {
        if let Some(dut) = &candidate.record_dut {
            debug!("{}: no DUT status line, using {dut} from the record", candidate.path);
            verdict.dut = Some(dut.clone());
        }
    }

    if timestamp_source == TimestampSource::Log {
        candidate.timestamp = Some(log_timestamp(candidate, &verdict)?);
    }
    candidate.verdict = Some(verdict);
    Ok(())
}

fn log_timestamp(candidate: &Candidate, verdict: &Verdict) -> Result<i64, DecorateError> {
    let begin = verdict
        .begin
        .as_deref()
        .ok_or_else(|| DecorateError::MissingStartTime {
            archive: candidate.path.clone(),
        })?;
    parse_begin(begin).ok_or_else(|| DecorateError::InvalidStartTime {
        archive: candidate.path.clone(),
        begin: begin.to_owned(),
    })
}

/// Parses a test start time into seconds since the Unix epoch.
///
/// Returns `None` if `begin` matches none of the known formats.
pub fn parse_begin(begin: &str) -> Option<i64> {
    let begin = begin.trim();
    BEGIN_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(begin, format)
            .ok()
            .map(|time| time.and_utc().timestamp())
    })
}

/// Displays the source chain of an error, each cause prefixed with `: `.
struct DisplaySource<'a>(&'a dyn std::error::Error);

impl fmt::Display for DisplaySource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut source = self.0.source();
        while let Some(error) = source {
            write!(f, ": {error}")?;
            source = error.source();
        }
        Ok(())
    }
}
