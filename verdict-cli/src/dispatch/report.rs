// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::value_enums::{DedupPolicyOpt, TimestampSourceOpt};
use crate::{ExpectedError, Result, output::OutputWriter};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use std::io::Write;
use tracing::info;
use verdict_metadata::VerdictExitCode;
use verdict_runner::{
    archive::ArchiveLocator,
    config::VerdictConfig,
    dedupe::dedupe,
    extract::VerdictExtractor,
    fetch::CachedArtifacts,
    filter::filter_result,
    material::Material,
    pipeline::{decorate, populate},
    report::ReportFormatter,
    tables::{NamingTable, PermutationTable},
};

/// Options for `verdict report`.
///
/// Every option overrides the corresponding config setting.
#[derive(Debug, Args)]
pub(crate) struct ReportOpts {
    /// JSON dump of execution records
    #[arg(long, value_name = "PATH", help_heading = "Input options")]
    records: Option<Utf8PathBuf>,

    /// Directory holding cached artifacts
    #[arg(long, value_name = "DIR", help_heading = "Input options")]
    cache_dir: Option<Utf8PathBuf>,

    /// Directory execution logs are extracted to
    #[arg(long, value_name = "DIR", help_heading = "Input options")]
    scratch_dir: Option<Utf8PathBuf>,

    /// Naming table mapping agents to display names
    #[arg(long, value_name = "PATH", help_heading = "Table options")]
    naming: Option<Utf8PathBuf>,

    /// Permutation table listing expected roles per test case
    #[arg(long, value_name = "PATH", help_heading = "Table options")]
    permutation: Option<Utf8PathBuf>,

    /// Result executions are expected to have
    #[arg(long, value_name = "RESULT", help_heading = "Filter options")]
    expected_result: Option<String>,

    /// Keep executions regardless of their result
    #[arg(long, help_heading = "Filter options")]
    no_result_filter: bool,

    /// Which equivalent executions to keep
    #[arg(long, value_enum, value_name = "POLICY", help_heading = "Filter options")]
    dedup: Option<DedupPolicyOpt>,

    /// Where candidate timestamps come from
    #[arg(long, value_enum, value_name = "SOURCE", help_heading = "Filter options")]
    timestamp_source: Option<TimestampSourceOpt>,

    /// Print test cases in lexicographic order
    #[arg(long, help_heading = "Output options")]
    sort: bool,

    /// String placed between report records
    #[arg(long, value_name = "DELIMITER", help_heading = "Output options")]
    delimiter: Option<String>,
}

impl ReportOpts {
    pub(crate) fn exec(
        self,
        root: &Utf8Path,
        config: &VerdictConfig,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let report_config = config.report();
        let cache = config.cache();
        let tables = config.tables();
        let resolve = |path: Utf8PathBuf| root.join(path);

        let records = self.records.map_or(cache.records, resolve);
        let cache_dir = self.cache_dir.map_or(cache.dir, resolve);
        let scratch_dir = self.scratch_dir.map_or(cache.scratch_dir, resolve);
        let expected_result = self
            .expected_result
            .unwrap_or_else(|| report_config.expected_result.clone());
        let filter = report_config.filter_result && !self.no_result_filter;
        let dedup_policy = self.dedup.map_or(report_config.dedup, Into::into);
        let timestamp_source = self
            .timestamp_source
            .map_or(report_config.timestamp_source, Into::into);
        let sort = self.sort || report_config.sort_test_cases;
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| report_config.line_delimiter.clone());

        // Load tables first so a broken table fails before any archive is touched.
        let naming = match self.naming.map(resolve).or(tables.naming) {
            Some(path) => NamingTable::from_path(&path)?,
            None => NamingTable::new(),
        };
        let permutations = match self.permutation.map(resolve).or(tables.permutation) {
            Some(path) => PermutationTable::from_path(&path)?,
            None => PermutationTable::new(),
        };

        let mut material = Material::new();
        let mut source = CachedArtifacts::new(records, cache_dir);
        populate(
            &mut material,
            &mut source,
            filter.then_some(expected_result.as_str()),
            timestamp_source,
        )?;

        let locator = ArchiveLocator::new(scratch_dir);
        decorate(
            &mut material,
            &locator,
            &VerdictExtractor::new(),
            timestamp_source,
        );

        if filter {
            let summary = filter_result(&mut material, &expected_result);
            info!(
                "result filter ({expected_result}): kept {}, removed {}",
                summary.kept, summary.removed
            );
        }
        let summary = dedupe(&mut material, dedup_policy);
        info!(
            "dedup ({dedup_policy}): kept {}, removed {}",
            summary.kept, summary.removed
        );

        if material.is_empty() {
            return Err(ExpectedError::NoCandidates {
                test_cases: material.test_case_count(),
            });
        }
        if sort {
            material.sort_test_cases();
        }

        let report = ReportFormatter::new(&naming, &permutations, &expected_result)
            .with_delimiter(&delimiter)
            .format(&material);

        let mut writer = output_writer.stdout_writer();
        writeln!(writer, "{report}").map_err(ExpectedError::write_output_error)?;
        writer.flush().map_err(ExpectedError::write_output_error)?;

        Ok(VerdictExitCode::OK)
    }
}
