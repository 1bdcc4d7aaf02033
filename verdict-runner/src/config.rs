// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for a verdict run.
//!
//! The embedded [`DEFAULT_CONFIG`](VerdictConfig::DEFAULT_CONFIG) is layered with a repository
//! file, `.config/verdict.toml`, or with an explicitly provided file.

use crate::{
    dedupe::DedupPolicy,
    errors::{ConfigParseError, ConfigParseErrorKind},
    pipeline::TimestampSource,
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Settings that shape the report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportConfig {
    /// The result executions are expected to have.
    pub expected_result: String,

    /// Whether to remove candidates whose extracted result isn't the expected one.
    pub filter_result: bool,

    /// Which equivalent executions to keep.
    pub dedup: DedupPolicy,

    /// Where candidate timestamps come from.
    pub timestamp_source: TimestampSource,

    /// Whether to order test cases lexicographically.
    pub sort_test_cases: bool,

    /// The string placed between records.
    pub line_delimiter: String,
}

/// Locations of the naming and permutation tables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TablesConfig {
    /// The naming table, if any.
    pub naming: Option<Utf8PathBuf>,

    /// The permutation table, if any.
    pub permutation: Option<Utf8PathBuf>,
}

/// Locations of the local artifact cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// The JSON dump of execution records.
    pub records: Utf8PathBuf,

    /// The directory holding downloaded artifacts.
    pub dir: Utf8PathBuf,

    /// The directory inner logs are extracted to.
    pub scratch_dir: Utf8PathBuf,
}

/// Overall configuration for verdict.
///
/// Paths in the config are resolved against the root passed to [`Self::from_sources`].
#[derive(Clone, Debug)]
pub struct VerdictConfig {
    root: Utf8PathBuf,
    report: ReportConfig,
    tables: TablesConfig,
    cache: CacheConfig,
}

impl VerdictConfig {
    /// The default location of the config within the root: `.config/verdict.toml`.
    pub const CONFIG_PATH: &'static str = ".config/verdict.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config from the given file, or if not specified from `.config/verdict.toml`
    /// within `root`.
    ///
    /// If no config file is specified and `root` doesn't have `.config/verdict.toml`, uses the
    /// default config options. Unknown keys are reported as warnings.
    pub fn from_sources(
        root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_impl(root, config_file, |config_file, unknown| {
            let mut unknown_str = String::new();
            if unknown.len() == 1 {
                // Print this on the same line.
                unknown_str.push(' ');
                unknown_str.extend(unknown.iter().next().map(String::as_str));
            } else {
                for ignored_key in unknown {
                    unknown_str.push_str("\n  - ");
                    unknown_str.push_str(ignored_key);
                }
            }

            warn!("ignoring unknown configuration keys in config file {config_file}:{unknown_str}")
        })
    }

    // A custom unknown_callback can be passed in while testing.
    fn from_sources_impl(
        root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
        mut unknown_callback: impl FnMut(&Utf8Path, &BTreeSet<String>),
    ) -> Result<Self, ConfigParseError> {
        let root = root.into();
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (deserialized, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;
        if !unknown.is_empty() {
            unknown_callback(&config_file, &unknown);
        }

        let (report, tables, cache) = deserialized
            .into_parts()
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;
        Ok(Self {
            root,
            report,
            tables,
            cache,
        })
    }

    /// Returns the directory paths are resolved against.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns the report settings.
    pub fn report(&self) -> &ReportConfig {
        &self.report
    }

    /// Returns the table locations, resolved against the root.
    pub fn tables(&self) -> TablesConfig {
        TablesConfig {
            naming: self.tables.naming.as_deref().map(|path| self.resolve(path)),
            permutation: self
                .tables
                .permutation
                .as_deref()
                .map(|path| self.resolve(path)),
        }
    }

    /// Returns the cache locations, resolved against the root.
    pub fn cache(&self) -> CacheConfig {
        CacheConfig {
            records: self.resolve(&self.cache.records),
            dir: self.resolve(&self.cache.dir),
            scratch_dir: self.resolve(&self.cache.scratch_dir),
        }
    }

    // ---
    // Helper methods
    // ---

    fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        // join() keeps absolute paths as they are.
        self.root.join(path)
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(VerdictConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let config: VerdictConfigDeserialize =
            serde_ignored::deserialize(config, |path: serde_ignored::Path| {
                ignored.insert(path.to_string());
            })
            .map_err(|error| ConfigParseErrorKind::DeserializeError(Box::new(error)))?;

        Ok((config, ignored))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct VerdictConfigDeserialize {
    report: ReportConfigDeserialize,
    #[serde(default)]
    tables: TablesConfigDeserialize,
    cache: CacheConfigDeserialize,
}

impl VerdictConfigDeserialize {
    fn into_parts(
        self,
    ) -> Result<(ReportConfig, TablesConfig, CacheConfig), ConfigParseErrorKind> {
        let report = ReportConfig {
            expected_result: self.report.expected_result,
            filter_result: self.report.filter_result,
            dedup: self.report.dedup.parse()?,
            timestamp_source: self.report.timestamp_source.parse()?,
            sort_test_cases: self.report.sort_test_cases,
            line_delimiter: self.report.line_delimiter,
        };
        let tables = TablesConfig {
            naming: self.tables.naming,
            permutation: self.tables.permutation,
        };
        let cache = CacheConfig {
            records: self.cache.records,
            dir: self.cache.dir,
            scratch_dir: self.cache.scratch_dir,
        };
        Ok((report, tables, cache))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReportConfigDeserialize {
    expected_result: String,
    filter_result: bool,
    dedup: String,
    timestamp_source: String,
    sort_test_cases: bool,
    line_delimiter: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TablesConfigDeserialize {
    #[serde(default)]
    naming: Option<Utf8PathBuf>,
    #[serde(default)]
    permutation: Option<Utf8PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CacheConfigDeserialize {
    records: Utf8PathBuf,
    dir: Utf8PathBuf,
    scratch_dir: Utf8PathBuf,
}
