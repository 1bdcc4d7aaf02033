// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Top-level application and command routing.

use super::{extract::ExtractOpts, report::ReportOpts};
use crate::{
    ExpectedError, Result,
    output::{OutputContext, OutputOpts, OutputWriter},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use verdict_runner::config::VerdictConfig;

/// Build deduplicated verdict reports from cached test-execution archives.
#[derive(Debug, Parser)]
#[command(
    name = "verdict",
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct VerdictApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(flatten)]
    config_opts: ConfigOpts,

    #[clap(subcommand)]
    command: Command,
}

impl VerdictApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output_writer: &mut OutputWriter) -> Result<i32> {
        let root = self.config_opts.root()?;
        match self.command {
            Command::Report(opts) => {
                let config = self.config_opts.make_config(&root)?;
                opts.exec(&root, &config, output_writer)
            }
            Command::Extract(opts) => {
                let config = self.config_opts.make_config(&root)?;
                opts.exec(&root, &config, output_writer)
            }
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch, decorate, filter and deduplicate executions, then print the report.
    Report(ReportOpts),

    /// Print the verdict extracted from a single archive.
    Extract(ExtractOpts),
}

/// Configuration options for verdict.
#[derive(Debug, Args)]
#[command(next_help_heading = "Config options")]
pub(crate) struct ConfigOpts {
    /// Config file [default: ROOT/.config/verdict.toml].
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    /// Directory that relative paths are resolved against [default: current directory].
    #[arg(long, global = true, value_name = "DIR", env = "VERDICT_ROOT")]
    root: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn root(&self) -> Result<Utf8PathBuf> {
        let current_dir = std::env::current_dir()
            .map_err(|err| ExpectedError::CurrentDirFailed { err })
            .and_then(|dir| {
                Utf8PathBuf::try_from(dir)
                    .map_err(|err| ExpectedError::CurrentDirInvalidUtf8 { err })
            });
        match &self.root {
            Some(root) if root.is_absolute() => Ok(root.clone()),
            Some(root) => Ok(current_dir?.join(root)),
            None => current_dir,
        }
    }

    fn make_config(&self, root: &Utf8Path) -> Result<VerdictConfig> {
        let config_file = self.config_file.as_deref().map(|file| root.join(file));
        Ok(VerdictConfig::from_sources(root, config_file.as_deref())?)
    }
}
