// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{ExpectedError, Result, output::OutputWriter};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use std::io::{self, Write};
use verdict_metadata::VerdictExitCode;
use verdict_runner::{
    archive::ArchiveLocator, config::VerdictConfig, extract::VerdictExtractor,
};

/// Options for `verdict extract`.
#[derive(Debug, Args)]
pub(crate) struct ExtractOpts {
    /// Archive to extract the verdict from
    #[arg(value_name = "ARCHIVE")]
    archive: Utf8PathBuf,

    /// Directory the execution log is extracted to
    #[arg(long, value_name = "DIR")]
    scratch_dir: Option<Utf8PathBuf>,
}

impl ExtractOpts {
    pub(crate) fn exec(
        self,
        root: &Utf8Path,
        config: &VerdictConfig,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let archive = root.join(&self.archive);
        let scratch_dir = self
            .scratch_dir
            .map_or_else(|| config.cache().scratch_dir, |dir| root.join(dir));

        let locator = ArchiveLocator::new(scratch_dir);
        let log = locator
            .locate(&archive)?
            .ok_or(ExpectedError::NoInnerLog { archive })?;
        let verdict = VerdictExtractor::new().extract(&log)?;

        let ap = verdict.ap.join(",");
        let sta = verdict.sta.join(",");
        let fields = [
            ("entry", Some(log.entry_name.as_str())),
            ("core_ver", verdict.core_ver.as_deref()),
            ("begin", verdict.begin.as_deref()),
            ("elapsed", verdict.elapsed.as_deref()),
            ("result", verdict.result.as_deref()),
            ("dut", verdict.dut.as_deref()),
            ("ap", Some(ap.as_str())),
            ("sta", Some(sta.as_str())),
        ];

        let mut writer = output_writer.stdout_writer();
        write_fields(&mut writer, &fields).map_err(ExpectedError::write_output_error)?;

        Ok(VerdictExitCode::OK)
    }
}

fn write_fields(writer: &mut impl Write, fields: &[(&str, Option<&str>)]) -> io::Result<()> {
    for (key, value) in fields {
        match value.filter(|value| !value.is_empty()) {
            Some(value) => writeln!(writer, "{key}: {value}")?,
            None => writeln!(writer, "{key}:")?,
        }
    }
    writer.flush()
}
