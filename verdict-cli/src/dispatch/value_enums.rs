// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Value enums for command-line options.

use clap::ValueEnum;
use verdict_runner::{dedupe::DedupPolicy, pipeline::TimestampSource};

/// Which equivalent executions to keep.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum DedupPolicyOpt {
    /// Keep every execution.
    All,

    /// Keep the earliest execution of each equivalence class.
    #[clap(alias = "earliest")]
    First,

    /// Keep the latest execution of each equivalence class.
    #[clap(alias = "latest")]
    Last,
}

impl From<DedupPolicyOpt> for DedupPolicy {
    fn from(opt: DedupPolicyOpt) -> Self {
        match opt {
            DedupPolicyOpt::All => Self::All,
            DedupPolicyOpt::First => Self::First,
            DedupPolicyOpt::Last => Self::Last,
        }
    }
}

/// Where candidate timestamps come from.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum TimestampSourceOpt {
    /// The execution record's timestamp.
    Record,

    /// The test start time in the execution log.
    Log,
}

impl From<TimestampSourceOpt> for TimestampSource {
    fn from(opt: TimestampSourceOpt) -> Self {
        match opt {
            TimestampSourceOpt::Record => Self::Record,
            TimestampSourceOpt::Log => Self::Log,
        }
    }
}
