// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [verdict](https://crates.io/crates/verdict-cli): turning cached
//! test-execution archives into a deduplicated verdict report.
//!
//! The entry points are [`pipeline::populate`] and [`pipeline::decorate`], followed by the
//! pruning stages in [`filter`] and [`dedupe`] and the formatter in [`report`].

pub mod archive;
pub mod config;
pub mod dedupe;
pub mod errors;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod material;
pub mod pipeline;
pub mod report;
pub mod tables;
