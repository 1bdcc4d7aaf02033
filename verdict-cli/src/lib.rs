// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Build deduplicated verdict reports from cached test-execution archives.
//!
//! The `verdict` binary reads a JSON dump of execution records, pulls the execution log out of
//! each cached archive, drops executions that failed or duplicate a later one, and prints one
//! line per surviving execution.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter};
