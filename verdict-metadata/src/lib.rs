// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Machine-readable data shared between `verdict` and the tools that feed it.
//!
//! This crate contains the execution-record format read from test-management
//! dumps, and the documented exit codes of the `verdict` binary.

mod exit_codes;
mod record;

pub use exit_codes::*;
pub use record::*;
