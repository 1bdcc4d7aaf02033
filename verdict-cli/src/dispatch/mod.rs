// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command dispatch and execution.

mod app;
mod extract;
mod report;
mod value_enums;

pub use app::VerdictApp;
