// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static tables used to annotate the report.
//!
//! * The [`NamingTable`] maps raw agent identifiers to display names, per role kind.
//! * The [`PermutationTable`] lists, per test case, the role sequences the test plan expects.

mod naming;
mod permutation;

pub use naming::NamingTable;
pub use permutation::{Permutation, PermutationTable};

use crate::errors::TableLoadError;
use camino::Utf8Path;

fn read_table(path: &Utf8Path) -> Result<String, TableLoadError> {
    std::fs::read_to_string(path).map_err(|error| TableLoadError::Read {
        path: path.to_owned(),
        error,
    })
}
