// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::read_table;
use crate::{
    errors::{PermutationParseError, TableLoadError},
    extract::RoleKind,
};
use camino::Utf8Path;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::collections::BTreeMap;
use tracing::debug;

const TESTCASE_ELEMENT: &[u8] = b"testcase";
const NAME_ATTRIBUTE: &[u8] = b"name";

/// The role sequences a test plan expects for one test case.
///
/// Entries are display names, as produced by the [`NamingTable`](super::NamingTable).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Permutation {
    /// Expected AP roles, in order.
    pub ap: Vec<String>,

    /// Expected STA roles, in order.
    pub sta: Vec<String>,
}

impl Permutation {
    /// Returns the expected sequence for `kind`.
    pub fn expected(&self, kind: RoleKind) -> &[String] {
        match kind {
            RoleKind::Ap => &self.ap,
            RoleKind::Sta => &self.sta,
        }
    }

    fn expected_mut(&mut self, kind: RoleKind) -> &mut Vec<String> {
        match kind {
            RoleKind::Ap => &mut self.ap,
            RoleKind::Sta => &mut self.sta,
        }
    }
}

/// Expected role sequences, by test case.
///
/// The on-disk format is an XML document; the root element's name doesn't matter:
///
/// ```xml
/// <permutations>
///   <testcase name="5.2.1">
///     <ap name="AP-1"/>
///     <ap name="AP-2"/>
///     <sta name="STA-1"/>
///   </testcase>
/// </permutations>
/// ```
///
/// Role order is element order. Unknown elements are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermutationTable {
    entries: BTreeMap<String, Permutation>,
}

impl PermutationTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a table from `path`.
    pub fn from_path(path: &Utf8Path) -> Result<Self, TableLoadError> {
        let contents = read_table(path)?;
        let table = Self::parse(&contents).map_err(|error| TableLoadError::Permutation {
            path: path.to_owned(),
            error,
        })?;
        debug!(
            "loaded permutation table from {path}: {} test cases",
            table.entries.len()
        );
        Ok(table)
    }

    /// Parses a table from its XML form.
    pub fn parse(contents: &str) -> Result<Self, PermutationParseError> {
        let mut reader = Reader::from_str(contents);
        reader.config_mut().trim_text(true);

        let mut table = Self::new();
        let mut current: Option<(String, Permutation)> = None;

        loop {
            let position = reader.buffer_position();
            let event = reader
                .read_event()
                .map_err(|error| PermutationParseError::Xml {
                    position: reader.error_position(),
                    error,
                })?;

            let self_closing = matches!(event, Event::Empty(_));
            match event {
                Event::Start(element) | Event::Empty(element)
                    if element.name().as_ref().eq_ignore_ascii_case(TESTCASE_ELEMENT) =>
                {
                    let name = name_attribute(&element, position)?
                        .ok_or(PermutationParseError::MissingTestCaseName { position })?;
                    if let Some((name, permutation)) = current.take() {
                        table.entries.insert(name, permutation);
                    }
                    if self_closing {
                        table.entries.insert(name, Permutation::default());
                    } else {
                        current = Some((name, Permutation::default()));
                    }
                }
                Event::Start(element) | Event::Empty(element) => {
                    let Some(kind) = role_kind(&element) else {
                        continue;
                    };
                    let element_name = kind.as_str().to_owned();
                    let Some((_, permutation)) = current.as_mut() else {
                        return Err(PermutationParseError::OrphanRole {
                            element: element_name,
                            position,
                        });
                    };
                    let role = name_attribute(&element, position)?.ok_or(
                        PermutationParseError::MissingRoleName {
                            element: element_name,
                            position,
                        },
                    )?;
                    permutation.expected_mut(kind).push(role);
                }
                Event::End(element)
                    if element.name().as_ref().eq_ignore_ascii_case(TESTCASE_ELEMENT) =>
                {
                    if let Some((name, permutation)) = current.take() {
                        table.entries.insert(name, permutation);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some((name, permutation)) = current {
            table.entries.insert(name, permutation);
        }
        Ok(table)
    }

    /// Sets the expected sequences for `test_case`.
    pub fn insert(&mut self, test_case: impl Into<String>, permutation: Permutation) {
        self.entries.insert(test_case.into(), permutation);
    }

    /// Returns the expected sequences for `test_case`, or `None` if it is unpermuted.
    pub fn get(&self, test_case: &str) -> Option<&Permutation> {
        self.entries.get(test_case)
    }

    /// Returns the number of permuted test cases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no test case is permuted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn role_kind(element: &BytesStart<'_>) -> Option<RoleKind> {
    let name = element.name();
    RoleKind::ALL
        .into_iter()
        .find(|kind| name.as_ref().eq_ignore_ascii_case(kind.as_str().as_bytes()))
}

fn name_attribute(
    element: &BytesStart<'_>,
    position: u64,
) -> Result<Option<String>, PermutationParseError> {
    let xml_error = |error: quick_xml::Error| PermutationParseError::Xml { position, error };
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|error| xml_error(error.into()))?;
        if attribute.key.as_ref() == NAME_ATTRIBUTE {
            let value = attribute.unescape_value().map_err(xml_error)?;
            return Ok(Some(value.trim().to_owned()));
        }
    }
    Ok(None)
}
