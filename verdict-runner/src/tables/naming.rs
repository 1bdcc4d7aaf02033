// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::read_table;
use crate::{
    errors::{NamingParseError, TableLoadError},
    extract::RoleKind,
};
use camino::Utf8Path;
use std::collections::HashMap;
use tracing::debug;

const FIELD_SEPARATOR: char = '!';
const COMMENT_PREFIX: char = '#';

/// Display names for agents, per role kind.
///
/// The on-disk format has one agent per line:
///
/// ```text
/// # agent!ap-name!sta-name
/// agent1!AP-1!STA-1
/// agent2!AP-2
/// agent3!!STA-3
/// ```
///
/// An empty or missing name means the agent has no alias for that kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamingTable {
    ap: HashMap<String, String>,
    sta: HashMap<String, String>,
}

impl NamingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a table from `path`.
    pub fn from_path(path: &Utf8Path) -> Result<Self, TableLoadError> {
        let contents = read_table(path)?;
        let table = Self::parse(&contents).map_err(|error| TableLoadError::Naming {
            path: path.to_owned(),
            error,
        })?;
        debug!(
            "loaded naming table from {path}: {} ap, {} sta aliases",
            table.ap.len(),
            table.sta.len()
        );
        Ok(table)
    }

    /// Parses a table from its textual form.
    pub fn parse(contents: &str) -> Result<Self, NamingParseError> {
        let mut table = Self::new();
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
                continue;
            }

            let mut fields = line.split(FIELD_SEPARATOR).map(str::trim);
            let agent = fields.next().unwrap_or_default();
            let ap_name = fields.next();
            if agent.is_empty() || ap_name.is_none() {
                return Err(NamingParseError::new(index + 1, line));
            }
            let sta_name = fields.next();

            for (kind, name) in [(RoleKind::Ap, ap_name), (RoleKind::Sta, sta_name)] {
                if let Some(name) = name.filter(|name| !name.is_empty()) {
                    table.insert(kind, agent, name);
                }
            }
        }
        Ok(table)
    }

    /// Adds an alias for `agent` in the `kind` role. A later alias replaces an earlier one.
    pub fn insert(&mut self, kind: RoleKind, agent: impl Into<String>, name: impl Into<String>) {
        self.map_mut(kind).insert(agent.into(), name.into());
    }

    /// Returns the display name of `agent` in the `kind` role, or `agent` itself if it has none.
    pub fn alias<'a>(&'a self, kind: RoleKind, agent: &'a str) -> &'a str {
        self.map(kind).get(agent).map_or(agent, String::as_str)
    }

    fn map(&self, kind: RoleKind) -> &HashMap<String, String> {
        match kind {
            RoleKind::Ap => &self.ap,
            RoleKind::Sta => &self.sta,
        }
    }

    fn map_mut(&mut self, kind: RoleKind) -> &mut HashMap<String, String> {
        match kind {
            RoleKind::Ap => &mut self.ap,
            RoleKind::Sta => &mut self.sta,
        }
    }
}
