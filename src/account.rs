// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Account declarations.
//!
//! # Example
//!
//! ```
//! use hledger_lint::{AccountRegistry, DocumentId};
//!
//! let mut accounts = AccountRegistry::new();
//! accounts.declare("Assets:Bank:Checking", DocumentId::ROOT);
//! accounts.declare("Assets:Cash", DocumentId::ROOT);
//! assert!(accounts.is_declared("Assets:Cash"));
//! assert_eq!(accounts.completions("Assets:"), vec!["Bank:", "Cash"]);
//! ```

use crate::base::DocumentId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Separates the segments of an account name.
pub const SEGMENT_SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub name: String,
    /// Document holding the `account` directive.
    pub document: DocumentId,
}

/// Declared accounts of a journal, visible from every document.
#[derive(Debug, Clone, Default)]
pub struct AccountRegistry {
    accounts: BTreeMap<String, Account>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a declaration; redeclaring a name moves it to the later document.
    pub fn declare(&mut self, name: &str, document: DocumentId) {
        self.accounts.insert(
            name.to_string(),
            Account {
                name: name.to_string(),
                document,
            },
        );
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.accounts.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Account> {
        self.accounts.get(name)
    }

    /// All declared names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Next name segments below the group `prefix` belongs to.
    ///
    /// The group is `prefix` up to and including its last `:`. Segments that
    /// continue deeper keep their trailing `:`.
    pub fn completions(&self, prefix: &str) -> Vec<&str> {
        let group = match prefix.rfind(SEGMENT_SEPARATOR) {
            Some(index) => &prefix[..=index],
            None => "",
        };
        let mut segments: Vec<&str> = Vec::new();
        for name in self.names() {
            let Some(rest) = name.strip_prefix(group) else {
                continue;
            };
            let segment = match rest.find(SEGMENT_SEPARATOR) {
                Some(index) => &rest[..=index],
                None => rest,
            };
            if !segment.is_empty() && !segments.contains(&segment) {
                segments.push(segment);
            }
        }
        segments
    }
}

/// Strips the `(...)` or `[...]` wrapping of a virtual posting's account.
pub fn strip_virtual(name: &str) -> &str {
    let inner = name
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .or_else(|| name.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')));
    inner.unwrap_or(name)
}
