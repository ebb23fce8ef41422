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

//! Validation passes over changing journals.
//!
//! Every edit to a journal starts a new pass. A pass builds a fresh
//! [`Journal`], checks it, and publishes the result as an immutable
//! [`Snapshot`]. Starting a pass makes every earlier pass for the same root
//! stale; a stale pass may still finish, but its results are dropped whole.
//!
//! # Example
//!
//! ```
//! use hledger_lint::{Config, MemoryLoader, Workspace};
//!
//! let workspace = Workspace::new();
//! let snapshot = workspace
//!     .run("/books/main.journal", "2024-01-01 x\n  a  1\n  b\n", &MemoryLoader::new(), &Config::default())
//!     .unwrap();
//! assert_eq!(snapshot.journal.transactions().len(), 1);
//! ```

use crate::check::{Diagnostic, check};
use crate::config::Config;
use crate::document::{SourceLoader, normalize};
use crate::journal::Journal;
use dashmap::DashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Identifies a pass; later passes have larger generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The published outcome of one pass.
#[derive(Debug)]
pub struct Snapshot {
    pub generation: Generation,
    pub journal: Journal,
    pub diagnostics: Vec<Diagnostic>,
}

/// Latest published snapshot per journal root.
///
/// # Invariants
///
/// - Only the newest pass started for a root can publish.
/// - A published snapshot is never replaced by an older one.
#[derive(Debug, Default)]
pub struct Workspace {
    snapshots: DashMap<PathBuf, Arc<Snapshot>>,
    /// Newest generation started per root.
    started: DashMap<PathBuf, Generation>,
    next_generation: AtomicU64,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a pass for `root`, making earlier passes stale.
    pub fn begin(&self, root: impl AsRef<Path>) -> Generation {
        // Allocating under the entry lock keeps generations per root increasing.
        let mut newest = self.started.entry(normalize(root.as_ref())).or_insert(Generation(0));
        let generation = Generation(self.next_generation.fetch_add(1, Ordering::SeqCst) + 1);
        *newest = generation;
        generation
    }

    /// Whether `generation` is still the newest pass for `root`.
    pub fn is_current(&self, root: impl AsRef<Path>, generation: Generation) -> bool {
        self.started
            .get(&normalize(root.as_ref()))
            .is_some_and(|started| *started == generation)
    }

    /// Publishes the results of a pass. Returns `false`, dropping the
    /// results, when a newer pass has started since.
    pub fn publish(
        &self,
        root: impl AsRef<Path>,
        generation: Generation,
        journal: Journal,
        diagnostics: Vec<Diagnostic>,
    ) -> bool {
        let root = normalize(root.as_ref());
        // Holding the entry keeps `begin` for this root out until the
        // snapshot is installed.
        let Some(started) = self.started.get(&root) else {
            return false;
        };
        if *started != generation {
            debug!(%generation, newest = %*started, "discarding stale pass");
            return false;
        }
        let snapshot = Arc::new(Snapshot {
            generation,
            journal,
            diagnostics,
        });
        self.snapshots.insert(root, snapshot);
        true
    }

    /// Builds, checks and publishes a journal in one pass. Returns the
    /// snapshot if it was published.
    pub fn run<L>(
        &self,
        root: impl AsRef<Path>,
        text: impl Into<String>,
        loader: &L,
        config: &Config,
    ) -> Option<Arc<Snapshot>>
    where
        L: SourceLoader + ?Sized,
    {
        let root = root.as_ref();
        let generation = self.begin(root);
        let journal = Journal::load(root, text, loader, config);
        let diagnostics = check(&journal, &config.validations);
        if self.publish(root, generation, journal, diagnostics) {
            self.latest(root)
        } else {
            None
        }
    }

    pub fn latest(&self, root: impl AsRef<Path>) -> Option<Arc<Snapshot>> {
        self.snapshots
            .get(&normalize(root.as_ref()))
            .map(|snapshot| Arc::clone(&snapshot))
    }

    /// Drops everything known about `root`.
    pub fn forget(&self, root: impl AsRef<Path>) {
        let root = normalize(root.as_ref());
        self.started.remove(&root);
        self.snapshots.remove(&root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_increase() {
        let workspace = Workspace::new();
        let first = workspace.begin("/a.journal");
        let second = workspace.begin("/b.journal");
        assert!(second > first);
        assert!(workspace.is_current("/a.journal", first));
    }

    #[test]
    fn stale_pass_is_discarded() {
        let workspace = Workspace::new();
        let config = Config::default();
        let old = workspace.begin("/a.journal");
        let new = workspace.begin("/a.journal");
        assert!(!workspace.is_current("/a.journal", old));

        let journal = Journal::parse("", &config);
        assert!(!workspace.publish("/a.journal", old, journal.clone(), Vec::new()));
        assert!(workspace.latest("/a.journal").is_none());

        assert!(workspace.publish("/a.journal", new, journal, Vec::new()));
        assert_eq!(workspace.latest("/a.journal").unwrap().generation, new);
    }

    #[test]
    fn forget_drops_snapshot() {
        let workspace = Workspace::new();
        let loader = crate::document::MemoryLoader::new();
        assert!(workspace.run("/a.journal", "", &loader, &Config::default()).is_some());
        workspace.forget("/a.journal");
        assert!(workspace.latest("/a.journal").is_none());
    }
}
