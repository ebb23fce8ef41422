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

//! Documents and include resolution.
//!
//! A journal is a root document plus everything reachable from it through
//! `include` directives. Resolution proceeds in passes: each pass scans the
//! documents known when it started and loads any target not seen before, so
//! includes discovered in pass N are followed in pass N+1. Resolution stops
//! at the first pass that adds nothing, which makes cyclic includes safe.
//!
//! # Example
//!
//! ```
//! use hledger_lint::{DocumentSet, MemoryLoader};
//!
//! let loader = MemoryLoader::new().with("/books/accounts.journal", "account Assets:Cash\n");
//! let documents = DocumentSet::resolve(
//!     "/books/main.journal",
//!     "include accounts.journal\ninclude missing.journal\n",
//!     &loader,
//! );
//! assert_eq!(documents.len(), 3);
//! assert!(documents.iter().any(|doc| doc.is_missing()));
//! ```

use crate::base::{DecimalMark, DocumentId, Span};
use crate::directive::{self, INCLUDE_PREFIX_LEN};
use crate::error::LoadError;
use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace, warn};

/// Provides the text of included files.
pub trait SourceLoader {
    /// # Errors
    ///
    /// - [`LoadError::NotFound`] - Nothing exists at `path`.
    /// - [`LoadError::Unreadable`] - `path` exists but is not readable text.
    fn load(&self, path: &Path) -> Result<String, LoadError>;
}

impl<F> SourceLoader for F
where
    F: Fn(&Path) -> Result<String, LoadError>,
{
    fn load(&self, path: &Path) -> Result<String, LoadError> {
        self(path)
    }
}

/// Reads includes from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> Result<String, LoadError> {
        std::fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Unreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })
    }
}

/// Serves includes from a map of paths to text.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.files.insert(normalize(path.as_ref()), text.into());
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &Path) -> Result<String, LoadError> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| LoadError::NotFound(path.to_path_buf()))
    }
}

/// Where a document was included from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncludeSite {
    pub document: DocumentId,
    /// The directive's path argument, without the `include ` keyword.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub path: PathBuf,
    /// `None` when the include target could not be loaded.
    pub text: Option<String>,
    /// `None` for the root document.
    pub include_site: Option<IncludeSite>,
    pub load_error: Option<LoadError>,
    /// Set by the document's first `decimal-mark` directive.
    pub default_decimal_mark: Option<DecimalMark>,
}

impl Document {
    pub fn is_missing(&self) -> bool {
        self.text.is_none()
    }

    /// The document's text, empty for a missing document.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// Zero-based line and character column of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let text = self.text();
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &text[..offset];
        let line = before.matches('\n').count();
        let line_start = before.rfind('\n').map_or(0, |index| index + 1);
        (line, before[line_start..].chars().count())
    }
}

/// Every document reachable from a root, indexed by [`DocumentId`].
#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    documents: Vec<Document>,
    by_path: HashMap<PathBuf, DocumentId>,
    passes: usize,
}

impl DocumentSet {
    /// Loads everything `root` includes, directly or transitively.
    ///
    /// Targets that fail to load become placeholder documents without text;
    /// resolution itself never fails.
    pub fn resolve<L>(root: impl AsRef<Path>, text: impl Into<String>, loader: &L) -> Self
    where
        L: SourceLoader + ?Sized,
    {
        let mut set = Self::default();
        set.push(normalize(root.as_ref()), Ok(text.into()), None);

        loop {
            set.passes += 1;
            let known = set.documents.len();
            let mut added = 0;
            for index in 0..known {
                added += set.follow_includes(DocumentId(index), loader);
            }
            trace!(pass = set.passes, added, "include pass finished");
            if added == 0 {
                break;
            }
        }

        for document in &mut set.documents {
            document.default_decimal_mark =
                document.text.as_deref().and_then(directive::decimal_mark);
        }

        debug!(
            documents = set.documents.len(),
            passes = set.passes,
            "resolved includes"
        );
        set
    }

    /// Loads the unseen include targets of one document, returning how many
    /// documents were added.
    fn follow_includes<L>(&mut self, id: DocumentId, loader: &L) -> usize
    where
        L: SourceLoader + ?Sized,
    {
        let document = &self.documents[id.0];
        let Some(text) = document.text.as_deref() else {
            return 0;
        };
        let base = document.path.parent().map(Path::to_path_buf).unwrap_or_default();
        let includes = directive::includes(text);

        let mut added = 0;
        for include in includes {
            let target = normalize(&base.join(&include.path));
            if self.by_path.contains_key(&target) {
                continue;
            }
            trace!(from = %id, path = %target.display(), "loading include");
            let loaded = loader.load(&target);
            if let Err(e) = &loaded {
                warn!(error = %e, "include target could not be loaded");
            }
            let site = IncludeSite {
                document: id,
                span: Span::new(
                    (include.span.start + INCLUDE_PREFIX_LEN).min(include.span.end),
                    include.span.end,
                ),
            };
            self.push(target, loaded, Some(site));
            added += 1;
        }
        added
    }

    fn push(
        &mut self,
        path: PathBuf,
        loaded: Result<String, LoadError>,
        include_site: Option<IncludeSite>,
    ) -> DocumentId {
        let id = DocumentId(self.documents.len());
        let (text, load_error) = match loaded {
            Ok(text) => (Some(text), None),
            Err(e) => (None, Some(e)),
        };
        self.by_path.insert(path.clone(), id);
        self.documents.push(Document {
            id,
            path,
            text,
            include_site,
            load_error,
            default_decimal_mark: None,
        });
        id
    }

    pub fn root(&self) -> Option<&Document> {
        self.documents.first()
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id.0)
    }

    /// Looks a document up by path, relative paths taken as written.
    pub fn find(&self, path: impl AsRef<Path>) -> Option<&Document> {
        let id = self.by_path.get(&normalize(path.as_ref()))?;
        self.get(*id)
    }

    /// Documents in discovery order, root first.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of include passes resolution took, including the final pass
    /// that found nothing new.
    pub fn passes(&self) -> usize {
        self.passes
    }
}

/// Resolves `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let climbing = matches!(normalized.components().next_back(), Some(Component::ParentDir));
                if climbing || !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}
