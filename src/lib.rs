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

//! # hledger-lint
//!
//! This library reads hledger plain-text journals, checks them for
//! accounting and consistency problems, and realigns their postings.
//!
//! ## Core Components
//!
//! - [`Journal`]: Model of a root document and everything it includes
//! - [`CommodityRegistry`]: Declared commodities and their numeral formats
//! - [`AccountRegistry`]: Declared accounts and name completion
//! - [`check`]: Validation rules producing [`Diagnostic`]s
//! - [`format_document`]: Column alignment producing [`TextEdit`]s
//! - [`Workspace`]: Publishes per-pass snapshots and drops stale passes
//!
//! ## Example
//!
//! ```
//! use hledger_lint::{Config, DiagnosticKind, DocumentId, Journal, apply_edits, check, format_document};
//!
//! let text = "\
//! account Expenses:Food
//! account Assets:Cash
//! commodity $1,000.00
//!
//! 2024-01-10 Market
//!     Expenses:Food  $12.00
//!     Assets:Cash  $-12.00
//!
//! 2024-01-05 Bakery
//!     Expenses:Food  $3.50
//!     Assets:Cash
//! ";
//! let config = Config::default();
//! let journal = Journal::parse(text, &config);
//!
//! let diagnostics = check(&journal, &config.validations);
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].kind, DiagnosticKind::DateOrder);
//!
//! let edits = format_document(&journal, DocumentId::ROOT, &config);
//! let formatted = apply_edits(text, &edits);
//! assert!(formatted.contains("    Assets:Cash    -$12.00\n"));
//! ```

pub mod account;
mod base;
pub mod check;
pub mod commodity;
pub mod config;
mod directive;
pub mod document;
pub mod error;
pub mod format;
mod journal;
mod number_format;
pub mod posting;
mod scanner;
pub mod transaction;
mod workspace;

pub use account::{Account, AccountRegistry};
pub use base::{DecimalMark, DocumentId, Span};
pub use check::{Diagnostic, DiagnosticKind, Severity, check, group_by_document, has_errors};
pub use commodity::{Commodity, CommodityRegistry, FormattedAmount, RenderOptions};
pub use config::{AlignmentMode, CommodityScope, Config, SLOT_COUNT, Validations};
pub use document::{Document, DocumentSet, FsLoader, IncludeSite, MemoryLoader, SourceLoader};
pub use error::{ConfigError, LoadError};
pub use format::{
    AlignmentProfile, TextEdit, apply_edits, format_document, format_journal, format_transaction,
    posting_components, render_line,
};
pub use journal::Journal;
pub use number_format::NumberFormat;
pub use posting::{Amount, Contribution, Posting};
pub use transaction::{Status, Transaction};
pub use workspace::{Generation, Snapshot, Workspace};
