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

//! Journal validation.
//!
//! [`check`] walks a built [`Journal`] and reports every problem it finds.
//! Findings come out in a fixed order: missing includes first, then for each
//! transaction its balance and ordering findings followed by the findings
//! of each of its postings.
//!
//! # Example
//!
//! ```
//! use hledger_lint::{check, Config, DiagnosticKind, Journal};
//!
//! let journal = Journal::parse(
//!     "2024-01-01 Lunch\n    Expenses:Food  $10.00\n    Assets:Cash  $-9.00\n",
//!     &Config::default(),
//! );
//! let found = check(&journal, &Config::default().validations);
//! assert!(found.iter().any(|d| d.kind == DiagnosticKind::Unbalanced));
//! ```

use crate::account::strip_virtual;
use crate::base::{DocumentId, Span};
use crate::config::Validations;
use crate::journal::Journal;
use crate::posting::{Amount, Posting};
use crate::transaction::Transaction;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// The rule a [`Diagnostic`] comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    MissingInclude,
    Unbalanced,
    MultipleAutoBalance,
    DateOrder,
    UndeclaredAccount,
    UndeclaredCommodity,
    IncorrectSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Document the span points into.
    pub document: DocumentId,
    pub span: Span,
    pub message: String,
    pub severity: Severity,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    fn error(document: DocumentId, span: Span, kind: DiagnosticKind, message: String) -> Self {
        Self {
            document,
            span,
            message,
            severity: Severity::Error,
            kind,
        }
    }

    fn warning(document: DocumentId, span: Span, kind: DiagnosticKind, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(document, span, kind, message)
        }
    }
}

/// Runs every enabled rule over `journal`.
///
/// Missing includes, unbalanced transactions, multiple auto-balancing
/// postings and incorrect signatures are always reported; `validations`
/// switches the remaining rules.
pub fn check(journal: &Journal, validations: &Validations) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for document in journal.documents().iter() {
        let Some(site) = document.include_site.filter(|_| document.is_missing()) else {
            continue;
        };
        diagnostics.push(Diagnostic::error(
            site.document,
            site.span,
            DiagnosticKind::MissingInclude,
            format!("This file does not exist at {}", document.path.display()),
        ));
    }

    let mut previous: Option<&Transaction> = None;
    for transaction in journal.transactions() {
        check_balance(transaction, &mut diagnostics);

        let preceding = previous.filter(|p| p.document == transaction.document);
        if validations.ordered_dates {
            if let Some(preceding) = preceding {
                check_date_order(preceding, transaction, &mut diagnostics);
            }
        }
        previous = Some(transaction);

        for posting in transaction.postings.iter().filter(|p| p.matched) {
            check_posting(journal, transaction.document, posting, validations, &mut diagnostics);
        }
    }

    debug!(diagnostics = diagnostics.len(), "checked journal");
    diagnostics
}

fn check_balance(transaction: &Transaction, diagnostics: &mut Vec<Diagnostic>) {
    let Some(span) = transaction.postings_span() else {
        return;
    };

    if !transaction.is_balanced() {
        let residuals: String = transaction
            .residuals()
            .map(|(id, total)| format!(" {id}{total},"))
            .collect();
        diagnostics.push(Diagnostic::error(
            transaction.document,
            span,
            DiagnosticKind::Unbalanced,
            format!(
                "This transaction is unbalanced. The real postings' sum should be 0 but is:{residuals} Consider adjusting this entry's amounts, or adding missing postings."
            ),
        ));
    }

    if transaction.auto_balance_posting_count > 1 {
        diagnostics.push(Diagnostic::error(
            transaction.document,
            span,
            DiagnosticKind::MultipleAutoBalance,
            "Multiple auto balancing posts in are included in this transaction".to_string(),
        ));
    }
}

fn check_date_order(preceding: &Transaction, transaction: &Transaction, diagnostics: &mut Vec<Diagnostic>) {
    let (Some(before), Some(date)) = (preceding.date.value, transaction.date.value) else {
        return;
    };
    if date < before {
        diagnostics.push(Diagnostic::warning(
            transaction.document,
            transaction.date.span,
            DiagnosticKind::DateOrder,
            "This transaction is out of date order with the previous transaction. Consider moving this entry into date order, or adjusting its date.".to_string(),
        ));
    }
}

fn check_posting(
    journal: &Journal,
    document: DocumentId,
    posting: &Posting,
    validations: &Validations,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if validations.accounts {
        if let Some(account) = &posting.account {
            if !journal.accounts().is_declared(strip_virtual(&account.name)) {
                diagnostics.push(Diagnostic::warning(
                    document,
                    account.span,
                    DiagnosticKind::UndeclaredAccount,
                    format!(
                        "The account \"{}\" has not been declared. Consider adding an account directive.",
                        account.name
                    ),
                ));
            }
        }
    }

    let cost = posting.cost.as_ref().map(|cost| &cost.amount);
    let assertion = posting.assertion.as_ref().map(|assertion| &assertion.amount);
    let assertion_cost = posting
        .assertion
        .as_ref()
        .and_then(|assertion| assertion.cost.as_ref())
        .map(|cost| &cost.amount);

    if validations.commodities {
        for amount in [posting.amount.as_ref(), assertion, cost, assertion_cost].into_iter().flatten() {
            if !amount.commodity.declared && !amount.commodity_id.is_empty() {
                diagnostics.push(undeclared_commodity(document, amount));
            }
        }
    }

    for amount in posting.amounts() {
        if !amount.has_correct_signature {
            diagnostics.push(Diagnostic::error(
                document,
                amount.span,
                DiagnosticKind::IncorrectSignature,
                "The signature of this doesn't match the declared commodity".to_string(),
            ));
        }
    }
}

fn undeclared_commodity(document: DocumentId, amount: &Amount) -> Diagnostic {
    Diagnostic::warning(
        document,
        amount.commodity_span,
        DiagnosticKind::UndeclaredCommodity,
        format!(
            "The commodity \"{}\" has not been declared. Consider adding a commodity directive",
            amount.commodity_id
        ),
    )
}

/// Groups findings by the document they point into, keeping their order.
pub fn group_by_document(diagnostics: &[Diagnostic]) -> BTreeMap<DocumentId, Vec<&Diagnostic>> {
    let mut grouped: BTreeMap<DocumentId, Vec<&Diagnostic>> = BTreeMap::new();
    for diagnostic in diagnostics {
        grouped.entry(diagnostic.document).or_default().push(diagnostic);
    }
    grouped
}

/// Whether any finding is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}
