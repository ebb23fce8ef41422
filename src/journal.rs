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

//! The journal model.
//!
//! Building a journal resolves includes, collects declarations from every
//! document, then parses transactions against those declarations. The
//! result is immutable: a changed document means building a new journal.
//!
//! # Example
//!
//! ```
//! use hledger_lint::{Config, Journal};
//!
//! let journal = Journal::parse(
//!     "account Assets:Cash\n\n2024-01-05 Coffee\n    Expenses:Coffee  $3.50\n    Assets:Cash\n",
//!     &Config::default(),
//! );
//! assert_eq!(journal.transactions().len(), 1);
//! assert!(journal.accounts().is_declared("Assets:Cash"));
//! ```

use crate::account::AccountRegistry;
use crate::base::DocumentId;
use crate::commodity::CommodityRegistry;
use crate::config::Config;
use crate::directive::{self, CommodityDirectiveKind};
use crate::document::{Document, DocumentSet, MemoryLoader, SourceLoader};
use crate::posting::AmountContext;
use crate::transaction::{self, Transaction};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Journal {
    documents: DocumentSet,
    commodities: CommodityRegistry,
    accounts: AccountRegistry,
    transactions: Vec<Transaction>,
}

impl Journal {
    /// Builds the journal rooted at `root`, loading includes with `loader`.
    pub fn load<L>(root: impl AsRef<Path>, text: impl Into<String>, loader: &L, config: &Config) -> Self
    where
        L: SourceLoader + ?Sized,
    {
        Self::from_documents(DocumentSet::resolve(root, text, loader), config)
    }

    /// Builds a journal from a single text; any include it has is missing.
    pub fn parse(text: impl Into<String>, config: &Config) -> Self {
        Self::load("", text, &MemoryLoader::new(), config)
    }

    /// Builds the model over already resolved documents.
    pub fn from_documents(documents: DocumentSet, config: &Config) -> Self {
        let mut commodities = CommodityRegistry::new(config.commodity_scope);
        let mut accounts = AccountRegistry::new();

        for document in documents.iter() {
            let Some(text) = document.text.as_deref() else {
                continue;
            };
            for declaration in directive::commodities(text) {
                match declaration.kind {
                    CommodityDirectiveKind::Commodity => commodities.declare(
                        &declaration.leading_unit,
                        &declaration.trailing_unit,
                        &declaration.sample,
                        document.id,
                        document.default_decimal_mark,
                    ),
                    CommodityDirectiveKind::Default => commodities.declare_default(
                        &declaration.sample,
                        document.id,
                        document.default_decimal_mark,
                    ),
                };
            }
            for declaration in directive::accounts(text) {
                accounts.declare(&declaration.name, document.id);
            }
        }

        let mut transactions = Vec::new();
        for document in documents.iter() {
            let Some(text) = document.text.as_deref() else {
                continue;
            };
            let context = AmountContext {
                commodities: &commodities,
                document: document.id,
                default_mark: document.default_decimal_mark,
            };
            transactions.extend(transaction::parse_document(text, &context));
        }

        debug!(
            documents = documents.len(),
            commodities = commodities.len(),
            accounts = accounts.len(),
            transactions = transactions.len(),
            "built journal"
        );

        Self {
            documents,
            commodities,
            accounts,
            transactions,
        }
    }

    pub fn documents(&self) -> &DocumentSet {
        &self.documents
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn commodities(&self) -> &CommodityRegistry {
        &self.commodities
    }

    pub fn accounts(&self) -> &AccountRegistry {
        &self.accounts
    }

    /// All transactions, grouped by document in discovery order and in text
    /// order within a document.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn transactions_in(&self, document: DocumentId) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(move |transaction| transaction.document == document)
    }
}
