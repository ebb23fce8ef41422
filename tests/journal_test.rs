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

//! Journal model integration tests.

use hledger_lint::{
    CommodityScope, Config, DecimalMark, DocumentId, FsLoader, Journal, LoadError, MemoryLoader, Status,
};
use rust_decimal_macros::dec;
use std::fs;
use std::path::Path;

fn root_with_includes() -> (&'static str, MemoryLoader) {
    let root = "include accounts.journal\ninclude 2024/january.journal\n";
    let loader = MemoryLoader::new()
        .with(
            "/books/accounts.journal",
            "account Assets:Checking\naccount Expenses:Food\ncommodity $1,000.00\n",
        )
        .with(
            "/books/2024/january.journal",
            "2024-01-03 * Market\n    Expenses:Food  $25.00\n    Assets:Checking\n",
        );
    (root, loader)
}

#[test]
fn includes_are_loaded_relative_to_including_file() {
    let (root, loader) = root_with_includes();
    let journal = Journal::load("/books/main.journal", root, &loader, &Config::default());

    assert_eq!(journal.documents().len(), 3);
    assert_eq!(journal.documents().passes(), 2);
    assert!(journal.documents().find("/books/2024/january.journal").is_some());
    assert!(journal.accounts().is_declared("Expenses:Food"));

    let transaction = &journal.transactions()[0];
    assert_eq!(transaction.status, Status::Cleared);
    assert_eq!(transaction.description, "Market");
    assert_eq!(
        transaction.document,
        journal.documents().find("/books/2024/january.journal").unwrap().id
    );
}

#[test]
fn journal_scope_shares_declarations_across_documents() {
    let (root, loader) = root_with_includes();
    let config = Config {
        commodity_scope: CommodityScope::Journal,
        ..Config::default()
    };
    let journal = Journal::load("/books/main.journal", root, &loader, &config);
    let amount = journal.transactions()[0].postings[0].amount.as_ref().unwrap();
    assert!(amount.commodity.declared);
    assert_eq!(amount.quantity, dec!(25.00));
}

#[test]
fn cyclic_includes_terminate() {
    let loader = MemoryLoader::new()
        .with("/j/a.journal", "include b.journal\n")
        .with("/j/b.journal", "include a.journal\ninclude ../j/main.journal\n");
    let journal = Journal::load("/j/main.journal", "include a.journal\n", &loader, &Config::default());

    assert_eq!(journal.documents().len(), 3);
    assert!(journal.documents().iter().all(|document| !document.is_missing()));
}

#[test]
fn missing_include_is_a_placeholder() {
    let journal = Journal::parse("include nowhere.journal\n", &Config::default());
    let missing = journal.document(DocumentId(1)).unwrap();
    assert!(missing.is_missing());
    assert_eq!(missing.text(), "");
    assert!(matches!(missing.load_error, Some(LoadError::NotFound(_))));
    let site = missing.include_site.unwrap();
    assert_eq!(site.document, DocumentId::ROOT);
    assert_eq!(&"include nowhere.journal\n"[site.span.range()], "nowhere.journal");
}

#[test]
fn filesystem_includes() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("main.journal");
    fs::write(dir.path().join("prices.journal"), "commodity 1.000,00 EUR\n").unwrap();
    let text = "include prices.journal\ninclude absent.journal\n\n2024-02-01 x\n  a  3,50 EUR\n  b\n";
    fs::write(&root, text).unwrap();

    let config = Config {
        commodity_scope: CommodityScope::Journal,
        ..Config::default()
    };
    let journal = Journal::load(&root, fs::read_to_string(&root).unwrap(), &FsLoader, &config);

    assert_eq!(journal.documents().len(), 3);
    let prices = journal.documents().find(dir.path().join("prices.journal")).unwrap();
    assert!(!prices.is_missing());
    let absent = journal.documents().find(dir.path().join("absent.journal")).unwrap();
    assert!(matches!(&absent.load_error, Some(LoadError::NotFound(path)) if path.ends_with(Path::new("absent.journal"))));

    let amount = journal.transactions()[0].postings[0].amount.as_ref().unwrap();
    assert_eq!(amount.quantity, dec!(3.50));
    assert_eq!(amount.commodity.format.decimal_mark, Some(DecimalMark::Comma));
}

#[test]
fn closure_loader() {
    let loader = |path: &Path| -> Result<String, LoadError> {
        if path.ends_with("extra.journal") {
            Ok("account Income:Salary\n".to_string())
        } else {
            Err(LoadError::NotFound(path.to_path_buf()))
        }
    };
    let journal = Journal::load("/x/main.journal", "include extra.journal\n", &loader, &Config::default());
    assert!(journal.accounts().is_declared("Income:Salary"));
}

#[test]
fn account_completions() {
    let text = "account Assets:Checking\naccount Assets:Savings\naccount Assets:Broker:Cash\naccount Expenses:Food\n";
    let journal = Journal::parse(text, &Config::default());

    assert_eq!(journal.accounts().completions(""), vec!["Assets:", "Expenses:"]);
    assert_eq!(
        journal.accounts().completions("Assets:S"),
        vec!["Broker:", "Checking", "Savings"]
    );
}

#[test]
fn unparsable_lines_are_kept_inert() {
    let text = "2024-01-01 x\n    a  $1 junk junk\n    b  $-1\n";
    let journal = Journal::parse(text, &Config::default());
    let transaction = &journal.transactions()[0];
    assert_eq!(transaction.postings.len(), 2);
    assert!(!transaction.postings[0].matched);
    assert!(transaction.postings[1].matched);
}
