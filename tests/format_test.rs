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

//! Formatter integration tests.

use hledger_lint::{
    AlignmentMode, Config, DocumentId, Journal, MemoryLoader, SLOT_COUNT, apply_edits, format_document,
    format_journal,
};

fn format_root(text: &str, config: &Config) -> String {
    let journal = Journal::parse(text, config);
    apply_edits(text, &format_document(&journal, DocumentId::ROOT, config))
}

fn global_columns(first: usize) -> [usize; SLOT_COUNT] {
    let mut columns = [0; SLOT_COUNT];
    columns[0] = first;
    for slot in 1..SLOT_COUNT {
        columns[slot] = first + 3 * slot;
    }
    columns
}

#[test]
fn reformats_amounts_with_declared_precision() {
    let config = Config {
        format_amounts: true,
        ..Config::default()
    };
    let text = "commodity $1,000.00\n\n2024-01-01 x\n  a  $1234.5\n  b  $-1234.5\n";
    assert_eq!(
        format_root(text, &config),
        "commodity $1,000.00\n\n2024-01-01 x\n    a   $1,234.50\n    b  -$1,234.50\n"
    );
}

#[test]
fn sign_after_commodity() {
    let config = Config {
        negatives_in_front_of_commodities: false,
        ..Config::default()
    };
    let text = "2024-01-01 x\n  a  $5\n  b  -$5\n";
    assert_eq!(format_root(text, &config), "2024-01-01 x\n    a   $5\n    b  $-5\n");
}

#[test]
fn global_alignment_uses_fixed_columns() {
    let config = Config {
        alignment: AlignmentMode::Global,
        global_alignments: global_columns(40),
        ..Config::default()
    };
    let text = "2024-01-01 x\n  a  $5.00\n  b\n";
    let formatted = format_root(text, &config);
    let expected = format!("2024-01-01 x\n    a{}$5.00\n    b\n", " ".repeat(33));
    assert_eq!(formatted, expected);
    assert_eq!(formatted.lines().nth(1).map(str::len), Some(43));
}

#[test]
fn both_mode_floors_transaction_widths() {
    let config = Config {
        alignment: AlignmentMode::Both,
        global_alignments: global_columns(20),
        ..Config::default()
    };
    let text = "2024-01-01 x\n  a  $5.00\n  b\n";
    let expected = format!("2024-01-01 x\n    a{}$5.00\n    b\n", " ".repeat(13));
    assert_eq!(format_root(text, &config), expected);

    let wide = "2024-01-01 x\n  Expenses:Household:Repairs  $5.00\n  b\n";
    assert!(format_root(wide, &config).contains("\n    Expenses:Household:Repairs   $5.00\n"));
}

#[test]
fn only_changed_documents_get_edits() {
    let loader = MemoryLoader::new().with("/j/child.journal", "2024-01-01 x\n  a  1\n  b\n");
    let config = Config::default();
    let journal = Journal::load("/j/main.journal", "include child.journal\n", &loader, &config);

    let edits = format_journal(&journal, &config);
    let child = journal.documents().find("/j/child.journal").unwrap();
    assert_eq!(edits.keys().copied().collect::<Vec<_>>(), vec![child.id]);
    assert_eq!(apply_edits(child.text(), &edits[&child.id]), "2024-01-01 x\n    a   1\n    b\n");
}

#[test]
fn formatting_is_idempotent() {
    let text = "2024-01-01 * x  ; header\n    ; note\n  Assets:Broker  10 AAPL @@ $1,500.00 = 20 AAPL  ; buy\n  Assets:Cash  $-1,500.00\n\n\n\n2024-01-02 y\n  (Budget:Food)  -25 EUR == -100 EUR\n  [Assets:Cash]\n";
    for alignment in [AlignmentMode::Transaction, AlignmentMode::Both, AlignmentMode::Global] {
        let config = Config {
            alignment,
            global_alignments: global_columns(30),
            format_amounts: true,
            ..Config::default()
        };
        let once = format_root(text, &config);
        let twice = format_root(&once, &config);
        assert_eq!(once, twice, "{alignment:?}");
        assert!(!once.contains("\n\n\n"));
    }
}
