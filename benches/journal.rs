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

//! Benchmarks for building, checking and formatting journals.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Model building over journals of growing size
//! - Validation of a built journal
//! - Formatting in each alignment mode
//! - Concurrent passes through a shared workspace

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hledger_lint::{
    AlignmentMode, Config, DocumentId, Journal, MemoryLoader, Validations, Workspace, check, format_document,
};
use std::sync::Arc;
use std::thread;

// =============================================================================
// Helper Functions
// =============================================================================

const ACCOUNTS: [&str; 4] = ["Expenses:Food", "Expenses:Rent", "Assets:Checking", "Income:Salary"];

/// A journal with declarations followed by `count` three-posting transactions.
fn generate_journal(count: usize) -> String {
    let mut text = String::from("commodity $1,000.00\ncommodity 1.000,00 EUR\n");
    for account in ACCOUNTS {
        text.push_str(&format!("account {account}\n"));
    }
    text.push('\n');

    for i in 0..count {
        let day = i % 28 + 1;
        let cents = (i * 137) % 100_000;
        text.push_str(&format!(
            "2024-01-{day:02} * Transaction {i}  ; generated\n  {}  ${}.{:02}\n  {}  {},{:02} EUR @ $1.10\n  {}\n\n",
            ACCOUNTS[i % 4],
            cents / 100,
            cents % 100,
            ACCOUNTS[(i + 1) % 4],
            cents / 100,
            cents % 100,
            ACCOUNTS[(i + 2) % 4],
        ));
    }
    text
}

// =============================================================================
// Model Benchmarks
// =============================================================================

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_journal");
    let config = Config::default();

    for count in [100, 1_000, 10_000].iter() {
        let text = generate_journal(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &text, |b, text| {
            b.iter(|| black_box(Journal::parse(text.as_str(), &config)))
        });
    }
    group.finish();
}

fn bench_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_journal");
    let config = Config::default();

    for count in [100, 1_000, 10_000].iter() {
        let journal = Journal::parse(generate_journal(*count), &config);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &journal, |b, journal| {
            b.iter(|| black_box(check(journal, &Validations::default())))
        });
    }
    group.finish();
}

// =============================================================================
// Formatter Benchmarks
// =============================================================================

fn bench_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("format_document");
    let text = generate_journal(1_000);

    for mode in [AlignmentMode::Transaction, AlignmentMode::Global, AlignmentMode::Both] {
        let config = Config {
            alignment: mode,
            global_alignments: [40, 43, 46, 49, 52, 55, 58, 61, 64],
            ..Config::default()
        };
        let journal = Journal::parse(text.as_str(), &config);
        group.bench_function(format!("{mode:?}").to_lowercase(), |b| {
            b.iter(|| black_box(format_document(&journal, DocumentId::ROOT, &config)))
        });
    }
    group.finish();
}

// =============================================================================
// Workspace Benchmarks
// =============================================================================

fn bench_concurrent_passes(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_passes");
    let text = Arc::new(generate_journal(200));

    for threads in [1, 4, 8].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(threads), threads, |b, &threads| {
            b.iter(|| {
                let workspace = Arc::new(Workspace::new());
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let workspace = Arc::clone(&workspace);
                        let text = Arc::clone(&text);
                        thread::spawn(move || {
                            let config = Config::default();
                            workspace.run("/bench/main.journal", text.as_str(), &MemoryLoader::new(), &config);
                        })
                    })
                    .collect();
                for handle in handles {
                    let _ = handle.join();
                }
                black_box(workspace.latest("/bench/main.journal"));
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_check, bench_format, bench_concurrent_passes);
criterion_main!(benches);
