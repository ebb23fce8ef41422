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

use clap::{Parser, Subcommand, ValueEnum};
use csv::Writer;
use hledger_lint::{
    Config, Diagnostic, FsLoader, Journal, Severity, apply_edits, check, format_document, format_journal,
    has_errors,
};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

/// hledger journal linter
///
/// Checks journals for unbalanced transactions, undeclared accounts and
/// commodities, and misaligned postings.
#[derive(Parser, Debug)]
#[command(name = "hledger-lint")]
#[command(about = "Checks and aligns hledger journals", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report problems in a journal and the files it includes
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = Output::Text)]
        output: Output,
    },
    /// Align postings and collapse blank lines
    Format {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Rewrite every changed file in place instead of printing the root
        #[arg(long)]
        write: bool,
    },
    /// List declared accounts
    Accounts {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only list the next name segments below this prefix
        #[arg(long)]
        prefix: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Output {
    Text,
    Json,
    Csv,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let result = match &args.command {
        Command::Check { file, output } => run_check(file, *output, &config),
        Command::Format { file, write } => run_format(file, *write, &config),
        Command::Accounts { file, prefix } => run_accounts(file, prefix.as_deref(), &config),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn load(file: &Path, config: &Config) -> io::Result<Journal> {
    let text = fs::read_to_string(file)?;
    Ok(Journal::load(file, text, &FsLoader, config))
}

/// One diagnostic, positioned for humans.
#[derive(Debug, Serialize)]
struct Row<'a> {
    file: String,
    line: usize,
    column: usize,
    start: usize,
    end: usize,
    severity: Severity,
    message: &'a str,
}

fn rows<'a>(journal: &Journal, diagnostics: &'a [Diagnostic]) -> Vec<Row<'a>> {
    diagnostics
        .iter()
        .filter_map(|diagnostic| {
            let document = journal.document(diagnostic.document)?;
            let (line, column) = document.line_col(diagnostic.span.start);
            Some(Row {
                file: document.path.display().to_string(),
                line: line + 1,
                column: column + 1,
                start: diagnostic.span.start,
                end: diagnostic.span.end,
                severity: diagnostic.severity,
                message: &diagnostic.message,
            })
        })
        .collect()
}

/// Returns `Ok(false)` when an error-severity diagnostic was found.
fn run_check(file: &Path, output: Output, config: &Config) -> Result<bool, Box<dyn std::error::Error>> {
    let journal = load(file, config)?;
    let diagnostics = check(&journal, &config.validations);
    let rows = rows(&journal, &diagnostics);
    let stdout = io::stdout();

    match output {
        Output::Text => {
            let mut out = stdout.lock();
            for row in &rows {
                writeln!(out, "{}:{}:{}: {}: {}", row.file, row.line, row.column, row.severity, row.message)?;
            }
        }
        Output::Json => {
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, &rows)?;
            writeln!(out)?;
        }
        Output::Csv => {
            let mut writer = Writer::from_writer(stdout.lock());
            for row in &rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
    }

    Ok(!has_errors(&diagnostics))
}

fn run_format(file: &Path, write: bool, config: &Config) -> Result<bool, Box<dyn std::error::Error>> {
    let journal = load(file, config)?;

    if !write {
        let Some(root) = journal.documents().root() else {
            return Ok(true);
        };
        let edits = format_document(&journal, root.id, config);
        print!("{}", apply_edits(root.text(), &edits));
        return Ok(true);
    }

    for (id, edits) in format_journal(&journal, config) {
        let Some(document) = journal.document(id) else {
            continue;
        };
        fs::write(&document.path, apply_edits(document.text(), &edits))?;
        eprintln!("formatted {} ({} edits)", document.path.display(), edits.len());
    }
    Ok(true)
}

fn run_accounts(file: &Path, prefix: Option<&str>, config: &Config) -> Result<bool, Box<dyn std::error::Error>> {
    let journal = load(file, config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match prefix {
        Some(prefix) => {
            for segment in journal.accounts().completions(prefix) {
                writeln!(out, "{}", segment)?;
            }
        }
        None => {
            for name in journal.accounts().names() {
                writeln!(out, "{}", name)?;
            }
        }
    }
    Ok(true)
}
