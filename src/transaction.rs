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

//! Transaction blocks.
//!
//! A transaction is a header line starting with a date, followed by the
//! indented lines below it:
//!
//! ```text
//! 2024-03-01 * (1042) Grocery store  ; weekly
//!     ; receipt in the shoebox
//!     Expenses:Food      $42.10
//!     Assets:Checking
//! ```
//!
//! Comment lines directly under the header belong to the transaction; every
//! line after the first non-comment line is a posting.

use crate::base::{DocumentId, Span};
use crate::posting::{self, AmountContext, Contribution, Posting};
use crate::scanner::{Cursor, Line, is_blank_char, lines};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Unmarked,
    /// `!`
    Pending,
    /// `*`
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDate {
    pub text: String,
    pub span: Span,
    /// `None` when the date has no year or names no calendar day.
    pub value: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub document: DocumentId,
    /// Offset of the header line.
    pub offset: usize,
    pub date: TransactionDate,
    pub status: Status,
    pub code: Option<String>,
    pub description: String,
    /// Comment on the header line, including its `;`.
    pub comment: Option<String>,
    /// Comment lines between the header and the first posting.
    pub comment_lines: Vec<Span>,
    pub postings: Vec<Posting>,
    /// Per-commodity sum of balance contributions, in first-seen order. A sum
    /// that does not fit a `Decimal` is pinned to `Decimal::MAX` or `Decimal::MIN`.
    pub commodity_totals: Vec<(String, Decimal)>,
    /// Sum of the absolute values of `commodity_totals`, saturating at
    /// `Decimal::MAX`.
    pub total_absolute_magnitude: Decimal,
    pub auto_balance_posting_count: usize,
}

impl Transaction {
    /// Balanced when an auto-balancing posting absorbs the residual or every
    /// commodity sums to zero.
    pub fn is_balanced(&self) -> bool {
        self.auto_balance_posting_count > 0 || self.total_absolute_magnitude.is_zero()
    }

    /// Commodities whose contributions do not sum to zero.
    pub fn residuals(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.commodity_totals
            .iter()
            .filter(|(_, total)| !total.is_zero())
            .map(|(id, total)| (id.as_str(), *total))
    }

    /// From the start of the first posting to the end of the last one.
    pub fn postings_span(&self) -> Option<Span> {
        let first = self.postings.first()?;
        let last = self.postings.last()?;
        Some(first.span.cover(last.span))
    }

    fn aggregate(&mut self) {
        // A total that leaves `Decimal`'s range saturates and stays there.
        let mut totals: Vec<(String, Decimal, bool)> = Vec::new();
        for posting in &self.postings {
            if posting.is_auto_balancing() {
                self.auto_balance_posting_count += 1;
            }
            let Some((id, contribution)) = posting.balance_contribution() else {
                continue;
            };
            let index = match totals.iter().position(|(seen, ..)| seen == id) {
                Some(index) => index,
                None => {
                    totals.push((id.to_string(), Decimal::ZERO, false));
                    totals.len() - 1
                }
            };
            let (_, total, saturated) = &mut totals[index];
            if *saturated {
                continue;
            }
            let sum = match contribution {
                Contribution::Value(value) => total.checked_add(value).ok_or(value.is_sign_negative()),
                Contribution::OutOfRange { negative } => Err(negative),
            };
            match sum {
                Ok(sum) => *total = sum,
                Err(negative) => {
                    *total = if negative { Decimal::MIN } else { Decimal::MAX };
                    *saturated = true;
                }
            }
        }
        self.total_absolute_magnitude = totals
            .iter()
            .try_fold(Decimal::ZERO, |sum, (_, total, _)| sum.checked_add(total.abs()))
            .unwrap_or(Decimal::MAX);
        self.commodity_totals = totals.into_iter().map(|(id, total, _)| (id, total)).collect();
    }
}

/// Parses every transaction of one document.
pub(crate) fn parse_document(text: &str, context: &AmountContext<'_>) -> Vec<Transaction> {
    let all: Vec<Line<'_>> = lines(text).collect();
    let mut transactions = Vec::new();
    let mut index = 0;
    while index < all.len() {
        let line = all[index];
        index += 1;
        let Some(mut transaction) = parse_header(line, context.document) else {
            continue;
        };

        let block_len = all[index..]
            .iter()
            .take_while(|line| line.is_indented())
            .count();
        let block = &all[index..index + block_len];
        index += block_len;

        let comment_count = block
            .iter()
            .take_while(|line| line.text.trim_start().starts_with(';'))
            .count();
        transaction.comment_lines = block[..comment_count].iter().map(Line::span).collect();
        transaction.postings = block[comment_count..]
            .iter()
            .map(|line| posting::parse(*line, context))
            .collect();
        transaction.aggregate();
        transactions.push(transaction);
    }
    transactions
}

fn parse_header(line: Line<'_>, document: DocumentId) -> Option<Transaction> {
    let mut cursor = Cursor::new(line.text);
    let date_span = scan_date(&mut cursor)?;
    let date_text = cursor.slice(date_span);

    let status = match cursor.peek() {
        Some('*') => {
            cursor.bump();
            Status::Cleared
        }
        Some('!') => {
            cursor.bump();
            Status::Pending
        }
        _ => Status::Unmarked,
    };
    cursor.skip_blanks();

    let mut code = None;
    if cursor.peek() == Some('(') {
        let mut ahead = cursor.clone();
        ahead.bump();
        let inner = ahead.eat_while(|c| c != ')');
        if ahead.eat(')') {
            code = Some(ahead.slice(inner).to_string());
            cursor = ahead;
            cursor.skip_blanks();
        }
    }

    let description = cursor.eat_while(|c| c != ';');
    let comment = (!cursor.is_at_end()).then(|| cursor.rest().to_string());

    Some(Transaction {
        document,
        offset: line.start,
        date: TransactionDate {
            text: date_text.to_string(),
            span: date_span.shift(line.start),
            value: date_value(date_text),
        },
        status,
        code,
        description: cursor.slice(description).trim().to_string(),
        comment,
        comment_lines: Vec::new(),
        postings: Vec::new(),
        commodity_totals: Vec::new(),
        total_absolute_magnitude: Decimal::ZERO,
        auto_balance_posting_count: 0,
    })
}

fn is_date_separator(c: char) -> bool {
    matches!(c, '-' | '/' | '.')
}

/// `[YYYY-]MM-DD` in the first column, followed by a blank, a `;` or the end
/// of the line. The year may have two to four digits.
fn scan_date(cursor: &mut Cursor<'_>) -> Option<Span> {
    let start = cursor.pos();
    let mut groups = Vec::with_capacity(3);
    loop {
        groups.push(cursor.eat_while(|c| c.is_ascii_digit()).len());
        if groups.len() == 3 || !cursor.peek().is_some_and(is_date_separator) {
            break;
        }
        cursor.bump();
    }
    let valid = match groups[..] {
        [year, 2, 2] => (2..=4).contains(&year),
        [2, 2] => true,
        _ => false,
    };
    let followed_by_gap = cursor
        .peek()
        .is_none_or(|c| is_blank_char(c) || c == ';' || c == '*' || c == '!');
    if !valid || !followed_by_gap {
        return None;
    }
    let span = Span::new(start, cursor.pos());
    cursor.skip_blanks();
    Some(span)
}

fn date_value(text: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = text.split(is_date_separator).collect();
    let [year, month, day] = parts[..] else {
        return None;
    };
    let mut year: i32 = year.parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commodity::CommodityRegistry;
    use crate::config::CommodityScope;
    use rust_decimal_macros::dec;

    fn parse_text(text: &str) -> Vec<Transaction> {
        let registry = CommodityRegistry::new(CommodityScope::Document);
        let context = AmountContext {
            commodities: &registry,
            document: DocumentId::ROOT,
            default_mark: None,
        };
        parse_document(text, &context)
    }

    #[test]
    fn header_fields() {
        let text = "2024-03-01 * (1042) Grocery store  ; weekly\n    Expenses:Food  $42.10\n    Assets:Checking\n";
        let transactions = parse_text(text);
        assert_eq!(transactions.len(), 1);
        let t = &transactions[0];
        assert_eq!(t.date.text, "2024-03-01");
        assert_eq!(t.date.span, Span::new(0, 10));
        assert_eq!(t.date.value, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(t.status, Status::Cleared);
        assert_eq!(t.code.as_deref(), Some("1042"));
        assert_eq!(t.description, "Grocery store");
        assert_eq!(t.comment.as_deref(), Some("; weekly"));
        assert_eq!(t.postings.len(), 2);
        assert_eq!(t.auto_balance_posting_count, 1);
        assert!(t.is_balanced());
    }

    #[test]
    fn date_forms() {
        assert_eq!(date_value("2023/1/05"), NaiveDate::from_ymd_opt(2023, 1, 5));
        assert_eq!(date_value("23.01.05"), NaiveDate::from_ymd_opt(2023, 1, 5));
        assert_eq!(date_value("01-05"), None);
        assert_eq!(date_value("2023-02-30"), None);

        assert_eq!(parse_text("01-05 no year\n").len(), 1);
        assert!(parse_text("2023-1-05 x\n").is_empty());
        assert!(parse_text("20231-01-05 x\n").is_empty());
        assert!(parse_text("2023-01-05x\n").is_empty());
        assert!(parse_text("  2023-01-05 indented\n").is_empty());
    }

    #[test]
    fn pending_status_without_space() {
        let t = &parse_text("2024-01-01! rent\n")[0];
        assert_eq!(t.status, Status::Pending);
        assert_eq!(t.description, "rent");
        assert!(t.postings.is_empty());
    }

    #[test]
    fn leading_comment_lines_belong_to_transaction() {
        let text = "2024-01-01 x\n    ; note\n\t; tabbed\n    a  $1\n    ; inner\n    b  $-1\nnot indented\n";
        let t = &parse_text(text)[0];
        assert_eq!(t.comment_lines.len(), 2);
        assert_eq!(t.postings.len(), 3);
        assert!(!t.postings[1].matched);
        assert!(t.is_balanced());
        assert_eq!(t.postings_span().map(|s| &text[s.range()]), Some("    a  $1\n    ; inner\n    b  $-1"));
    }

    #[test]
    fn totals_group_by_commodity() {
        let text = "2024-01-01 x\n  a  $10.00\n  b  5 EUR\n  c  $-9.00\n  d  -5 EUR\n";
        let t = &parse_text(text)[0];
        assert_eq!(
            t.commodity_totals,
            vec![("$".to_string(), dec!(1.00)), ("EUR".to_string(), dec!(0))]
        );
        assert_eq!(t.total_absolute_magnitude, dec!(1));
        assert!(!t.is_balanced());
        assert_eq!(t.residuals().collect::<Vec<_>>(), vec![("$", dec!(1.00))]);
    }

    #[test]
    fn totals_out_of_range_saturate() {
        let text = "2024-01-01 x\n  a  50000000000000000000000000000\n  b  50000000000000000000000000000\n";
        let t = &parse_text(text)[0];
        assert_eq!(t.commodity_totals, vec![(String::new(), Decimal::MAX)]);
        assert_eq!(t.total_absolute_magnitude, Decimal::MAX);
        assert!(!t.is_balanced());

        // A saturated total does not come back into range.
        let text = "2024-01-01 x\n  a  -50000000000000000000000000000\n  b  -50000000000000000000000000000\n  c  50000000000000000000000000000\n";
        let t = &parse_text(text)[0];
        assert_eq!(t.commodity_totals, vec![(String::new(), Decimal::MIN)]);
        assert!(!t.is_balanced());
    }

    #[test]
    fn unit_cost_out_of_range_is_unbalanced() {
        let text = "2024-01-01 x\n  a  10000000000000000 X @ 10000000000000000 Y\n  b  -1 Y\n";
        let t = &parse_text(text)[0];
        assert_eq!(t.commodity_totals, vec![("Y".to_string(), Decimal::MAX)]);
        assert!(!t.is_balanced());
    }

    #[test]
    fn total_cost_balances_as_written() {
        let text = "2024-01-01 sell\n  a  -10 AAPL @@ $1500\n  b  $-1500\n";
        let t = &parse_text(text)[0];
        assert_eq!(t.commodity_totals, vec![("$".to_string(), dec!(0))]);
        assert!(t.is_balanced());
    }

    #[test]
    fn blank_line_ends_block() {
        let text = "2024-01-01 x\n  a  $1\n\n  b  $-1\n2024-01-02 y\n  c  $2\n";
        let transactions = parse_text(text);
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].postings.len(), 1);
        assert_eq!(transactions[1].offset, text.find("2024-01-02").unwrap());
    }
}
