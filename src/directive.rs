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

//! Line-anchored directive scanners.
//!
//! Directives always start in the first column:
//!
//! ```text
//! include accounts.journal
//! decimal-mark ,
//! account Assets:Checking
//! commodity 1.000,00 EUR
//! D $1,000.00
//! ```

use crate::base::{DecimalMark, Span};
use crate::commodity;
use crate::scanner::{Cursor, Line, is_blank_char, lines};

const INCLUDE: &str = "include";
const DECIMAL_MARK: &str = "decimal-mark ";
const ACCOUNT: &str = "account ";
const COMMODITY: &str = "commodity ";
const DEFAULT_COMMODITY: &str = "D ";
const FORMAT: &str = "format ";

/// Length of the `include ` keyword and its separator.
pub const INCLUDE_PREFIX_LEN: usize = INCLUDE.len() + 1;

/// An `include <path>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    /// The whole directive line.
    pub span: Span,
    pub path: String,
}

/// An `account <name>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDirective {
    pub name: String,
    pub span: Span,
}

/// Whether a commodity line was `commodity` or the `D` default-commodity
/// directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommodityDirectiveKind {
    Commodity,
    Default,
}

/// A `commodity` or `D` line.
///
/// Units keep the whitespace that separates them from the numeral so they
/// can be rendered back exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommodityDirective {
    pub kind: CommodityDirectiveKind,
    pub leading_unit: String,
    pub trailing_unit: String,
    pub sample: String,
    pub span: Span,
}

impl CommodityDirective {
    /// Trimmed leading unit followed by trimmed trailing unit.
    pub fn commodity_id(&self) -> String {
        commodity::commodity_id(&self.leading_unit, &self.trailing_unit)
    }
}

pub fn includes(text: &str) -> Vec<IncludeDirective> {
    lines(text).filter_map(include_on).collect()
}

fn include_on(line: Line<'_>) -> Option<IncludeDirective> {
    let rest = line.text.strip_prefix(INCLUDE)?;
    let path = rest.strip_prefix(is_blank_char)?.trim();
    if path.is_empty() {
        return None;
    }
    let span = Span::new(line.start, line.start + line.text.trim_end().len());
    Some(IncludeDirective {
        span,
        path: path.to_string(),
    })
}

/// The first `decimal-mark` directive of `text`, if any.
pub fn decimal_mark(text: &str) -> Option<DecimalMark> {
    lines(text).find_map(|line| {
        let rest = line.text.strip_prefix(DECIMAL_MARK)?;
        rest.chars().next().and_then(DecimalMark::from_char)
    })
}

pub fn accounts(text: &str) -> Vec<AccountDirective> {
    lines(text)
        .filter_map(|line| {
            line.text.strip_prefix(ACCOUNT)?;
            let mut cursor = Cursor::new(line.text);
            cursor.set_pos(ACCOUNT.len());
            let name = account_name(&mut cursor)?;
            Some(AccountDirective {
                name: cursor.slice(name).to_string(),
                span: name.shift(line.start),
            })
        })
        .collect()
}

/// Consumes an account name: words separated by single spaces, ending at two
/// spaces, a tab, a `;` or the end of the line.
pub(crate) fn account_name(cursor: &mut Cursor<'_>) -> Option<Span> {
    let word = |c: char| !is_blank_char(c) && c != ';';
    let start = cursor.pos();
    let mut end = cursor.eat_while(word).end;
    if end == start {
        return None;
    }
    while cursor.peek() == Some(' ') && cursor.peek_second().is_some_and(word) {
        cursor.bump();
        end = cursor.eat_while(word).end;
    }
    Some(Span::new(start, end))
}

pub fn commodities(text: &str) -> Vec<CommodityDirective> {
    let all: Vec<Line<'_>> = lines(text).collect();
    all.iter()
        .enumerate()
        .filter_map(|(index, line)| {
            let (kind, rest_at) = if line.text.starts_with(COMMODITY) {
                (CommodityDirectiveKind::Commodity, COMMODITY.len())
            } else if line.text.starts_with(DEFAULT_COMMODITY) {
                (CommodityDirectiveKind::Default, DEFAULT_COMMODITY.len())
            } else {
                return None;
            };
            let mut directive = commodity_amount(&line.text[rest_at..]);
            directive.kind = kind;
            directive.span = line.span();
            if directive.sample.is_empty() {
                if let Some(format) = format_subdirective(&all[index + 1..]) {
                    let shown = commodity_amount(format);
                    if !shown.sample.is_empty() {
                        if shown.commodity_id() == directive.commodity_id() {
                            directive.leading_unit = shown.leading_unit;
                            directive.trailing_unit = shown.trailing_unit;
                        }
                        directive.sample = shown.sample;
                    }
                }
            }
            Some(directive)
        })
        .collect()
}

/// The `format` line among the indented lines directly below a directive.
fn format_subdirective<'a>(following: &[Line<'a>]) -> Option<&'a str> {
    following
        .iter()
        .take_while(|line| line.is_indented())
        .find_map(|line| line.text.trim_start().strip_prefix(FORMAT))
}

/// Splits `[-][unit][-][amount][unit]` into units and sample numeral.
fn commodity_amount(text: &str) -> CommodityDirective {
    let mut cursor = Cursor::new(text);
    cursor.eat('-');
    cursor.skip_blanks();

    let lead_start = cursor.pos();
    cursor.eat_unit(|c| c.is_ascii_digit() || c == '-' || c == ';');
    cursor.skip_blanks();
    let leading = Span::new(lead_start, cursor.pos());
    cursor.eat('-');

    let sample = if cursor.peek().is_some_and(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        let run = cursor.eat_while(|c| c.is_ascii_digit() || c == '.' || c == ',' || c == ' ');
        let end = run.start + cursor.slice(run).trim_end_matches(' ').len();
        cursor.set_pos(end);
        Span::new(run.start, end)
    } else {
        Span::empty(cursor.pos())
    };

    let trail_start = cursor.pos();
    let mut ahead = cursor.clone();
    ahead.eat(' ');
    let trailing = match ahead.eat_unit(|c| c.is_ascii_digit() || c == '-' || c == ';' || c == '=') {
        Some(unit) => Span::new(trail_start, unit.end),
        None => Span::empty(trail_start),
    };

    CommodityDirective {
        kind: CommodityDirectiveKind::Commodity,
        leading_unit: cursor.slice(leading).to_string(),
        trailing_unit: cursor.slice(trailing).to_string(),
        sample: cursor.slice(sample).to_string(),
        span: Span::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_includes_with_spans() {
        let text = "; header\ninclude a.journal\ninclude\t sub/b.journal  \nincluded x\n";
        let found = includes(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, "a.journal");
        assert_eq!(found[0].span, Span::new(9, 26));
        assert_eq!(found[1].path, "sub/b.journal");
        assert_eq!(&text[found[1].span.range()], "include\t sub/b.journal");
    }

    #[test]
    fn first_decimal_mark_wins() {
        assert_eq!(
            decimal_mark("decimal-mark ,\ndecimal-mark .\n"),
            Some(DecimalMark::Comma)
        );
        assert_eq!(decimal_mark("  decimal-mark ,\n"), None);
        assert_eq!(decimal_mark("decimal-mark x\n"), None);
    }

    #[test]
    fn account_names_stop_at_double_space_and_comment() {
        let found = accounts("account Assets:Bank Account  ; type: A\naccount Expenses:Food;x\n");
        let names: Vec<_> = found.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Assets:Bank Account", "Expenses:Food"]);
        assert_eq!(found[0].span, Span::new(8, 27));
    }

    #[test]
    fn commodity_with_leading_symbol() {
        let found = commodities("commodity $1,000.00\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, CommodityDirectiveKind::Commodity);
        assert_eq!(found[0].leading_unit, "$");
        assert_eq!(found[0].trailing_unit, "");
        assert_eq!(found[0].sample, "1,000.00");
    }

    #[test]
    fn commodity_with_trailing_symbol_keeps_spacing() {
        let found = commodities("commodity 1.000,00 EUR\n");
        assert_eq!(found[0].leading_unit, "");
        assert_eq!(found[0].trailing_unit, " EUR");
        assert_eq!(found[0].sample, "1.000,00");
    }

    #[test]
    fn commodity_symbol_only() {
        let found = commodities("commodity USD\n");
        assert_eq!(found[0].leading_unit, "USD");
        assert_eq!(found[0].sample, "");
    }

    #[test]
    fn commodity_format_subdirective_supplies_sample() {
        let found = commodities("commodity EUR\n  format 1.000,00 EUR\n\n");
        assert_eq!(found[0].leading_unit, "");
        assert_eq!(found[0].trailing_unit, " EUR");
        assert_eq!(found[0].sample, "1.000,00");
        assert_eq!(found[0].commodity_id(), "EUR");
    }

    #[test]
    fn default_commodity_directive() {
        let found = commodities("D $1,000.00\n");
        assert_eq!(found[0].kind, CommodityDirectiveKind::Default);
        assert_eq!(found[0].sample, "1,000.00");
    }
}
