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

//! Commodities and their registry.
//!
//! A commodity is a unit symbol plus the numeral shape it is written with.
//! Declared commodities come from `commodity`/`D` directives; any other
//! commodity is synthesized from the numeral it is first used with.
//!
//! # Example
//!
//! ```
//! use hledger_lint::Commodity;
//!
//! let usd = Commodity::declared("$", "", "1,234.56", None);
//! assert!(usd.has_correct_signature("1,234.56"));
//! assert!(!usd.has_correct_signature("1,23.456"));
//! ```

use crate::base::{DecimalMark, DocumentId};
use crate::config::CommodityScope;
use crate::number_format::NumberFormat;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A unit symbol and its numeral format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commodity {
    /// Symbol written before the numeral, with its separating whitespace.
    pub leading_unit: String,
    /// Symbol written after the numeral, with its separating whitespace.
    pub trailing_unit: String,
    pub format: NumberFormat,
    pub declared: bool,
    /// Trimmed leading unit followed by trimmed trailing unit.
    pub id: String,
}

/// A rendered amount split at its decimal mark, so amounts of different
/// magnitude can be aligned on it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormattedAmount {
    /// Sign, leading unit and integer digits.
    pub before: String,
    /// Decimal mark, fractional digits and trailing unit.
    pub after: String,
}

impl fmt::Display for FormattedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.before, self.after)
    }
}

/// How [`Commodity::format`] renders the numeral and its sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Re-render the numeral with the commodity's grouping and precision
    /// instead of copying it as written.
    pub format_amounts: bool,
    /// `-$5` rather than `$-5`.
    pub negatives_in_front: bool,
}

impl Commodity {
    pub fn declared(
        leading_unit: &str,
        trailing_unit: &str,
        sample: &str,
        default_mark: Option<DecimalMark>,
    ) -> Self {
        Self::new(leading_unit, trailing_unit, sample, default_mark, true)
    }

    pub fn synthesized(
        leading_unit: &str,
        trailing_unit: &str,
        sample: &str,
        default_mark: Option<DecimalMark>,
    ) -> Self {
        Self::new(leading_unit, trailing_unit, sample, default_mark, false)
    }

    fn new(
        leading_unit: &str,
        trailing_unit: &str,
        sample: &str,
        default_mark: Option<DecimalMark>,
        declared: bool,
    ) -> Self {
        Self {
            leading_unit: leading_unit.to_string(),
            trailing_unit: trailing_unit.to_string(),
            format: NumberFormat::infer(sample, default_mark),
            declared,
            id: commodity_id(leading_unit, trailing_unit),
        }
    }

    /// Whether `numeral` is written in a shape this commodity accepts.
    ///
    /// Two shapes pass:
    /// - grouped: runs of up to three digits joined by the thousand
    ///   separator, optionally followed by the decimal mark and at most two
    ///   fractional digits;
    /// - ungrouped: plain digits, optionally followed by the decimal mark and
    ///   the fractional digits.
    pub fn has_correct_signature(&self, numeral: &str) -> bool {
        let body = numeral.trim_end_matches([' ', '\t']);
        let mark = self.format.effective_decimal_mark().as_char();
        matches_grouped(body, self.format.thousand_separator, mark)
            || matches_ungrouped(body, mark, self.format.precision_of(body))
    }

    /// Renders `amount` for alignment.
    ///
    /// The numeral is written with `max(min_fractional_digits, precision)`
    /// fractional digits when `options.format_amounts` is set, otherwise
    /// `original` is copied verbatim.
    pub fn format(
        &self,
        amount: Decimal,
        negative: bool,
        min_fractional_digits: usize,
        options: RenderOptions,
        original: &str,
    ) -> FormattedAmount {
        let numeral = if options.format_amounts {
            let precision = min_fractional_digits.max(self.format.fractional_digits);
            self.format.render(amount, precision)
        } else {
            original.to_string()
        };

        let mut before = String::new();
        if options.negatives_in_front {
            before.push(if negative { '-' } else { ' ' });
            before.push_str(&self.leading_unit);
        } else {
            before.push_str(&self.leading_unit);
            if negative {
                before.push('-');
            }
        }

        let mark = self.format.effective_decimal_mark().as_char();
        let split = numeral.rfind(mark).unwrap_or(numeral.len());
        before.push_str(&numeral[..split]);
        let mut after = numeral[split..].to_string();
        after.push_str(&self.trailing_unit);

        FormattedAmount { before, after }
    }
}

/// Trimmed leading unit followed by trimmed trailing unit.
pub fn commodity_id(leading_unit: &str, trailing_unit: &str) -> String {
    format!("{}{}", leading_unit.trim(), trailing_unit.trim())
}

fn all_digits(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit())
}

fn matches_grouped(body: &str, separator: Option<char>, mark: char) -> bool {
    let (integer, fraction) = match body.split_once(mark) {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (body, None),
    };
    if let Some(fraction) = fraction {
        if fraction.len() > 2 || !all_digits(fraction) {
            return false;
        }
    }
    match separator {
        None => !integer.is_empty() && all_digits(integer),
        Some(separator) => {
            let mut groups = integer.split(separator);
            let first_ok = groups
                .next()
                .is_some_and(|g| (1..=3).contains(&g.len()) && all_digits(g));
            first_ok && groups.all(|g| g.len() == 3 && all_digits(g))
        }
    }
}

fn matches_ungrouped(body: &str, mark: char, precision: usize) -> bool {
    match body.split_once(mark) {
        Some((integer, fraction)) => {
            all_digits(integer) && fraction.len() <= precision && all_digits(fraction)
        }
        None => all_digits(body),
    }
}

/// Declared commodities of a journal, keyed by id and declaring document.
#[derive(Debug, Clone, Default)]
pub struct CommodityRegistry {
    scope: CommodityScope,
    by_document: HashMap<(String, DocumentId), Arc<Commodity>>,
    latest: HashMap<String, Arc<Commodity>>,
}

impl CommodityRegistry {
    pub fn new(scope: CommodityScope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    pub fn scope(&self) -> CommodityScope {
        self.scope
    }

    /// Records a `commodity` declaration; a later declaration of the same id
    /// in the same document replaces the earlier one.
    pub fn declare(
        &mut self,
        leading_unit: &str,
        trailing_unit: &str,
        sample: &str,
        document: DocumentId,
        default_mark: Option<DecimalMark>,
    ) -> Arc<Commodity> {
        let commodity = Arc::new(Commodity::declared(
            leading_unit,
            trailing_unit,
            sample,
            default_mark,
        ));
        self.insert(commodity.id.clone(), document, Arc::clone(&commodity));
        commodity
    }

    /// Records a `D` directive: the format of bare numerals in `document`.
    pub fn declare_default(
        &mut self,
        sample: &str,
        document: DocumentId,
        default_mark: Option<DecimalMark>,
    ) -> Arc<Commodity> {
        let commodity = Arc::new(Commodity::declared("", "", sample, default_mark));
        self.insert(String::new(), document, Arc::clone(&commodity));
        commodity
    }

    fn insert(&mut self, id: String, document: DocumentId, commodity: Arc<Commodity>) {
        self.latest.insert(id.clone(), Arc::clone(&commodity));
        self.by_document.insert((id, document), commodity);
    }

    /// The declaration of `id` visible from `document`, if any.
    pub fn get(&self, id: &str, document: DocumentId) -> Option<&Arc<Commodity>> {
        match self.scope {
            CommodityScope::Document => self.by_document.get(&(id.to_string(), document)),
            CommodityScope::Journal => self.latest.get(id),
        }
    }

    /// The declared commodity for `id` as seen from `document`, or a new
    /// undeclared one inferred from the numeral actually written.
    pub fn resolve(
        &self,
        leading_unit: &str,
        trailing_unit: &str,
        sample: &str,
        document: DocumentId,
        default_mark: Option<DecimalMark>,
    ) -> Arc<Commodity> {
        let id = commodity_id(leading_unit, trailing_unit);
        match self.get(&id, document) {
            Some(declared) => Arc::clone(declared),
            None => Arc::new(Commodity::synthesized(
                leading_unit,
                trailing_unit,
                sample,
                default_mark,
            )),
        }
    }

    /// Number of (id, document) declarations.
    pub fn len(&self) -> usize {
        self.by_document.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_document.is_empty()
    }

    /// Distinct declared ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.latest.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
