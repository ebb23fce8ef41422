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

//! Number-format inference.
//!
//! Deduces the decimal mark, thousand separator and precision of a commodity
//! from a single numeral written in the journal.
//!
//! # Example
//!
//! ```
//! use hledger_lint::{DecimalMark, NumberFormat};
//!
//! let format = NumberFormat::infer("1.234.567,891", None);
//! assert_eq!(format.decimal_mark, Some(DecimalMark::Comma));
//! assert_eq!(format.thousand_separator, Some('.'));
//! assert_eq!(format.fractional_digits, 3);
//! ```

use crate::base::DecimalMark;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Decimal mark assumed when neither a declaration nor a directive sets one.
pub const FALLBACK_DECIMAL_MARK: DecimalMark = DecimalMark::Period;

/// Numeral shape of a commodity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    /// `None` when the sample had no punctuation and no default applied.
    pub decimal_mark: Option<DecimalMark>,
    /// `None` disables digit grouping.
    pub thousand_separator: Option<char>,
    pub fractional_digits: usize,
}

impl NumberFormat {
    /// Infers a format from `sample`, using `fallback` as the decimal mark when
    /// the sample contains no `.` or `,`.
    ///
    /// The last punctuation character decides: if it occurs more than once it
    /// is the thousand separator, otherwise it is the decimal mark. The
    /// thousand separator is only kept if it actually occurs in the sample.
    pub fn infer(sample: &str, fallback: Option<DecimalMark>) -> Self {
        let terminal = sample.chars().rev().find_map(DecimalMark::from_char);

        let (decimal_mark, candidate_separator) = match terminal {
            None => (fallback, ','),
            Some(mark) => {
                let occurrences = sample.matches(mark.as_char()).count();
                if occurrences > 1 {
                    (Some(mark.opposite()), mark.as_char())
                } else {
                    (Some(mark), mark.opposite().as_char())
                }
            }
        };

        let thousand_separator = sample
            .contains(candidate_separator)
            .then_some(candidate_separator);

        let fractional_digits = decimal_mark
            .map(|mark| digits_after_first_mark(sample, mark))
            .unwrap_or(0);

        Self {
            decimal_mark,
            thousand_separator,
            fractional_digits,
        }
    }

    /// Decimal mark used for parsing, checking and rendering.
    pub fn effective_decimal_mark(&self) -> DecimalMark {
        self.decimal_mark.unwrap_or(FALLBACK_DECIMAL_MARK)
    }

    /// Number of characters between the first and second decimal mark of
    /// `numeral`, i.e. the precision the numeral is written with.
    pub fn precision_of(&self, numeral: &str) -> usize {
        let mark = self.effective_decimal_mark().as_char();
        numeral
            .split(mark)
            .nth(1)
            .map(|fraction| fraction.chars().count())
            .unwrap_or(0)
    }

    /// Parses the unsigned value of `numeral`.
    ///
    /// Every character other than a digit or the decimal mark is dropped.
    /// Returns `None` if what remains is not a number.
    pub fn parse(&self, numeral: &str) -> Option<Decimal> {
        let mark = self.effective_decimal_mark().as_char();
        let normalized: String = numeral
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == mark)
            .map(|c| if c == mark { '.' } else { c })
            .collect();
        if normalized.is_empty() {
            return None;
        }
        Decimal::from_str(&normalized).ok()
    }

    /// Renders the magnitude of `value` with `precision` fractional digits,
    /// grouping the integer part by the thousand separator.
    pub fn render(&self, value: Decimal, precision: usize) -> String {
        let rounded = value
            .abs()
            .round_dp_with_strategy(precision as u32, RoundingStrategy::MidpointAwayFromZero);
        let plain = format!("{rounded:.precision$}");
        let (integer, fraction) = match plain.split_once('.') {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (plain.as_str(), None),
        };

        let mut rendered = match self.thousand_separator {
            Some(separator) => group_digits(integer, separator),
            None => integer.to_string(),
        };
        if let Some(fraction) = fraction {
            rendered.push(self.effective_decimal_mark().as_char());
            rendered.push_str(fraction);
        }
        rendered
    }
}

/// Length of the digit run following the first `mark` that is followed by a
/// digit.
fn digits_after_first_mark(sample: &str, mark: DecimalMark) -> usize {
    let mark = mark.as_char();
    sample
        .match_indices(mark)
        .map(|(index, _)| {
            sample[index + mark.len_utf8()..]
                .chars()
                .take_while(char::is_ascii_digit)
                .count()
        })
        .find(|&count| count > 0)
        .unwrap_or(0)
}

fn group_digits(integer: &str, separator: char) -> String {
    let digits: Vec<char> = integer.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.iter().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(*digit);
    }
    grouped
}
