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

//! Posting lines.
//!
//! A posting line has up to six fields, always in this order:
//!
//! ```text
//!     Assets:Brokerage    10 AAPL @ $150.00 = 20 AAPL @@ $3,000.00  ; buy
//!     └── account ──┘     └amount┘ └─cost─┘ └─ assertion + cost ──┘  └comment
//! ```
//!
//! Lines that do not fit this shape are kept as inert postings: they take
//! no part in balancing, checking or formatting.

use crate::base::{DecimalMark, DocumentId, Span};
use crate::commodity::{Commodity, CommodityRegistry};
use crate::directive::account_name;
use crate::scanner::{Cursor, Line};
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostKind {
    /// `@`: price of one unit.
    Unit,
    /// `@@`: price of the whole amount.
    Total,
}

impl CostKind {
    pub fn marker(self) -> &'static str {
        match self {
            Self::Unit => "@",
            Self::Total => "@@",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionKind {
    /// `=`
    Single,
    /// `==`
    Total,
}

impl AssertionKind {
    pub fn marker(self) -> &'static str {
        match self {
            Self::Single => "=",
            Self::Total => "==",
        }
    }
}

/// A numeral with its commodity, as written in one slot of a posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    /// The digits and punctuation as written, without sign or units.
    pub numeral: String,
    /// Position of `numeral` in the document.
    pub span: Span,
    pub commodity_id: String,
    /// Position of the commodity symbol, empty for bare numerals.
    pub commodity_span: Span,
    pub commodity: Arc<Commodity>,
    pub negative: bool,
    /// Signed value; zero when the numeral could not be read.
    pub quantity: Decimal,
    /// Fractional digits of `numeral`.
    pub precision: usize,
    pub has_correct_signature: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cost {
    pub kind: CostKind,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub kind: AssertionKind,
    pub amount: Amount,
    /// Cost annotation of the asserted balance.
    pub cost: Option<Cost>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    /// The whole line, without its terminator.
    pub span: Span,
    pub account: Option<AccountRef>,
    pub amount: Option<Amount>,
    pub cost: Option<Cost>,
    pub assertion: Option<Assertion>,
    /// Trailing comment including its `;`.
    pub comment: Option<String>,
    /// `false` for lines that do not read as a posting.
    pub matched: bool,
}

impl Posting {
    fn inert(span: Span) -> Self {
        Self {
            span,
            account: None,
            amount: None,
            cost: None,
            assertion: None,
            comment: None,
            matched: false,
        }
    }

    /// An account with no amount, to be balanced by the rest of the transaction.
    pub fn is_auto_balancing(&self) -> bool {
        self.matched && self.account.is_some() && self.amount.is_none()
    }

    /// Present amounts in slot order: amount, cost, assertion, assertion cost.
    pub fn amounts(&self) -> impl Iterator<Item = &Amount> {
        let assertion_cost = self
            .assertion
            .as_ref()
            .and_then(|assertion| assertion.cost.as_ref());
        [
            self.amount.as_ref(),
            self.cost.as_ref().map(|cost| &cost.amount),
            self.assertion.as_ref().map(|assertion| &assertion.amount),
            assertion_cost.map(|cost| &cost.amount),
        ]
        .into_iter()
        .flatten()
    }

    /// Every present amount has a correct signature.
    pub fn is_well_formed(&self) -> bool {
        self.amounts().all(|amount| amount.has_correct_signature)
    }

    /// What this posting adds to its transaction's balance, keyed by
    /// commodity id.
    ///
    /// A cost converts the amount into the cost's commodity: `@` multiplies
    /// by the unit price, `@@` takes the total price as written.
    pub fn balance_contribution(&self) -> Option<(&str, Contribution)> {
        if !self.matched {
            return None;
        }
        let amount = self.amount.as_ref()?;
        match &self.cost {
            None => Some((&amount.commodity_id, Contribution::Value(amount.quantity))),
            Some(cost) => {
                let value = match cost.kind {
                    CostKind::Unit => match cost.amount.quantity.checked_mul(amount.quantity) {
                        Some(value) => Contribution::Value(value),
                        None => Contribution::OutOfRange {
                            negative: cost.amount.quantity.is_sign_negative()
                                != amount.quantity.is_sign_negative(),
                        },
                    },
                    CostKind::Total => Contribution::Value(cost.amount.quantity),
                };
                Some((&cost.amount.commodity_id, value))
            }
        }
    }
}

/// A posting's share of its transaction's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contribution {
    Value(Decimal),
    /// The cost conversion does not fit a `Decimal`.
    OutOfRange { negative: bool },
}

/// What amounts in one document resolve their commodities against.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AmountContext<'a> {
    pub commodities: &'a CommodityRegistry,
    pub document: DocumentId,
    pub default_mark: Option<DecimalMark>,
}

/// Reads one indented line of a transaction block.
pub(crate) fn parse(line: Line<'_>, context: &AmountContext<'_>) -> Posting {
    match scan(line.text) {
        Some(syntax) => syntax.resolve(line, context),
        None => Posting::inert(line.span()),
    }
}

/// Spans of an amount relative to its line.
#[derive(Debug, Clone, Copy)]
struct AmountSyntax {
    negative: bool,
    /// Leading unit with the blanks that follow it.
    leading: Span,
    numeral: Span,
    /// Trailing unit with the blanks that precede it.
    trailing: Span,
}

#[derive(Debug, Clone, Copy)]
struct PostingSyntax {
    account: Option<Span>,
    amount: Option<AmountSyntax>,
    cost: Option<(CostKind, AmountSyntax)>,
    assertion: Option<(AssertionKind, AmountSyntax)>,
    assertion_cost: Option<(CostKind, AmountSyntax)>,
    comment: Option<Span>,
}

fn is_unit_excluded(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '-' | '+' | ';' | '@' | '=')
}

fn scan(text: &str) -> Option<PostingSyntax> {
    let mut cursor = Cursor::new(text);
    if cursor.skip_blanks() == 0 || cursor.peek() == Some(';') {
        return None;
    }

    let account = account_name(&mut cursor);
    cursor.skip_blanks();
    let amount = scan_amount(&mut cursor);

    let cost = scan_cost(&mut cursor)?;
    let mut assertion = None;
    let mut assertion_cost = None;
    let mut ahead = cursor.clone();
    ahead.skip_blanks();
    if ahead.eat('=') {
        let kind = if ahead.eat('=') {
            AssertionKind::Total
        } else {
            AssertionKind::Single
        };
        ahead.skip_blanks();
        assertion = Some((kind, scan_amount(&mut ahead)?));
        cursor = ahead;
        assertion_cost = scan_cost(&mut cursor)?;
    }

    cursor.skip_blanks();
    let comment = if cursor.peek() == Some(';') {
        let start = cursor.pos();
        cursor.set_pos(text.len());
        Some(Span::new(start, text.len()))
    } else {
        None
    };

    cursor.skip_blanks();
    if !cursor.is_at_end() {
        return None;
    }
    Some(PostingSyntax {
        account,
        amount,
        cost,
        assertion,
        assertion_cost,
        comment,
    })
}

/// `Some(None)` when no cost marker follows; `None` when a marker is not
/// followed by an amount.
fn scan_cost(cursor: &mut Cursor<'_>) -> Option<Option<(CostKind, AmountSyntax)>> {
    let mut ahead = cursor.clone();
    ahead.skip_blanks();
    if !ahead.eat('@') {
        return Some(None);
    }
    let kind = if ahead.eat('@') {
        CostKind::Total
    } else {
        CostKind::Unit
    };
    ahead.skip_blanks();
    let amount = scan_amount(&mut ahead)?;
    *cursor = ahead;
    Some(Some((kind, amount)))
}

/// `[-][unit][-]numeral[unit]`; the cursor is left untouched when there is
/// no numeral.
fn scan_amount(cursor: &mut Cursor<'_>) -> Option<AmountSyntax> {
    let mut ahead = cursor.clone();
    let mut negative = ahead.eat_sign() == Some(true);
    ahead.skip_blanks();

    let leading_start = ahead.pos();
    if ahead.eat_unit(is_unit_excluded).is_some() {
        ahead.skip_blanks();
    }
    let leading = Span::new(leading_start, ahead.pos());

    if ahead.eat_sign() == Some(true) {
        negative = true;
    }
    ahead.skip_blanks();
    let numeral = ahead.eat_numeral()?;

    let trailing_start = ahead.pos();
    let mut unit_ahead = ahead.clone();
    unit_ahead.skip_blanks();
    let trailing = match unit_ahead.eat_unit(is_unit_excluded) {
        Some(unit) => {
            ahead = unit_ahead;
            Span::new(trailing_start, unit.end)
        }
        None => Span::empty(trailing_start),
    };

    *cursor = ahead;
    Some(AmountSyntax {
        negative,
        leading,
        numeral,
        trailing,
    })
}

/// Span of the non-blank part of `span` within `text`.
fn trimmed(text: &str, span: Span) -> Span {
    let slice = &text[span.range()];
    let start = span.start + (slice.len() - slice.trim_start().len());
    let end = span.start + slice.trim_end().len();
    Span::new(start, end.max(start))
}

impl AmountSyntax {
    fn resolve(&self, line: Line<'_>, context: &AmountContext<'_>) -> Amount {
        let text = line.text;
        let leading_unit = &text[self.leading.range()];
        let trailing_unit = &text[self.trailing.range()];
        let numeral = &text[self.numeral.range()];

        let commodity = context.commodities.resolve(
            leading_unit,
            trailing_unit,
            numeral,
            context.document,
            context.default_mark,
        );
        let parsed = commodity.format.parse(numeral);
        let magnitude = parsed.unwrap_or(Decimal::ZERO);

        let leading = trimmed(text, self.leading);
        let trailing = trimmed(text, self.trailing);
        let commodity_span = if trailing.len() > leading.len() {
            trailing
        } else {
            leading
        };

        Amount {
            numeral: numeral.to_string(),
            span: self.numeral.shift(line.start),
            commodity_id: commodity.id.clone(),
            commodity_span: commodity_span.shift(line.start),
            negative: self.negative,
            quantity: if self.negative { -magnitude } else { magnitude },
            precision: commodity.format.precision_of(numeral),
            has_correct_signature: parsed.is_some() && commodity.has_correct_signature(numeral),
            commodity,
        }
    }
}

impl PostingSyntax {
    fn resolve(&self, line: Line<'_>, context: &AmountContext<'_>) -> Posting {
        let text = line.text;
        let amount = |syntax: &AmountSyntax| syntax.resolve(line, context);
        let cost = |(kind, syntax): &(CostKind, AmountSyntax)| Cost {
            kind: *kind,
            amount: amount(syntax),
        };

        Posting {
            span: line.span(),
            account: self.account.map(|span| AccountRef {
                name: text[span.range()].to_string(),
                span: span.shift(line.start),
            }),
            amount: self.amount.as_ref().map(amount),
            cost: self.cost.as_ref().map(cost),
            assertion: self.assertion.as_ref().map(|(kind, syntax)| Assertion {
                kind: *kind,
                amount: amount(syntax),
                cost: self.assertion_cost.as_ref().map(cost),
            }),
            comment: self.comment.map(|span| text[span.range()].to_string()),
            matched: true,
        }
    }
}
