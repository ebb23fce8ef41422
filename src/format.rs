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

//! Column alignment.
//!
//! A posting line is rebuilt from nine components, each a pair of strings
//! with a padding point between them:
//!
//! | Slot | Before padding | After padding |
//! |---|---|---|
//! | 0 | indent, account, gap | sign, unit, integer digits |
//! | 1 | decimal mark, fraction, unit | gap before cost |
//! | 2 | `@`/`@@` | cost integer part |
//! | 3 | cost fraction | gap before assertion |
//! | 4 | `=`/`==` | assertion integer part |
//! | 5 | assertion fraction | gap before assertion cost |
//! | 6 | `@`/`@@` | assertion cost integer part |
//! | 7 | assertion cost fraction | gap before comment |
//! | 8 | comment | |
//!
//! Padding brings each slot to its target column, so decimal marks line up
//! and markers start in the same column.
//!
//! The formatter never rewrites a document: it returns [`TextEdit`]s.

use crate::base::{DocumentId, Span};
use crate::commodity::{FormattedAmount, RenderOptions};
use crate::config::{AlignmentMode, Config, SLOT_COUNT};
use crate::journal::Journal;
use crate::posting::{Amount, Posting};
use crate::scanner::lines;
use crate::transaction::Transaction;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

const INDENT: &str = "    ";
const GAP: &str = "  ";

/// Replaces `span` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    pub span: Span,
    pub new_text: String,
}

impl TextEdit {
    pub fn replace(span: Span, new_text: impl Into<String>) -> Self {
        Self {
            span,
            new_text: new_text.into(),
        }
    }

    pub fn insert(offset: usize, new_text: impl Into<String>) -> Self {
        Self::replace(Span::empty(offset), new_text)
    }

    pub fn delete(span: Span) -> Self {
        Self::replace(span, "")
    }
}

/// Applies sorted, non-overlapping edits to `text`.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let mut result = text.to_string();
    for edit in edits.iter().rev() {
        result.replace_range(edit.span.range(), &edit.new_text);
    }
    result
}

/// One structural slot of a posting line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Component {
    pub before: String,
    pub after: String,
}

impl Component {
    fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
        }
    }

    pub fn width(&self) -> usize {
        self.before.chars().count() + self.after.chars().count()
    }
}

pub type PostingComponents = [Component; SLOT_COUNT];

fn split_amount(amount: Option<&Amount>, options: RenderOptions) -> FormattedAmount {
    match amount {
        Some(amount) => amount.commodity.format(
            amount.quantity,
            amount.negative,
            amount.precision,
            options,
            &amount.numeral,
        ),
        None => FormattedAmount::default(),
    }
}

fn when(present: bool, text: &str) -> String {
    if present { text.to_string() } else { String::new() }
}

/// Breaks a posting into its nine slots.
pub fn posting_components(posting: &Posting, options: RenderOptions) -> PostingComponents {
    let assertion_cost = posting.assertion.as_ref().and_then(|a| a.cost.as_ref());

    let amount = split_amount(posting.amount.as_ref(), options);
    let cost = split_amount(posting.cost.as_ref().map(|c| &c.amount), options);
    let assertion = split_amount(posting.assertion.as_ref().map(|a| &a.amount), options);
    let asserted_cost = split_amount(assertion_cost.map(|c| &c.amount), options);

    let account = match &posting.account {
        Some(account) => format!("{INDENT}{}{GAP}", account.name),
        None => INDENT.to_string(),
    };
    let marker = |text: Option<&str>| text.map(|m| format!("{m} ")).unwrap_or_default();

    [
        Component::new(account, amount.before),
        Component::new(amount.after, when(posting.cost.is_some(), " ")),
        Component::new(marker(posting.cost.as_ref().map(|c| c.kind.marker())), cost.before),
        Component::new(cost.after, when(posting.assertion.is_some(), " ")),
        Component::new(
            marker(posting.assertion.as_ref().map(|a| a.kind.marker())),
            assertion.before,
        ),
        Component::new(assertion.after, when(assertion_cost.is_some(), " ")),
        Component::new(marker(assertion_cost.map(|c| c.kind.marker())), asserted_cost.before),
        Component::new(asserted_cost.after, when(posting.comment.is_some(), " ")),
        Component::new(posting.comment.clone().unwrap_or_default(), ""),
    ]
}

/// Target column of every slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlignmentProfile {
    pub columns: [usize; SLOT_COUNT],
}

impl AlignmentProfile {
    /// Columns fitting the widest posting in every slot, each slot starting
    /// where the previous one ends. With `floor`, no column is left of the
    /// corresponding floor column.
    pub fn fit(postings: &[PostingComponents], floor: Option<&[usize; SLOT_COUNT]>) -> Self {
        let mut columns = [0; SLOT_COUNT];
        for slot in 0..SLOT_COUNT {
            let previous = if slot > 0 { columns[slot - 1] } else { 0 };
            let widest = postings
                .iter()
                .map(|components| components[slot].width() + previous)
                .max()
                .unwrap_or(0);
            let minimum = floor.map_or(0, |floor| floor[slot]);
            columns[slot] = widest.max(minimum);
        }
        Self { columns }
    }

    pub fn for_mode(postings: &[PostingComponents], mode: AlignmentMode, global: &[usize; SLOT_COUNT]) -> Self {
        match mode {
            AlignmentMode::Global => Self { columns: *global },
            AlignmentMode::Transaction => Self::fit(postings, None),
            AlignmentMode::Both => Self::fit(postings, Some(global)),
        }
    }
}

/// Joins the components, padding each non-empty slot up to its column.
pub fn render_line(components: &PostingComponents, profile: &AlignmentProfile) -> String {
    let mut line = String::new();
    let mut length = 0;
    for (component, &target) in components.iter().zip(profile.columns.iter()) {
        let current = length + component.width();
        line.push_str(&component.before);
        if current < target && current > length {
            line.extend(std::iter::repeat_n(' ', target - current));
            length = target;
        } else {
            length = current;
        }
        line.push_str(&component.after);
    }
    line.truncate(line.trim_end().len());
    line
}

fn render_options(config: &Config) -> RenderOptions {
    RenderOptions {
        format_amounts: config.format_amounts,
        negatives_in_front: config.negatives_in_front_of_commodities,
    }
}

/// Realigns the well-formed postings of one transaction. `text` is the text
/// of the transaction's document.
pub fn format_transaction(transaction: &Transaction, text: &str, config: &Config) -> Vec<TextEdit> {
    let options = render_options(config);
    let formattable: Vec<(&Posting, PostingComponents)> = transaction
        .postings
        .iter()
        .filter(|posting| posting.matched && posting.is_well_formed())
        .map(|posting| (posting, posting_components(posting, options)))
        .collect();
    let components: Vec<PostingComponents> =
        formattable.iter().map(|(_, components)| components.clone()).collect();
    let profile = AlignmentProfile::for_mode(&components, config.alignment, &config.global_alignments);

    formattable
        .iter()
        .filter_map(|(posting, components)| {
            let rendered = render_line(components, &profile);
            (text.get(posting.span.range()) != Some(rendered.as_str()))
                .then(|| TextEdit::replace(posting.span, rendered))
        })
        .collect()
}

/// Collapses runs of blank lines to one empty line.
pub fn format_white_space(text: &str) -> Vec<TextEdit> {
    let mut edits = Vec::new();
    let mut previous_blank = false;
    for line in lines(text) {
        if !line.is_blank() {
            previous_blank = false;
            continue;
        }
        if previous_blank {
            edits.push(TextEdit::delete(Span::new(line.start, line.next)));
        } else if !line.text.is_empty() {
            edits.push(TextEdit::delete(line.span()));
        }
        previous_blank = true;
    }
    edits
}

/// All edits for one document of `journal`, sorted by position.
pub fn format_document(journal: &Journal, document: DocumentId, config: &Config) -> Vec<TextEdit> {
    let Some(text) = journal.document(document).and_then(|d| d.text.as_deref()) else {
        return Vec::new();
    };

    let mut edits = Vec::new();
    if config.format_transactions {
        for transaction in journal.transactions_in(document) {
            edits.extend(format_transaction(transaction, text, config));
        }
    }
    if config.format_white_space {
        edits.extend(format_white_space(text));
    }
    edits.sort_by_key(|edit| edit.span);

    debug!(%document, edits = edits.len(), "formatted document");
    edits
}

/// Edits for every document that needs any.
pub fn format_journal(journal: &Journal, config: &Config) -> BTreeMap<DocumentId, Vec<TextEdit>> {
    journal
        .documents()
        .iter()
        .map(|document| (document.id, format_document(journal, document.id, config)))
        .filter(|(_, edits)| !edits.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_text(text: &str, config: &Config) -> String {
        let journal = Journal::parse(text, config);
        apply_edits(text, &format_document(&journal, DocumentId::ROOT, config))
    }

    #[test]
    fn edits_apply_back_to_front() {
        let edits = vec![
            TextEdit::replace(Span::new(0, 1), "AA"),
            TextEdit::insert(2, "-"),
            TextEdit::delete(Span::new(3, 4)),
        ];
        assert_eq!(apply_edits("abcd", &edits), "AAb-c");
    }

    #[test]
    fn render_pads_only_present_slots() {
        let mut components: PostingComponents = Default::default();
        components[0] = Component::new("    a  ", " 5");
        components[1] = Component::new(".00", "");
        let profile = AlignmentProfile {
            columns: [12, 20, 20, 20, 20, 20, 20, 20, 20],
        };
        assert_eq!(render_line(&components, &profile), "    a      5.00");
    }

    #[test]
    fn fit_chains_columns() {
        let mut short: PostingComponents = Default::default();
        short[0] = Component::new("    a  ", " 5");
        let mut long: PostingComponents = Default::default();
        long[0] = Component::new("    Assets  ", " 10");
        long[1] = Component::new(".50", "");
        let profile = AlignmentProfile::fit(&[short.clone(), long.clone()], None);
        assert_eq!(profile.columns[0], 15);
        assert_eq!(profile.columns[1], 18);
        assert_eq!(profile.columns[8], 18);

        let floored = AlignmentProfile::fit(&[short, long], Some(&[20, 0, 0, 0, 0, 0, 0, 0, 30]));
        assert_eq!(floored.columns[0], 20);
        assert_eq!(floored.columns[1], 23);
        assert_eq!(floored.columns[8], 30);
    }

    #[test]
    fn aligns_decimal_marks() {
        let text = "2024-01-01 x\n    Expenses:Food  $10.50\n    Assets:Checking  $-100.5\n";
        let formatted = format_text(text, &Config::default());
        assert_eq!(
            formatted,
            "2024-01-01 x\n    Expenses:Food      $10.50\n    Assets:Checking  -$100.5\n"
        );
    }

    #[test]
    fn second_format_is_a_no_op() {
        let text = "2024-01-01 x\n  a  1 AAPL @ $150.00  ; buy\n  bb  $-150\n\n\n  \n2024-01-02 y\n  c  1\n  d\n";
        let config = Config::default();
        let once = format_text(text, &config);
        let journal = Journal::parse(once.as_str(), &config);
        assert!(format_document(&journal, DocumentId::ROOT, &config).is_empty());
    }

    #[test]
    fn malformed_posting_is_left_alone() {
        let text = "commodity $1,000.00\n\n2024-01-01 x\n  a  $1,23.4\n  b  $5\n";
        let formatted = format_text(text, &Config::default());
        assert!(formatted.contains("\n  a  $1,23.4\n"));
        assert!(formatted.contains("\n    b   $5\n"));
    }

    #[test]
    fn blank_runs_collapse() {
        let text = "a\n\n \n\t\nb\n   \nc";
        let edits = format_white_space(text);
        assert_eq!(apply_edits(text, &edits), "a\n\nb\n\nc");
    }

    #[test]
    fn disabled_formatting_produces_nothing() {
        let config = Config {
            format_transactions: false,
            format_white_space: false,
            ..Config::default()
        };
        let text = "2024-01-01 x\n  a  $1\n  b\n\n\n";
        assert_eq!(format_text(text, &config), text);
    }
}
