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

//! Lexical primitives shared by the directive and posting scanners.

use crate::base::Span;

/// One line of a document, without its line terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Line<'a> {
    /// Byte offset of the first character.
    pub start: usize,
    pub text: &'a str,
    /// Byte offset just past the line terminator (or end of text).
    pub next: usize,
}

impl Line<'_> {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.start + self.text.len())
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Starts with a space or tab and has some content.
    pub fn is_indented(&self) -> bool {
        self.text.starts_with([' ', '\t']) && !self.is_blank()
    }
}

/// Iterates the lines of `text` the way [`str::lines`] does, keeping offsets.
pub(crate) fn lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    let mut start = 0;
    std::iter::from_fn(move || {
        if start >= text.len() {
            return None;
        }
        let rest = &text[start..];
        let (raw, next) = match rest.find('\n') {
            Some(index) => (&rest[..index], start + index + 1),
            None => (rest, text.len()),
        };
        let line = Line {
            start,
            text: raw.strip_suffix('\r').unwrap_or(raw),
            next,
        };
        start = next;
        Some(line)
    })
}

pub(crate) fn is_blank_char(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Forward-only cursor over a single line.
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Moves to `pos`, which must lie on a character boundary.
    pub fn set_pos(&mut self, pos: usize) {
        debug_assert!(self.text.is_char_boundary(pos));
        self.pos = pos.min(self.text.len());
    }

    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consumes `expected` if it is next.
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consumes a `-` or `+` sign, returning whether it was a minus.
    pub fn eat_sign(&mut self) -> Option<bool> {
        match self.peek() {
            Some('-') => {
                self.bump();
                Some(true)
            }
            Some('+') => {
                self.bump();
                Some(false)
            }
            _ => None,
        }
    }

    /// Consumes characters while `predicate` holds and returns their range.
    pub fn eat_while(&mut self, predicate: impl Fn(char) -> bool) -> Span {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        Span::new(start, self.pos)
    }

    /// Consumes spaces and tabs, returning how many characters were skipped.
    pub fn skip_blanks(&mut self) -> usize {
        self.eat_while(is_blank_char).len()
    }

    pub fn slice(&self, span: Span) -> &'a str {
        &self.text[span.range()]
    }

    /// Consumes a commodity symbol: either a double-quoted string or a run of
    /// characters not in `excluded`. Returns `None` if nothing was consumed.
    pub fn eat_unit(&mut self, excluded: impl Fn(char) -> bool) -> Option<Span> {
        let start = self.pos;
        if self.peek() == Some('"') {
            let mut ahead = self.clone();
            ahead.bump();
            let body = ahead.eat_while(|c| c != '"');
            if !body.is_empty() && ahead.eat('"') {
                *self = ahead;
                return Some(Span::new(start, self.pos));
            }
            return None;
        }
        let run = self.eat_while(|c| !excluded(c) && c != '"' && !is_blank_char(c));
        (!run.is_empty()).then_some(run)
    }

    /// Consumes a numeral: a digit run optionally continued by digits, `.`
    /// and `,`, allowing one space right after the leading digit run when
    /// more digits or punctuation follow it.
    pub fn eat_numeral(&mut self) -> Option<Span> {
        let start = self.pos;
        let leading = self.eat_while(|c| c.is_ascii_digit());
        if leading.is_empty() {
            return None;
        }
        let continues = |c: char| c.is_ascii_digit() || c == '.' || c == ',';
        if self.peek() == Some(' ') && self.peek_second().is_some_and(continues) {
            self.bump();
        }
        self.eat_while(continues);
        Some(Span::new(start, self.pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_keep_offsets_and_strip_carriage_returns() {
        let text = "a\r\n\n  b\nlast";
        let collected: Vec<_> = lines(text).map(|l| (l.start, l.text, l.next)).collect();
        assert_eq!(
            collected,
            vec![(0, "a", 3), (3, "", 4), (4, "  b", 8), (8, "last", 12)]
        );
    }

    #[test]
    fn trailing_newline_adds_no_empty_line() {
        assert_eq!(lines("x\n").count(), 1);
        assert_eq!(lines("").count(), 0);
    }

    #[test]
    fn indentation_requires_content() {
        let mut it = lines("  a\n   \n\tb\nc");
        assert!(it.next().unwrap().is_indented());
        assert!(!it.next().unwrap().is_indented());
        assert!(it.next().unwrap().is_indented());
        assert!(!it.next().unwrap().is_indented());
    }

    #[test]
    fn numeral_allows_one_inner_space() {
        let mut cursor = Cursor::new("1 000,50 EUR");
        let span = cursor.eat_numeral().unwrap();
        assert_eq!(cursor.slice(span), "1 000,50");
        assert_eq!(cursor.rest(), " EUR");

        let mut cursor = Cursor::new("100 EUR");
        let span = cursor.eat_numeral().unwrap();
        assert_eq!(cursor.slice(span), "100");
    }

    #[test]
    fn quoted_unit_includes_quotes() {
        let mut cursor = Cursor::new("\"ACME 1\" 10");
        let span = cursor.eat_unit(|c| c.is_ascii_digit()).unwrap();
        assert_eq!(cursor.slice(span), "\"ACME 1\"");
    }

    #[test]
    fn unterminated_quote_is_not_a_unit() {
        let mut cursor = Cursor::new("\"ACME 10");
        assert_eq!(cursor.eat_unit(|c| c.is_ascii_digit()), None);
        assert_eq!(cursor.pos(), 0);
    }
}
