// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Source positions and spans shared by the lexer, parser, and AST.

/// A single point in the source text.
///
/// `line` and `column` are 1-based and are only populated when the lexer
/// was asked to track positions (see `LexerOptions::track_positions`);
/// otherwise they are left at `0` to avoid the bookkeeping cost on the
/// hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Byte offset from the start of the source.
    pub offset: usize,
    /// 1-based line number, or 0 if position tracking was disabled.
    pub line: u32,
    /// 1-based column number, or 0 if position tracking was disabled.
    pub column: u32,
}

impl Position {
    /// Construct a position with only a byte offset (no line/column info).
    pub const fn at_offset(offset: usize) -> Self {
        Self { offset, line: 0, column: 0 }
    }
}

/// A half-open source range, `[start, end)`, spanning a token or an AST
/// node's full extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// Start of the range (inclusive).
    pub start: Position,
    /// End of the range (exclusive).
    pub end: Position,
}

impl Span {
    /// An empty span at a single offset, used for synthetic nodes (e.g.
    /// the cursor placeholder) that have no real source extent.
    pub const fn empty_at(offset: usize) -> Self {
        Self {
            start: Position::at_offset(offset),
            end: Position::at_offset(offset),
        }
    }

    /// The smallest span that contains both `self` and `other` — used to
    /// compute a parent node's range as the hull of its children's ranges
    /// (see the range-containment invariant).
    pub fn hull(self, other: Span) -> Span {
        let start = if other.start.offset < self.start.offset { other.start } else { self.start };
        let end = if other.end.offset > self.end.offset { other.end } else { self.end };
        Span { start, end }
    }

    /// Whether `self` fully contains `other` (used by the range-containment
    /// property test).
    pub fn contains(&self, other: &Span) -> bool {
        self.start.offset <= other.start.offset && self.end.offset >= other.end.offset
    }
}
