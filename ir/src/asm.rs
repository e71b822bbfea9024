//! Custom assembly syntax for completion-barrier lists and async tokens.
//!
//! ```text
//! barrier-and-pred   := `,` ssa-value `[` ssa-value `]`
//! barriers-and-preds := (barrier-and-pred)*
//! token              := `[` ssa-value? `]`
//! dep-operand        := token?
//! ```
//!
//! The parsers work on the operand list only and return names; resolving names
//! to values is left to the hosting parser.

use std::fmt;

use snafu::ensure;
use tracing::trace;

use crate::error::{ExpectedSnafu, ParseError};
use crate::ops::{CompletionBarrier, OptionalToken};

/// SSA operand name as written, without the leading `%`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnresolvedOperand(pub String);

impl UnresolvedOperand {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnresolvedOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.' | '-' | '#')
}

/// Cursor over an operand list.
#[derive(Debug, Clone)]
pub struct AsmParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> AsmParser<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Byte offset of the next unread character.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Unconsumed input.
    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub fn is_at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.rest().is_empty()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Consume `punct` if it is next.
    pub fn parse_optional(&mut self, punct: char) -> bool {
        self.skip_whitespace();
        if self.rest().starts_with(punct) {
            self.pos += punct.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn parse_punct(&mut self, punct: char, expected: &'static str) -> Result<(), ParseError> {
        ensure!(self.parse_optional(punct), ExpectedSnafu { expected, offset: self.pos });
        Ok(())
    }

    /// `%name`
    pub fn parse_operand(&mut self) -> Result<UnresolvedOperand, ParseError> {
        self.parse_punct('%', "SSA value")?;
        let name_len = self.rest().find(|c: char| !is_name_char(c)).unwrap_or(self.rest().len());
        ensure!(name_len > 0, ExpectedSnafu { expected: "SSA value name", offset: self.pos });
        let name = &self.rest()[..name_len];
        self.pos += name_len;
        Ok(UnresolvedOperand::new(name))
    }

    /// Zero or more `, %barrier[%pred]` pairs.
    pub fn parse_barriers_and_preds(&mut self) -> Result<Vec<CompletionBarrier<UnresolvedOperand>>, ParseError> {
        let mut barriers = Vec::new();
        while self.parse_optional(',') {
            let barrier = self.parse_operand()?;
            self.parse_punct('[', "'['")?;
            let pred = self.parse_operand()?;
            self.parse_punct(']', "']'")?;
            barriers.push(CompletionBarrier::new(barrier, pred));
        }
        trace!(count = barriers.len(), "parsed completion barriers");
        Ok(barriers)
    }

    /// Optional `[]` or `[%dep]`.
    pub fn parse_token(&mut self) -> Result<OptionalToken<UnresolvedOperand>, ParseError> {
        if !self.parse_optional('[') {
            return Ok(OptionalToken::Absent);
        }
        if self.parse_optional(']') {
            return Ok(OptionalToken::Present(None));
        }
        let dep = self.parse_operand()?;
        self.parse_punct(']', "']'")?;
        Ok(OptionalToken::Present(Some(dep)))
    }
}

/// Parse a complete barrier list.
pub fn parse_barriers_and_preds(src: &str) -> Result<Vec<CompletionBarrier<UnresolvedOperand>>, ParseError> {
    let mut parser = AsmParser::new(src);
    let barriers = parser.parse_barriers_and_preds()?;
    ensure!(parser.is_at_end(), ExpectedSnafu { expected: "end of barrier list", offset: parser.offset() });
    Ok(barriers)
}

/// Parse a complete optional token.
pub fn parse_token(src: &str) -> Result<OptionalToken<UnresolvedOperand>, ParseError> {
    let mut parser = AsmParser::new(src);
    let token = parser.parse_token()?;
    ensure!(parser.is_at_end(), ExpectedSnafu { expected: "end of token", offset: parser.offset() });
    Ok(token)
}

pub fn print_barriers_and_preds<V: fmt::Display>(
    out: &mut impl fmt::Write,
    barriers: &[CompletionBarrier<V>],
) -> fmt::Result {
    for CompletionBarrier { barrier, pred } in barriers {
        write!(out, ", {barrier}[{pred}]")?;
    }
    Ok(())
}

pub fn print_token<V: fmt::Display>(out: &mut impl fmt::Write, token: &OptionalToken<V>) -> fmt::Result {
    match token {
        OptionalToken::Absent => Ok(()),
        OptionalToken::Present(None) => out.write_str("[]"),
        OptionalToken::Present(Some(dep)) => write!(out, "[{dep}]"),
    }
}
