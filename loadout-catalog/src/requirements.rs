//! Part prerequisite expressions.
//!
//! ```text
//! expr   := term (("|" | "or") term)*
//! term   := factor (("&" | "and" | "+") factor)*
//! factor := atom | "(" expr ")"
//! atom   := ("part" | "has") ":" INT | "type" ":" SLUG | "manufacturer" ":" SLUG
//! ```
//!
//! Empty text and `none` are always satisfied. Expressions are parsed once,
//! when the catalog is built, and evaluated as a [`Predicate`] tree.

use loadout_types::ids::{ItemType, Manufacturer, PartId};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Predicate {
    Always,
    HasPart(PartId),
    ItemType(ItemType),
    Manufacturer(Manufacturer),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

/// What a predicate is evaluated against: the build's own identity and the
/// other parts selected alongside the part being checked.
#[derive(Debug, Clone, Copy)]
pub struct RequirementContext<'a> {
    pub manufacturer: &'a Manufacturer,
    pub item_type: &'a ItemType,
    pub parts: &'a BTreeSet<PartId>,
}

impl Predicate {
    pub fn evaluate(&self, ctx: &RequirementContext<'_>) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::HasPart(id) => ctx.parts.contains(id),
            Predicate::ItemType(t) => t == ctx.item_type,
            Predicate::Manufacturer(m) => m == ctx.manufacturer,
            Predicate::All(items) => items.iter().all(|p| p.evaluate(ctx)),
            Predicate::Any(items) => items.iter().any(|p| p.evaluate(ctx)),
        }
    }

    /// Every part id named by a `part:` atom, ascending.
    pub fn referenced_parts(&self) -> BTreeSet<PartId> {
        let mut out = BTreeSet::new();
        self.collect_parts(&mut out);
        out
    }

    fn collect_parts(&self, out: &mut BTreeSet<PartId>) {
        match self {
            Predicate::HasPart(id) => {
                out.insert(*id);
            }
            Predicate::All(items) | Predicate::Any(items) => {
                for item in items {
                    item.collect_parts(out);
                }
            }
            Predicate::Always | Predicate::ItemType(_) | Predicate::Manufacturer(_) => {}
        }
    }

    pub fn is_always(&self) -> bool {
        matches!(self, Predicate::Always)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Always => f.write_str("none"),
            Predicate::HasPart(id) => write!(f, "part:{}", id),
            Predicate::ItemType(t) => write!(f, "type:{}", t),
            Predicate::Manufacturer(m) => write!(f, "manufacturer:{}", m),
            Predicate::All(items) => write_joined(f, items, " & "),
            Predicate::Any(items) => write_joined(f, items, " | "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Predicate], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        match item {
            Predicate::All(_) | Predicate::Any(_) => write!(f, "({})", item)?,
            _ => write!(f, "{}", item)?,
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequirementErrorKind {
    #[error("unknown token '{0}'")]
    UnknownToken(String),

    #[error("missing value after '{0}'")]
    MissingValue(String),

    #[error("part id '{0}' is not a number")]
    InvalidPartId(String),

    #[error("operator without an operand")]
    MissingOperand,

    #[error("two operands without an operator")]
    MissingOperator,

    #[error("unmatched parenthesis")]
    UnmatchedParen,
}

/// The text could not be parsed into recognized atoms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed requirement '{text}' at offset {offset}: {kind}")]
pub struct RequirementError {
    pub text: String,
    pub offset: usize,
    pub kind: RequirementErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Atom(Predicate),
}

pub fn parse(text: &str) -> Result<Predicate, RequirementError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(Predicate::Always);
    }

    let tokens = tokenize(text)?;
    let mut parser = Parser {
        text,
        tokens: &tokens,
        pos: 0,
    };
    let predicate = parser.expr()?;
    match parser.peek() {
        None => Ok(predicate),
        Some((offset, Token::RParen)) => Err(parser.error(*offset, RequirementErrorKind::UnmatchedParen)),
        Some((offset, _)) => Err(parser.error(*offset, RequirementErrorKind::MissingOperator)),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-' | '.')
}

fn tokenize(text: &str) -> Result<Vec<(usize, Token)>, RequirementError> {
    let err = |offset: usize, kind| RequirementError {
        text: text.to_string(),
        offset,
        kind,
    };

    let mut out = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some(&(offset, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                out.push((offset, Token::LParen));
            }
            ')' => {
                chars.next();
                out.push((offset, Token::RParen));
            }
            '&' | '+' => {
                chars.next();
                if c == '&' && matches!(chars.peek(), Some((_, '&'))) {
                    chars.next();
                }
                out.push((offset, Token::And));
            }
            '|' => {
                chars.next();
                if matches!(chars.peek(), Some((_, '|'))) {
                    chars.next();
                }
                out.push((offset, Token::Or));
            }
            c if is_word_char(c) => {
                let mut end = offset;
                while let Some(&(i, c)) = chars.peek() {
                    if !is_word_char(c) {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                let word = &text[offset..end];
                out.push((offset, word_token(word).map_err(|kind| err(offset, kind))?));
            }
            other => return Err(err(offset, RequirementErrorKind::UnknownToken(other.to_string()))),
        }
    }
    Ok(out)
}

fn word_token(word: &str) -> Result<Token, RequirementErrorKind> {
    let lower = word.to_ascii_lowercase();
    match lower.as_str() {
        "and" => return Ok(Token::And),
        "or" => return Ok(Token::Or),
        _ => {}
    }

    let Some((key, value)) = lower.split_once(':') else {
        return Err(RequirementErrorKind::UnknownToken(word.to_string()));
    };
    if value.is_empty() {
        return Err(RequirementErrorKind::MissingValue(format!("{key}:")));
    }
    match key {
        "part" | "has" => {
            if !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(RequirementErrorKind::InvalidPartId(value.to_string()));
            }
            let id = value
                .parse::<u32>()
                .map_err(|_| RequirementErrorKind::InvalidPartId(value.to_string()))?;
            Ok(Token::Atom(Predicate::HasPart(PartId(id))))
        }
        "type" => Ok(Token::Atom(Predicate::ItemType(ItemType::new(value)))),
        "manufacturer" => Ok(Token::Atom(Predicate::Manufacturer(Manufacturer::new(value)))),
        _ => Err(RequirementErrorKind::UnknownToken(word.to_string())),
    }
}

struct Parser<'a> {
    text: &'a str,
    tokens: &'a [(usize, Token)],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&(usize, Token)> {
        self.tokens.get(self.pos)
    }

    fn end_offset(&self) -> usize {
        self.text.len()
    }

    fn error(&self, offset: usize, kind: RequirementErrorKind) -> RequirementError {
        RequirementError {
            text: self.text.to_string(),
            offset,
            kind,
        }
    }

    fn expr(&mut self) -> Result<Predicate, RequirementError> {
        let mut terms = vec![self.term()?];
        while matches!(self.peek(), Some((_, Token::Or))) {
            self.pos += 1;
            terms.push(self.term()?);
        }
        Ok(collapse(terms, Predicate::Any))
    }

    fn term(&mut self) -> Result<Predicate, RequirementError> {
        let mut factors = vec![self.factor()?];
        while matches!(self.peek(), Some((_, Token::And))) {
            self.pos += 1;
            factors.push(self.factor()?);
        }
        Ok(collapse(factors, Predicate::All))
    }

    fn factor(&mut self) -> Result<Predicate, RequirementError> {
        let Some((offset, token)) = self.peek().cloned() else {
            return Err(self.error(self.end_offset(), RequirementErrorKind::MissingOperand));
        };
        match token {
            Token::Atom(predicate) => {
                self.pos += 1;
                Ok(predicate)
            }
            Token::LParen => {
                self.pos += 1;
                let inner = self.expr()?;
                match self.peek() {
                    Some((_, Token::RParen)) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    _ => Err(self.error(offset, RequirementErrorKind::UnmatchedParen)),
                }
            }
            Token::RParen | Token::And | Token::Or => {
                Err(self.error(offset, RequirementErrorKind::MissingOperand))
            }
        }
    }
}

fn collapse(mut items: Vec<Predicate>, wrap: fn(Vec<Predicate>) -> Predicate) -> Predicate {
    if items.len() == 1 {
        items.remove(0)
    } else {
        wrap(items)
    }
}
