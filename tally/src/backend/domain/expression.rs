//! Keypad arithmetic.
//!
//! The keypad buffer is a small arithmetic expression over decimals:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := number | '(' expr ')'
//! number  := digits ['.' digits] | '.' digits
//! ```
//!
//! `×` and `÷` are accepted for `*` and `/`. Evaluation is exact decimal
//! arithmetic; any failure collapses to the sentinel `"0"` in [`evaluate`],
//! while [`evaluate_decimal`] reports the typed reason.

use log::debug;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Result of any evaluation that cannot produce a number
pub const SENTINEL: &str = "0";

const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("Expression is empty")]
    Empty,

    #[error("Character '{0}' is not allowed")]
    DisallowedCharacter(char),

    #[error("Unexpected token at position {0}")]
    UnexpectedToken(usize),

    #[error("Unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Expression nests too deeply")]
    TooDeep,
}

pub type ExpressionResult<T> = std::result::Result<T, ExpressionError>;

/// Replace display operators with their ASCII forms
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '×' => '*',
            '÷' => '/',
            '−' => '-',
            other => other,
        })
        .collect()
}

/// Evaluate a keypad buffer to its canonical decimal string, or `"0"` on any failure
pub fn evaluate(input: &str) -> String {
    match evaluate_decimal(input) {
        Ok(value) => format_decimal(value),
        Err(ExpressionError::Empty) => SENTINEL.to_string(),
        Err(e) => {
            debug!("Expression '{}' evaluated to {}: {}", input, SENTINEL, e);
            SENTINEL.to_string()
        }
    }
}

/// Evaluate a keypad buffer.
///
/// Trailing operators and a trailing decimal point are dropped first, so an
/// unfinished entry such as `12+` evaluates as `12`.
pub fn evaluate_decimal(input: &str) -> ExpressionResult<Decimal> {
    let normalized = normalize(input);
    let trimmed = normalized
        .trim()
        .trim_end_matches(|c: char| matches!(c, '+' | '-' | '*' | '/' | '.'))
        .trim_end();

    if trimmed.is_empty() {
        return Err(ExpressionError::Empty);
    }

    if let Some(c) = trimmed
        .chars()
        .find(|c| !(c.is_ascii_digit() || "+-*/().".contains(*c) || c.is_whitespace()))
    {
        return Err(ExpressionError::DisallowedCharacter(c));
    }

    let tokens = tokenize(trimmed)?;
    let mut parser = Parser::new(&tokens);
    let value = parser.parse_expression()?;

    match parser.current() {
        Token::Eof => Ok(value),
        Token::RightParen => Err(ExpressionError::UnbalancedParentheses),
        _ => Err(ExpressionError::UnexpectedToken(parser.pos)),
    }
}

/// Canonical text for a value: no trailing fractional zeros, never `-0`
pub fn format_decimal(value: Decimal) -> String {
    if value.is_zero() {
        return SENTINEL.to_string();
    }
    value.normalize().to_string()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Decimal),
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
    Eof,
}

fn tokenize(input: &str) -> ExpressionResult<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        let token = match c {
            c if c.is_whitespace() => {
                pos += 1;
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '0'..='9' | '.' => {
                let start = pos;
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
                if pos < chars.len() && chars[pos] == '.' {
                    pos += 1;
                    let fraction_start = pos;
                    while pos < chars.len() && chars[pos].is_ascii_digit() {
                        pos += 1;
                    }
                    if pos == fraction_start {
                        let text: String = chars[start..pos].iter().collect();
                        return Err(ExpressionError::InvalidNumber(text));
                    }
                }
                let text: String = chars[start..pos].iter().collect();
                let value = Decimal::from_str(&text)
                    .map_err(|_| ExpressionError::InvalidNumber(text.clone()))?;
                tokens.push(Token::Number(value));
                continue;
            }
            other => return Err(ExpressionError::DisallowedCharacter(other)),
        };
        tokens.push(token);
        pos += 1;
    }

    tokens.push(Token::Eof);
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn consume(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn descend(&mut self) -> ExpressionResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExpressionError::TooDeep);
        }
        Ok(())
    }

    fn parse_expression(&mut self) -> ExpressionResult<Decimal> {
        let mut left = self.parse_term()?;

        loop {
            let op = self.current().clone();
            match op {
                Token::Plus | Token::Minus => self.consume(),
                _ => break,
            }

            let right = self.parse_term()?;
            left = match op {
                Token::Plus => left.checked_add(right),
                _ => left.checked_sub(right),
            }
            .ok_or(ExpressionError::Overflow)?;
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> ExpressionResult<Decimal> {
        let mut left = self.parse_unary()?;

        loop {
            let op = self.current().clone();
            match op {
                Token::Star | Token::Slash => self.consume(),
                _ => break,
            }

            let right = self.parse_unary()?;
            left = match op {
                Token::Star => left.checked_mul(right).ok_or(ExpressionError::Overflow)?,
                _ => {
                    if right.is_zero() {
                        return Err(ExpressionError::DivisionByZero);
                    }
                    left.checked_div(right).ok_or(ExpressionError::Overflow)?
                }
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ExpressionResult<Decimal> {
        match self.current() {
            Token::Minus => {
                self.consume();
                self.descend()?;
                let operand = self.parse_unary()?;
                self.depth -= 1;
                Ok(-operand)
            }
            Token::Plus => {
                self.consume();
                self.descend()?;
                let operand = self.parse_unary()?;
                self.depth -= 1;
                Ok(operand)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> ExpressionResult<Decimal> {
        match self.current().clone() {
            Token::Number(value) => {
                self.consume();
                Ok(value)
            }
            Token::LeftParen => {
                self.consume();
                self.descend()?;
                let value = self.parse_expression()?;
                if self.current() != &Token::RightParen {
                    return Err(ExpressionError::UnbalancedParentheses);
                }
                self.consume();
                self.depth -= 1;
                Ok(value)
            }
            Token::RightParen => Err(ExpressionError::UnbalancedParentheses),
            _ => Err(ExpressionError::UnexpectedToken(self.pos)),
        }
    }
}
