// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Scalar filter expressions for the in-memory store
//!
//! Grammar: `condition (and condition)*`, where a condition is
//! `field op literal` with `op` one of `== != > >= < <=`. Literals are integers,
//! floats, quoted strings (`"..."` or `'...'`) and `true` / `false`. `&&` is accepted
//! for `and`. An empty expression matches every row.

use std::cmp::Ordering;

use crate::core::errors::StoreError;
use crate::schema::FieldValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Op(CompareOp),
    Literal(Literal),
    And,
}

#[derive(Debug, Clone, PartialEq)]
struct Condition {
    field: String,
    op: CompareOp,
    literal: Literal,
}

/// A parsed filter expression
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    conditions: Vec<Condition>,
}

fn invalid(expression: &str, message: impl std::fmt::Display) -> StoreError {
    StoreError::Rejected(format!("invalid filter '{}': {}", expression, message))
}

fn tokenize(expression: &str) -> Result<Vec<Token>, StoreError> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '"' || c == '\'' {
            chars.next();
            let mut text = String::new();
            let mut terminated = false;
            while let Some(ch) = chars.next() {
                match ch {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            text.push(escaped);
                        }
                    }
                    ch if ch == c => {
                        terminated = true;
                        break;
                    }
                    ch => text.push(ch),
                }
            }
            if !terminated {
                return Err(invalid(expression, "unterminated string"));
            }
            tokens.push(Token::Literal(Literal::Str(text)));
            continue;
        }

        if matches!(c, '=' | '!' | '>' | '<') {
            chars.next();
            let followed_by_eq = chars.peek() == Some(&'=');
            if followed_by_eq {
                chars.next();
            }
            let op = match (c, followed_by_eq) {
                ('=', true) => CompareOp::Eq,
                ('!', true) => CompareOp::Ne,
                ('>', true) => CompareOp::Ge,
                ('>', false) => CompareOp::Gt,
                ('<', true) => CompareOp::Le,
                ('<', false) => CompareOp::Lt,
                _ => return Err(invalid(expression, format!("unexpected '{}'", c))),
            };
            tokens.push(Token::Op(op));
            continue;
        }

        if c == '&' {
            chars.next();
            if chars.next() != Some('&') {
                return Err(invalid(expression, "expected '&&'"));
            }
            tokens.push(Token::And);
            continue;
        }

        if c.is_ascii_digit() || c == '-' || c == '.' {
            let mut text = String::new();
            while let Some(&ch) = chars.peek() {
                let sign_after_exponent =
                    (ch == '-' || ch == '+') && (text.is_empty() || text.ends_with(|c: char| c == 'e' || c == 'E'));
                if ch.is_ascii_digit() || ch == '.' || ch == 'e' || ch == 'E' || sign_after_exponent {
                    text.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            let literal = if text.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
                text.parse::<f64>().map(Literal::Float).ok()
            } else {
                text.parse::<i64>().map(Literal::Int).ok()
            };
            let literal =
                literal.ok_or_else(|| invalid(expression, format!("bad number '{}'", text)))?;
            tokens.push(Token::Literal(literal));
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let mut text = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    text.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            let token = match text.to_ascii_lowercase().as_str() {
                "and" => Token::And,
                "true" => Token::Literal(Literal::Bool(true)),
                "false" => Token::Literal(Literal::Bool(false)),
                _ => Token::Ident(text),
            };
            tokens.push(token);
            continue;
        }

        return Err(invalid(expression, format!("unexpected '{}'", c)));
    }

    Ok(tokens)
}

impl Filter {
    pub fn parse(expression: &str) -> Result<Self, StoreError> {
        let mut tokens = tokenize(expression)?.into_iter();
        let mut conditions = Vec::new();

        loop {
            let condition = match (tokens.next(), tokens.next(), tokens.next()) {
                (None, None, None) if conditions.is_empty() => break,
                (Some(Token::Ident(field)), Some(Token::Op(op)), Some(Token::Literal(literal))) => {
                    Condition { field, op, literal }
                }
                _ => return Err(invalid(expression, "expected `field op literal`")),
            };
            conditions.push(condition);

            match tokens.next() {
                None => break,
                Some(Token::And) => continue,
                Some(_) => return Err(invalid(expression, "expected `and`")),
            }
        }

        Ok(Self { conditions })
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate against one row; `lookup` resolves field values by name
    pub fn matches<'a>(
        &self,
        lookup: impl Fn(&str) -> Option<&'a FieldValue>,
    ) -> Result<bool, StoreError> {
        for condition in &self.conditions {
            let value = lookup(&condition.field).ok_or_else(|| {
                StoreError::Rejected(format!("filter field '{}' does not exist", condition.field))
            })?;
            if !condition.evaluate(value)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Condition {
    fn evaluate(&self, value: &FieldValue) -> Result<bool, StoreError> {
        let ordering = match (value, &self.literal) {
            (FieldValue::VarChar(v), Literal::Str(l)) => Some(v.as_str().cmp(l.as_str())),
            (FieldValue::Bool(v), Literal::Bool(l)) => {
                if !matches!(self.op, CompareOp::Eq | CompareOp::Ne) {
                    return Err(self.incomparable(value));
                }
                Some(v.cmp(l))
            }
            (value, literal) => match (as_integer(value), as_float(value), literal) {
                (Some(v), _, Literal::Int(l)) => Some(v.cmp(l)),
                (_, Some(v), Literal::Int(l)) => v.partial_cmp(&(*l as f64)),
                (_, Some(v), Literal::Float(l)) => v.partial_cmp(l),
                _ => return Err(self.incomparable(value)),
            },
        };
        Ok(ordering.map(|o| self.op.holds(o)).unwrap_or(false))
    }

    fn incomparable(&self, value: &FieldValue) -> StoreError {
        StoreError::Rejected(format!(
            "filter cannot compare {} field '{}' with {:?} using {:?}",
            value.semantic_type(),
            self.field,
            self.literal,
            self.op
        ))
    }
}

fn as_integer(value: &FieldValue) -> Option<i64> {
    match value {
        FieldValue::Int8(v) => Some(i64::from(*v)),
        FieldValue::Int16(v) => Some(i64::from(*v)),
        FieldValue::Int32(v) => Some(i64::from(*v)),
        FieldValue::Int64(v) => Some(*v),
        FieldValue::Int(v) => i64::try_from(*v).ok(),
        _ => None,
    }
}

fn as_float(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Float(v) => Some(f64::from(*v)),
        FieldValue::Double(v) => Some(*v),
        other => as_integer(other).map(|v| v as f64),
    }
}
