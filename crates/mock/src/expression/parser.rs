use std::collections::{HashMap, HashSet};

use super::{Comparator, Expression, Operand};
use crate::error::{MockError, Result};
use crate::value::AttributeValue;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Name(String),
    Value(String),
    LParen,
    RParen,
    Comparator(Comparator),
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn invalid(source: &str, reason: impl std::fmt::Display) -> MockError {
    MockError::Validation(format!(
        "Invalid expression: {reason}; expression: \"{source}\""
    ))
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '=' => Token::Comparator(Comparator::Eq),
            '>' => Token::Comparator(Comparator::Gt),
            '#' | ':' | '_' | 'a'..='z' | 'A'..='Z' => {
                let mut end = start + c.len_utf8();
                while let Some(&(index, next)) = chars.peek() {
                    if !is_word_char(next) {
                        break;
                    }
                    end = index + next.len_utf8();
                    chars.next();
                }
                let word = &source[start..end];
                match c {
                    '#' | ':' if word.len() == 1 => {
                        return Err(invalid(source, format!("empty placeholder at {start}")))
                    }
                    '#' => Token::Name(word.to_string()),
                    ':' => Token::Value(word.to_string()),
                    _ => Token::Ident(word.to_string()),
                }
            }
            other => {
                return Err(invalid(
                    source,
                    format!("unexpected character '{other}' at {start}"),
                ))
            }
        };
        tokens.push(token);
    }

    Ok(tokens)
}

/// Placeholder maps shared by the expressions of one request.
///
/// Tracks which placeholders were referenced so that unused entries can be
/// rejected once every expression has been parsed.
#[derive(Debug, Default)]
pub struct Placeholders {
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
    used_names: HashSet<String>,
    used_values: HashSet<String>,
}

impl Placeholders {
    pub fn new(
        names: Option<HashMap<String, String>>,
        values: Option<HashMap<String, AttributeValue>>,
    ) -> Self {
        Self {
            names: names.unwrap_or_default(),
            values: values.unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Parses one expression.
    pub fn parse(&mut self, source: &str) -> Result<Expression> {
        for value in self.values.values() {
            value.validate().map_err(MockError::Validation)?;
        }

        let tokens = tokenize(source)?;
        let mut parser = Parser {
            source,
            tokens,
            position: 0,
            placeholders: self,
        };
        let expression = parser.parse_and()?;
        if let Some(token) = parser.peek() {
            return Err(invalid(source, format!("unexpected token {token:?}")));
        }
        Ok(expression)
    }

    /// Fails when a provided placeholder was never referenced.
    pub fn finish(self) -> Result<()> {
        let mut unused_names: Vec<_> = self
            .names
            .keys()
            .filter(|key| !self.used_names.contains(*key))
            .cloned()
            .collect();
        if !unused_names.is_empty() {
            unused_names.sort();
            return Err(MockError::Validation(format!(
                "Value provided in ExpressionAttributeNames unused in expressions: keys: {{{}}}",
                unused_names.join(", ")
            )));
        }

        let mut unused_values: Vec<_> = self
            .values
            .keys()
            .filter(|key| !self.used_values.contains(*key))
            .cloned()
            .collect();
        if !unused_values.is_empty() {
            unused_values.sort();
            return Err(MockError::Validation(format!(
                "Value provided in ExpressionAttributeValues unused in expressions: keys: {{{}}}",
                unused_values.join(", ")
            )));
        }

        Ok(())
    }

    fn name(&mut self, placeholder: &str) -> Result<String> {
        let name = self.names.get(placeholder).cloned().ok_or_else(|| {
            MockError::Validation(format!(
                "An expression attribute name used in the document path is not defined; \
                 attribute name: {placeholder}"
            ))
        })?;
        self.used_names.insert(placeholder.to_string());
        Ok(name)
    }

    fn value(&mut self, placeholder: &str) -> Result<AttributeValue> {
        let value = self.values.get(placeholder).cloned().ok_or_else(|| {
            MockError::Validation(format!(
                "An expression attribute value used in expression is not defined; \
                 attribute value: {placeholder}"
            ))
        })?;
        self.used_values.insert(placeholder.to_string());
        Ok(value)
    }
}

struct Parser<'a, 'p> {
    source: &'a str,
    tokens: Vec<Token>,
    position: usize,
    placeholders: &'p mut Placeholders,
}

impl Parser<'_, '_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn error(&self, reason: impl std::fmt::Display) -> MockError {
        invalid(self.source, reason)
    }

    fn eat_and(&mut self) -> bool {
        match self.peek() {
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("AND") => {
                self.position += 1;
                true
            }
            _ => false,
        }
    }

    fn parse_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_primary()?;
        while self.eat_and() {
            let right = self.parse_primary()?;
            left = Expression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        if self.peek() == Some(&Token::LParen) {
            self.position += 1;
            let expression = self.parse_and()?;
            return match self.next() {
                Some(Token::RParen) => Ok(expression),
                Some(token) => Err(self.error(format!("expected ')', found {token:?}"))),
                None => Err(self.error("expected ')', found end of input")),
            };
        }

        let left = self.parse_operand()?;
        let comparator = match self.next() {
            Some(Token::Comparator(comparator)) => comparator,
            Some(token) => return Err(self.error(format!("expected '=' or '>', found {token:?}"))),
            None => return Err(self.error("expected a comparison")),
        };
        let right = self.parse_operand()?;

        Ok(Expression::Compare {
            left,
            comparator,
            right,
        })
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        match self.next() {
            Some(Token::Value(placeholder)) => {
                Ok(Operand::Value(self.placeholders.value(&placeholder)?))
            }
            Some(Token::Name(placeholder)) => {
                Ok(Operand::Attribute(self.placeholders.name(&placeholder)?))
            }
            Some(Token::Ident(word)) if !word.eq_ignore_ascii_case("AND") => {
                Ok(Operand::Attribute(word))
            }
            Some(token) => Err(self.error(format!("expected an operand, found {token:?}"))),
            None => Err(self.error("expected an operand, found end of input")),
        }
    }
}
