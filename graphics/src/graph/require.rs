//! `require` predicates attached to resource requests.
//!
//! A predicate is a boolean expression over names. A name holds when an
//! option of that name is truthy or when a resource of that name is present
//! in the frame's plan.
//!
//! ```text
//! expr   := term ( "||" term )*
//! term   := factor ( "&&" factor )*
//! factor := "!" factor | "(" expr ")" | NAME
//! ```
//!
//! # Example
//!
//! ```ignore
//! let require: Require = "taa_enable && !ColorScaled".parse()?;
//! let honored = require.evaluate(&|name| options.is_truthy(name) || plan.contains(name));
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while parsing a predicate string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequireParseError {
    /// The input contains no expression.
    #[error("empty require predicate")]
    Empty,
    /// The input ended in the middle of an expression.
    #[error("unexpected end of require predicate")]
    UnexpectedEnd,
    /// A character that cannot start or continue an expression.
    #[error("unexpected '{found}' at position {position} in require predicate")]
    UnexpectedToken { position: usize, found: char },
}

/// A boolean predicate over option and resource names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Require {
    /// Holds when the named option is truthy or the named resource is present.
    Name(String),
    /// Negation.
    Not(Box<Require>),
    /// Holds when every operand holds.
    All(Vec<Require>),
    /// Holds when any operand holds.
    Any(Vec<Require>),
}

impl Require {
    /// Predicate on a single name.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Negate a predicate.
    pub fn not(require: Require) -> Self {
        Self::Not(Box::new(require))
    }

    /// Conjunction of predicates.
    pub fn all(operands: impl IntoIterator<Item = Require>) -> Self {
        Self::All(operands.into_iter().collect())
    }

    /// Disjunction of predicates.
    pub fn any(operands: impl IntoIterator<Item = Require>) -> Self {
        Self::Any(operands.into_iter().collect())
    }

    /// Evaluate the predicate, asking `holds` about each name.
    pub fn evaluate(&self, holds: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Self::Name(name) => holds(name),
            Self::Not(inner) => !inner.evaluate(holds),
            Self::All(operands) => operands.iter().all(|operand| operand.evaluate(holds)),
            Self::Any(operands) => operands.iter().any(|operand| operand.evaluate(holds)),
        }
    }

    /// Every name mentioned by the predicate.
    pub fn names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Name(name) => names.push(name),
            Self::Not(inner) => inner.collect_names(names),
            Self::All(operands) | Self::Any(operands) => {
                for operand in operands {
                    operand.collect_names(names);
                }
            }
        }
    }
}

impl fmt::Display for Require {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, operands: &[Require], op: &str) -> fmt::Result {
            for (index, operand) in operands.iter().enumerate() {
                if index > 0 {
                    write!(f, " {op} ")?;
                }
                match operand {
                    Require::All(_) | Require::Any(_) => write!(f, "({operand})")?,
                    _ => write!(f, "{operand}")?,
                }
            }
            Ok(())
        }

        match self {
            Self::Name(name) => f.write_str(name),
            Self::Not(inner) => match inner.as_ref() {
                Self::All(_) | Self::Any(_) => write!(f, "!({inner})"),
                _ => write!(f, "!{inner}"),
            },
            Self::All(operands) => join(f, operands, "&&"),
            Self::Any(operands) => join(f, operands, "||"),
        }
    }
}

impl FromStr for Require {
    type Err = RequireParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser {
            chars: input.char_indices().collect(),
            cursor: 0,
        };
        parser.skip_whitespace();
        if parser.peek().is_none() {
            return Err(RequireParseError::Empty);
        }

        let require = parser.expr()?;
        parser.skip_whitespace();
        match parser.peek() {
            None => Ok(require),
            Some((position, found)) => Err(RequireParseError::UnexpectedToken { position, found }),
        }
    }
}

struct Parser {
    chars: Vec<(usize, char)>,
    cursor: usize,
}

impl Parser {
    fn peek(&self) -> Option<(usize, char)> {
        self.chars.get(self.cursor).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|(_, c)| c.is_whitespace()) {
            self.cursor += 1;
        }
    }

    /// Consume a two-character operator if it comes next.
    fn eat_operator(&mut self, op: char) -> bool {
        self.skip_whitespace();
        let first = self.chars.get(self.cursor).map(|(_, c)| *c);
        let second = self.chars.get(self.cursor + 1).map(|(_, c)| *c);
        if first == Some(op) && second == Some(op) {
            self.cursor += 2;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<Require, RequireParseError> {
        let mut operands = vec![self.term()?];
        while self.eat_operator('|') {
            operands.push(self.term()?);
        }
        Ok(collapse(operands, Require::Any))
    }

    fn term(&mut self) -> Result<Require, RequireParseError> {
        let mut operands = vec![self.factor()?];
        while self.eat_operator('&') {
            operands.push(self.factor()?);
        }
        Ok(collapse(operands, Require::All))
    }

    fn factor(&mut self) -> Result<Require, RequireParseError> {
        self.skip_whitespace();
        let (position, c) = self.peek().ok_or(RequireParseError::UnexpectedEnd)?;
        match c {
            '!' => {
                self.cursor += 1;
                Ok(Require::not(self.factor()?))
            }
            '(' => {
                self.cursor += 1;
                let inner = self.expr()?;
                self.skip_whitespace();
                match self.peek() {
                    Some((_, ')')) => {
                        self.cursor += 1;
                        Ok(inner)
                    }
                    Some((position, found)) => {
                        Err(RequireParseError::UnexpectedToken { position, found })
                    }
                    None => Err(RequireParseError::UnexpectedEnd),
                }
            }
            c if is_name_char(c) => {
                let mut name = String::new();
                while let Some((_, c)) = self.peek().filter(|(_, c)| is_name_char(*c)) {
                    name.push(c);
                    self.cursor += 1;
                }
                Ok(Require::Name(name))
            }
            found => Err(RequireParseError::UnexpectedToken { position, found }),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn collapse(mut operands: Vec<Require>, wrap: fn(Vec<Require>) -> Require) -> Require {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        wrap(operands)
    }
}
