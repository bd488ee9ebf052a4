//! Error taxonomy shared by the tokenizer and the parser.
//!
//! Nothing in the front end recovers from an error: every failure travels up
//! through `?` to the driver, which renders a [`Diagnostic`] and exits.

use std::fmt;

use thiserror::Error;

use crate::SourceLocation;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("unexpected character {ch:?}")]
    UnexpectedChar { ch: char, loc: SourceLocation },

    #[error("integer literal {text} is out of range")]
    InvalidNumber { text: String, loc: SourceLocation },

    #[error("expected {expected}, but got {found:?}")]
    Expected {
        expected: String,
        found: String,
        loc: SourceLocation,
    },

    #[error("undefined variable {name}")]
    Undeclared { name: String, loc: SourceLocation },

    #[error("redefined variable {name}")]
    Redeclared { name: String, loc: SourceLocation },

    #[error("{0}")]
    MalformedFunction(FunctionDefect),
}

/// The ways a function definition header can be malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionDefect {
    MissingReturnType,
    MissingName,
    MissingParamType,
}

impl fmt::Display for FunctionDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionDefect::MissingReturnType => write!(f, "function return type is not defined"),
            FunctionDefect::MissingName => write!(f, "expected a function name"),
            FunctionDefect::MissingParamType => write!(f, "function parameter type not found"),
        }
    }
}

impl CompileError {
    pub fn expected(expected: impl Into<String>, found: &str, loc: SourceLocation) -> Self {
        Self::Expected {
            expected: expected.into(),
            found: found.to_string(),
            loc,
        }
    }

    /// Source position of the failure, if the category has one.
    pub fn loc(&self) -> Option<SourceLocation> {
        match self {
            CompileError::UnexpectedChar { loc, .. }
            | CompileError::InvalidNumber { loc, .. }
            | CompileError::Expected { loc, .. }
            | CompileError::Undeclared { loc, .. }
            | CompileError::Redeclared { loc, .. } => Some(*loc),
            CompileError::MalformedFunction(_) => None,
        }
    }

    pub fn diagnostic(&self, src: &str) -> Diagnostic {
        let message = self.to_string();
        match self.loc() {
            Some(loc) => {
                let start = src[..loc.offset.min(src.len())]
                    .rfind('\n')
                    .map_or(0, |i| i + 1);
                let end = src[start..].find('\n').map_or(src.len(), |i| start + i);
                Diagnostic {
                    line: Some(src[start..end].to_string()),
                    column: loc.column,
                    message,
                }
            }
            None => Diagnostic {
                line: None,
                column: 0,
                message,
            },
        }
    }
}

/// A rendered error: the offending line with a caret under `column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: Option<String>,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.line {
            Some(line) => {
                writeln!(f, "{}", line)?;
                write!(f, "{: <1$}", "", self.column.saturating_sub(1))?;
                write!(f, "^ {}", self.message)
            }
            None => write!(f, "{}", self.message),
        }
    }
}
