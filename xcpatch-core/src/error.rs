use thiserror::Error;

use crate::models::Anchor;

/// Failure to read the descriptor text as a property list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("line {line}: unterminated string")]
    UnterminatedString { line: usize },

    #[error("line {line}: unterminated comment")]
    UnterminatedComment { line: usize },

    #[error("line {line}: unexpected character {found:?}")]
    UnexpectedChar { line: usize, found: char },

    #[error("line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("unexpected end of document, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("line {line}: trailing content after root dictionary")]
    TrailingContent { line: usize },

    #[error("root dictionary has no `objects` dictionary")]
    MissingObjects,
}

/// Why a single anchor could not be turned into an insertion point.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnchorError {
    #[error("{anchor}: not found")]
    NotFound { anchor: Anchor },

    #[error("{anchor}: matched {count} times, expected exactly once")]
    Ambiguous { anchor: Anchor, count: usize },

    #[error("{anchor}: expected a {expected}")]
    WrongKind {
        anchor: Anchor,
        expected: &'static str,
    },
}

/// A patch plan that could not be committed. Nothing was applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("{} anchor(s) could not be resolved: {}", .0.len(), join(.0))]
    Unresolved(Vec<AnchorError>),
}

fn join(errors: &[AnchorError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
