//! # Crate-wide error type
//!
//! [DandyError] unifies the error kinds raised by [crate::cfg], [crate::lexspec] and
//! [crate::json] (spec.md §7's five error kinds) behind a single `thiserror`-derived enum, so a
//! caller like `dandy-cli` has one type to match on and print as a single diagnostic line.

use crate::cfg::{CfgError, SyntaxError};
use crate::lexspec::LexError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DandyError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Cfg(#[from] CfgError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
