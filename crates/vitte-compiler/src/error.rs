//! Compile-time diagnostics (§7 "Rust realization").

use thiserror::Error;

/// A single compile error, already attached to the source line it
/// occurred on. The compiler keeps collecting these in panic-mode rather
/// than stopping at the first one (§4.5 "Error recovery").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("[line {line}] Error{context}: {message}")]
pub struct CompileError {
    pub line: u32,
    pub message: String,
    context: String,
}

impl CompileError {
    pub fn new(line: u32, lexeme: &str, message: impl Into<String>) -> Self {
        let context = if lexeme.is_empty() {
            String::new()
        } else {
            format!(" at '{lexeme}'")
        };
        Self { line, message: message.into(), context }
    }

    pub fn at_eof(line: u32, message: impl Into<String>) -> Self {
        Self { line, message: message.into(), context: " at end".to_string() }
    }
}
