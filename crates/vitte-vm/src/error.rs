//! Runtime diagnostics (§7 "Rust realization").
//!
//! [`vitte_core::ValueError`] is line-agnostic; the VM is the only place
//! that knows which source line the currently-executing instruction maps
//! to, so it is the one that attaches it, producing a `RuntimeError`.

use thiserror::Error;
use vitte_core::{SerdeError, ValueError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("[line {line}] Error: Operand must be a number")]
    NotANumber { line: u32 },

    #[error("[line {line}] Error: Operands must be two numbers or two strings")]
    TypeMismatch { line: u32 },

    #[error("[line {line}] Error: Division by zero")]
    DivisionByZero { line: u32 },

    #[error("[line {line}] Error: Undefined variable '{name}'")]
    UndefinedVariable { line: u32, name: String },

    #[error("[line {line}] Error: Stack overflow")]
    StackOverflow { line: u32 },

    #[error("[line {line}] Error: Stack underflow (internal error, corrupt bytecode)")]
    StackUnderflow { line: u32 },

    #[error("[line {line}] Error: {source}")]
    CorruptBytecode {
        line: u32,
        #[source]
        source: SerdeError,
    },
}

impl RuntimeError {
    pub(crate) fn from_value_error(err: ValueError, line: u32) -> Self {
        match err {
            ValueError::TypeMismatch => RuntimeError::TypeMismatch { line },
            ValueError::DivisionByZero => RuntimeError::DivisionByZero { line },
        }
    }
}
