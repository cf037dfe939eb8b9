//! vitte-compiler — single-pass scanner and Pratt compiler
//!
//! Turns one source string directly into a [`vitte_core::Chunk`]. There
//! is no separate lexing pass, no AST, and no optimization pass: every
//! parse rule emits its bytecode as soon as it recognizes the
//! construct, exactly the way `original_source/clox/src/compiler.h`'s
//! `parsePrecedence` drives codegen off the parser's own recursion.
//!
//! ## Modules
//! - `scanner`  : hand-written lexer producing [`scanner::Token`]s on demand.
//! - `compiler` : the Pratt parser/codegen, exposed as [`Compiler`].
//! - `error`    : [`CompileError`], the collected-diagnostics type.
//!
//! ## Features
//! - **tracing**: instruments the compile pipeline — a span around
//!   [`Compiler::compile`] plus a summary of the emitted chunk on success.

#![deny(rust_2018_idioms, unused_must_use)]

pub mod compiler;
pub mod error;
pub mod scanner;

pub use compiler::Compiler;
pub use error::CompileError;

use vitte_core::Chunk;

/// Compile `source` into a finished [`Chunk`], or the full list of
/// diagnostics collected in panic-mode recovery.
pub fn compile(source: &str) -> Result<Chunk, Vec<CompileError>> {
    Compiler::new(source).compile()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_trivial_program() {
        assert!(compile("print 1 + 2;").is_ok());
    }

    #[test]
    fn reports_a_syntax_error_with_its_line() {
        let errors = compile("var;\n").unwrap_err();
        assert_eq!(errors[0].line, 1);
    }
}
