//! vitte-cli — command-line driver for the Vitte scripting language.
//!
//! Thin `main.rs` / logic-in-`lib.rs` split: `main.rs` wires up
//! `color-eyre` and `env_logger`, then calls [`run`], which is
//! unit-testable in isolation (`cargo test -p vitte-cli`).
//!
//! ## Modules
//! - `cli`    : the flat `clap` flag surface (§6) and single-dash
//!   normalization.
//! - `config` : layered ambient `Config` (§1a).
//! - `repl`   : the interactive `!`-command loop (§4.6).
//!
//! ## Features
//! - **tracing**: wraps [`run`] in a span and installs a
//!   `tracing-subscriber` fmt layer in `main` instead of `env_logger`'s
//!   plain output, so the spans emitted by `vitte-core`/`vitte-compiler`/
//!   `vitte-vm` render with their fields when this feature is on.

#![deny(rust_2018_idioms, unused_must_use)]

mod cli;
mod config;
mod repl;

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use config::Config;

/// Parse `args`, run the requested mode, and return the process exit code
/// (§6: `0` success, `-1` any compile or runtime error). An `Err` is
/// reserved for driver-level failures — a file that can't be read, a
/// directory passed where a file was expected — which `main.rs` reports
/// and maps to the same `-1`.
pub fn run(args: impl Iterator<Item = String>) -> Result<i32> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("vitte_cli::run").entered();

    let cli = Cli::parse_from(cli::normalize_args(args));
    let config = Config::resolve(&cli);

    if cli.repl {
        let stdin = io::stdin();
        repl::run(&config, stdin.lock(), io::stdout().lock())
            .context("REPL I/O failure")?;
        return Ok(0);
    }

    let input = classify_input(&cli)?;
    dispatch(&cli, &config, input)
}

/// What the driver ended up being asked to run, after `-code`/`-run`/file
/// extension classification (§6 "Driver pipeline").
enum Input {
    Source(String),
    Bytecode(Vec<u8>),
}

fn classify_input(cli: &Cli) -> Result<Input> {
    if let Some(code) = &cli.code {
        return Ok(Input::Source(code.clone()));
    }

    let path = cli
        .path
        .as_deref()
        .context("no input: pass a file path, -code <source>, or -repl")?;

    if cli.run || Path::new(path).extension().is_some_and(|ext| ext == "vitbc") {
        let bytes = fs::read(path).with_context(|| format!("reading bytecode file {path}"))?;
        log::info!("loaded bytecode file {path} ({} bytes)", bytes.len());
        Ok(Input::Bytecode(bytes))
    } else {
        let source = fs::read_to_string(path).with_context(|| format!("reading source file {path}"))?;
        log::info!("loaded source file {path} ({} bytes)", source.len());
        Ok(Input::Source(source))
    }
}

fn dispatch(cli: &Cli, config: &Config, input: Input) -> Result<i32> {
    let chunk = match input {
        Input::Bytecode(bytes) => match vitte_core::serializer::from_bytes(&bytes) {
            Ok(chunk) => {
                let (major, minor, build) = vitte_core::serializer::format_version();
                log::debug!("decoded bytecode version {major}.{minor}.{build}");
                chunk
            }
            Err(err) => {
                eprintln!("Error: {err}");
                return Ok(-1);
            }
        },
        Input::Source(source) => match vitte_compiler::compile(&source) {
            Ok(chunk) => chunk,
            Err(errors) => {
                for error in &errors {
                    eprintln!("{error}");
                }
                return Ok(-1);
            }
        },
    };

    if cli.disassemble {
        println!("{}", vitte_core::disasm::disassemble(&chunk, "chunk"));
    }

    if cli.compile {
        let bytes = vitte_core::serializer::to_bytes(&chunk);
        let (major, minor, build) = vitte_core::serializer::format_version();
        match &cli.output {
            Some(path) => {
                fs::write(path, &bytes).with_context(|| format!("writing bytecode to {path}"))?;
                log::info!(
                    "wrote {} bytes of bytecode (format v{major}.{minor}.{build}) to {path}",
                    bytes.len()
                );
            }
            None => {
                io::stdout().write_all(&bytes).context("writing bytecode to stdout")?;
                log::info!(
                    "wrote {} bytes of bytecode (format v{major}.{minor}.{build}) to stdout",
                    bytes.len()
                );
            }
        }
        return Ok(0);
    }

    let mut vm = vitte_vm::Vm::with_capacity(config.stack_capacity);
    vm.set_trace(cli.step_debugging);
    match vm.interpret(&chunk) {
        Ok(_) => Ok(0),
        Err(err) => {
            eprintln!("{err}");
            Ok(-1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> impl Iterator<Item = String> {
        std::iter::once("vitte".to_string()).chain(extra.iter().map(|s| s.to_string()))
    }

    #[test]
    fn runs_inline_source() {
        let code = run(args(&["-code", "print 1 + 1;"])).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn reports_compile_error_with_nonzero_exit() {
        let code = run(args(&["-code", "var;"])).unwrap();
        assert_eq!(code, -1);
    }

    #[test]
    fn reports_runtime_error_with_nonzero_exit() {
        let code = run(args(&["-code", "print nope;"])).unwrap();
        assert_eq!(code, -1);
    }

    #[test]
    fn compile_only_writes_bytecode_to_stdout() {
        let code = run(args(&["-code", "print 42;", "-compile"])).unwrap();
        assert_eq!(code, 0);
    }
}
