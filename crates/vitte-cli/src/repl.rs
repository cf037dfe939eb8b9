//! Interactive read-eval-print loop (§4.6, §6), grounded in
//! `original_source/clox/src/vm.h`'s `repl()`.
//!
//! One long-lived [`vitte_vm::Vm`] backs the whole session so `var`
//! declarations from earlier lines stay visible to later ones — the same
//! carry-over the original's single `VirtualMachine` gives its `repl()`.
//! Lines starting with `!` are meta-commands instead of source text.

use std::io::{self, BufRead, Write};

use vitte_vm::Vm;

use crate::config::Config;

const HELP_TEXT: &str = "\
--------------------------------
Commands (preceded with '!'):
\t!debugbreak enable/disable
\t!quit
--------------------------------";

/// Drive the REPL to completion (EOF on stdin, or a `!quit`).
pub fn run(config: &Config, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
    let mut vm = Vm::with_capacity(config.stack_capacity);
    let mut lines = input.lines();

    loop {
        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            break;
        };
        let line = line?;

        if let Some(rest) = line.strip_prefix('!') {
            if rest.contains("quit") {
                writeln!(output, "--------------------------------")?;
                writeln!(output, "Exiting...")?;
                writeln!(output, "--------------------------------")?;
                break;
            } else if rest.contains("help") {
                writeln!(output, "{HELP_TEXT}")?;
                continue;
            } else if rest.contains("debugbreak") {
                let enable = rest.contains("enable");
                vm.set_trace(enable);
                writeln!(
                    output,
                    "--------------------------------\nDebugBreak {}\n--------------------------------",
                    if enable { "enabled" } else { "disabled" }
                )?;
                continue;
            }
        }

        match vitte_compiler::compile(&line) {
            Ok(chunk) => {
                if let Err(err) = vm.interpret(&chunk) {
                    eprintln!("{err}");
                }
            }
            Err(errors) => {
                for error in errors {
                    eprintln!("{error}");
                }
            }
        }
    }

    Ok(())
}
