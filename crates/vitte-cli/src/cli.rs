//! Flag definitions and the single-dash-to-double-dash normalization that
//! lets `clap`'s derive API (which only ever parses `--long` flags) accept
//! the single-dash flag surface §6 specifies (`-repl`, `-code`, ...).
//!
//! `clap`'s short flags are a single character; every flag this driver
//! supports is multi-character, so there is no ambiguity to resolve by
//! rewriting exactly the known flag spellings before handing argv to
//! `Cli::parse_from`. Anything else — positional arguments, `--` itself,
//! already-double-dashed flags — passes through untouched.

use clap::Parser;

/// Long-flag names this driver recognizes in their single-dash §6 form.
/// Kept as a flat list (rather than letting clap invent its own spelling)
/// so normalization and the derived struct can't drift apart.
const KNOWN_FLAGS: &[&str] = &[
    "-help",
    "-repl",
    "-code",
    "-compile",
    "-output",
    "-run",
    "-disassemble",
    "-step_debugging",
    "-allow_dynamic_variables",
    "-default_const_variables",
];

/// Rewrite every argument that is exactly one of [`KNOWN_FLAGS`] into its
/// `--` form, leaving everything else (positionals, `--help`, `-h`, stray
/// negative numbers passed as inline `-code` source) untouched.
pub fn normalize_args(args: impl Iterator<Item = String>) -> Vec<String> {
    args.map(|arg| {
        if KNOWN_FLAGS.contains(&arg.as_str()) {
            format!("-{arg}")
        } else {
            arg
        }
    })
    .collect()
}

#[derive(Parser, Debug)]
#[command(
    name = "vitte",
    version,
    about = "Single-pass bytecode compiler and stack VM for the Vitte scripting language"
)]
pub struct Cli {
    /// Enter interactive read-eval-print mode.
    #[arg(long = "repl")]
    pub repl: bool,

    /// Treat the following value as inline source rather than a file path.
    #[arg(long = "code", value_name = "SOURCE")]
    pub code: Option<String>,

    /// Compile only; write bytecode instead of executing it.
    #[arg(long = "compile")]
    pub compile: bool,

    /// Destination file for `-compile` output (defaults to stdout).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<String>,

    /// Load precompiled bytecode and execute it.
    #[arg(long = "run")]
    pub run: bool,

    /// Print the bytecode disassembly listing after loading.
    #[arg(long = "disassemble")]
    pub disassemble: bool,

    /// Trace every instruction (stack, globals, disassembly) as it runs.
    #[arg(long = "step_debugging")]
    pub step_debugging: bool,

    /// Permit implicit global declaration on first assignment. Inert — see
    /// §9.
    #[arg(long = "allow_dynamic_variables")]
    pub allow_dynamic_variables: bool,

    /// Require `mut` for mutability. Inert — see §9.
    #[arg(long = "default_const_variables")]
    pub default_const_variables: bool,

    /// Source file (or `.vitbc` bytecode file with `-run`).
    pub path: Option<String>,
}
