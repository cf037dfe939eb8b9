//! Layered configuration (§1a "Ambient stack").
//!
//! Compiled-in defaults, overridden by `VITTE_*` environment variables,
//! overridden last by CLI flags — the same three-tier layering as
//! `vitte-core::compiler::config::Config`.
//!
//! Only ambient, non-semantic knobs live here: operand-stack capacity and
//! output color/verbosity. The constant-pool cap is deliberately *not* a
//! knob here: it is wired into the wire format as a single-byte operand
//! (§4.3), so making it configurable would silently desynchronize compiled
//! bytecode from the format that reads it back. `-allow_dynamic_variables`
//! and `-default_const_variables` are stored (per §6) but have no effect on
//! compiled output or runtime behavior (§9's open question).

use crate::cli::Cli;

/// Default operand stack depth, mirrored from `vitte_vm::STACK_SIZE`.
const DEFAULT_STACK_CAPACITY: usize = vitte_vm::STACK_SIZE;

#[derive(Debug, Clone)]
pub struct Config {
    pub stack_capacity: usize,
    pub color: bool,
    /// Stored per §6 but inert — see module docs and §9.
    pub allow_dynamic_variables: bool,
    /// Stored per §6 but inert — see module docs and §9.
    pub default_const_variables: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stack_capacity: DEFAULT_STACK_CAPACITY,
            color: true,
            allow_dynamic_variables: false,
            default_const_variables: false,
        }
    }
}

impl Config {
    /// Build a `Config` from compiled defaults, `VITTE_*` environment
    /// variables, and finally `cli`'s flags — in that override order.
    pub fn resolve(cli: &Cli) -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("VITTE_STACK_CAPACITY") {
            if let Ok(capacity) = raw.parse() {
                config.stack_capacity = capacity;
            }
        }
        if let Ok(raw) = std::env::var("VITTE_NO_COLOR") {
            config.color = raw != "1";
        }

        if cli.allow_dynamic_variables {
            config.allow_dynamic_variables = true;
        }
        if cli.default_const_variables {
            config.default_const_variables = true;
        }

        config
    }
}
