//! vitte-core — value model, bytecode chunk and wire format
//!
//! Everything needed to build, inspect and (de)serialize a [`Chunk`]
//! without depending on the compiler or the VM.
//!
//! ## Modules
//! - `value`      : the tagged [`Value`] type and heap-allocated strings.
//! - `op`         : the [`Op`] instruction set.
//! - `chunk`      : [`Chunk`], the constant pool and [`chunk::LineTable`].
//! - `serializer` : the `_CODE42_` binary wire format.
//! - `disasm`     : human-readable disassembly listing.
//!
//! ## Features
//! - **std** *(default)*: enables `std::fs`/`std::io` based helpers used
//!   by the CLI's file I/O. There is no `no_std` mode for this crate —
//!   unlike some sibling crates in this workspace, the value model and
//!   wire format have no embedded-systems use case worth the complexity.
//! - **serde**: derives `Serialize`/`Deserialize` on [`Op`] for tooling
//!   that wants to shuttle instructions through JSON (e.g. editor
//!   integrations), independent of the binary wire format.
//! - **tracing**: instruments chunk construction and (de)serialization.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unused_must_use)]

pub mod chunk;
pub mod disasm;
pub mod error;
pub mod op;
pub mod serializer;
pub mod value;

pub use chunk::{Chunk, LineTable};
pub use error::{ChunkError, SerdeError};
pub use op::Op;
pub use value::{ObjectRef, ObjectString, Value, ValueError};

/// Crate version, as seen by `Cargo.toml` — handy for `-version`-style
/// CLI output and for the `VersionMismatch` diagnostic in `serializer`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly paired imports for crates that consume a [`Chunk`] end to end
/// (the compiler and the VM both `use vitte_core::prelude::*;`).
pub mod prelude {
    pub use crate::chunk::{Chunk, LineTable};
    pub use crate::error::{ChunkError, SerdeError};
    pub use crate::op::Op;
    pub use crate::value::{ObjectRef, ObjectString, Value, ValueError};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_public_api() {
        let mut chunk = Chunk::new();
        let idx = chunk.add_constant(Value::Integer(42)).unwrap();
        chunk.write_op(Op::Constant, 1).unwrap();
        chunk.write_byte(idx, 1).unwrap();
        chunk.write_op(Op::Return, 1).unwrap();

        let bytes = serializer::to_bytes(&chunk);
        let decoded = serializer::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.constants(), chunk.constants());
    }
}
