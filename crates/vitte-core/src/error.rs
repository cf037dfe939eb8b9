//! Error types owned by `vitte-core`: chunk-capacity violations and the
//! wire-format decode/encode failures from [`crate::serializer`].

use thiserror::Error;

/// Raised by [`crate::chunk::Chunk`] when a hard capacity limit (§3 of the
/// spec this crate implements) would be exceeded.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ChunkError {
    /// The constant pool already holds 256 entries (single-byte operand cap).
    #[error("constant pool full (max 256 entries)")]
    ConstantPoolFull,
    /// The code segment already holds 65535 bytes.
    #[error("chunk code segment too large (max 65535 bytes)")]
    CodeTooLarge,
}

/// Raised while encoding or decoding the bit-exact `_CODE42_` wire format.
///
/// Every variant corresponds to one of the failure modes the format names:
/// truncation, bad magic, version mismatch, an over-declared count, or an
/// unrecognized constant-type tag.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SerdeError {
    /// Stream ended before a required field could be read.
    #[error("truncated chunk stream: expected {expected} more byte(s), found {found}")]
    Truncated {
        /// Bytes still required to satisfy the field being read.
        expected: usize,
        /// Bytes actually remaining.
        found: usize,
    },
    /// The 8-byte magic did not match `"_CODE42_"`.
    #[error("bad magic: expected \"_CODE42_\"")]
    BadMagic,
    /// `.DATA` or `.CODE` segment tag did not match.
    #[error("missing or corrupt {0} segment tag")]
    BadSegmentTag(&'static str),
    /// `version.major` differs from this build's major version.
    #[error("version mismatch: file is v{file_major}, runtime is v{runtime_major}")]
    VersionMismatch {
        /// Major version recorded in the file.
        file_major: u8,
        /// Major version of the running implementation.
        runtime_major: u8,
    },
    /// A declared element count implies more bytes than remain in the stream.
    #[error("declared count {declared} exceeds remaining bytes ({remaining})")]
    CountExceedsRemaining {
        /// Count read from the stream.
        declared: u64,
        /// Bytes actually left to satisfy it.
        remaining: usize,
    },
    /// A constant's `type` byte did not match any known [`crate::value::Value`] tag.
    #[error("unknown constant type tag: {0:#04x}")]
    UnknownConstantType(u8),
    /// A string length prefix used an unrecognized 2-bit tag (`11`).
    #[error("unrecognized string-length tag in varint prefix")]
    BadStringLengthTag,
    /// The declared string payload was not valid UTF-8.
    #[error("string constant payload is not valid UTF-8")]
    InvalidUtf8,
    /// An opcode byte in the `.CODE` segment did not match any known [`crate::op::Op`].
    #[error("unknown opcode byte: {0:#04x}")]
    UnknownOpcode(u8),
}
