//! Bit-exact binary wire format for a [`Chunk`] (§4.3 "Serializer").
//!
//! Layout, in order:
//!
//! ```text
//! magic        8 bytes   b"_CODE42_"
//! version      3 bytes   major, minor, build (a 4th tag byte is reserved
//!                        and never written)
//! .DATA        5 bytes   b".DATA"
//! const_count  4 bytes   u32 LE
//! constants    ...       one entry per constant (see below)
//! .CODE        5 bytes   b".CODE"
//! code_len     4 bytes   u32 LE
//! code         ...       raw instruction bytes
//! line_count   4 bytes   u32 LE
//! lines        ...       (line: u32 LE, run_length: u32 LE) pairs
//! ```
//!
//! Each constant entry is a one-byte type tag followed by its payload:
//! `0=Null` (no payload), `1=Bool` (1 byte), `2=Integer` (4 bytes LE),
//! `3=Number` (8 bytes LE), `4=String` (length-prefixed UTF-8, see below).
//! `Undefined` constants are never written — the compiler never interns one.
//!
//! String lengths use a 2-bit tagged varint rather than a fixed width:
//! the low two bits of the first byte select the encoding width, the
//! remaining bits (little-endian, low byte first) hold the length.
//!
//! | tag  | total width | max length |
//! |------|-------------|------------|
//! | `01` | 1 byte      | 62         |
//! | `10` | 2 bytes     | 16383      |
//! | `00` | 4 bytes     | 0x3FFF_FFFF |
//! | `11` | —           | reserved, always [`SerdeError::BadStringLengthTag`] |

use crate::chunk::{Chunk, LineTable};
use crate::error::SerdeError;
use crate::op::Op;
use crate::value::{ObjectString, Value};

const MAGIC: &[u8; 8] = b"_CODE42_";
const VERSION: (u8, u8, u8) = (1, 0, 0);

const TAG_DATA: &[u8; 5] = b".DATA";
const TAG_CODE: &[u8; 5] = b".CODE";

const CONST_NULL: u8 = 0;
const CONST_BOOL: u8 = 1;
const CONST_INTEGER: u8 = 2;
const CONST_NUMBER: u8 = 3;
const CONST_STRING: u8 = 4;

const LEN_TAG_6BIT: u8 = 0b01;
const LEN_TAG_14BIT: u8 = 0b10;
const LEN_TAG_30BIT: u8 = 0b00;
const LEN_TAG_RESERVED: u8 = 0b11;

/// The `(major, minor, build)` triplet this build reads and writes
/// (§4.3's version-triplet field). Exposed so callers outside this
/// module — the CLI's "bytecode version" log line, chiefly — don't
/// have to reach past `from_bytes`/`to_bytes` to learn it.
pub fn format_version() -> (u8, u8, u8) {
    VERSION
}

/// Encode `chunk` into its on-disk byte representation.
pub fn to_bytes(chunk: &Chunk) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.push(VERSION.0);
    out.push(VERSION.1);
    out.push(VERSION.2);

    out.extend_from_slice(TAG_DATA);
    out.extend_from_slice(&(chunk.constants().len() as u32).to_le_bytes());
    for value in chunk.constants() {
        write_constant(&mut out, value);
    }

    out.extend_from_slice(TAG_CODE);
    out.extend_from_slice(&(chunk.code().len() as u32).to_le_bytes());
    out.extend_from_slice(chunk.code());

    let runs: Vec<(u32, u32)> = chunk.lines().runs().collect();
    out.extend_from_slice(&(runs.len() as u32).to_le_bytes());
    for (line, count) in runs {
        out.extend_from_slice(&line.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        bytes = out.len(),
        consts = chunk.constants().len(),
        code_len = chunk.code().len(),
        "encoded chunk"
    );

    out
}

fn write_constant(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Undefined => {
            debug_assert!(false, "undefined constants are never interned");
        }
        Value::Null => out.push(CONST_NULL),
        Value::Bool(b) => {
            out.push(CONST_BOOL);
            out.push(*b as u8);
        }
        Value::Integer(i) => {
            out.push(CONST_INTEGER);
            out.extend_from_slice(&i.to_le_bytes());
        }
        Value::Number(n) => {
            out.push(CONST_NUMBER);
            out.extend_from_slice(&n.to_le_bytes());
        }
        Value::Object(s) => {
            out.push(CONST_STRING);
            write_string_len(out, s.len());
            out.extend_from_slice(s.as_bytes());
        }
    }
}

fn write_string_len(out: &mut Vec<u8>, len: usize) {
    if len <= 62 {
        out.push(((len as u8 & 0x3F) << 2) | LEN_TAG_6BIT);
    } else if len <= 0x3FFF {
        let len = len as u16;
        out.push((((len & 0x3F) as u8) << 2) | LEN_TAG_14BIT);
        out.push(((len >> 6) & 0xFF) as u8);
    } else {
        let len = len as u32 & 0x3FFF_FFFF;
        out.push((((len & 0x3F) as u8) << 2) | LEN_TAG_30BIT);
        out.push(((len >> 6) & 0xFF) as u8);
        out.push(((len >> 14) & 0xFF) as u8);
        out.push(((len >> 22) & 0xFF) as u8);
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], SerdeError> {
        if self.remaining() < n {
            return Err(SerdeError::Truncated { expected: n, found: self.remaining() });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, SerdeError> {
        Ok(self.take(1)?[0])
    }

    fn u32_le(&mut self) -> Result<u32, SerdeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn i32_le(&mut self) -> Result<i32, SerdeError> {
        Ok(self.u32_le()? as i32)
    }

    fn f64_le(&mut self) -> Result<f64, SerdeError> {
        let bytes = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(arr))
    }

    fn tag(&mut self, expected: &'static [u8], name: &'static str) -> Result<(), SerdeError> {
        let bytes = self.take(expected.len())?;
        if bytes != expected {
            return Err(SerdeError::BadSegmentTag(name));
        }
        Ok(())
    }

    fn string_len(&mut self) -> Result<usize, SerdeError> {
        let first = self.u8()?;
        let tag = first & 0b11;
        let low6 = (first >> 2) as u32;
        match tag {
            LEN_TAG_6BIT => Ok(low6 as usize),
            LEN_TAG_14BIT => {
                let b1 = self.u8()?;
                Ok((low6 | ((b1 as u32) << 6)) as usize)
            }
            LEN_TAG_30BIT => {
                let rest = self.take(3)?;
                let len = low6
                    | ((rest[0] as u32) << 6)
                    | ((rest[1] as u32) << 14)
                    | ((rest[2] as u32) << 22);
                Ok(len as usize)
            }
            LEN_TAG_RESERVED => Err(SerdeError::BadStringLengthTag),
            _ => unreachable!("2-bit tag"),
        }
    }
}

/// Decode a [`Chunk`] from its on-disk byte representation.
pub fn from_bytes(bytes: &[u8]) -> Result<Chunk, SerdeError> {
    let mut cur = Cursor::new(bytes);

    let magic = cur.take(MAGIC.len())?;
    if magic != MAGIC.as_slice() {
        return Err(SerdeError::BadMagic);
    }

    let file_major = cur.u8()?;
    let _file_minor = cur.u8()?;
    let _file_build = cur.u8()?;
    if file_major != VERSION.0 {
        return Err(SerdeError::VersionMismatch { file_major, runtime_major: VERSION.0 });
    }

    cur.tag(TAG_DATA, ".DATA")?;
    let const_count = cur.u32_le()?;
    if const_count as usize > cur.remaining() {
        return Err(SerdeError::CountExceedsRemaining {
            declared: const_count as u64,
            remaining: cur.remaining(),
        });
    }
    let mut constants = Vec::with_capacity(const_count as usize);
    for _ in 0..const_count {
        constants.push(read_constant(&mut cur)?);
    }

    cur.tag(TAG_CODE, ".CODE")?;
    let code_len = cur.u32_le()?;
    if code_len as usize > cur.remaining() {
        return Err(SerdeError::CountExceedsRemaining {
            declared: code_len as u64,
            remaining: cur.remaining(),
        });
    }
    let code = cur.take(code_len as usize)?.to_vec();

    let line_count = cur.u32_le()?;
    let mut runs = Vec::with_capacity(line_count as usize);
    for _ in 0..line_count {
        let line = cur.u32_le()?;
        let count = cur.u32_le()?;
        runs.push((line, count));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        bytes = bytes.len(),
        consts = const_count,
        code_len = code.len(),
        version = ?VERSION,
        "decoded chunk"
    );

    Ok(Chunk::from_parts(code, constants, LineTable::from_runs(runs)))
}

fn read_constant(cur: &mut Cursor<'_>) -> Result<Value, SerdeError> {
    match cur.u8()? {
        CONST_NULL => Ok(Value::Null),
        CONST_BOOL => Ok(Value::Bool(cur.u8()? != 0)),
        CONST_INTEGER => Ok(Value::Integer(cur.i32_le()?)),
        CONST_NUMBER => Ok(Value::Number(cur.f64_le()?)),
        CONST_STRING => {
            let len = cur.string_len()?;
            let bytes = cur.take(len)?.to_vec();
            let text = String::from_utf8(bytes).map_err(|_| SerdeError::InvalidUtf8)?;
            Ok(Value::Object(ObjectString::from_bytes(text.into_bytes())))
        }
        other => Err(SerdeError::UnknownConstantType(other)),
    }
}

/// Validate that every opcode byte in `code` decodes to a known [`Op`],
/// skipping each instruction's declared operand width. Used by the
/// disassembler and by `from_bytes` callers that want strict validation
/// beyond what the wire format itself checks.
pub fn validate_opcodes(code: &[u8]) -> Result<(), SerdeError> {
    let mut offset = 0;
    while offset < code.len() {
        let op = Op::try_from(code[offset])?;
        offset += 1 + op.operand_len();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Op;

    fn sample_chunk() -> Chunk {
        let mut chunk = Chunk::new();
        let idx = chunk.add_constant(Value::Integer(42)).unwrap();
        chunk.write_op(Op::Constant, 1).unwrap();
        chunk.write_byte(idx, 1).unwrap();
        chunk.write_op(Op::Return, 2).unwrap();
        chunk
    }

    #[test]
    fn round_trips_through_bytes() {
        let chunk = sample_chunk();
        let bytes = to_bytes(&chunk);
        assert_eq!(&bytes[0..8], MAGIC.as_slice());

        let decoded = from_bytes(&bytes).unwrap();
        assert_eq!(decoded.code(), chunk.code());
        assert_eq!(decoded.constants(), chunk.constants());
        assert_eq!(decoded.lines().runs().collect::<Vec<_>>(), chunk.lines().runs().collect::<Vec<_>>());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = to_bytes(&sample_chunk());
        bytes[0] = b'X';
        assert_eq!(from_bytes(&bytes), Err(SerdeError::BadMagic));
    }

    #[test]
    fn string_length_tags_round_trip_at_each_width() {
        for len in [0usize, 62, 63, 16_383, 16_384, 100_000] {
            let mut out = Vec::new();
            write_string_len(&mut out, len);
            let mut cur = Cursor::new(&out);
            assert_eq!(cur.string_len().unwrap(), len);
        }
    }

    #[test]
    fn reserved_length_tag_is_an_error() {
        let mut cur_bytes = vec![0b0000_0011u8];
        let mut cur = Cursor::new(&mut cur_bytes);
        assert_eq!(cur.string_len(), Err(SerdeError::BadStringLengthTag));
    }

    #[test]
    fn truncated_stream_is_reported() {
        let bytes = to_bytes(&sample_chunk());
        let short = &bytes[..bytes.len() - 3];
        assert!(matches!(from_bytes(short), Err(SerdeError::Truncated { .. })));
    }
}
