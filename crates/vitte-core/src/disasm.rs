//! Human-readable disassembly listing, used by the CLI's `-disassemble`
//! flag and by compiler/VM debug tooling.

use std::fmt::Write as _;

use crate::chunk::Chunk;
use crate::op::Op;

/// Render every instruction in `chunk` as one line of text:
/// `<offset padded> <line or '|'> <MNEMONIC> [operand]`.
pub fn disassemble(chunk: &Chunk, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {name} ==");

    let mut offset = 0;
    let mut last_line: Option<u32> = None;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, offset, &mut last_line, &mut out);
    }
    out
}

/// Disassemble a single instruction at `offset`, returning the offset of
/// the next one. Shared by [`disassemble`] and step-debugging traces.
pub fn disassemble_instruction(
    chunk: &Chunk,
    offset: usize,
    last_line: &mut Option<u32>,
    out: &mut String,
) -> usize {
    let _ = write!(out, "{offset:04} ");

    let line = chunk.line_at(offset);
    match (line, *last_line) {
        (Some(l), Some(prev)) if l == prev => {
            let _ = write!(out, "   | ");
        }
        (Some(l), _) => {
            let _ = write!(out, "{l:4} ");
            *last_line = Some(l);
        }
        (None, _) => {
            let _ = write!(out, "   ? ");
        }
    }

    let byte = chunk.byte_at(offset);
    let op = match Op::try_from(byte) {
        Ok(op) => op,
        Err(_) => {
            let _ = writeln!(out, "UNKNOWN {byte:#04x}");
            return offset + 1;
        }
    };

    match op.operand_len() {
        0 => {
            let _ = writeln!(out, "{}", op.name());
            offset + 1
        }
        1 => {
            let operand = chunk.byte_at(offset + 1);
            match op {
                Op::Constant => {
                    let value = chunk.constant(operand);
                    let _ = writeln!(
                        out,
                        "{:<16} {:4} '{}'",
                        op.name(),
                        operand,
                        value.map(|v| v.to_string()).unwrap_or_default()
                    );
                }
                _ => {
                    let _ = writeln!(out, "{:<16} {:4}", op.name(), operand);
                }
            }
            offset + 2
        }
        2 => {
            let jump = chunk.u16_at(offset + 1);
            let _ = writeln!(out, "{:<16} {:4} -> {}", op.name(), jump, offset + 3 + jump as usize);
            offset + 3
        }
        _ => unreachable!("no opcode declares more than two operand bytes"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn disassembles_a_constant_and_return() {
        let mut chunk = Chunk::new();
        let idx = chunk.add_constant(Value::Integer(7)).unwrap();
        chunk.write_op(Op::Constant, 1).unwrap();
        chunk.write_byte(idx, 1).unwrap();
        chunk.write_op(Op::Return, 1).unwrap();

        let text = disassemble(&chunk, "test");
        assert!(text.contains("== test =="));
        assert!(text.contains("CONSTANT"));
        assert!(text.contains("'7'"));
        assert!(text.contains("RETURN"));
    }
}
