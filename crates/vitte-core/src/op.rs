//! Bytecode instruction set (§4.5 "Instruction set").
//!
//! `Chunk::code` is a flat `Vec<u8>`, not a `Vec<Op>` — the wire format and
//! the VM's fetch loop both walk raw bytes. `Op` exists purely as the
//! typed view the compiler emits from and the VM/disassembler decode into.
//!
//! Variant order and discriminants are stable once assigned: append new
//! opcodes at the bottom rather than renumbering, exactly as the upstream
//! `vitte-core::bytecode::ops::Op` enum this is grounded on does, so that
//! already-serialized `.vitbc` files keep decoding the same way. Numbering
//! stops at `Return`; call/closure/class opcodes are deliberately not
//! reserved with placeholder variants (§9: "leave room… don't invent
//! semantics") — the next opcode simply gets the next free byte.

use crate::error::SerdeError;

/// One bytecode instruction. Operand encoding is documented per variant
/// below; decoding operands out of `Chunk::code` is the VM's and
/// disassembler's job, not this enum's.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Op {
    /// `idx:u8` — push `constants[idx]`.
    Constant = 0,
    /// push `Null`.
    Null = 1,
    /// push `Bool(true)`.
    True = 2,
    /// push `Bool(false)`.
    False = 3,
    /// discard top of stack.
    Pop = 4,
    /// unary negate top of stack.
    Negate = 5,
    /// unary logical-not top of stack.
    Not = 6,
    Add = 7,
    Subtract = 8,
    Multiply = 9,
    Divide = 10,
    Equal = 11,
    Greater = 12,
    Less = 13,
    /// write top of stack to stdout, then pop.
    Print = 14,
    /// `idx:u8` — `globals[name(idx)] := pop()`.
    GlobalVarDef = 15,
    /// `idx:u8` — push `globals[name(idx)]`.
    GlobalVarGet = 16,
    /// `idx:u8` — `globals[name(idx)] := peek(0)`.
    GlobalVarSet = 17,
    /// `slot:u8` — push `stack[frameBase + slot]`.
    LocalVarGet = 18,
    /// `slot:u8` — `stack[frameBase + slot] := peek(0)`.
    LocalVarSet = 19,
    /// `off:i16` big-endian — `ip += off`.
    Jump = 20,
    /// `off:i16` big-endian — `ip += off` if top is falsey.
    JumpIfFalse = 21,
    /// `off:i16` big-endian — `ip += off` if top is truthy.
    JumpIfTrue = 22,
    /// debugger marker only, no runtime effect.
    ScopeBegin = 23,
    /// debugger marker only, no runtime effect.
    ScopeEnd = 24,
    /// halt interpretation; print top of stack if the stack is non-empty.
    Return = 25,
}

impl Op {
    /// Number of operand bytes following this opcode in `Chunk::code`
    /// (used by the disassembler to advance past an instruction).
    pub fn operand_len(self) -> usize {
        match self {
            Op::Constant
            | Op::GlobalVarDef
            | Op::GlobalVarGet
            | Op::GlobalVarSet
            | Op::LocalVarGet
            | Op::LocalVarSet => 1,
            Op::Jump | Op::JumpIfFalse | Op::JumpIfTrue => 2,
            _ => 0,
        }
    }

    /// Mnemonic used by the disassembler.
    pub fn name(self) -> &'static str {
        match self {
            Op::Constant => "CONSTANT",
            Op::Null => "NULL",
            Op::True => "TRUE",
            Op::False => "FALSE",
            Op::Pop => "POP",
            Op::Negate => "NEGATE",
            Op::Not => "NOT",
            Op::Add => "ADD",
            Op::Subtract => "SUBTRACT",
            Op::Multiply => "MULTIPLY",
            Op::Divide => "DIVIDE",
            Op::Equal => "EQUAL",
            Op::Greater => "GREATER",
            Op::Less => "LESS",
            Op::Print => "PRINT",
            Op::GlobalVarDef => "GLOBAL_VAR_DEF",
            Op::GlobalVarGet => "GLOBAL_VAR_GET",
            Op::GlobalVarSet => "GLOBAL_VAR_SET",
            Op::LocalVarGet => "LOCAL_VAR_GET",
            Op::LocalVarSet => "LOCAL_VAR_SET",
            Op::Jump => "JUMP",
            Op::JumpIfFalse => "JUMP_IF_FALSE",
            Op::JumpIfTrue => "JUMP_IF_TRUE",
            Op::ScopeBegin => "SCOPE_BEGIN",
            Op::ScopeEnd => "SCOPE_END",
            Op::Return => "RETURN",
        }
    }
}

impl TryFrom<u8> for Op {
    type Error = SerdeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0 => Op::Constant,
            1 => Op::Null,
            2 => Op::True,
            3 => Op::False,
            4 => Op::Pop,
            5 => Op::Negate,
            6 => Op::Not,
            7 => Op::Add,
            8 => Op::Subtract,
            9 => Op::Multiply,
            10 => Op::Divide,
            11 => Op::Equal,
            12 => Op::Greater,
            13 => Op::Less,
            14 => Op::Print,
            15 => Op::GlobalVarDef,
            16 => Op::GlobalVarGet,
            17 => Op::GlobalVarSet,
            18 => Op::LocalVarGet,
            19 => Op::LocalVarSet,
            20 => Op::Jump,
            21 => Op::JumpIfFalse,
            22 => Op::JumpIfTrue,
            23 => Op::ScopeBegin,
            24 => Op::ScopeEnd,
            25 => Op::Return,
            other => return Err(SerdeError::UnknownOpcode(other)),
        })
    }
}

impl From<Op> for u8 {
    fn from(op: Op) -> u8 {
        op as u8
    }
}
