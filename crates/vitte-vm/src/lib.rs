//! vitte-vm — stack-based bytecode interpreter
//!
//! Fetch-execute loop over a [`vitte_core::Chunk`], grounded on
//! `original_source/clox/src/vm.h`'s `run()`. Two deliberate departures
//! from that original, both load-bearing for the REPL (§4.6, §6):
//!
//! - Locals address the stack directly by slot (no `frameBase` offset,
//!   since this VM never calls into functions — §4.6 Non-goals); globals
//!   live in a `HashMap<String, Value>` rather than the original's
//!   intrusive `_globalVariables` map keyed by raw `char*`.
//! - `globals` and the object allocation list survive across calls to
//!   [`Vm::interpret`]; only the operand stack and instruction pointer
//!   reset. This is what lets a REPL session accumulate `var`
//!   declarations across lines the way `vm.h::repl()`'s single
//!   long-lived `VirtualMachine` does.
//!
//! ## Features
//! - **tracing**: instruments the run pipeline — a span around
//!   [`Vm::interpret`] plus entry/exit summaries of the chunk executed.

#![deny(rust_2018_idioms, unused_must_use)]

mod error;

pub use error::RuntimeError;

use std::collections::HashMap;

use vitte_core::{Chunk, ObjectRef, Op, Value};

/// Default hard cap on operand stack depth (§4.6, mirroring `vm.h`'s
/// `STACK_SIZE`). Overridable per-session via [`Vm::with_capacity`], which
/// is the one ambient knob the CLI's `Config` (§1a) is allowed to thread
/// through — it never touches language semantics, only this resource
/// limit.
pub const STACK_SIZE: usize = 1024;

/// A virtual machine session. Persists global variable bindings and the
/// object allocation list across repeated [`Vm::interpret`] calls, which
/// is what makes it suitable as the backing store for a REPL (§4.6, §6).
pub struct Vm {
    stack: Vec<Value>,
    globals: HashMap<String, Value>,
    allocations: Vec<ObjectRef>,
    capacity: usize,
    trace: bool,
}

impl Default for Vm {
    fn default() -> Self {
        Self::with_capacity(STACK_SIZE)
    }
}

impl Vm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a session with a non-default stack capacity (§1a
    /// `Config`). Language behavior is unaffected; only the point at
    /// which `StackOverflow` fires changes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stack: Vec::new(),
            globals: HashMap::new(),
            allocations: Vec::new(),
            capacity,
            trace: false,
        }
    }

    /// Enable the `-step_debugging` instruction trace (grounded in
    /// `original_source/clox/src/vm.h`'s `DEBUG_TRACE_EXECUTION` block):
    /// before executing each instruction, the operand stack, the global
    /// variables and the disassembled instruction are written to stderr.
    /// Purely observational — never changes the bytecode executed.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Read-only view of the currently-bound globals, used by the CLI's
    /// step-debugging trace and by tests.
    pub fn globals(&self) -> &HashMap<String, Value> {
        &self.globals
    }

    /// Number of heap objects the VM has allocated over its lifetime
    /// (string concatenation results, primarily). Exists for parity with
    /// the original's allocation bookkeeping, not because Rust needs it
    /// to free memory — `Rc` already does that.
    pub fn allocation_count(&self) -> usize {
        self.allocations.len()
    }

    /// Run `chunk` to completion. Resets the operand stack and
    /// instruction pointer; `globals` and the allocation list carry over
    /// from any previous call on this `Vm`.
    pub fn interpret(&mut self, chunk: &Chunk) -> Result<Option<Value>, RuntimeError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("interpret", code_len = chunk.len()).entered();

        self.stack.clear();
        let mut ip = 0usize;
        let mut trace_last_line: Option<u32> = None;

        loop {
            if self.trace {
                self.print_trace(chunk, ip, &mut trace_last_line);
            }

            let line = chunk.line_at(ip).unwrap_or(0);
            let byte = chunk.byte_at(ip);
            let op = Op::try_from(byte)
                .map_err(|source| RuntimeError::CorruptBytecode { line, source })?;
            ip += 1;

            match op {
                Op::Constant => {
                    let idx = chunk.byte_at(ip);
                    ip += 1;
                    let value = chunk.constant(idx).cloned().unwrap_or(Value::Undefined);
                    self.push(value, line)?;
                }
                Op::Null => self.push(Value::Null, line)?,
                Op::True => self.push(Value::Bool(true), line)?,
                Op::False => self.push(Value::Bool(false), line)?,
                Op::Pop => {
                    self.pop(line)?;
                }
                Op::Negate => {
                    let value = self.pop(line)?;
                    let result = value
                        .negate()
                        .map_err(|_| RuntimeError::NotANumber { line })?;
                    self.push(result, line)?;
                }
                Op::Not => {
                    let value = self.pop(line)?;
                    self.push(Value::Bool(value.is_falsey()), line)?;
                }
                Op::Add | Op::Subtract | Op::Multiply | Op::Divide => {
                    self.binary_arith(op, line)?;
                }
                Op::Equal => {
                    let b = self.pop(line)?;
                    let a = self.pop(line)?;
                    self.push(Value::Bool(a.equal(&b)), line)?;
                }
                Op::Greater => {
                    let b = self.pop(line)?;
                    let a = self.pop(line)?;
                    let result = a.greater(&b).map_err(|e| RuntimeError::from_value_error(e, line))?;
                    self.push(Value::Bool(result), line)?;
                }
                Op::Less => {
                    let b = self.pop(line)?;
                    let a = self.pop(line)?;
                    let result = a.less(&b).map_err(|e| RuntimeError::from_value_error(e, line))?;
                    self.push(Value::Bool(result), line)?;
                }
                Op::Print => {
                    let value = self.peek(0, line)?;
                    println!("{value}");
                    self.pop(line)?;
                }
                Op::GlobalVarDef => {
                    let idx = chunk.byte_at(ip);
                    ip += 1;
                    let name = self.constant_name(chunk, idx, line)?;
                    let value = self.pop(line)?;
                    self.globals.insert(name, value);
                }
                Op::GlobalVarGet => {
                    let idx = chunk.byte_at(ip);
                    ip += 1;
                    let name = self.constant_name(chunk, idx, line)?;
                    let value = self
                        .globals
                        .get(&name)
                        .cloned()
                        .ok_or_else(|| RuntimeError::UndefinedVariable { line, name: name.clone() })?;
                    self.push(value, line)?;
                }
                Op::GlobalVarSet => {
                    let idx = chunk.byte_at(ip);
                    ip += 1;
                    let name = self.constant_name(chunk, idx, line)?;
                    if !self.globals.contains_key(&name) {
                        return Err(RuntimeError::UndefinedVariable { line, name });
                    }
                    let value = self.peek(0, line)?.clone();
                    self.globals.insert(name, value);
                }
                Op::LocalVarGet => {
                    let slot = chunk.byte_at(ip) as usize;
                    ip += 1;
                    let value = self.stack.get(slot).cloned().unwrap_or(Value::Undefined);
                    self.push(value, line)?;
                }
                Op::LocalVarSet => {
                    let slot = chunk.byte_at(ip) as usize;
                    ip += 1;
                    let value = self.peek(0, line)?.clone();
                    if slot < self.stack.len() {
                        self.stack[slot] = value;
                    }
                }
                Op::Jump => {
                    let offset = chunk.u16_at(ip) as i16;
                    ip += 2;
                    ip = (ip as i64 + offset as i64) as usize;
                }
                Op::JumpIfFalse => {
                    let offset = chunk.u16_at(ip) as i16;
                    ip += 2;
                    if self.peek(0, line)?.is_falsey() {
                        ip = (ip as i64 + offset as i64) as usize;
                    }
                }
                Op::JumpIfTrue => {
                    let offset = chunk.u16_at(ip) as i16;
                    ip += 2;
                    if !self.peek(0, line)?.is_falsey() {
                        ip = (ip as i64 + offset as i64) as usize;
                    }
                }
                Op::ScopeBegin | Op::ScopeEnd => {}
                Op::Return => {
                    let result = self.stack.pop();
                    #[cfg(feature = "tracing")]
                    tracing::debug!(ip, globals = self.globals.len(), "interpret returned");
                    return Ok(result);
                }
            }

            if ip >= chunk.len() {
                let result = self.stack.pop();
                #[cfg(feature = "tracing")]
                tracing::debug!(ip, globals = self.globals.len(), "interpret fell off the end");
                return Ok(result);
            }
        }
    }

    fn print_trace(&self, chunk: &Chunk, offset: usize, last_line: &mut Option<u32>) {
        eprint!(" Stack: ");
        for slot in &self.stack {
            eprint!("[{slot}]");
        }
        eprintln!();

        eprint!(" Variables: ");
        for (name, value) in &self.globals {
            eprint!("{name}=[{value}]");
        }
        eprintln!();

        let mut listing = String::new();
        vitte_core::disasm::disassemble_instruction(chunk, offset, last_line, &mut listing);
        eprint!(" {listing}");
    }

    fn binary_arith(&mut self, op: Op, line: u32) -> Result<(), RuntimeError> {
        let b = self.pop(line)?;
        let a = self.pop(line)?;
        let result = match op {
            Op::Add => a.add(&b),
            Op::Subtract => a.sub(&b),
            Op::Multiply => a.mul(&b),
            Op::Divide => a.div(&b),
            _ => unreachable!("binary_arith only called for arithmetic opcodes"),
        };
        let value = result.map_err(|e| RuntimeError::from_value_error(e, line))?;
        if let Value::Object(obj) = &value {
            self.allocations.push(obj.clone());
        }
        self.push(value, line)
    }

    fn constant_name(&self, chunk: &Chunk, idx: u8, line: u32) -> Result<String, RuntimeError> {
        match chunk.constant(idx) {
            Some(Value::Object(s)) => Ok(s.as_str().to_string()),
            _ => Err(RuntimeError::CorruptBytecode {
                line,
                source: vitte_core::SerdeError::UnknownConstantType(idx),
            }),
        }
    }

    fn push(&mut self, value: Value, line: u32) -> Result<(), RuntimeError> {
        if self.stack.len() >= self.capacity {
            return Err(RuntimeError::StackOverflow { line });
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self, line: u32) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow { line })
    }

    fn peek(&self, distance: usize, line: u32) -> Result<&Value, RuntimeError> {
        let len = self.stack.len();
        if distance >= len {
            return Err(RuntimeError::StackUnderflow { line });
        }
        Ok(&self.stack[len - 1 - distance])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitte_compiler::compile;

    fn run(source: &str) -> Result<Option<Value>, RuntimeError> {
        let chunk = compile(source).expect("expected source to compile");
        Vm::new().interpret(&chunk)
    }

    #[test]
    fn integer_arithmetic_truncates_toward_zero() {
        let mut vm = Vm::new();
        let chunk = compile("var r = -7 / 2;").unwrap();
        vm.interpret(&chunk).unwrap();
        assert_eq!(vm.globals().get("r"), Some(&Value::Integer(-3)));
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let err = run("1 / 0;").unwrap_err();
        assert!(matches!(err, RuntimeError::DivisionByZero { .. }));
    }

    #[test]
    fn globals_persist_across_interpret_calls() {
        let mut vm = Vm::new();
        let define = compile("var x = 3;").unwrap();
        vm.interpret(&define).unwrap();
        assert_eq!(vm.globals().get("x"), Some(&Value::Integer(3)));

        let use_it = compile("x = x + 1;").unwrap();
        vm.interpret(&use_it).unwrap();
        assert_eq!(vm.globals().get("x"), Some(&Value::Integer(4)));
    }

    #[test]
    fn undefined_global_is_a_runtime_error() {
        let err = run("y;").unwrap_err();
        assert!(matches!(err, RuntimeError::UndefinedVariable { .. }));
    }

    #[test]
    fn while_loop_runs_to_completion() {
        let mut vm = Vm::new();
        let chunk = compile("var i = 0; while (i < 3) { i = i + 1; }").unwrap();
        vm.interpret(&chunk).unwrap();
        assert_eq!(vm.globals().get("i"), Some(&Value::Integer(3)));
    }

    #[test]
    fn for_loop_runs_its_full_three_clause_form() {
        let mut vm = Vm::new();
        let chunk =
            compile("var total = 0; for (var i = 0; i < 5; i = i + 1) { total = total + i; }")
                .unwrap();
        vm.interpret(&chunk).unwrap();
        assert_eq!(vm.globals().get("total"), Some(&Value::Integer(10)));
    }

    #[test]
    fn string_concatenation_allocates_and_is_tracked() {
        let mut vm = Vm::new();
        let chunk = compile("\"foo\" + \"bar\";").unwrap();
        vm.interpret(&chunk).unwrap();
        assert_eq!(vm.allocation_count(), 1);
    }
}
