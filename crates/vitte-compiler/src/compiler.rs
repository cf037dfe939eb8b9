//! Single-pass Pratt compiler (§4.5 "Grammar", "Instruction set").
//!
//! There is no intermediate AST: each parse function emits bytecode
//! directly into the [`Chunk`] it is building, the way
//! `original_source/clox/src/compiler.h`'s `parsePrecedence` does. Locals
//! resolve to stack slots at compile time; globals resolve to a constant
//! pool slot holding their name.

use vitte_core::{Chunk, ObjectString, Op, Value};

use crate::error::CompileError;
use crate::scanner::{Scanner, Token, TokenType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    fn next(self) -> Self {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

struct Local<'src> {
    name: &'src str,
    depth: i32,
}

/// Compiles one source string into one [`Chunk`]. Every call starts a
/// fresh compiler; there is no persistent cross-call compiler state (the
/// VM, not the compiler, is what persists across REPL lines).
pub struct Compiler<'src> {
    scanner: Scanner<'src>,
    previous: Token<'src>,
    current: Token<'src>,
    chunk: Chunk,
    locals: Vec<Local<'src>>,
    scope_depth: i32,
    had_error: bool,
    panic_mode: bool,
    errors: Vec<CompileError>,
}

const MAX_LOCALS: usize = 256;

type ParseFn<'src> = fn(&mut Compiler<'src>, bool);

struct ParseRule<'src> {
    prefix: Option<ParseFn<'src>>,
    infix: Option<ParseFn<'src>>,
    precedence: Precedence,
}

fn rule<'src>(kind: TokenType) -> ParseRule<'src> {
    use Precedence as P;
    use TokenType as T;
    match kind {
        T::LeftParen => ParseRule { prefix: Some(Compiler::grouping), infix: None, precedence: P::None },
        T::Minus => ParseRule { prefix: Some(Compiler::unary), infix: Some(Compiler::binary), precedence: P::Term },
        T::Plus => ParseRule { prefix: None, infix: Some(Compiler::binary), precedence: P::Term },
        T::Slash => ParseRule { prefix: None, infix: Some(Compiler::binary), precedence: P::Factor },
        T::Star => ParseRule { prefix: None, infix: Some(Compiler::binary), precedence: P::Factor },
        T::Bang => ParseRule { prefix: Some(Compiler::unary), infix: None, precedence: P::None },
        T::BangEqual => ParseRule { prefix: None, infix: Some(Compiler::binary), precedence: P::Equality },
        T::EqualEqual => ParseRule { prefix: None, infix: Some(Compiler::binary), precedence: P::Equality },
        T::Greater => ParseRule { prefix: None, infix: Some(Compiler::binary), precedence: P::Comparison },
        T::GreaterEqual => ParseRule { prefix: None, infix: Some(Compiler::binary), precedence: P::Comparison },
        T::Less => ParseRule { prefix: None, infix: Some(Compiler::binary), precedence: P::Comparison },
        T::LessEqual => ParseRule { prefix: None, infix: Some(Compiler::binary), precedence: P::Comparison },
        T::Identifier => ParseRule { prefix: Some(Compiler::variable), infix: None, precedence: P::None },
        T::String => ParseRule { prefix: Some(Compiler::string), infix: None, precedence: P::None },
        T::Number => ParseRule { prefix: Some(Compiler::integer), infix: None, precedence: P::None },
        T::NumberFloat => ParseRule { prefix: Some(Compiler::number), infix: None, precedence: P::None },
        T::True => ParseRule { prefix: Some(Compiler::literal), infix: None, precedence: P::None },
        T::False => ParseRule { prefix: Some(Compiler::literal), infix: None, precedence: P::None },
        T::Null => ParseRule { prefix: Some(Compiler::literal), infix: None, precedence: P::None },
        _ => ParseRule { prefix: None, infix: None, precedence: P::None },
    }
}

impl<'src> Compiler<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.scan_token();
        Self {
            scanner,
            previous: current,
            current,
            chunk: Chunk::new(),
            locals: Vec::new(),
            scope_depth: 0,
            had_error: false,
            panic_mode: false,
            errors: Vec::new(),
        }
    }

    /// Compile the full program and hand back the finished chunk, or the
    /// collected diagnostics if anything went wrong.
    pub fn compile(mut self) -> Result<Chunk, Vec<CompileError>> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("compile").entered();

        while !self.check(TokenType::Eof) {
            self.declaration();
        }
        self.consume(TokenType::Eof, "expected end of expression");

        if self.had_error {
            #[cfg(feature = "tracing")]
            tracing::debug!(errors = self.errors.len(), "compile failed");
            return Err(self.errors);
        }

        let line = self.previous.line;
        self.emit_op(Op::Return, line);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            code_len = self.chunk.len(),
            consts = self.chunk.constants().len(),
            "compile finished"
        );

        Ok(self.chunk)
    }

    // ---- token plumbing -------------------------------------------------

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind != TokenType::Error {
                break;
            }
            self.error_at_current(self.current.lexeme);
        }
    }

    fn check(&self, kind: TokenType) -> bool {
        self.current.kind == kind
    }

    fn matches(&mut self, kind: TokenType) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    fn consume(&mut self, kind: TokenType, message: &str) {
        if self.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current_owned(message.to_string());
    }

    fn error_at_current(&mut self, message: &str) {
        self.error_at_current_owned(message.to_string());
    }

    fn error_at_current_owned(&mut self, message: String) {
        self.record_error(self.current, message);
    }

    fn error(&mut self, message: &str) {
        self.record_error(self.previous, message.to_string());
    }

    fn record_error(&mut self, token: Token<'src>, message: String) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;
        let err = if token.kind == TokenType::Eof {
            CompileError::at_eof(token.line, message)
        } else if token.kind == TokenType::Error {
            CompileError::new(token.line, "", message)
        } else {
            CompileError::new(token.line, token.lexeme, message)
        };
        self.errors.push(err);
    }

    /// Resynchronize after an error at the next statement boundary (§4.5
    /// "Error recovery").
    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.current.kind != TokenType::Eof {
            if self.previous.kind == TokenType::Semicolon {
                return;
            }
            match self.current.kind {
                TokenType::Class
                | TokenType::Func
                | TokenType::Var
                | TokenType::For
                | TokenType::If
                | TokenType::While
                | TokenType::Print
                | TokenType::Return => return,
                _ => {}
            }
            self.advance();
        }
    }

    // ---- bytecode emission ----------------------------------------------

    fn emit_op(&mut self, op: Op, line: u32) {
        self.chunk.write_op(op, line).expect("code segment capacity exceeded");
    }

    fn emit_byte(&mut self, byte: u8, line: u32) {
        self.chunk.write_byte(byte, line).expect("code segment capacity exceeded");
    }

    fn emit_constant(&mut self, value: Value) {
        let line = self.previous.line;
        match self.chunk.add_constant(value) {
            Ok(idx) => {
                self.emit_op(Op::Constant, line);
                self.emit_byte(idx, line);
            }
            Err(_) => self.error("too many constants in one chunk"),
        }
    }

    /// Emit a jump opcode with a two-byte placeholder, returning the
    /// offset of the placeholder's first byte for later patching.
    fn emit_jump(&mut self, op: Op) -> usize {
        let line = self.previous.line;
        self.emit_op(op, line);
        self.emit_byte(0xFF, line);
        self.emit_byte(0xFF, line);
        self.chunk.len() - 2
    }

    fn patch_jump(&mut self, offset: usize) {
        let target = self.chunk.len();
        let distance = target - (offset + 2);
        if distance > u16::MAX as usize {
            self.error("too much code to jump over");
            return;
        }
        self.chunk.patch_jump(offset, distance as u16);
    }

    /// Emit a backward `Jump` to `loop_start`. `off:i16` is added to `ip`
    /// *after* the two operand bytes are consumed, so the offset here is
    /// `loop_start - (placeholder + 2)` — negative, stored as its `i16`
    /// bit pattern reinterpreted as `u16` (§4.5 jump encoding).
    fn emit_loop(&mut self, loop_start: usize) {
        let line = self.previous.line;
        self.emit_op(Op::Jump, line);
        let placeholder = self.chunk.len();
        self.emit_byte(0xFF, line);
        self.emit_byte(0xFF, line);
        let next_ip = self.chunk.len();

        let distance = next_ip - loop_start;
        if distance > u16::MAX as usize {
            self.error("loop body too large");
            return;
        }
        let offset = (loop_start as i64 - next_ip as i64) as i16;
        self.chunk.patch_jump(placeholder, offset as u16);
    }

    // ---- expressions ------------------------------------------------------

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let prefix = rule::<'src>(self.previous.kind).prefix;
        let Some(prefix) = prefix else {
            self.error("expected an expression");
            return;
        };
        let can_assign = precedence <= Precedence::Assignment;
        prefix(self, can_assign);

        while precedence <= rule::<'src>(self.current.kind).precedence {
            self.advance();
            let infix = rule::<'src>(self.previous.kind).infix.expect("precedence table consistency");
            infix(self, can_assign);
        }

        if can_assign && self.matches(TokenType::Equal) {
            self.error("invalid assignment target");
        }
    }

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn grouping(&mut self, _can_assign: bool) {
        self.expression();
        self.consume(TokenType::RightParen, "expected ')' after expression");
    }

    fn unary(&mut self, _can_assign: bool) {
        let kind = self.previous.kind;
        let line = self.previous.line;
        self.parse_precedence(Precedence::Unary);
        match kind {
            TokenType::Minus => self.emit_op(Op::Negate, line),
            TokenType::Bang => self.emit_op(Op::Not, line),
            _ => unreachable!("unary rule only registered for Minus and Bang"),
        }
    }

    fn binary(&mut self, _can_assign: bool) {
        let kind = self.previous.kind;
        let line = self.previous.line;
        let next_precedence = rule::<'src>(kind).precedence.next();
        self.parse_precedence(next_precedence);

        match kind {
            TokenType::Plus => self.emit_op(Op::Add, line),
            TokenType::Minus => self.emit_op(Op::Subtract, line),
            TokenType::Star => self.emit_op(Op::Multiply, line),
            TokenType::Slash => self.emit_op(Op::Divide, line),
            TokenType::EqualEqual => self.emit_op(Op::Equal, line),
            TokenType::BangEqual => {
                self.emit_op(Op::Equal, line);
                self.emit_op(Op::Not, line);
            }
            TokenType::Greater => self.emit_op(Op::Greater, line),
            TokenType::GreaterEqual => {
                self.emit_op(Op::Less, line);
                self.emit_op(Op::Not, line);
            }
            TokenType::Less => self.emit_op(Op::Less, line),
            TokenType::LessEqual => {
                self.emit_op(Op::Greater, line);
                self.emit_op(Op::Not, line);
            }
            _ => unreachable!("binary rule only registered for arithmetic/comparison tokens"),
        }
    }

    fn literal(&mut self, _can_assign: bool) {
        match self.previous.kind {
            TokenType::True => self.emit_op(Op::True, self.previous.line),
            TokenType::False => self.emit_op(Op::False, self.previous.line),
            TokenType::Null => self.emit_op(Op::Null, self.previous.line),
            _ => unreachable!("literal rule only registered for True/False/Null"),
        }
    }

    fn integer(&mut self, _can_assign: bool) {
        match self.previous.lexeme.parse::<i32>() {
            Ok(value) => self.emit_constant(Value::Integer(value)),
            Err(_) => self.error("integer literal out of range"),
        }
    }

    fn number(&mut self, _can_assign: bool) {
        match self.previous.lexeme.parse::<f64>() {
            Ok(value) => self.emit_constant(Value::Number(value)),
            Err(_) => self.error("invalid number literal"),
        }
    }

    fn string(&mut self, _can_assign: bool) {
        let value = Value::Object(ObjectString::from_copy(self.previous.lexeme));
        self.emit_constant(value);
    }

    fn variable(&mut self, can_assign: bool) {
        self.named_variable(self.previous, can_assign);
    }

    fn named_variable(&mut self, name: Token<'src>, can_assign: bool) {
        let line = name.line;
        if let Some(slot) = self.resolve_local(name.lexeme) {
            if can_assign && self.matches(TokenType::Equal) {
                self.expression();
                self.emit_op(Op::LocalVarSet, line);
                self.emit_byte(slot as u8, line);
            } else {
                self.emit_op(Op::LocalVarGet, line);
                self.emit_byte(slot as u8, line);
            }
            return;
        }

        let idx = self.identifier_constant(name.lexeme);
        if can_assign && self.matches(TokenType::Equal) {
            self.expression();
            self.emit_op(Op::GlobalVarSet, line);
            self.emit_byte(idx, line);
        } else {
            self.emit_op(Op::GlobalVarGet, line);
            self.emit_byte(idx, line);
        }
    }

    fn identifier_constant(&mut self, name: &str) -> u8 {
        match self.chunk.add_constant(Value::Object(ObjectString::from_copy(name))) {
            Ok(idx) => idx,
            Err(_) => {
                self.error("too many constants in one chunk");
                0
            }
        }
    }

    // ---- locals / scopes --------------------------------------------------

    fn resolve_local(&mut self, name: &str) -> Option<usize> {
        for (slot, local) in self.locals.iter().enumerate().rev() {
            if local.name == name {
                if local.depth == -1 {
                    self.error("can't read local variable in its own initializer");
                }
                return Some(slot);
            }
        }
        None
    }

    fn begin_scope(&mut self) {
        self.scope_depth += 1;
        self.emit_op(Op::ScopeBegin, self.previous.line);
    }

    fn end_scope(&mut self) {
        self.scope_depth -= 1;
        let line = self.previous.line;
        while let Some(local) = self.locals.last() {
            if local.depth <= self.scope_depth {
                break;
            }
            self.emit_op(Op::Pop, line);
            self.locals.pop();
        }
        self.emit_op(Op::ScopeEnd, line);
    }

    fn declare_variable(&mut self, name: &'src str) {
        if self.scope_depth == 0 {
            return;
        }
        for local in self.locals.iter().rev() {
            if local.depth != -1 && local.depth < self.scope_depth {
                break;
            }
            if local.name == name {
                self.error("a variable with this name already exists in this scope");
                return;
            }
        }
        if self.locals.len() >= MAX_LOCALS {
            self.error("too many local variables in one scope");
            return;
        }
        self.locals.push(Local { name, depth: -1 });
    }

    fn mark_initialized(&mut self) {
        if self.scope_depth == 0 {
            return;
        }
        if let Some(local) = self.locals.last_mut() {
            local.depth = self.scope_depth;
        }
    }

    // ---- declarations / statements -----------------------------------------

    fn declaration(&mut self) {
        if self.matches(TokenType::Var) {
            self.var_declaration();
        } else {
            self.statement();
        }
        if self.panic_mode {
            self.synchronize();
        }
    }

    fn var_declaration(&mut self) {
        self.consume(TokenType::Identifier, "expected a variable name");
        let name = self.previous;
        self.declare_variable(name.lexeme);

        let line = name.line;
        if self.matches(TokenType::Equal) {
            self.expression();
        } else {
            self.emit_op(Op::Null, line);
        }
        self.consume(TokenType::Semicolon, "expected ';' after variable declaration");

        if self.scope_depth > 0 {
            self.mark_initialized();
            return;
        }
        let idx = self.identifier_constant(name.lexeme);
        self.emit_op(Op::GlobalVarDef, line);
        self.emit_byte(idx, line);
    }

    fn statement(&mut self) {
        if self.matches(TokenType::Print) {
            self.print_statement();
        } else if self.matches(TokenType::If) {
            self.if_statement();
        } else if self.matches(TokenType::While) {
            self.while_statement();
        } else if self.matches(TokenType::For) {
            self.for_statement();
        } else if self.matches(TokenType::LeftBrace) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    fn print_statement(&mut self) {
        let line = self.previous.line;
        self.expression();
        self.consume(TokenType::Semicolon, "expected ';' after value");
        self.emit_op(Op::Print, line);
    }

    fn expression_statement(&mut self) {
        let line = self.current.line;
        self.expression();
        self.consume(TokenType::Semicolon, "expected ';' after expression");
        self.emit_op(Op::Pop, line);
    }

    fn block(&mut self) {
        while !self.check(TokenType::RightBrace) && !self.check(TokenType::Eof) {
            self.declaration();
        }
        self.consume(TokenType::RightBrace, "expected '}' after block");
    }

    fn if_statement(&mut self) {
        let line = self.previous.line;
        self.consume(TokenType::LeftParen, "expected '(' after 'if'");
        self.expression();
        self.consume(TokenType::RightParen, "expected ')' after condition");

        let then_jump = self.emit_jump(Op::JumpIfFalse);
        self.emit_op(Op::Pop, line);
        self.statement();

        let else_jump = self.emit_jump(Op::Jump);
        self.patch_jump(then_jump);
        self.emit_op(Op::Pop, line);

        if self.matches(TokenType::Else) {
            self.statement();
        }
        self.patch_jump(else_jump);
    }

    fn while_statement(&mut self) {
        let line = self.previous.line;
        let loop_start = self.chunk.len();
        self.consume(TokenType::LeftParen, "expected '(' after 'while'");
        self.expression();
        self.consume(TokenType::RightParen, "expected ')' after condition");

        let exit_jump = self.emit_jump(Op::JumpIfFalse);
        self.emit_op(Op::Pop, line);
        self.statement();
        self.emit_loop(loop_start);

        self.patch_jump(exit_jump);
        self.emit_op(Op::Pop, line);
    }

    /// `for (init; cond; incr) body` lowered entirely to `while`-shaped
    /// jumps (§4.5 "for"): the initializer runs once in a fresh scope, the
    /// increment is spliced in after the body via a forward jump over it
    /// on the first iteration and a backward loop from the body into it
    /// on every iteration after.
    fn for_statement(&mut self) {
        self.begin_scope();
        self.consume(TokenType::LeftParen, "expected '(' after 'for'");

        if self.matches(TokenType::Semicolon) {
            // no initializer
        } else if self.matches(TokenType::Var) {
            self.var_declaration();
        } else {
            self.expression_statement();
        }

        let mut loop_start = self.chunk.len();
        let mut exit_jump = None;
        if !self.matches(TokenType::Semicolon) {
            let line = self.current.line;
            self.expression();
            self.consume(TokenType::Semicolon, "expected ';' after loop condition");
            exit_jump = Some(self.emit_jump(Op::JumpIfFalse));
            self.emit_op(Op::Pop, line);
        }

        if !self.matches(TokenType::RightParen) {
            let line = self.current.line;
            let body_jump = self.emit_jump(Op::Jump);
            let increment_start = self.chunk.len();
            self.expression();
            self.emit_op(Op::Pop, line);
            self.consume(TokenType::RightParen, "expected ')' after for clauses");

            self.emit_loop(loop_start);
            loop_start = increment_start;
            self.patch_jump(body_jump);
        }

        self.statement();
        self.emit_loop(loop_start);

        if let Some(exit_jump) = exit_jump {
            self.patch_jump(exit_jump);
            self.emit_op(Op::Pop, self.previous.line);
        }

        self.end_scope();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitte_core::serializer;

    fn compiles(source: &str) -> Chunk {
        Compiler::new(source).compile().expect("expected source to compile")
    }

    #[test]
    fn simple_expression_statement_compiles_and_round_trips() {
        let chunk = compiles("1 + 2;");
        let bytes = serializer::to_bytes(&chunk);
        assert!(serializer::from_bytes(&bytes).is_ok());
    }

    #[test]
    fn undeclared_assignment_target_is_a_compile_error() {
        let errors = Compiler::new("1 + 2 = 3;").compile().unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("invalid assignment target")));
    }

    #[test]
    fn self_referencing_initializer_is_rejected() {
        let errors = Compiler::new("{ var a = a; }").compile().unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("its own initializer")));
    }

    #[test]
    fn while_loop_emits_a_backward_jump() {
        let chunk = compiles("var i = 0; while (i) { i = 0; }");
        assert!(chunk.code().contains(&Op::Jump.into()));
    }

    #[test]
    fn for_loop_with_all_three_clauses_compiles() {
        let chunk = compiles("for (var i = 0; i < 3; i = i + 1) { print i; }");
        assert!(chunk.code().contains(&Op::Jump.into()));
        assert!(chunk.code().contains(&Op::JumpIfFalse.into()));
    }

    #[test]
    fn for_loop_with_omitted_clauses_compiles() {
        let chunk = compiles("for (;;) { print 1; }");
        assert!(chunk.code().contains(&Op::Jump.into()));
    }
}
