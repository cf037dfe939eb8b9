//! Tagged value model and heap-allocated string objects (§3, §4.1).
//!
//! `Value` is a sum type over `{Null, Bool, Integer, Number, Object,
//! Undefined}`. The original C++ core backs `Object` with a hand-rolled
//! intrusive linked list of `malloc`'d records; this workspace forbids
//! `unsafe_code`, so the allocation list is realized instead as a plain
//! `Vec<ObjectRef>` owned by the VM, with `Value::Object` holding a cheap
//! `Rc` clone rather than a raw pointer. See `DESIGN.md` for the rationale.

use std::fmt;
use std::rc::Rc;

/// A heap-allocated, immutable byte string. The only `Object` variant the
/// core implements (§3).
#[derive(Debug, PartialEq, Eq)]
pub struct ObjectString {
    bytes: Vec<u8>,
}

impl ObjectString {
    /// The empty string, used when deserializing placeholder/default constants.
    pub fn empty() -> Rc<Self> {
        Rc::new(Self { bytes: Vec::new() })
    }

    /// Allocate a new string by copying `text`. Used for scanner lexemes,
    /// which only borrow into the source buffer and must not outlive it.
    pub fn from_copy(text: &str) -> Rc<Self> {
        Rc::new(Self { bytes: text.as_bytes().to_vec() })
    }

    /// Allocate a new string holding raw bytes (used by the deserializer,
    /// which has already validated UTF-8).
    pub fn from_bytes(bytes: Vec<u8>) -> Rc<Self> {
        Rc::new(Self { bytes })
    }

    /// Allocate a fresh string by concatenating two existing ones.
    pub fn concat(a: &ObjectString, b: &ObjectString) -> Rc<Self> {
        let mut bytes = Vec::with_capacity(a.bytes.len() + b.bytes.len());
        bytes.extend_from_slice(&a.bytes);
        bytes.extend_from_slice(&b.bytes);
        Rc::new(Self { bytes })
    }

    /// Borrow the string as UTF-8 text. Every constructor above is fed
    /// valid UTF-8, so this never fails in practice; scanner-sourced and
    /// deserializer-sourced bytes are both validated at their origin.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).unwrap_or("")
    }

    /// Raw byte length (cached implicitly by `Vec::len`).
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for the zero-length string.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw bytes, for serialization.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for ObjectString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-owning (but reference-counted) handle into the object heap.
pub type ObjectRef = Rc<ObjectString>;

/// A runtime value. Tag determines which payload is valid (§3).
#[derive(Debug, Clone)]
pub enum Value {
    /// Uninitialized-slot marker. Must never reach the operand stack.
    Undefined,
    /// The `null` literal.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// 32-bit signed integer (no `.` in the source literal).
    Integer(i32),
    /// 64-bit IEEE-754 double (source literal contains a `.`).
    Number(f64),
    /// Heap-allocated object (only `String` exists today).
    Object(ObjectRef),
}

/// Failure of a pure [`Value`] operation. The VM attaches the current
/// source line and promotes this into a `RuntimeError` (§7); `vitte-core`
/// itself stays line-number-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueError {
    /// Operand tags are incompatible with the operator.
    TypeMismatch,
    /// Integer division or modulo by an Integer zero.
    DivisionByZero,
}

impl Value {
    /// `isFalsey`: true iff `Null` or `Bool(false)` (§4.1).
    pub fn is_falsey(&self) -> bool {
        matches!(self, Value::Null | Value::Bool(false))
    }

    /// `equal(a,b)`. Differing tags are unequal; matching tags compare
    /// componentwise, strings by length then bytes.
    pub fn equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len() && a.as_bytes() == b.as_bytes()
            }
            _ => false,
        }
    }

    /// `less(a,b)`. Defined only for matching numeric tags and for strings.
    pub fn less(&self, other: &Value) -> Result<bool, ValueError> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Ok(a < b),
            (Value::Number(a), Value::Number(b)) => Ok(a < b),
            (Value::Object(a), Value::Object(b)) => Ok(a.as_bytes() < b.as_bytes()),
            _ => Err(ValueError::TypeMismatch),
        }
    }

    /// `greater(a,b)`. Defined only for matching numeric tags and for strings.
    pub fn greater(&self, other: &Value) -> Result<bool, ValueError> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Ok(a > b),
            (Value::Number(a), Value::Number(b)) => Ok(a > b),
            (Value::Object(a), Value::Object(b)) => Ok(a.as_bytes() > b.as_bytes()),
            _ => Err(ValueError::TypeMismatch),
        }
    }

    /// `negate(v)`. Defined for `Integer` and `Number`.
    pub fn negate(&self) -> Result<Value, ValueError> {
        match self {
            Value::Integer(i) => Ok(Value::Integer(i.wrapping_neg())),
            Value::Number(n) => Ok(Value::Number(-n)),
            _ => Err(ValueError::TypeMismatch),
        }
    }

    /// `a + b`. Matching Integer pair wraps on overflow; matching Number
    /// pair adds; two Strings concatenate into a freshly allocated String.
    /// No other combination is defined (no implicit Integer/Number
    /// promotion — see §9).
    pub fn add(&self, other: &Value) -> Result<Value, ValueError> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_add(*b))),
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Object(a), Value::Object(b)) => {
                Ok(Value::Object(ObjectString::concat(a, b)))
            }
            _ => Err(ValueError::TypeMismatch),
        }
    }

    /// `a - b`.
    pub fn sub(&self, other: &Value) -> Result<Value, ValueError> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_sub(*b))),
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
            _ => Err(ValueError::TypeMismatch),
        }
    }

    /// `a * b`.
    pub fn mul(&self, other: &Value) -> Result<Value, ValueError> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_mul(*b))),
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
            _ => Err(ValueError::TypeMismatch),
        }
    }

    /// `a / b`. Integer division truncates toward zero and rejects a zero
    /// divisor as a `DivisionByZero` error rather than trapping or wrapping.
    pub fn div(&self, other: &Value) -> Result<Value, ValueError> {
        match (self, other) {
            (Value::Integer(_), Value::Integer(0)) => Err(ValueError::DivisionByZero),
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_div(*b))),
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
            _ => Err(ValueError::TypeMismatch),
        }
    }

    /// Tag name, used in runtime-error messages ("Operand must be a number").
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::Object(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    /// Pinned formatting rule (§4.1 "Display formatting"): `Number` uses
    /// Rust's shortest round-trippable `f64` rendering, `Integer` plain
    /// decimal, `Bool` `true`/`false`, `Null` `null`, strings raw.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Object(s) => write!(f, "{s}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falsey_rules() {
        assert!(Value::Null.is_falsey());
        assert!(Value::Bool(false).is_falsey());
        assert!(!Value::Bool(true).is_falsey());
        assert!(!Value::Integer(0).is_falsey());
    }

    #[test]
    fn integer_division_truncates_and_rejects_zero() {
        assert_eq!(Value::Integer(7).div(&Value::Integer(2)), Ok(Value::Integer(3)));
        assert_eq!(Value::Integer(-7).div(&Value::Integer(2)), Ok(Value::Integer(-3)));
        assert_eq!(Value::Integer(1).div(&Value::Integer(0)), Err(ValueError::DivisionByZero));
    }

    #[test]
    fn no_implicit_numeric_promotion() {
        assert_eq!(
            Value::Integer(1).add(&Value::Number(2.0)),
            Err(ValueError::TypeMismatch)
        );
    }

    #[test]
    fn string_concat_allocates_fresh_object() {
        let a = Value::Object(ObjectString::from_copy("foo"));
        let b = Value::Object(ObjectString::from_copy("bar"));
        let c = a.add(&b).unwrap();
        assert_eq!(c.to_string(), "foobar");
    }

    #[test]
    fn equal_is_false_across_tags() {
        assert!(!Value::Integer(1).equal(&Value::Number(1.0)));
    }
}
