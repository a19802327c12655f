//! Ready-made combinators over dynamically-typed [`Value`]s.
//!
//! Binary operations dispatch on the [`ValueKind`](crate::types::ValueKind) of their
//! operands. Operands of different kinds fail with [`ProcessingError::IncompatibleKinds`];
//! a kind the operation has no meaning for fails with [`ProcessingError::UnsupportedKind`].

use std::cmp::Ordering;

use crate::context::Context;
use crate::error::{ProcessingError, ProcessingResult};
use crate::processing::function::{Apply, Combine, Transform, apply};
use crate::processing::predicate::{Not, Or, Predicate, not, or};
use crate::types::Value;

/// Arithmetic operation applied by [`Arithmetic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    /// `a + b`
    Sum,
    /// `a - b`
    Difference,
    /// `a * b`
    Product,
}

impl ArithmeticOp {
    fn name(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Difference => "negative_sum",
            Self::Product => "multiply",
        }
    }

    fn int64(self, a: i64, b: i64) -> Option<i64> {
        match self {
            Self::Sum => a.checked_add(b),
            Self::Difference => a.checked_sub(b),
            Self::Product => a.checked_mul(b),
        }
    }

    fn float64(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Sum => a + b,
            Self::Difference => a - b,
            Self::Product => a * b,
        }
    }
}

fn kind_mismatch(op: &'static str, left: &Value, right: &Value) -> ProcessingError {
    if left.kind() == right.kind() {
        ProcessingError::UnsupportedKind {
            op,
            kind: left.kind(),
        }
    } else {
        ProcessingError::IncompatibleKinds {
            op,
            left: left.kind(),
            right: right.kind(),
        }
    }
}

/// Numeric [`Combine`] over `Int64` and `Float64` values.
///
/// Integer overflow is an error rather than a wrap.
#[derive(Debug, Clone, Copy)]
pub struct Arithmetic {
    op: ArithmeticOp,
}

impl Combine<Value, Value> for Arithmetic {
    fn call(&self, _ctx: &Context, acc: Value, item: &Value) -> ProcessingResult<Value> {
        let name = self.op.name();
        match (&acc, item) {
            (Value::Int64(a), Value::Int64(b)) => self
                .op
                .int64(*a, *b)
                .map(Value::Int64)
                .ok_or(ProcessingError::Overflow { op: name }),
            (Value::Float64(a), Value::Float64(b)) => Ok(Value::Float64(self.op.float64(*a, *b))),
            (left, right) => Err(kind_mismatch(name, left, right)),
        }
    }
}

/// `a + b`.
pub fn sum() -> Arithmetic {
    Arithmetic {
        op: ArithmeticOp::Sum,
    }
}

/// `a - b`.
pub fn negative_sum() -> Arithmetic {
    Arithmetic {
        op: ArithmeticOp::Difference,
    }
}

/// `a * b`.
pub fn multiply() -> Arithmetic {
    Arithmetic {
        op: ArithmeticOp::Product,
    }
}

/// Transform computing `a + x`.
pub fn add(a: impl Into<Value>) -> Apply<Value, Arithmetic> {
    apply(a.into(), sum())
}

/// Transform computing `a - x`.
pub fn sub(a: impl Into<Value>) -> Apply<Value, Arithmetic> {
    apply(a.into(), negative_sum())
}

/// Transform computing `a * x`.
pub fn mul(a: impl Into<Value>) -> Apply<Value, Arithmetic> {
    apply(a.into(), multiply())
}

/// Joins two `Utf8` values with a separator. Built with [`concat`].
#[derive(Debug, Clone)]
pub struct Concat {
    separator: String,
}

impl Combine<Value, Value> for Concat {
    fn call(&self, _ctx: &Context, acc: Value, item: &Value) -> ProcessingResult<Value> {
        match (&acc, item) {
            (Value::Utf8(a), Value::Utf8(b)) => {
                let mut out = String::with_capacity(a.len() + self.separator.len() + b.len());
                out.push_str(a);
                out.push_str(&self.separator);
                out.push_str(b);
                Ok(Value::Utf8(out))
            }
            (Value::Utf8(_), other) => Err(ProcessingError::UnsupportedKind {
                op: "concat",
                kind: other.kind(),
            }),
            (other, _) => Err(ProcessingError::UnsupportedKind {
                op: "concat",
                kind: other.kind(),
            }),
        }
    }
}

/// `a + separator + b` for `Utf8` values.
pub fn concat(separator: impl Into<String>) -> Concat {
    Concat {
        separator: separator.into(),
    }
}

/// Renders any value as `Utf8`. Built with [`stringify`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Stringify;

impl Transform<Value, Value> for Stringify {
    fn call(&self, _ctx: &Context, item: &Value) -> ProcessingResult<Value> {
        Ok(match item {
            Value::Utf8(s) => Value::Utf8(s.clone()),
            other => Value::Utf8(other.to_string()),
        })
    }
}

pub fn stringify() -> Stringify {
    Stringify
}

/// Orders `x` against a bound. Built with [`gt`] and [`lt`].
#[derive(Debug, Clone)]
pub struct Compare {
    bound: Value,
    expect: Ordering,
}

impl Compare {
    fn name(&self) -> &'static str {
        match self.expect {
            Ordering::Greater => "gt",
            Ordering::Less => "lt",
            Ordering::Equal => "eq",
        }
    }
}

impl Predicate<Value> for Compare {
    fn test(&self, _ctx: &Context, item: &Value) -> ProcessingResult<bool> {
        let ordering = match (item, &self.bound) {
            (Value::Int64(x), Value::Int64(a)) => Some(x.cmp(a)),
            // NaN compares false both ways.
            (Value::Float64(x), Value::Float64(a)) => x.partial_cmp(a),
            (Value::Utf8(x), Value::Utf8(a)) => Some(x.as_str().cmp(a.as_str())),
            (left, right) => return Err(kind_mismatch(self.name(), left, right)),
        };
        Ok(ordering == Some(self.expect))
    }
}

/// `x > a` for `Int64`, `Float64` and `Utf8` values.
pub fn gt(a: impl Into<Value>) -> Compare {
    Compare {
        bound: a.into(),
        expect: Ordering::Greater,
    }
}

/// `x < a` for `Int64`, `Float64` and `Utf8` values.
pub fn lt(a: impl Into<Value>) -> Compare {
    Compare {
        bound: a.into(),
        expect: Ordering::Less,
    }
}

/// Structural equality against a bound. Never fails. Built with [`eq`].
#[derive(Debug, Clone)]
pub struct Equals {
    bound: Value,
}

impl Predicate<Value> for Equals {
    fn test(&self, _ctx: &Context, item: &Value) -> ProcessingResult<bool> {
        Ok(*item == self.bound)
    }
}

pub fn eq(a: impl Into<Value>) -> Equals {
    Equals { bound: a.into() }
}

/// `x >= a`, as `or(gt(a), eq(a))`.
pub fn gte(a: impl Into<Value>) -> Or<Value> {
    let a = a.into();
    or(vec![gt(a.clone()).boxed(), eq(a).boxed()])
}

/// `x <= a`, as `or(lt(a), eq(a))`.
pub fn lte(a: impl Into<Value>) -> Or<Value> {
    let a = a.into();
    or(vec![lt(a.clone()).boxed(), eq(a).boxed()])
}

/// `x != a`.
pub fn neq(a: impl Into<Value>) -> Not<Equals> {
    not(eq(a))
}
