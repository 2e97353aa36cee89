// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Compile-time constant values.
//!
//! Arithmetic and string conversion follow the host runtime: integer
//! operations wrap, floating point follows IEEE 754, and numbers print the
//! way `Double.toString` and `Float.toString` print them.

use std::cmp::Ordering;

use tea_ast::expr::{ArithOp, Expr, Literal};
use tea_ast::token::NumberLit;
use tea_ast::{ClassId, Type};

/// A value known at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

/// The value of `expr` after its conversion chain, if it is a literal.
pub fn constant_of(expr: &Expr) -> Option<Constant> {
    let mut value = Constant::from_literal(expr.constant()?);
    for conv in &expr.conversions {
        value = value.convert(&conv.to)?;
    }
    Some(value)
}

impl Constant {
    pub fn from_literal(lit: &Literal) -> Self {
        match lit {
            Literal::Null => Constant::Null,
            Literal::Bool(b) => Constant::Bool(*b),
            Literal::String(s) => Constant::String(s.clone()),
            Literal::Number(NumberLit::Int(v)) => Constant::Int(*v),
            Literal::Number(NumberLit::Long(v)) => Constant::Long(*v),
            Literal::Number(NumberLit::Float(v)) => Constant::Float(*v),
            Literal::Number(NumberLit::Double(v)) => Constant::Double(*v),
        }
    }

    pub fn to_literal(&self) -> Literal {
        match self {
            Constant::Null => Literal::Null,
            Constant::Bool(b) => Literal::Bool(*b),
            Constant::String(s) => Literal::String(s.clone()),
            Constant::Int(v) => Literal::Number(NumberLit::Int(*v)),
            Constant::Long(v) => Literal::Number(NumberLit::Long(*v)),
            Constant::Float(v) => Literal::Number(NumberLit::Float(*v)),
            Constant::Double(v) => Literal::Number(NumberLit::Double(*v)),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Constant::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Constant::Null)
    }

    fn is_number(&self) -> bool {
        matches!(self, Constant::Int(_) | Constant::Long(_) | Constant::Float(_) | Constant::Double(_))
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Constant::Int(v) => Some(*v as f64),
            Constant::Long(v) => Some(*v as f64),
            Constant::Float(v) => Some(*v as f64),
            Constant::Double(v) => Some(*v),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Constant::Int(v) => Some(*v as i64),
            Constant::Long(v) => Some(*v),
            // Float to integer casts saturate and send NaN to zero.
            Constant::Float(v) => Some(*v as i64),
            Constant::Double(v) => Some(*v as i64),
            _ => None,
        }
    }

    fn as_i32(&self) -> Option<i32> {
        match self {
            Constant::Int(v) => Some(*v),
            Constant::Long(v) => Some(*v as i32),
            Constant::Float(v) => Some(*v as i32),
            Constant::Double(v) => Some(*v as i32),
            _ => None,
        }
    }

    /// Apply one conversion step. `None` when the step cannot be done at
    /// compile time.
    pub fn convert(self, to: &Type) -> Option<Constant> {
        if to.is_string() {
            return Some(match self {
                Constant::Null => Constant::Null,
                other => Constant::String(other.java_string()),
            });
        }
        if self.is_null() {
            return (!to.is_primitive()).then_some(Constant::Null);
        }
        if to.is_char() {
            return None;
        }
        let Some(id) = to.class_id() else { return Some(self) };
        if !self.is_number() || to.numeric_rank().is_none() {
            return Some(self);
        }
        Some(match id {
            ClassId::INTEGER => Constant::Int(self.as_i32()?),
            ClassId::LONG => Constant::Long(self.as_i64()?),
            ClassId::FLOAT => match self {
                Constant::Long(v) => Constant::Float(v as f32),
                other => Constant::Float(other.as_f64()? as f32),
            },
            ClassId::DOUBLE => match self {
                Constant::Float(v) => Constant::Double(v as f64),
                other => Constant::Double(other.as_f64()?),
            },
            _ => return None,
        })
    }

    /// String form as the host runtime would print it.
    pub fn java_string(&self) -> String {
        match self {
            Constant::Null => "null".to_string(),
            Constant::Bool(b) => b.to_string(),
            Constant::Int(v) => v.to_string(),
            Constant::Long(v) => v.to_string(),
            Constant::Float(v) => java_float(*v),
            Constant::Double(v) => java_double(*v),
            Constant::String(s) => s.clone(),
        }
    }

    pub fn negate(&self) -> Option<Constant> {
        Some(match self {
            Constant::Int(v) => Constant::Int(v.wrapping_neg()),
            Constant::Long(v) => Constant::Long(v.wrapping_neg()),
            Constant::Float(v) => Constant::Float(-v),
            Constant::Double(v) => Constant::Double(-v),
            _ => return None,
        })
    }

    /// Fold `self op rhs` for operands of the same numeric type. Division by
    /// zero is never folded.
    pub fn arith(&self, op: ArithOp, rhs: &Constant) -> Option<Constant> {
        if matches!(op, ArithOp::Div | ArithOp::Rem) && rhs.as_f64() == Some(0.0) {
            return None;
        }
        Some(match (self, rhs) {
            (Constant::Int(a), Constant::Int(b)) => Constant::Int(int_op(op, *a, *b)),
            (Constant::Long(a), Constant::Long(b)) => Constant::Long(long_op(op, *a, *b)),
            (Constant::Float(a), Constant::Float(b)) => Constant::Float(float_op(op, *a, *b)),
            (Constant::Double(a), Constant::Double(b)) => Constant::Double(double_op(op, *a, *b)),
            _ => return None,
        })
    }

    /// Numeric or string ordering of two constants of the same kind.
    pub fn ordering(&self, rhs: &Constant) -> Option<Ordering> {
        match (self, rhs) {
            (Constant::Int(a), Constant::Int(b)) => Some(a.cmp(b)),
            (Constant::Long(a), Constant::Long(b)) => Some(a.cmp(b)),
            (Constant::Float(a), Constant::Float(b)) => a.partial_cmp(b),
            (Constant::Double(a), Constant::Double(b)) => a.partial_cmp(b),
            (Constant::String(a), Constant::String(b)) => Some(java_compare(a, b).cmp(&0)),
            (Constant::Bool(a), Constant::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Value equality, `None` when the kinds differ.
    pub fn equals(&self, rhs: &Constant) -> Option<bool> {
        match (self, rhs) {
            (Constant::Null, Constant::Null) => Some(true),
            (Constant::Null, _) | (_, Constant::Null) => Some(false),
            (Constant::Bool(a), Constant::Bool(b)) => Some(a == b),
            (Constant::String(a), Constant::String(b)) => Some(a == b),
            (a, b) => a.ordering(b).map(|o| o == Ordering::Equal),
        }
    }

    /// Result of `self <=> rhs`.
    ///
    /// Numbers and booleans yield -1, 0 or 1. Strings, and values of
    /// different kinds by their string forms, yield the host's string
    /// comparison result.
    pub fn compare(&self, rhs: &Constant) -> Option<i32> {
        if self.is_null() || rhs.is_null() {
            return None;
        }
        match (self, rhs) {
            (Constant::String(a), Constant::String(b)) => Some(java_compare(a, b)),
            _ => match self.ordering(rhs) {
                Some(order) => Some(order as i32),
                None => Some(java_compare(&self.java_string(), &rhs.java_string())),
            },
        }
    }
}

fn int_op(op: ArithOp, a: i32, b: i32) -> i32 {
    match op {
        ArithOp::Add => a.wrapping_add(b),
        ArithOp::Sub => a.wrapping_sub(b),
        ArithOp::Mul => a.wrapping_mul(b),
        ArithOp::Div => a.wrapping_div(b),
        ArithOp::Rem => a.wrapping_rem(b),
    }
}

fn long_op(op: ArithOp, a: i64, b: i64) -> i64 {
    match op {
        ArithOp::Add => a.wrapping_add(b),
        ArithOp::Sub => a.wrapping_sub(b),
        ArithOp::Mul => a.wrapping_mul(b),
        ArithOp::Div => a.wrapping_div(b),
        ArithOp::Rem => a.wrapping_rem(b),
    }
}

fn float_op(op: ArithOp, a: f32, b: f32) -> f32 {
    match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Rem => a % b,
    }
}

fn double_op(op: ArithOp, a: f64, b: f64) -> f64 {
    match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Rem => a % b,
    }
}

/// `String.compareTo`: first differing UTF-16 unit, else length difference.
fn java_compare(a: &str, b: &str) -> i32 {
    let mut left = a.encode_utf16();
    let mut right = b.encode_utf16();
    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) if x != y => return x as i32 - y as i32,
            (Some(_), Some(_)) => {}
            (None, None) => return 0,
            (Some(_), None) => return 1 + left.count() as i32,
            (None, Some(_)) => return -(1 + right.count() as i32),
        }
    }
}

pub fn java_double(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }
    java_format(&format!("{:e}", v))
}

pub fn java_float(v: f32) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }
    java_format(&format!("{:e}", v))
}

/// Lay out the shortest round-trip digits from `{:e}` formatting: plain
/// decimal for magnitudes in [1e-3, 1e7), computerized scientific otherwise.
fn java_format(sci: &str) -> String {
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if (-3..7).contains(&exp) {
        if exp >= 0 {
            let split = exp as usize + 1;
            let mut int_part = digits.chars().take(split).collect::<String>();
            while int_part.len() < split {
                int_part.push('0');
            }
            let frac: String = digits.chars().skip(split).collect();
            let frac = if frac.is_empty() { "0".to_string() } else { frac };
            format!("{sign}{int_part}.{frac}")
        } else {
            let zeros = "0".repeat((-exp - 1) as usize);
            format!("{sign}0.{zeros}{digits}")
        }
    } else {
        let (first, rest) = digits.split_at(1);
        let rest = if rest.is_empty() { "0" } else { rest };
        format!("{sign}{first}.{rest}E{exp}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_print_like_the_host() {
        assert_eq!(java_double(1.0), "1.0");
        assert_eq!(java_double(1.5), "1.5");
        assert_eq!(java_double(-0.25), "-0.25");
        assert_eq!(java_double(0.001), "0.001");
        assert_eq!(java_double(0.0001), "1.0E-4");
        assert_eq!(java_double(1234567.0), "1234567.0");
        assert_eq!(java_double(1e7), "1.0E7");
        assert_eq!(java_double(1.25e10), "1.25E10");
        assert_eq!(java_double(-0.0), "-0.0");
        assert_eq!(java_double(f64::NAN), "NaN");
        assert_eq!(java_double(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(java_float(0.1), "0.1");
    }

    #[test]
    fn integer_arithmetic_wraps() {
        let max = Constant::Int(i32::MAX);
        assert_eq!(max.arith(ArithOp::Add, &Constant::Int(1)), Some(Constant::Int(i32::MIN)));
        let min = Constant::Long(i64::MIN);
        assert_eq!(min.arith(ArithOp::Div, &Constant::Long(-1)), Some(Constant::Long(i64::MIN)));
        assert_eq!(Constant::Int(-7).arith(ArithOp::Rem, &Constant::Int(3)), Some(Constant::Int(-1)));
    }

    #[test]
    fn division_by_zero_is_not_folded() {
        assert_eq!(Constant::Int(1).arith(ArithOp::Div, &Constant::Int(0)), None);
        assert_eq!(Constant::Double(1.0).arith(ArithOp::Rem, &Constant::Double(0.0)), None);
        assert_eq!(Constant::Int(1).arith(ArithOp::Add, &Constant::Long(1)), None);
    }

    #[test]
    fn conversions_follow_casts() {
        assert_eq!(Constant::Int(3).convert(&Type::LONG), Some(Constant::Long(3)));
        assert_eq!(Constant::Double(3.9).convert(&Type::INT), Some(Constant::Int(3)));
        assert_eq!(Constant::Long(1 << 32).convert(&Type::INT), Some(Constant::Int(0)));
        assert_eq!(Constant::Double(3e9).convert(&Type::INT), Some(Constant::Int(i32::MAX)));
        assert_eq!(Constant::Double(2.0).convert(&Type::STRING), Some(Constant::String("2.0".to_string())));
        assert_eq!(Constant::Int(7).convert(&Type::INTEGER_OBJECT), Some(Constant::Int(7)));
        assert_eq!(Constant::Null.convert(&Type::INT), None);
    }

    #[test]
    fn comparison_results() {
        assert_eq!(Constant::Int(1).compare(&Constant::Int(5)), Some(-1));
        assert_eq!(Constant::String("apple".into()).compare(&Constant::String("apricot".into())), Some(-2));
        assert_eq!(Constant::String("ab".into()).compare(&Constant::String("a".into())), Some(1));
        assert_eq!(Constant::Bool(true).compare(&Constant::Bool(false)), Some(1));
        assert_eq!(Constant::String("b".into()).equals(&Constant::Null), Some(false));
    }
}
