use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::parser::VarKind;

/// Absolute tolerance used when comparing two numeric values
pub const NUMERIC_TOLERANCE: f64 = 1e-7;

/// Runtime value representation
///
/// Numeric missing is `NaN`; character missing is the empty (or all-blank)
/// string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "WireValue", into = "WireValue")]
pub enum Value {
    /// 64-bit floating-point value
    Numeric(f64),
    /// Character value
    Character(String),
}

/// On-disk shape of a [`Value`]: missing numerics travel as `null`
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireValue {
    Num(Option<f64>),
    Char(String),
}

impl From<WireValue> for Value {
    fn from(wire: WireValue) -> Self {
        match wire {
            WireValue::Num(Some(n)) => Value::Numeric(n),
            WireValue::Num(None) => Value::missing(),
            WireValue::Char(s) => Value::Character(s),
        }
    }
}

impl From<Value> for WireValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Numeric(n) if n.is_nan() => WireValue::Num(None),
            Value::Numeric(n) => WireValue::Num(Some(n)),
            Value::Character(s) => WireValue::Char(s),
        }
    }
}

impl Value {
    /// Numeric missing value (`.`)
    pub fn missing() -> Self {
        Value::Numeric(f64::NAN)
    }

    /// Missing value of the given kind
    pub fn missing_of(kind: VarKind) -> Self {
        match kind {
            VarKind::Numeric => Value::missing(),
            VarKind::Character => Value::Character(String::new()),
        }
    }

    /// Numeric 1/0 for a condition result
    pub fn from_bool(b: bool) -> Self {
        Value::Numeric(if b { 1.0 } else { 0.0 })
    }

    /// Storage kind of this value
    pub fn kind(&self) -> VarKind {
        match self {
            Value::Numeric(_) => VarKind::Numeric,
            Value::Character(_) => VarKind::Character,
        }
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Numeric(_) => "numeric",
            Value::Character(_) => "character",
        }
    }

    /// Whether this is the missing value of its kind
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Numeric(n) => n.is_nan(),
            Value::Character(s) => s.trim().is_empty(),
        }
    }

    /// Non-zero and not missing
    pub fn is_truthy(&self) -> bool {
        let n = self.as_number();
        !n.is_nan() && n != 0.0
    }

    /// Numeric view of the value.
    ///
    /// Character values are trimmed and parsed; text that is not a number
    /// (including the empty string) yields `0.0`.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Numeric(n) => *n,
            Value::Character(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        }
    }

    /// Character view of the value, numbers rendered as in listings
    pub fn as_string(&self) -> String {
        match self {
            Value::Numeric(n) => format_number(*n),
            Value::Character(s) => s.clone(),
        }
    }

    /// Borrow the text of a character value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Character(s) => Some(s),
            Value::Numeric(_) => None,
        }
    }

    /// Converts to the requested kind.
    ///
    /// Character to numeric follows [`Value::as_number`] except that blank
    /// text becomes numeric missing.
    pub fn coerce(self, kind: VarKind) -> Value {
        match (self, kind) {
            (v @ Value::Numeric(_), VarKind::Numeric) => v,
            (v @ Value::Character(_), VarKind::Character) => v,
            (Value::Numeric(n), VarKind::Character) => {
                if n.is_nan() {
                    Value::Character(String::new())
                } else {
                    Value::Character(format_number(n))
                }
            }
            (v @ Value::Character(_), VarKind::Numeric) => {
                if v.is_missing() {
                    Value::missing()
                } else {
                    Value::Numeric(v.as_number())
                }
            }
        }
    }

    /// Ordering used by comparisons and sorting.
    ///
    /// Numeric missing sorts below every number. Character values compare
    /// with trailing blanks ignored. Values of different kinds are not
    /// ordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Numeric(a), Value::Numeric(b)) => Some(compare_numbers(*a, *b)),
            (Value::Character(a), Value::Character(b)) => {
                Some(a.trim_end().cmp(b.trim_end()))
            }
            _ => None,
        }
    }

    /// Exact ordering for sorting.
    ///
    /// Unlike [`Value::compare`] no tolerance is applied, so the result is a
    /// total order within each kind.
    pub fn sort_order(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Numeric(a), Value::Numeric(b)) => Some(order_numbers(*a, *b)),
            (Value::Character(a), Value::Character(b)) => {
                Some(a.trim_end().cmp(b.trim_end()))
            }
            _ => None,
        }
    }
}

/// Exact total order on numbers with `NaN` lowest
pub fn order_numbers(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        // -0 and 0 compare equal
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Comparison of numbers with `NaN` lowest and the comparison tolerance.
///
/// Not transitive near the tolerance; sort with [`order_numbers`].
pub fn compare_numbers(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => {
            if (a - b).abs() < NUMERIC_TOLERANCE {
                Ordering::Equal
            } else if a < b {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
    }
}

/// Listing form of a number: `.` for missing, integers without a
/// fraction, otherwise up to nine decimals with trailing zeros removed
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return ".".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    let text = format!("{:.9}", n);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.compare(other), Some(Ordering::Equal))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Numeric(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Numeric(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Character(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Character(s)
    }
}
