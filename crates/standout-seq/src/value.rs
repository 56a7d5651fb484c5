//! Numeric and dynamic element types.
//!
//! [`Number`] is the accumulator used by `sum` and `average`. [`AsNumber`]
//! is how an element type opts into those evaluators, and [`Value`] is an
//! owned dynamic element for sequences that mix kinds (records decoded from
//! JSON, CSV cells, script values).

use std::cmp::Ordering;
use std::fmt;

/// Numeric value supporting all common numeric types.
///
/// Numbers are stored in one of three variants to preserve precision:
/// - `I64` for signed integers
/// - `U64` for unsigned integers
/// - `F64` for floating point
///
/// Comparisons between different numeric types are handled by converting
/// to the appropriate common type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Compares two numbers, handling mixed types.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),
            (Number::I64(a), Number::U64(b)) => Some((a as i128).cmp(&(b as i128))),
            (Number::U64(a), Number::I64(b)) => Some((a as i128).cmp(&(b as i128))),
            (Number::I64(a), Number::F64(b)) => compare_with_float(a as i128, b),
            (Number::U64(a), Number::F64(b)) => compare_with_float(a as i128, b),
            (Number::F64(a), Number::I64(b)) => {
                compare_with_float(b as i128, a).map(Ordering::reverse)
            }
            (Number::F64(a), Number::U64(b)) => {
                compare_with_float(b as i128, a).map(Ordering::reverse)
            }
        }
    }

    /// True for a float NaN.
    pub fn is_nan(self) -> bool {
        matches!(self, Number::F64(n) if n.is_nan())
    }

    /// Adds two numbers.
    ///
    /// Integer addition stays integral while the result fits in `i64` or
    /// `u64`; same-kind sums keep their kind. Anything involving a float,
    /// or an integer sum too large for both, is computed in `f64`.
    pub fn add(self, other: Number) -> Number {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => match a.checked_add(b) {
                Some(sum) => Number::I64(sum),
                None => Number::from_i128(a as i128 + b as i128),
            },
            (Number::U64(a), Number::U64(b)) => match a.checked_add(b) {
                Some(sum) => Number::U64(sum),
                None => Number::F64(a as f64 + b as f64),
            },
            (Number::I64(a), Number::U64(b)) | (Number::U64(b), Number::I64(a)) => {
                Number::from_i128(a as i128 + b as i128)
            }
            _ => Number::F64(self.to_f64() + other.to_f64()),
        }
    }

    fn from_i128(n: i128) -> Number {
        if let Ok(n) = i64::try_from(n) {
            Number::I64(n)
        } else if let Ok(n) = u64::try_from(n) {
            Number::U64(n)
        } else {
            Number::F64(n as f64)
        }
    }
}

// An integer that rounds onto the float equals it, so the tie is settled
// exactly in i128.
fn compare_with_float(int: i128, float: f64) -> Option<Ordering> {
    match (int as f64).partial_cmp(&float)? {
        Ordering::Equal => Some(int.cmp(&(float as i128))),
        unequal => Some(unequal),
    }
}

impl Default for Number {
    fn default() -> Self {
        Number::I64(0)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(n) => write!(f, "{n}"),
            Number::U64(n) => write!(f, "{n}"),
            Number::F64(n) => write!(f, "{n}"),
        }
    }
}

macro_rules! number_from {
    ($variant:ident as $target:ty: $($source:ty),*) => {
        $(
            impl From<$source> for Number {
                fn from(n: $source) -> Self {
                    Number::$variant(n as $target)
                }
            }

            impl AsNumber for $source {
                fn as_number(&self) -> Option<Number> {
                    Some(Number::from(*self))
                }
            }

            impl From<$source> for Value {
                fn from(n: $source) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

number_from!(I64 as i64: i8, i16, i32, i64, isize);
number_from!(U64 as u64: u8, u16, u32, u64, usize);
number_from!(F64 as f64: f32, f64);

/// Element types that `sum` and `average` can fold.
///
/// Statically numeric types always answer `Some`. Dynamic element types
/// answer `None` for non-numeric values, which the evaluators report as
/// [`SeqError::TypeMismatch`](crate::SeqError::TypeMismatch).
pub trait AsNumber {
    /// Returns the numeric value of this element, if it has one.
    fn as_number(&self) -> Option<Number>;

    /// Name of the element's kind, used in type mismatch errors.
    fn kind(&self) -> &'static str {
        "number"
    }
}

impl AsNumber for Number {
    fn as_number(&self) -> Option<Number> {
        Some(*self)
    }
}

impl<T: AsNumber> AsNumber for Option<T> {
    fn as_number(&self) -> Option<Number> {
        self.as_ref().and_then(AsNumber::as_number)
    }

    fn kind(&self) -> &'static str {
        match self {
            Some(inner) => inner.kind(),
            None => "null",
        }
    }
}

impl<T: AsNumber + ?Sized> AsNumber for &T {
    fn as_number(&self) -> Option<Number> {
        (**self).as_number()
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}

/// Owned dynamic value, for sequences whose elements mix kinds.
///
/// # Example
///
/// ```
/// use standout_seq::{Query, Value, SeqError};
///
/// let cells = vec![Value::from(1), Value::from(2.5)];
/// assert_eq!(cells.average().unwrap(), 1.75);
///
/// let mixed = vec![Value::from(1), Value::from("two")];
/// assert!(matches!(mixed.sum(), Err(SeqError::TypeMismatch { .. })));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(Number),
    /// String value.
    String(String),
}

impl Value {
    /// Returns `true` if this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` if this is a `Number` value.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the boolean value, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the name of this value's kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }

    /// Total order over values of the same kind; `Null` sorts last.
    ///
    /// NaN sorts after every other number. Values of different kinds
    /// compare by kind name.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => match (a.is_nan(), b.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => a.compare(*b).unwrap_or(Ordering::Equal),
            },
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            _ => self.type_name().cmp(other.type_name()),
        }
    }
}

impl AsNumber for Value {
    fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        self.type_name()
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_comparisons_mixed_types() {
        assert_eq!(
            Number::I64(5).compare(Number::U64(10)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::I64(5).compare(Number::F64(5.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Number::U64(10).compare(Number::F64(5.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Number::I64(-1).compare(Number::U64(u64::MAX)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn number_nan_comparison() {
        assert_eq!(Number::F64(f64::NAN).compare(Number::F64(1.0)), None);
    }

    #[test]
    fn number_add_keeps_kind() {
        assert_eq!(Number::I64(2).add(Number::I64(3)), Number::I64(5));
        assert_eq!(Number::U64(2).add(Number::U64(3)), Number::U64(5));
        assert_eq!(Number::I64(-2).add(Number::U64(3)), Number::I64(1));
        assert_eq!(Number::I64(1).add(Number::F64(0.5)), Number::F64(1.5));
    }

    #[test]
    fn number_add_widens_on_overflow() {
        assert_eq!(
            Number::I64(i64::MAX).add(Number::I64(1)),
            Number::U64(i64::MAX as u64 + 1)
        );
        assert_eq!(
            Number::U64(u64::MAX).add(Number::U64(1)),
            Number::F64(u64::MAX as f64 + 1.0)
        );
    }

    #[test]
    fn as_number_for_primitives_and_options() {
        assert_eq!(3u8.as_number(), Some(Number::U64(3)));
        assert_eq!((-3i32).as_number(), Some(Number::I64(-3)));
        assert_eq!(Some(1.5f32).as_number(), Some(Number::F64(1.5)));
        assert_eq!(None::<i32>.as_number(), None);
        assert_eq!(None::<i32>.kind(), "null");
    }

    #[test]
    fn value_kinds() {
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::from(true).kind(), "bool");
        assert_eq!(Value::from(7).as_number(), Some(Number::I64(7)));
        assert_eq!(Value::Null.as_number(), None);
        assert!(Value::default().is_null());
    }

    #[test]
    fn value_compare_nulls_last() {
        assert_eq!(Value::Null.compare(&Value::from(1)), Ordering::Greater);
        assert_eq!(Value::from(1).compare(&Value::from(2.0)), Ordering::Less);
        assert_eq!(Value::from("b").compare(&Value::from("a")), Ordering::Greater);
    }

    #[test]
    fn value_compare_puts_nan_after_numbers() {
        let nan = Value::from(f64::NAN);
        assert_eq!(nan.compare(&Value::from(1)), Ordering::Greater);
        assert_eq!(Value::from(2.5).compare(&nan), Ordering::Less);
        assert_eq!(nan.compare(&Value::from(f64::NAN)), Ordering::Equal);

        let mut values = vec![
            Value::from(3),
            nan.clone(),
            Value::from(1),
            Value::Null,
            Value::from(2.0),
            Value::from(f64::NAN),
        ];
        values.sort_by(Value::compare);
        let numbers: Vec<f64> = values[..3]
            .iter()
            .filter_map(|v| v.as_number().map(Number::to_f64))
            .collect();
        assert_eq!(numbers, vec![1.0, 2.0, 3.0]);
        assert!(values[3].as_number().is_some_and(Number::is_nan));
        assert!(values[4].as_number().is_some_and(Number::is_nan));
        assert!(values[5].is_null());
    }

    #[test]
    fn mixed_comparison_is_exact_beyond_float_precision() {
        let big = 1i64 << 53;
        let float = Number::F64(big as f64);
        assert_eq!(Number::I64(big + 1).compare(float), Some(Ordering::Greater));
        assert_eq!(float.compare(Number::I64(big + 1)), Some(Ordering::Less));
        assert_eq!(Number::I64(big).compare(float), Some(Ordering::Equal));
        assert_eq!(
            Number::U64(u64::MAX).compare(Number::F64(u64::MAX as f64)),
            Some(Ordering::Less)
        );
    }
}
