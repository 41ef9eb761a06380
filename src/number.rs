//! Arbitrary-precision numbers.
//!
//! Documents can hold integers and decimals of any size, so the library never
//! narrows a number before the destination type is known:
//!
//! - [`Number::Integer`] holds a [`BigInt`]
//! - [`Number::Float`] holds a [`Decimal`], an exact `mantissa × 10^exponent`
//! - infinities and NaN have their own variants
//!
//! Narrowing to a fixed-width type happens during binding, where a value that
//! does not fit is reported as an overflow.
//!
//! ## Examples
//!
//! ```rust
//! use serde_boa::Number;
//!
//! let n = Number::parse("0xdead_beef").unwrap();
//! assert_eq!(n.as_u64(), Some(0xdead_beef));
//!
//! let f = Number::parse("6.626e-34").unwrap();
//! assert!(f.is_float());
//! assert_eq!(f.to_string(), "6.626e-34");
//!
//! assert_eq!(Number::from(5.0).to_string(), "5.0");
//! ```

use num_bigint::{BigInt, Sign};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub(crate) const NUMBER_STRUCT: &str = "$__serde_boa_private_Number";
pub(crate) const NUMBER_TOKEN: &str = "$__serde_boa_private_number";

/// Largest power of ten expanded when a float is converted to an integer.
const MAX_EXPANSION: i64 = 4096;

/// An exact decimal number, `mantissa × 10^exponent`.
///
/// Decimals are kept normalized (no trailing zeros in the mantissa), so two
/// equal numbers always compare equal.
///
/// # Examples
///
/// ```rust
/// use serde_boa::Decimal;
///
/// let d = Decimal::parse("1_000.250").unwrap();
/// assert_eq!(d.exponent(), -2);
/// assert_eq!(d.to_string(), "1000.25");
/// assert_eq!(Decimal::parse("1e3"), Decimal::parse("1000.0"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: BigInt,
    exponent: i64,
}

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else {
        (false, text.strip_prefix('+').unwrap_or(text))
    }
}

impl Decimal {
    #[must_use]
    pub fn new(mantissa: BigInt, exponent: i64) -> Self {
        let negative = mantissa.sign() == Sign::Minus;
        Decimal::from_digits(negative, &mantissa.magnitude().to_string(), exponent)
    }

    fn from_digits(negative: bool, digits: &str, exponent: i64) -> Self {
        let digits = digits.trim_start_matches('0');
        let trimmed = digits.trim_end_matches('0');
        if trimmed.is_empty() {
            return Decimal::default();
        }
        let exponent = exponent.saturating_add((digits.len() - trimmed.len()) as i64);
        let magnitude = BigInt::parse_bytes(trimmed.as_bytes(), 10).unwrap_or_default();
        Decimal {
            mantissa: if negative { -magnitude } else { magnitude },
            exponent,
        }
    }

    /// Parses a decimal literal: optional sign, digits with an optional
    /// fractional part (either side of the point may be empty, not both), and
    /// an optional exponent. Underscores are ignored.
    #[must_use]
    pub fn parse(text: &str) -> Option<Decimal> {
        let text: String = text.chars().filter(|&c| c != '_').collect();
        let (negative, body) = split_sign(&text);
        let (significand, exponent) = match body.find(|c| c == 'e' || c == 'E') {
            Some(i) => (&body[..i], body[i + 1..].parse::<i64>().ok()?),
            None => (body, 0),
        };
        let (int, frac) = significand.split_once('.').unwrap_or((significand, ""));
        if int.is_empty() && frac.is_empty() {
            return None;
        }
        if !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }
        let exponent = exponent.checked_sub(frac.len() as i64)?;
        Some(Decimal::from_digits(negative, &format!("{}{}", int, frac), exponent))
    }

    /// Returns the exact decimal value of a finite float, using the shortest
    /// representation that reads back as the same float.
    #[must_use]
    pub fn from_f64(value: f64) -> Option<Decimal> {
        if !value.is_finite() {
            return None;
        }
        Decimal::parse(&format!("{:e}", value))
    }

    /// Same as [`Decimal::from_f64`], with the shortest `f32` representation.
    #[must_use]
    pub fn from_f32(value: f32) -> Option<Decimal> {
        if !value.is_finite() {
            return None;
        }
        Decimal::parse(&format!("{:e}", value))
    }

    #[inline]
    #[must_use]
    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    #[inline]
    #[must_use]
    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// Returns `true` when the number has no fractional part.
    #[inline]
    #[must_use]
    pub fn is_integral(&self) -> bool {
        self.exponent >= 0
    }

    /// Nearest `f64`. Values beyond the `f64` range become infinite.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        format!("{}e{}", self.mantissa, self.exponent)
            .parse()
            .unwrap_or(f64::NAN)
    }

    /// The integer value, if the number is integral.
    #[must_use]
    pub fn to_bigint(&self) -> Option<BigInt> {
        if !self.is_integral() || self.exponent > MAX_EXPANSION {
            return None;
        }
        Some(&self.mantissa * BigInt::from(10u32).pow(self.exponent as u32))
    }
}

/// Renders like C's `%g` with the shortest exact digits: positional notation
/// for decimal exponents in `-4..21`, scientific notation otherwise. Integral
/// values always keep a fractional part (`5.0`).
impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.magnitude().to_string();
        if self.mantissa.sign() == Sign::Minus {
            f.write_str("-")?;
        }
        let len = digits.len() as i64;
        let exp10 = len - 1 + self.exponent;
        if !(-4..21).contains(&exp10) {
            let (head, tail) = digits.split_at(1);
            f.write_str(head)?;
            if !tail.is_empty() {
                write!(f, ".{}", tail)?;
            }
            let sign = if exp10 < 0 { '-' } else { '+' };
            return write!(f, "e{}{:02}", sign, exp10.unsigned_abs());
        }
        if self.exponent >= 0 {
            return write!(f, "{}{}.0", digits, "0".repeat(self.exponent as usize));
        }
        let point = len + self.exponent;
        if point > 0 {
            let (int, frac) = digits.split_at(point as usize);
            write!(f, "{}.{}", int, frac)
        } else {
            write!(f, "0.{}{}", "0".repeat(point.unsigned_abs() as usize), digits)
        }
    }
}

/// A number read from or written to a document.
///
/// # Examples
///
/// ```rust
/// use serde_boa::Number;
///
/// let big = Number::parse("170141183460469231731687303715884105728").unwrap();
/// assert!(big.is_integer());
/// assert_eq!(big.as_i128(), None);
/// assert_eq!(big.as_u128(), Some(1u128 << 127));
///
/// assert!(Number::parse("-inf").unwrap().is_special());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    Integer(BigInt),
    Float(Decimal),
    Infinity,
    NegativeInfinity,
    NaN,
}

/// Parses an integer literal with an optional sign, an optional `0x`, `0o`
/// or `0b` radix prefix, and `_` separators.
#[must_use]
pub fn parse_integer(text: &str) -> Option<BigInt> {
    let clean: String = text.chars().filter(|&c| c != '_').collect();
    let (negative, body) = split_sign(&clean);
    let (radix, digits) = match body.get(..2) {
        Some("0x") | Some("0X") => (16, &body[2..]),
        Some("0o") => (8, &body[2..]),
        Some("0b") => (2, &body[2..]),
        _ => (10, body),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = BigInt::parse_bytes(digits.as_bytes(), radix)?;
    Some(if negative { -magnitude } else { magnitude })
}

impl Number {
    /// Parses any numeric literal accepted by TOML or JSON5: integers (with
    /// radix prefixes), decimals, `inf`/`Infinity` and `nan`/`NaN` with an
    /// optional sign.
    #[must_use]
    pub fn parse(text: &str) -> Option<Number> {
        let (negative, body) = split_sign(text);
        match body {
            "inf" | "Infinity" if negative => return Some(Number::NegativeInfinity),
            "inf" | "Infinity" => return Some(Number::Infinity),
            "nan" | "NaN" => return Some(Number::NaN),
            _ => {}
        }
        let prefixed = body.len() > 1
            && body.starts_with('0')
            && matches!(body.as_bytes()[1], b'x' | b'X' | b'o' | b'b');
        if !prefixed && body.contains(|c| matches!(c, '.' | 'e' | 'E')) {
            Decimal::parse(text).map(Number::Float)
        } else {
            parse_integer(text).map(Number::Integer)
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Returns `true` for infinities and NaN.
    #[inline]
    #[must_use]
    pub const fn is_special(&self) -> bool {
        matches!(
            self,
            Number::Infinity | Number::NegativeInfinity | Number::NaN
        )
    }

    /// Returns the integer value of integers and integral floats.
    #[must_use]
    pub fn as_bigint(&self) -> Option<BigInt> {
        match self {
            Number::Integer(i) => Some(i.clone()),
            Number::Float(d) => d.to_bigint(),
            _ => None,
        }
    }

    fn as_int<T: TryFrom<BigInt>>(&self) -> Option<T> {
        self.as_bigint().and_then(|i| T::try_from(i).ok())
    }

    /// Converts to `i64` if the value is integral and in range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_boa::Number;
    ///
    /// assert_eq!(Number::from(42).as_i64(), Some(42));
    /// assert_eq!(Number::from(42.0).as_i64(), Some(42));
    /// assert_eq!(Number::from(42.5).as_i64(), None);
    /// assert_eq!(Number::Infinity.as_i64(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_int()
    }

    #[inline]
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        self.as_int()
    }

    #[inline]
    #[must_use]
    pub fn as_i128(&self) -> Option<i128> {
        self.as_int()
    }

    #[inline]
    #[must_use]
    pub fn as_u128(&self) -> Option<u128> {
        self.as_int()
    }

    /// Nearest `f64`.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => i.to_string().parse().unwrap_or(f64::NAN),
            Number::Float(d) => d.to_f64(),
            Number::Infinity => f64::INFINITY,
            Number::NegativeInfinity => f64::NEG_INFINITY,
            Number::NaN => f64::NAN,
        }
    }

    /// Exact decimal value of finite numbers.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Number::Integer(i) => Some(Decimal::new(i.clone(), 0)),
            Number::Float(d) => Some(d.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(d) => write!(f, "{}", d),
            Number::Infinity => f.write_str("inf"),
            Number::NegativeInfinity => f.write_str("-inf"),
            Number::NaN => f.write_str("nan"),
        }
    }
}

impl std::ops::Neg for Number {
    type Output = Number;

    fn neg(self) -> Number {
        match self {
            Number::Integer(i) => Number::Integer(-i),
            Number::Float(d) => Number::Float(Decimal::new(-d.mantissa, d.exponent)),
            Number::Infinity => Number::NegativeInfinity,
            Number::NegativeInfinity => Number::Infinity,
            Number::NaN => Number::NaN,
        }
    }
}

macro_rules! number_from_integer {
    ($($ty:ty)*) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Number::Integer(BigInt::from(value))
                }
            }
        )*
    };
}

number_from_integer!(i8 i16 i32 i64 i128 isize u8 u16 u32 u64 u128 usize);

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        match Decimal::from_f64(value) {
            Some(d) => Number::Float(d),
            None if value.is_nan() => Number::NaN,
            None if value > 0.0 => Number::Infinity,
            None => Number::NegativeInfinity,
        }
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        match Decimal::from_f32(value) {
            Some(d) => Number::Float(d),
            None => Number::from(f64::from(value)),
        }
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::Integer(value)
    }
}

impl From<Decimal> for Number {
    fn from(value: Decimal) -> Self {
        Number::Float(value)
    }
}

fn serialize_token<S: Serializer>(serializer: S, text: &str) -> Result<S::Ok, S::Error> {
    let mut s = serializer.serialize_struct(NUMBER_STRUCT, 1)?;
    s.serialize_field(NUMBER_TOKEN, text)?;
    s.end()
}

/// Numbers that fit a primitive serialize as that primitive; others go
/// through a private single-field struct that this crate's serializer turns
/// back into an exact number.
impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Number::Integer(i) => {
                if let Ok(v) = i64::try_from(i) {
                    serializer.serialize_i64(v)
                } else if let Ok(v) = u64::try_from(i) {
                    serializer.serialize_u64(v)
                } else {
                    serialize_token(serializer, &i.to_string())
                }
            }
            Number::Float(d) => {
                let f = d.to_f64();
                if Decimal::from_f64(f).as_ref() == Some(d) {
                    serializer.serialize_f64(f)
                } else {
                    serialize_token(serializer, &d.to_string())
                }
            }
            Number::Infinity => serializer.serialize_f64(f64::INFINITY),
            Number::NegativeInfinity => serializer.serialize_f64(f64::NEG_INFINITY),
            Number::NaN => serializer.serialize_f64(f64::NAN),
        }
    }
}

pub(crate) fn number_from_token<E: de::Error>(text: &str) -> Result<Number, E> {
    Number::parse(text).ok_or_else(|| E::custom(format!("invalid number {:?}", text)))
}

struct NumberVisitor;

impl<'de> Visitor<'de> for NumberVisitor {
    type Value = Number;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number")
    }

    fn visit_i64<E>(self, value: i64) -> Result<Number, E> {
        Ok(Number::from(value))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Number, E> {
        Ok(Number::from(value))
    }

    fn visit_i128<E>(self, value: i128) -> Result<Number, E> {
        Ok(Number::from(value))
    }

    fn visit_u128<E>(self, value: u128) -> Result<Number, E> {
        Ok(Number::from(value))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Number, E> {
        Ok(Number::from(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Number, E> {
        number_from_token(value.trim())
    }

    fn visit_map<A>(self, mut map: A) -> Result<Number, A::Error>
    where
        A: MapAccess<'de>,
    {
        match map.next_key::<String>()? {
            Some(key) if key == NUMBER_TOKEN => number_from_token(&map.next_value::<String>()?),
            _ => Err(de::Error::invalid_type(de::Unexpected::Map, &self)),
        }
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NumberVisitor)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Number::Float(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let n = Number::deserialize(deserializer)?;
        n.as_decimal()
            .ok_or_else(|| de::Error::custom(format!("cannot assign {} to Decimal: value does not fit", n)))
    }
}

/// `serialize_with`/`deserialize_with` helpers binding a [`BigInt`] field to
/// a document number.
///
/// ```rust
/// use num_bigint::BigInt;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Ledger {
///     #[serde(with = "serde_boa::number::bigint")]
///     total: BigInt,
/// }
///
/// let ledger: Ledger = serde_boa::toml::from_str("total = 123456789012345678901234567890").unwrap();
/// assert_eq!(ledger.total.to_string(), "123456789012345678901234567890");
/// ```
pub mod bigint {
    use super::Number;
    use num_bigint::BigInt;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        Number::Integer(value.clone()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let n = Number::deserialize(deserializer)?;
        n.as_bigint()
            .ok_or_else(|| de::Error::custom(format!("cannot assign {} to BigInt: value does not fit", n)))
    }
}
