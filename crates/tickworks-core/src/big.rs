//! Scaled decimal numbers used for every simulated quantity.
//!
//! A [`Big`] is `mantissa × 10^exponent` with an arbitrary-precision
//! mantissa, plus a flag for ±∞. Values are always kept in normalized form:
//! the mantissa is never a multiple of ten, zero has exponent 0, and
//! infinity has mantissa ±1. Normalization is what makes structural equality
//! coincide with numeric equality, so every public constructor and operation
//! returns normalized values.
//!
//! # Immutable and mutable forms
//!
//! The arithmetic operators (`+ - * / -x`) and methods such as [`Big::pow`]
//! and [`Big::floor`] always return a new value. The `*_mut` methods update
//! `self` in place and return it, unless the value is frozen, in which case
//! they fail with [`ImmutableValueError`]. The shared constants in
//! [`consts`] are frozen.
//!
//! # Special cases
//!
//! - Division by a zero mantissa yields positive infinity (never an error).
//! - The IEEE "NaN" cases (`∞ - ∞`, `∞ × 0`, `∞ / ∞`) yield zero.
//! - [`Big::floor`] rounds toward zero and [`Big::ceil`] rounds away from
//!   zero. For negative numbers this differs from the mathematical
//!   floor/ceil: `floor(-1.5) == -1` and `ceil(-1.5) == -2`.
//!
//! # Range
//!
//! Finite values stay within [`MAX_MAGNITUDE`] decimal orders of magnitude
//! in both directions. Results above `10^MAX_MAGNITUDE` saturate to ±∞, and
//! digits below `10^-MAX_MAGNITUDE` are truncated toward zero. Exponent
//! arithmetic is done in `i128`, so no operation overflows. Decoding an
//! out-of-range value fails instead of saturating.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Raised when a mutating operation is invoked on a frozen value.
///
/// This always indicates a defect in the calling code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("attempted to mutate a frozen Big value")]
pub struct ImmutableValueError;

/// Errors from parsing a decimal literal into a [`Big`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseBigError {
    #[error("empty number literal")]
    Empty,
    #[error("invalid digits in number literal '{0}'")]
    InvalidDigit(String),
    #[error("invalid exponent in number literal '{0}'")]
    InvalidExponent(String),
}

/// A decoded [`Big`] whose exponent or magnitude lies outside the
/// representable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Big out of range: {digits} digits at exponent {exponent}")]
pub struct BigRangeError {
    pub digits: u64,
    pub exponent: i64,
}

/// Largest decimal order of magnitude of a finite [`Big`], and the smallest
/// exponent one may carry.
pub const MAX_MAGNITUDE: i64 = 10_000;

// ---------------------------------------------------------------------------
// Big
// ---------------------------------------------------------------------------

/// A scaled decimal value: `mantissa × 10^exponent`, or ±∞.
#[derive(Debug, Serialize, Deserialize)]
#[serde(try_from = "BigRepr", into = "BigRepr")]
pub struct Big {
    mantissa: BigInt,
    exponent: i64,
    infinite: bool,
    frozen: bool,
}

/// On-disk shape of a [`Big`]. Mantissa and exponent are stored as exact
/// integers so values round-trip bit for bit.
#[derive(Clone, Serialize, Deserialize)]
struct BigRepr {
    mantissa: BigInt,
    exponent: i64,
    infinite: bool,
}

impl From<Big> for BigRepr {
    fn from(value: Big) -> Self {
        Self {
            mantissa: value.mantissa,
            exponent: value.exponent,
            infinite: value.infinite,
        }
    }
}

impl TryFrom<BigRepr> for Big {
    type Error = BigRangeError;

    fn try_from(repr: BigRepr) -> Result<Self, Self::Error> {
        if repr.infinite {
            return Ok(Big::infinite_with_sign(if repr.mantissa.is_negative() { -1 } else { 1 }));
        }
        if repr.mantissa.is_zero() {
            return Ok(Big::zero());
        }
        let digits = digit_count(&repr.mantissa);
        let in_range = (-MAX_MAGNITUDE..=MAX_MAGNITUDE).contains(&repr.exponent)
            && i128::from(digits) + i128::from(repr.exponent) - 1 <= i128::from(MAX_MAGNITUDE);
        if !in_range {
            return Err(BigRangeError {
                digits: digits.unsigned_abs(),
                exponent: repr.exponent,
            });
        }
        Ok(Big::from_parts(repr.mantissa, i128::from(repr.exponent)))
    }
}

/// Shared, frozen well-known values.
pub mod consts {
    use super::Big;
    use std::sync::LazyLock;

    pub static ZERO: LazyLock<Big> = LazyLock::new(|| Big::zero().freeze());
    pub static ONE: LazyLock<Big> = LazyLock::new(|| Big::one().freeze());
    pub static TEN: LazyLock<Big> = LazyLock::new(|| Big::from(10).freeze());
    pub static INFINITY: LazyLock<Big> = LazyLock::new(|| Big::infinity().freeze());
    pub static NEG_INFINITY: LazyLock<Big> = LazyLock::new(|| Big::neg_infinity().freeze());
}

fn pow10(n: u64) -> BigInt {
    num_traits::pow(BigInt::from(10u8), n as usize)
}

fn digit_count(m: &BigInt) -> i64 {
    m.magnitude().to_str_radix(10).len() as i64
}

/// Rewrite both mantissas over the smaller of the two exponents.
fn aligned(a: &Big, b: &Big) -> (BigInt, BigInt, i64) {
    let exponent = a.exponent.min(b.exponent);
    let scale = |v: &Big| {
        let shift = (v.exponent - exponent) as u64;
        if shift == 0 {
            v.mantissa.clone()
        } else {
            &v.mantissa * pow10(shift)
        }
    };
    (scale(a), scale(b), exponent)
}

impl Big {
    /// Build a normalized value from a mantissa and a base-10 exponent.
    /// Values beyond [`MAX_MAGNITUDE`] saturate.
    pub fn new(mantissa: impl Into<BigInt>, exponent: i64) -> Self {
        Self::from_parts(mantissa.into(), i128::from(exponent))
    }

    /// Normalize and range-check a finite `mantissa × 10^exponent`.
    fn from_parts(mut mantissa: BigInt, mut exponent: i128) -> Self {
        if mantissa.is_zero() {
            return Self::zero();
        }
        let ten = BigInt::from(10u8);
        loop {
            let (quotient, remainder) = mantissa.div_rem(&ten);
            if !remainder.is_zero() {
                break;
            }
            mantissa = quotient;
            exponent += 1;
        }

        let limit = i128::from(MAX_MAGNITUDE);
        let digits = i128::from(digit_count(&mantissa));
        if digits + exponent - 1 > limit {
            return Self::infinite_with_sign(if mantissa.is_negative() { -1 } else { 1 });
        }
        if exponent < -limit {
            let cut = -limit - exponent;
            if cut >= digits {
                return Self::zero();
            }
            // `cut < digits` keeps the power small.
            let truncated = mantissa / pow10(cut.unsigned_abs() as u64);
            return Self::from_parts(truncated, -limit);
        }

        Self {
            mantissa,
            exponent: exponent as i64,
            infinite: false,
            frozen: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn unchecked(mantissa: impl Into<BigInt>, exponent: i64) -> Self {
        Self {
            mantissa: mantissa.into(),
            exponent,
            infinite: false,
            frozen: false,
        }
    }

    fn infinite_with_sign(sign: i8) -> Self {
        if sign < 0 {
            Self::neg_infinity()
        } else {
            Self::infinity()
        }
    }

    pub fn zero() -> Self {
        Self {
            mantissa: BigInt::zero(),
            exponent: 0,
            infinite: false,
            frozen: false,
        }
    }

    pub fn one() -> Self {
        Self {
            mantissa: BigInt::one(),
            exponent: 0,
            infinite: false,
            frozen: false,
        }
    }

    pub fn infinity() -> Self {
        Self {
            mantissa: BigInt::one(),
            exponent: 0,
            infinite: true,
            frozen: false,
        }
    }

    pub fn neg_infinity() -> Self {
        Self {
            mantissa: -BigInt::one(),
            exponent: 0,
            infinite: true,
            frozen: false,
        }
    }

    /// Mark this value as frozen. Mutating methods will refuse to touch it.
    pub fn freeze(mut self) -> Self {
        self.frozen = true;
        self
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    pub fn is_infinite(&self) -> bool {
        self.infinite
    }

    pub fn is_zero(&self) -> bool {
        !self.infinite && self.mantissa.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.mantissa.is_positive()
    }

    /// -1, 0 or 1.
    pub fn signum(&self) -> i8 {
        if self.mantissa.is_negative() {
            -1
        } else if self.mantissa.is_zero() {
            0
        } else {
            1
        }
    }

    /// Whether the value is an integer at its current scale.
    pub fn is_integral(&self) -> bool {
        !self.infinite && self.exponent >= 0
    }

    // -- Normalization --

    /// Return a normalized copy. Idempotent: normalizing twice yields the
    /// same representation as normalizing once.
    pub fn normalized(&self) -> Self {
        if self.infinite {
            return Self::infinite_with_sign(self.signum());
        }
        Self::from_parts(self.mantissa.clone(), i128::from(self.exponent))
    }

    /// Check the normalized-form invariant.
    pub fn is_normalized(&self) -> bool {
        if self.infinite {
            return self.exponent == 0 && self.mantissa.magnitude().is_one();
        }
        if self.mantissa.is_zero() {
            return self.exponent == 0;
        }
        !(&self.mantissa % BigInt::from(10u8)).is_zero()
    }

    // -- Arithmetic (immutable) --

    /// Raise to an integer power. `x^0 == 1`, negative powers are `1 / x^|n|`.
    pub fn pow(&self, power: i32) -> Self {
        match power {
            0 => Self::one(),
            1 => self.clone(),
            p if p < 0 => div_impl(&Self::one(), &self.pow_unsigned(p.unsigned_abs())),
            p => self.pow_unsigned(p as u32),
        }
    }

    fn pow_unsigned(&self, power: u32) -> Self {
        if self.infinite {
            let sign = if power % 2 == 0 { 1 } else { self.signum() };
            return Self::infinite_with_sign(sign);
        }
        // Square and multiply; every step is range-checked, so the
        // intermediate mantissas stay bounded.
        let mut result = Self::one();
        let mut base = self.clone();
        let mut remaining = power;
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = mul_impl(&result, &base);
            }
            remaining >>= 1;
            if remaining > 0 {
                base = mul_impl(&base, &base);
            }
        }
        result
    }

    /// Round toward zero.
    pub fn floor(&self) -> Self {
        self.round_to_integer(false)
    }

    /// Round away from zero.
    pub fn ceil(&self) -> Self {
        self.round_to_integer(true)
    }

    fn round_to_integer(&self, away_from_zero: bool) -> Self {
        if self.infinite || self.exponent >= 0 {
            return self.clone();
        }
        let divisor = pow10(self.exponent.unsigned_abs());
        let (quotient, remainder) = self.mantissa.div_rem(&divisor);
        let quotient = if away_from_zero && !remainder.is_zero() {
            quotient + self.mantissa.signum()
        } else {
            quotient
        };
        Self::from_parts(quotient, 0)
    }

    pub fn negate(&self) -> Self {
        Self {
            mantissa: -&self.mantissa,
            exponent: self.exponent,
            infinite: self.infinite,
            frozen: false,
        }
    }

    pub fn abs(&self) -> Self {
        if self.is_negative() {
            self.negate()
        } else {
            self.clone()
        }
    }

    /// Approximate base-10 order of magnitude: digits of the mantissa plus
    /// the exponent, minus one. Zero reports 0 and infinity `i64::MAX`.
    pub fn magnitude(&self) -> i64 {
        if self.infinite {
            return i64::MAX;
        }
        if self.mantissa.is_zero() {
            return 0;
        }
        digit_count(&self.mantissa) + self.exponent - 1
    }

    // -- Arithmetic (mutable) --

    fn mutate(&mut self, op: impl FnOnce(&Big) -> Big) -> Result<&mut Self, ImmutableValueError> {
        if self.frozen {
            return Err(ImmutableValueError);
        }
        let next = op(self);
        *self = next;
        Ok(self)
    }

    pub fn add_mut(&mut self, rhs: &Big) -> Result<&mut Self, ImmutableValueError> {
        self.mutate(|v| add_impl(v, rhs))
    }

    pub fn sub_mut(&mut self, rhs: &Big) -> Result<&mut Self, ImmutableValueError> {
        self.mutate(|v| sub_impl(v, rhs))
    }

    pub fn mul_mut(&mut self, rhs: &Big) -> Result<&mut Self, ImmutableValueError> {
        self.mutate(|v| mul_impl(v, rhs))
    }

    pub fn div_mut(&mut self, rhs: &Big) -> Result<&mut Self, ImmutableValueError> {
        self.mutate(|v| div_impl(v, rhs))
    }

    pub fn pow_mut(&mut self, power: i32) -> Result<&mut Self, ImmutableValueError> {
        self.mutate(|v| v.pow(power))
    }

    pub fn floor_mut(&mut self) -> Result<&mut Self, ImmutableValueError> {
        self.mutate(Big::floor)
    }

    pub fn ceil_mut(&mut self) -> Result<&mut Self, ImmutableValueError> {
        self.mutate(Big::ceil)
    }

    pub fn negate_mut(&mut self) -> Result<&mut Self, ImmutableValueError> {
        if self.frozen {
            return Err(ImmutableValueError);
        }
        self.mantissa = -std::mem::take(&mut self.mantissa);
        Ok(self)
    }

    // -- Aggregates --

    pub fn sum<'a>(values: impl IntoIterator<Item = &'a Big>) -> Self {
        values.into_iter().fold(Self::zero(), |acc, v| add_impl(&acc, v))
    }

    pub fn max_of<'a>(values: impl IntoIterator<Item = &'a Big>) -> Self {
        values.into_iter().max().cloned().unwrap_or_else(Self::zero)
    }

    pub fn min_of<'a>(values: impl IntoIterator<Item = &'a Big>) -> Self {
        values.into_iter().min().cloned().unwrap_or_else(Self::zero)
    }

    // -- Conversions --

    /// Convert from a float using its shortest exact decimal expansion.
    /// NaN maps to zero. Intended for configuration and `dt`, not for
    /// quantities that must stay exact.
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self::zero();
        }
        if value.is_infinite() {
            return Self::infinite_with_sign(if value > 0.0 { 1 } else { -1 });
        }
        format!("{value:e}").parse().unwrap_or_else(|_| Self::zero())
    }

    /// Lossy conversion for display and rate reporting.
    pub fn to_f64(&self) -> f64 {
        if self.infinite {
            return if self.is_negative() {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            };
        }
        format!("{}e{}", self.mantissa, self.exponent)
            .parse()
            .unwrap_or(0.0)
    }

    /// The integer part (rounded toward zero). `None` for infinities.
    pub fn to_integer(&self) -> Option<BigInt> {
        if self.infinite {
            return None;
        }
        let floored = self.floor();
        Some(floored.mantissa * pow10(floored.exponent as u64))
    }

    /// Integer part clamped to `[0, u32::MAX]`.
    pub fn to_u32_saturating(&self) -> u32 {
        if self.signum() <= 0 {
            return 0;
        }
        if self.infinite || self.magnitude() > 10 {
            return u32::MAX;
        }
        self.to_integer()
            .and_then(|i| i.to_u32())
            .unwrap_or(u32::MAX)
    }
}

// ---------------------------------------------------------------------------
// Arithmetic kernels
// ---------------------------------------------------------------------------

fn add_impl(a: &Big, b: &Big) -> Big {
    match (a.infinite, b.infinite) {
        (true, true) if a.signum() == b.signum() => a.clone(),
        (true, true) => Big::zero(),
        (true, false) => a.clone(),
        (false, true) => b.clone(),
        (false, false) => {
            let (am, bm, exponent) = aligned(a, b);
            Big::from_parts(am + bm, i128::from(exponent))
        }
    }
}

fn sub_impl(a: &Big, b: &Big) -> Big {
    add_impl(a, &b.negate())
}

fn mul_impl(a: &Big, b: &Big) -> Big {
    if a.infinite || b.infinite {
        if a.is_zero() || b.is_zero() {
            return Big::zero();
        }
        return Big::infinite_with_sign(a.signum() * b.signum());
    }
    Big::from_parts(
        &a.mantissa * &b.mantissa,
        i128::from(a.exponent) + i128::from(b.exponent),
    )
}

fn div_impl(a: &Big, b: &Big) -> Big {
    if b.is_zero() {
        return consts::INFINITY.clone();
    }
    match (a.infinite, b.infinite) {
        (true, true) | (false, true) => Big::zero(),
        (true, false) => Big::infinite_with_sign(a.signum() * b.signum()),
        (false, false) => {
            // Two guard digits of precision; integer division truncates.
            let scaled = &a.mantissa * BigInt::from(100u8);
            Big::from_parts(
                scaled / &b.mantissa,
                i128::from(a.exponent) - i128::from(b.exponent) - 2,
            )
        }
    }
}

macro_rules! forward_binop {
    ($trait:ident, $method:ident, $kernel:ident) => {
        impl $trait<&Big> for &Big {
            type Output = Big;
            fn $method(self, rhs: &Big) -> Big {
                $kernel(self, rhs)
            }
        }

        impl $trait<Big> for Big {
            type Output = Big;
            fn $method(self, rhs: Big) -> Big {
                $kernel(&self, &rhs)
            }
        }

        impl $trait<&Big> for Big {
            type Output = Big;
            fn $method(self, rhs: &Big) -> Big {
                $kernel(&self, rhs)
            }
        }

        impl $trait<Big> for &Big {
            type Output = Big;
            fn $method(self, rhs: Big) -> Big {
                $kernel(self, &rhs)
            }
        }
    };
}

forward_binop!(Add, add, add_impl);
forward_binop!(Sub, sub, sub_impl);
forward_binop!(Mul, mul, mul_impl);
forward_binop!(Div, div, div_impl);

impl Neg for Big {
    type Output = Big;
    fn neg(self) -> Big {
        self.negate()
    }
}

impl Neg for &Big {
    type Output = Big;
    fn neg(self) -> Big {
        self.negate()
    }
}

impl<'a> std::iter::Sum<&'a Big> for Big {
    fn sum<I: Iterator<Item = &'a Big>>(iter: I) -> Big {
        Big::sum(iter)
    }
}

impl std::iter::Sum<Big> for Big {
    fn sum<I: Iterator<Item = Big>>(iter: I) -> Big {
        iter.fold(Big::zero(), |acc, v| add_impl(&acc, &v))
    }
}

// ---------------------------------------------------------------------------
// Equality, ordering, hashing
// ---------------------------------------------------------------------------

impl Clone for Big {
    /// Clones are new values and never inherit the frozen flag.
    fn clone(&self) -> Self {
        Self {
            mantissa: self.mantissa.clone(),
            exponent: self.exponent,
            infinite: self.infinite,
            frozen: false,
        }
    }
}

impl Default for Big {
    fn default() -> Self {
        Self::zero()
    }
}

impl PartialEq for Big {
    fn eq(&self, other: &Self) -> bool {
        self.infinite == other.infinite
            && self.exponent == other.exponent
            && self.mantissa == other.mantissa
    }
}

impl Eq for Big {}

impl Hash for Big {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mantissa.hash(state);
        self.exponent.hash(state);
        self.infinite.hash(state);
    }
}

impl Ord for Big {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.infinite || other.infinite {
            let rank = |v: &Big| if v.infinite { 2 * v.signum() } else { 0 };
            return rank(self).cmp(&rank(other));
        }
        let (sa, sb) = (self.signum(), other.signum());
        if sa != sb {
            return sa.cmp(&sb);
        }
        if sa == 0 {
            return Ordering::Equal;
        }
        let by_abs = match self.magnitude().cmp(&other.magnitude()) {
            Ordering::Equal => {
                let (am, bm, _) = aligned(self, other);
                am.magnitude().cmp(bm.magnitude())
            }
            unequal => unequal,
        };
        if sa > 0 { by_abs } else { by_abs.reverse() }
    }
}

impl PartialOrd for Big {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

macro_rules! from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Big {
            fn from(v: $t) -> Self {
                Big::from_parts(BigInt::from(v), 0)
            }
        })*
    };
}

from_int!(i32, i64, u32, u64, usize);

impl From<BigInt> for Big {
    fn from(v: BigInt) -> Self {
        Big::from_parts(v, 0)
    }
}

impl FromStr for Big {
    type Err = ParseBigError;

    /// Accepts `"12"`, `"-1.5"`, `"2.5e-3"`, `".5"`, `"inf"`, `"-Infinity"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(ParseBigError::Empty);
        }
        let (negative, body) = match text.as_bytes()[0] {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };
        if body.eq_ignore_ascii_case("inf") || body.eq_ignore_ascii_case("infinity") {
            return Ok(Self::infinite_with_sign(if negative { -1 } else { 1 }));
        }

        let (number, exponent) = match body.find(|c| c == 'e' || c == 'E') {
            Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
            None => (body, None),
        };
        let exponent: i64 = match exponent {
            None => 0,
            Some(text) => text
                .parse()
                .map_err(|_| ParseBigError::InvalidExponent(s.to_string()))?,
        };

        let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
        let digits = format!("{int_part}{frac_part}");
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseBigError::InvalidDigit(s.to_string()));
        }
        let mut mantissa = BigInt::parse_bytes(digits.as_bytes(), 10)
            .ok_or_else(|| ParseBigError::InvalidDigit(s.to_string()))?;
        if negative {
            mantissa = -mantissa;
        }
        let exponent = i64::try_from(frac_part.len())
            .ok()
            .and_then(|scale| exponent.checked_sub(scale))
            .ok_or_else(|| ParseBigError::InvalidExponent(s.to_string()))?;
        Ok(Self::from_parts(mantissa, i128::from(exponent)))
    }
}

impl fmt::Display for Big {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.infinite {
            return f.write_str(if self.is_negative() { "-Infinity" } else { "Infinity" });
        }
        let sign = if self.is_negative() { "-" } else { "" };
        let digits = self.mantissa.magnitude().to_str_radix(10);
        let len = digits.len() as i64;

        if (0..=21).contains(&self.exponent) {
            let zeros = "0".repeat(self.exponent as usize);
            return write!(f, "{sign}{digits}{zeros}");
        }
        if self.exponent < 0 && self.exponent >= -21 {
            let point = len + self.exponent;
            return if point > 0 {
                let (int_part, frac_part) = digits.split_at(point as usize);
                write!(f, "{sign}{int_part}.{frac_part}")
            } else {
                let zeros = "0".repeat((-point) as usize);
                write!(f, "{sign}0.{zeros}{digits}")
            };
        }
        let (lead, rest) = digits.split_at(1);
        let sci_exponent = self.exponent + len - 1;
        if rest.is_empty() {
            write!(f, "{sign}{lead}e{sci_exponent}")
        } else {
            write!(f, "{sign}{lead}.{rest}e{sci_exponent}")
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
