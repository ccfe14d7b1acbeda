//! Fixed-precision decimal quantities
//!
//! Every amount in the recipe model is an [`ExactDecimal`]. Values are
//! rounded to [`DEFAULT_PRECISION`] fractional digits when they enter the
//! model; arithmetic keeps the full 28-digit precision of the underlying
//! `rust_decimal::Decimal` and only rounds again when rendered. Arithmetic
//! is checked: results outside the 96-bit range are `RecipeError::Overflow`.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{RecipeError, Result};

/// Fractional digits kept by `sanitize` and shown by `Display`
pub const DEFAULT_PRECISION: u32 = 4;

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExactDecimal(Decimal);

/// Anything that can be read as a decimal literal
pub trait NumericLiteral {
    fn to_decimal(&self) -> Result<Decimal>;
}

impl NumericLiteral for &str {
    fn to_decimal(&self) -> Result<Decimal> {
        parse_literal(self)
    }
}

impl NumericLiteral for String {
    fn to_decimal(&self) -> Result<Decimal> {
        parse_literal(self)
    }
}

impl NumericLiteral for Decimal {
    fn to_decimal(&self) -> Result<Decimal> {
        Ok(*self)
    }
}

impl NumericLiteral for ExactDecimal {
    fn to_decimal(&self) -> Result<Decimal> {
        Ok(self.0)
    }
}

macro_rules! integer_literal {
    ($($t:ty),*) => {
        $(
            impl NumericLiteral for $t {
                fn to_decimal(&self) -> Result<Decimal> {
                    Ok(Decimal::from(*self))
                }
            }
        )*
    };
}

integer_literal!(i32, i64, u32, u64, usize);

fn parse_literal(raw: &str) -> Result<Decimal> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(RecipeError::invalid_number(raw));
    }
    // Decimal::from_str rejects exponents, so retry those in scientific form
    Decimal::from_str(text)
        .or_else(|e| {
            if text.contains(['e', 'E']) {
                Decimal::from_scientific(text)
            } else {
                Err(e)
            }
        })
        .map_err(|_| RecipeError::invalid_number(raw))
}

impl ExactDecimal {
    pub const ZERO: ExactDecimal = ExactDecimal(Decimal::ZERO);
    pub const ONE: ExactDecimal = ExactDecimal(Decimal::ONE);

    /// Parse `raw` and round it to `precision` fractional digits (half-even).
    pub fn sanitize(raw: impl NumericLiteral, precision: u32) -> Result<Self> {
        let value = raw.to_decimal()?;
        Ok(ExactDecimal(
            value
                .round_dp_with_strategy(precision, RoundingStrategy::MidpointNearestEven)
                .normalize(),
        ))
    }

    /// `sanitize` with the default precision
    pub fn parse(raw: impl NumericLiteral) -> Result<Self> {
        Self::sanitize(raw, DEFAULT_PRECISION)
    }

    pub fn checked_add(self, rhs: ExactDecimal) -> Result<Self> {
        self.0
            .checked_add(rhs.0)
            .map(ExactDecimal)
            .ok_or(RecipeError::Overflow { operation: "add" })
    }

    pub fn checked_sub(self, rhs: ExactDecimal) -> Result<Self> {
        self.0
            .checked_sub(rhs.0)
            .map(ExactDecimal)
            .ok_or(RecipeError::Overflow {
                operation: "subtract",
            })
    }

    pub fn checked_mul(self, rhs: ExactDecimal) -> Result<Self> {
        self.0
            .checked_mul(rhs.0)
            .map(ExactDecimal)
            .ok_or(RecipeError::Overflow {
                operation: "multiply",
            })
    }

    pub fn divide(self, divisor: ExactDecimal) -> Result<Self> {
        if divisor.is_zero() {
            return Err(RecipeError::DivisionByZero);
        }
        self.0
            .checked_div(divisor.0)
            .map(ExactDecimal)
            .ok_or(RecipeError::Overflow { operation: "divide" })
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_positive()
    }

    /// Round to `precision` fractional digits without changing the stored scale
    pub fn round_to(self, precision: u32) -> Self {
        ExactDecimal(
            self.0
                .round_dp_with_strategy(precision, RoundingStrategy::MidpointNearestEven),
        )
    }

    /// Shortest plain rendering of the display-rounded value, e.g. `12.5`
    pub fn to_plain_string(&self) -> String {
        self.round_to(DEFAULT_PRECISION).0.normalize().to_string()
    }

    pub fn into_inner(self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for ExactDecimal {
    fn from(value: Decimal) -> Self {
        ExactDecimal(value)
    }
}

impl From<i64> for ExactDecimal {
    fn from(value: i64) -> Self {
        ExactDecimal(Decimal::from(value))
    }
}

impl From<u32> for ExactDecimal {
    fn from(value: u32) -> Self {
        ExactDecimal(Decimal::from(value))
    }
}

impl FromStr for ExactDecimal {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ExactDecimal {
    /// Grouped integer digits and fixed fractional digits: `1,234.5000`.
    /// An explicit precision (`{:.2}`) overrides the default.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().map_or(DEFAULT_PRECISION, |p| p as u32);
        let mut value = self
            .0
            .round_dp_with_strategy(precision, RoundingStrategy::MidpointNearestEven);
        if value.is_zero() {
            value.set_sign_positive(true);
        }
        value.rescale(precision);

        let text = value.abs().to_string();
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, fr)) => (i, Some(fr)),
            None => (text.as_str(), None),
        };

        let mut out = String::with_capacity(text.len() + int_part.len() / 3 + 1);
        if value.is_sign_negative() {
            out.push('-');
        }
        out.push_str(&group_thousands(int_part));
        if let Some(frac) = frac_part {
            out.push('.');
            out.push_str(frac);
        }
        match f.width() {
            Some(width) => write!(f, "{out:>width$}"),
            None => f.write_str(&out),
        }
    }
}

impl fmt::Debug for ExactDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExactDecimal('{}')", self.0.normalize())
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> ExactDecimal {
        ExactDecimal::parse(s).unwrap()
    }

    #[test]
    fn sanitize_rounds_half_even() {
        assert_eq!(ExactDecimal::sanitize("0.00005", 4).unwrap(), d("0"));
        assert_eq!(ExactDecimal::sanitize("0.00015", 4).unwrap(), d("0.0002"));
        assert_eq!(ExactDecimal::sanitize("2.345", 2).unwrap(), d("2.34"));
        assert_eq!(ExactDecimal::sanitize("2.355", 2).unwrap(), d("2.36"));
    }

    #[test]
    fn sanitize_accepts_integers_and_decimals() {
        assert_eq!(ExactDecimal::sanitize(12, 4).unwrap(), d("12"));
        assert_eq!(ExactDecimal::sanitize(Decimal::new(15, 1), 4).unwrap(), d("1.5"));
        assert_eq!(ExactDecimal::sanitize("1e3", 4).unwrap(), d("1000"));
        assert_eq!(ExactDecimal::sanitize(" 7.25 ", 4).unwrap(), d("7.25"));
    }

    #[test]
    fn sanitize_rejects_malformed_literals() {
        for bad in ["", "abc", "1.2.3", "1,5", "--1"] {
            assert!(
                matches!(
                    ExactDecimal::sanitize(bad, 4),
                    Err(RecipeError::InvalidNumberFormat { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn arithmetic_is_exact() {
        assert_eq!(d("0.1").checked_add(d("0.2")).unwrap(), d("0.3"));
        assert_eq!(d("1.5").checked_sub(d("0.5")).unwrap(), ExactDecimal::ONE);
        assert_eq!(d("0.007").checked_mul(d("10")).unwrap(), d("0.07"));
        assert_eq!(d("10").divide(d("4")).unwrap(), d("2.5"));
    }

    #[test]
    fn overflow_is_reported_not_panicking() {
        let huge = d("1e28");
        assert_eq!(
            huge.checked_mul(d("100")),
            Err(RecipeError::Overflow {
                operation: "multiply"
            })
        );
        assert!(matches!(
            huge.checked_add(d("7e28")),
            Err(RecipeError::Overflow { .. })
        ));
        assert!(matches!(
            d("-7e28").checked_sub(huge),
            Err(RecipeError::Overflow { .. })
        ));
    }

    #[test]
    fn division_overflow_is_not_division_by_zero() {
        assert_eq!(
            d("1e28").divide(d("0.0001")),
            Err(RecipeError::Overflow {
                operation: "divide"
            })
        );
    }

    #[test]
    fn divide_by_zero_fails() {
        assert_eq!(
            d("3").divide(ExactDecimal::ZERO),
            Err(RecipeError::DivisionByZero)
        );
    }

    #[test]
    fn division_keeps_precision_until_rendered() {
        let third = ExactDecimal::ONE.divide(d("3")).unwrap();
        assert_ne!(third, d("0.3333"));
        assert_eq!(third.checked_mul(d("3")).unwrap().round_to(4), ExactDecimal::ONE);
        assert_eq!(third.to_string(), "0.3333");
    }

    #[test]
    fn ordering_is_exact() {
        assert!(d("0.0001") > ExactDecimal::ZERO);
        assert!(!d("-0.0001").is_positive());
        assert!(!ExactDecimal::ZERO.is_positive());
        assert!(d("2.50") == d("2.5"));
    }

    #[test]
    fn display_groups_thousands() {
        assert_eq!(d("1234.5").to_string(), "1,234.5000");
        assert_eq!(d("1234567").to_string(), "1,234,567.0000");
        assert_eq!(d("999").to_string(), "999.0000");
        assert_eq!(d("-1234.5").to_string(), "-1,234.5000");
        assert_eq!(d("-0.00001").to_string(), "0.0000");
        assert_eq!(format!("{:.2}", d("1234.567")), "1,234.57");
        assert_eq!(format!("{:.0}", d("1234")), "1,234");
    }

    #[test]
    fn plain_and_debug_rendering() {
        assert_eq!(d("12.5000").to_plain_string(), "12.5");
        assert_eq!(d("100").to_plain_string(), "100");
        assert_eq!(format!("{:?}", d("1.50")), "ExactDecimal('1.5')");
    }
}
