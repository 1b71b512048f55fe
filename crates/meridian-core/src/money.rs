//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    100.10 + 99.90 = 200.00000000000003  ❌ never equal to 200.00        │
//! │                                                                         │
//! │  Settlement compares the sum of installments with the products total.  │
//! │  With floats that comparison fails for perfectly valid inputs.         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    10010 + 9990 = 20000 cents  ✓ exact                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use meridian_core::money::Money;
//!
//! let price = Money::from_cents(1099);
//! let parsed = Money::parse_decimal("10.99").unwrap();
//! assert_eq!(price, parsed);
//!
//! // Split a discount over three installments without losing a cent
//! let shares = Money::from_cents(1000).allocate(3);
//! assert_eq!(shares.iter().copied().sum::<Money>(), Money::from_cents(1000));
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use crate::error::ValidationError;
use crate::validation::validate_amount_range;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for exits, discounts
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Sale.products_total ──► Settlement total ──► Receivable.total          │
/// │                                │                                        │
/// │                                ├──► LedgerEntry.amount (cash)           │
/// │                                ├──► CardSettlement.charge (card)        │
/// │                                └──► Installment.amount (deferred)       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Parses a decimal amount such as `"200.00"`, `"92.5"` or `"185,00"` into cents.
    ///
    /// ## Rules
    /// - Surrounding whitespace is ignored
    /// - A single comma is accepted as the decimal separator
    /// - More than two decimal places are rounded half away from zero
    /// - Blank input is rejected with `ValidationError::Required`
    /// - Anything beyond [`MAX_AMOUNT`](crate::MAX_AMOUNT) either way is
    ///   rejected with `ValidationError::OutOfRange`
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("200.00").unwrap().cents(), 20000);
    /// assert_eq!(Money::parse_decimal("92,5").unwrap().cents(), 9250);
    /// assert_eq!(Money::parse_decimal("0.005").unwrap().cents(), 1);
    /// assert!(Money::parse_decimal("").is_err());
    /// assert!(Money::parse_decimal("abc").is_err());
    /// assert!(Money::parse_decimal("92233720368547758.07").is_err());
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
            trimmed.replacen(',', ".", 1)
        } else {
            trimmed.to_string()
        };

        let invalid = || ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: format!("'{}' is not a decimal amount", trimmed),
        };

        let decimal = Decimal::from_str(&normalized).map_err(|_| invalid())?;
        let cents = (decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            * Decimal::ONE_HUNDRED)
            .to_i64()
            .ok_or_else(invalid)?;

        let money = Money(cents);
        validate_amount_range("amount", money)?;

        Ok(money)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).major(), 10);
    /// assert_eq!(Money::from_cents(-550).major(), -5);
    /// ```
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Addition that reports overflow instead of wrapping or panicking.
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::Money;
    ///
    /// assert_eq!(
    ///     Money::from_cents(100).checked_add(Money::from_cents(1)),
    ///     Some(Money::from_cents(101))
    /// );
    /// assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    /// ```
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtraction that reports overflow instead of wrapping or panicking.
    #[inline]
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Multiplies money by a quantity. `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.checked_mul(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_mul(2), None);
    /// ```
    #[inline]
    pub fn checked_mul(self, qty: i64) -> Option<Money> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Splits the amount into `parts` shares that add back up exactly.
    ///
    /// ## Allocation Rule
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  10.00 discount over 3 installments                                │
    /// │                                                                     │
    /// │    naive:     3.33 + 3.33 + 3.33 = 9.99   → 1 cent lost            │
    /// │    allocate:  3.34 + 3.33 + 3.33 = 10.00  → leftover cents go to   │
    /// │                                             the earliest shares    │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// Returns an empty vector when `parts` is zero.
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::Money;
    ///
    /// let shares = Money::from_cents(2000).allocate(2);
    /// assert_eq!(shares, vec![Money::from_cents(1000), Money::from_cents(1000)]);
    ///
    /// let shares = Money::from_cents(-1000).allocate(3);
    /// assert_eq!(shares[0].cents(), -334);
    /// ```
    pub fn allocate(&self, parts: usize) -> Vec<Money> {
        if parts == 0 {
            return Vec::new();
        }

        let n = parts as i64;
        let base = self.0 / n;
        let leftover = self.0 % n;
        let step = leftover.signum();

        (0..n)
            .map(|i| {
                if i < leftover.abs() {
                    Money(base + step)
                } else {
                    Money(base)
                }
            })
            .collect()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount with two decimal places and no currency symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("200.00").unwrap().cents(), 20000);
        assert_eq!(Money::parse_decimal(" 100 ").unwrap().cents(), 10000);
        assert_eq!(Money::parse_decimal("0.01").unwrap().cents(), 1);
        assert_eq!(Money::parse_decimal("92,50").unwrap().cents(), 9250);
        assert_eq!(Money::parse_decimal("-3.5").unwrap().cents(), -350);
    }

    #[test]
    fn test_parse_decimal_rounds_to_cents() {
        assert_eq!(Money::parse_decimal("1.005").unwrap().cents(), 101);
        assert_eq!(Money::parse_decimal("1.004").unwrap().cents(), 100);
        assert_eq!(Money::parse_decimal("-1.005").unwrap().cents(), -101);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert!(matches!(
            Money::parse_decimal("   "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            Money::parse_decimal("12.3.4"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(Money::parse_decimal("R$ 10").is_err());
    }

    #[test]
    fn test_parse_decimal_rejects_amounts_beyond_the_limit() {
        assert_eq!(
            Money::parse_decimal("999999999.00").unwrap().cents(),
            crate::MAX_AMOUNT * 100
        );
        assert_eq!(
            Money::parse_decimal("-999999999").unwrap().cents(),
            -crate::MAX_AMOUNT * 100
        );

        for input in ["999999999.01", "-1000000000", "92233720368547758.07"] {
            assert!(
                matches!(
                    Money::parse_decimal(input),
                    Err(ValidationError::OutOfRange { .. })
                ),
                "{} should be out of range",
                input
            );
        }
    }

    #[test]
    fn test_checked_arithmetic() {
        let max = Money::from_cents(i64::MAX);
        let min = Money::from_cents(i64::MIN);

        assert_eq!(max.checked_add(Money::from_cents(1)), None);
        assert_eq!(min.checked_sub(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(500).checked_sub(Money::from_cents(700)),
            Some(Money::from_cents(-200))
        );
    }

    #[test]
    fn test_float_sum_pitfall_is_exact_in_cents() {
        let a = Money::parse_decimal("100.10").unwrap();
        let b = Money::parse_decimal("99.90").unwrap();
        assert_eq!(a + b, Money::parse_decimal("200.00").unwrap());
    }

    #[test]
    fn test_allocate_even_split() {
        let shares = Money::from_cents(2000).allocate(2);
        assert_eq!(shares, vec![Money::from_cents(1000); 2]);
    }

    #[test]
    fn test_allocate_leftover_goes_to_first_shares() {
        let shares = Money::from_cents(1001).allocate(3);
        assert_eq!(
            shares,
            vec![
                Money::from_cents(334),
                Money::from_cents(334),
                Money::from_cents(333)
            ]
        );
        assert_eq!(shares.into_iter().sum::<Money>().cents(), 1001);
    }

    #[test]
    fn test_allocate_negative_and_zero_parts() {
        let shares = Money::from_cents(-1000).allocate(3);
        assert_eq!(shares.iter().copied().sum::<Money>().cents(), -1000);
        assert!(Money::from_cents(100).allocate(0).is_empty());
        assert_eq!(Money::zero().allocate(4), vec![Money::zero(); 4]);
    }
}
