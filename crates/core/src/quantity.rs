//! Fixed-precision quantities (stock on hand, BOM usage, postings).

use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Number of fractional digits every quantity is rounded to.
pub const QUANTITY_SCALE: u32 = 6;

/// Integer digits a quantity may carry; matches the `NUMERIC(24, 6)` columns.
pub const QUANTITY_INTEGER_DIGITS: u32 = 18;

/// A decimal quantity normalised to [`QUANTITY_SCALE`] fractional digits.
///
/// Normalisation happens on construction, so sums over large batches never
/// accumulate representation drift. Rounding is midpoint-away-from-zero.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl ValueObject for Quantity {}

impl Quantity {
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(
            value
                .round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointAwayFromZero)
                .normalize(),
        )
    }

    pub fn from_int(value: i64) -> Self {
        Self::new(Decimal::from(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Whether the magnitude fits in [`QUANTITY_INTEGER_DIGITS`] integer digits.
    pub fn is_storable(&self) -> bool {
        self.0.abs() < Decimal::from(10i64.pow(QUANTITY_INTEGER_DIGITS))
    }

    /// Returns `self` when strictly positive and storable, otherwise an
    /// `InvalidQuantity` error naming `what`.
    pub fn ensure_positive(self, what: &str) -> DomainResult<Self> {
        if !self.is_positive() {
            return Err(DomainError::invalid_quantity(format!(
                "{what} must be greater than zero (got {self})"
            )));
        }
        self.ensure_storable(what)
    }

    pub fn ensure_storable(self, what: &str) -> DomainResult<Self> {
        if self.is_storable() {
            Ok(self)
        } else {
            Err(DomainError::invalid_quantity(format!(
                "{what} exceeds {QUANTITY_INTEGER_DIGITS} integer digits (got {self})"
            )))
        }
    }

    /// Rounded sum; `InvalidQuantity` instead of a panic on decimal overflow.
    pub fn checked_add(self, rhs: Quantity) -> DomainResult<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self::new)
            .ok_or_else(|| DomainError::invalid_quantity(format!("{self} + {rhs} overflows")))
    }

    /// Rounded product, e.g. `qty_per_unit * produced`.
    pub fn checked_mul(self, rhs: Quantity) -> DomainResult<Self> {
        self.0
            .checked_mul(rhs.0)
            .map(Self::new)
            .ok_or_else(|| DomainError::invalid_quantity(format!("{self} x {rhs} overflows")))
    }

    /// Smallest whole multiple of `pack` that is at least `self`.
    pub fn round_up_to_pack(self, pack: Quantity) -> Self {
        if !pack.is_positive() || !self.is_positive() {
            return self;
        }
        let packs = (self.0 / pack.0).ceil();
        Self::new(packs * pack.0)
    }
}

impl From<Decimal> for Quantity {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl FromStr for Quantity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Self::new)
            .map_err(|e| DomainError::invalid_quantity(format!("'{s}': {e}")))
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.0 - rhs.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Quantity {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl core::iter::Sum for Quantity {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Quantity::ZERO, |acc, q| acc + q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn construction_rounds_to_six_places() {
        assert_eq!(Quantity::new(dec!(0.1234565)).value(), dec!(0.123457));
        assert_eq!(Quantity::new(dec!(-0.1234565)).value(), dec!(-0.123457));
        assert_eq!(Quantity::new(dec!(2.500000)).to_string(), "2.5");
    }

    #[test]
    fn ensure_positive_rejects_zero_and_negative() {
        assert!(Quantity::ZERO.ensure_positive("qty").is_err());
        assert!(Quantity::from_int(-1).ensure_positive("qty").is_err());
        assert_eq!(
            Quantity::from_int(3).ensure_positive("qty").unwrap(),
            Quantity::from_int(3)
        );
    }

    #[test]
    fn quantities_beyond_eighteen_integer_digits_are_rejected() {
        let largest = Quantity::new(dec!(999999999999999999.999999));
        assert_eq!(largest.ensure_positive("qty").unwrap(), largest);

        let too_big = Quantity::new(dec!(1000000000000000000));
        assert!(matches!(too_big.ensure_positive("qty"), Err(DomainError::InvalidQuantity(_))));
        assert!(matches!(
            Quantity::new(Decimal::MAX).ensure_positive("qty"),
            Err(DomainError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn checked_add_reports_overflow() {
        let max = Quantity::new(Decimal::MAX);
        assert!(matches!(max.checked_add(max), Err(DomainError::InvalidQuantity(_))));
        assert_eq!(
            Quantity::from_int(2).checked_add(Quantity::new(dec!(0.5))).unwrap(),
            Quantity::new(dec!(2.5))
        );
    }

    #[test]
    fn round_up_to_pack_uses_whole_packs() {
        let shortfall = Quantity::new(dec!(7.5));
        assert_eq!(shortfall.round_up_to_pack(Quantity::from_int(5)), Quantity::from_int(10));
        assert_eq!(Quantity::from_int(10).round_up_to_pack(Quantity::from_int(5)), Quantity::from_int(10));
        assert_eq!(Quantity::ZERO.round_up_to_pack(Quantity::from_int(5)), Quantity::ZERO);
    }

    #[test]
    fn json_accepts_numbers_and_normalises() {
        let q: Quantity = serde_json::from_str("0.5").unwrap();
        assert_eq!(q, Quantity::new(dec!(0.5)));
        let q: Quantity = serde_json::from_str("4").unwrap();
        assert_eq!(q, Quantity::from_int(4));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("abc".parse::<Quantity>().is_err());
        assert_eq!(" 1.25 ".parse::<Quantity>().unwrap(), Quantity::new(dec!(1.25)));
    }

    proptest! {
        /// Property: summing many small postings equals the rounded exact total.
        #[test]
        fn sums_do_not_drift(millis in prop::collection::vec(1i64..1_000_000i64, 1..200)) {
            let total: Quantity = millis
                .iter()
                .map(|m| Quantity::new(Decimal::new(*m, 3)))
                .sum();
            let exact: i64 = millis.iter().sum();
            prop_assert_eq!(total, Quantity::new(Decimal::new(exact, 3)));
        }
    }
}
