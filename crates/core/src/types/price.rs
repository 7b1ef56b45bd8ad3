//! Lenient price representation using decimal arithmetic.
//!
//! Catalog data is not schema-validated before it reaches the cart, so a
//! price may arrive as a JSON number, a numeric string, `null`, or garbage.
//! [`Price::coerce`] maps all of these onto a [`Decimal`], with anything that
//! is not a number contributing zero.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A listing price in the marketplace currency (Indian rupees).
///
/// Serializes as a decimal string and deserializes from any JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

/// Currency symbol shown next to formatted prices.
pub const CURRENCY_SYMBOL: &str = "₹";

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Coerce an arbitrary JSON value into a price.
    ///
    /// Numbers convert directly, strings are trimmed and parsed (an empty
    /// string is zero), and every other value is zero.
    #[must_use]
    pub fn coerce(raw: &Value) -> Self {
        match raw {
            Value::Number(n) => Self::parse_text(&n.to_string()),
            Value::String(s) => Self::parse_text(s.trim()),
            _ => Self::ZERO,
        }
    }

    fn parse_text(text: &str) -> Self {
        if text.is_empty() {
            return Self::ZERO;
        }
        Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map_or(Self::ZERO, Self)
    }

    /// Sum prices, saturating instead of overflowing.
    #[must_use]
    pub fn sum<'a>(prices: impl IntoIterator<Item = &'a Self>) -> Self {
        Self(
            prices
                .into_iter()
                .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.0)),
        )
    }

    /// Format for display with the currency symbol (e.g., "₹20.00").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{CURRENCY_SYMBOL}{self}")
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(Self::coerce(&raw))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_coerce_numbers_and_strings() {
        assert_eq!(Price::coerce(&json!(10)).amount(), Decimal::from(10));
        assert_eq!(Price::coerce(&json!("20")).amount(), Decimal::from(20));
        assert_eq!(Price::coerce(&json!(" 12.5 ")).amount(), Decimal::new(125, 1));
        assert_eq!(Price::coerce(&json!(0.1)).amount(), Decimal::new(1, 1));
    }

    #[test]
    fn test_coerce_scientific_notation() {
        assert_eq!(Price::coerce(&json!("1e3")).amount(), Decimal::from(1000));
    }

    #[test]
    fn test_non_numeric_is_zero() {
        assert_eq!(Price::coerce(&Value::Null), Price::ZERO);
        assert_eq!(Price::coerce(&json!("free")), Price::ZERO);
        assert_eq!(Price::coerce(&json!("")), Price::ZERO);
        assert_eq!(Price::coerce(&json!(true)), Price::ZERO);
        assert_eq!(Price::coerce(&json!([1])), Price::ZERO);
    }

    #[test]
    fn test_sum() {
        let prices = [
            Price::coerce(&json!(10)),
            Price::coerce(&json!("20")),
            Price::coerce(&Value::Null),
        ];
        assert_eq!(Price::sum(&prices).amount(), Decimal::from(30));
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::coerce(&json!(15)).display(), "₹15.00");
    }

    #[test]
    fn test_deserialize_is_lenient() {
        let price: Price = serde_json::from_value(json!("7.25")).unwrap();
        assert_eq!(price.amount(), Decimal::new(725, 2));
        let price: Price = serde_json::from_value(json!({"amount": 3})).unwrap();
        assert_eq!(price, Price::ZERO);
    }

    #[test]
    fn test_serializes_as_string() {
        let value = serde_json::to_value(Price::coerce(&json!(15))).unwrap();
        assert_eq!(value, json!("15"));
    }
}
