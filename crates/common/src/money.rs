use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Money amount in minor units (kuruş for TRY) to avoid floating point drift.
///
/// On the wire amounts are decimal lira: serialized as a JSON number
/// (`15.5`), read from a number or a string (`15.5`, `15`, `"15.50"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money {
    cents: i64,
}

/// Largest amount accepted from a request, in lira.
pub const MAX_LIRA: i64 = 1_000_000_000;

impl Money {
    /// Creates a new amount from minor units.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in minor units.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Multiplies by a quantity, saturating at the `i64` bounds.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents.saturating_mul(i64::from(quantity)),
        }
    }

    /// Multiplies by a quantity; `None` on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts; `None` on overflow.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.cents.checked_add(other.cents).map(Money::from_cents)
    }

    /// Formats the amount the way payment gateways expect it: `"12.50"`.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }

    /// Parses a decimal lira amount with at most two fraction digits:
    /// `"15"`, `"15.5"`, `"-0.05"`.
    pub fn parse_decimal(text: &str) -> Option<Money> {
        let text = text.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if fraction.len() > 2
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        if whole > MAX_LIRA {
            return None;
        }
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().ok()? * 10,
            _ => fraction.parse().ok()?,
        };
        let cents = whole * 100 + fraction;
        Some(Money::from_cents(if negative { -cents } else { cents }))
    }

    /// Converts a lira amount given as a float, rounding to the nearest kuruş.
    pub fn from_lira(lira: f64) -> Option<Money> {
        if !lira.is_finite() || lira.abs() > MAX_LIRA as f64 {
            return None;
        }
        Some(Money::from_cents((lira * 100.0).round() as i64))
    }

    /// The amount in lira, for JSON output.
    pub fn as_lira(&self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} TRY", self.to_decimal_string())
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents.saturating_add(rhs.cents),
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_lira())
    }
}

struct LiraVisitor;

impl<'de> Visitor<'de> for LiraVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an amount in lira, as a number or a decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        if v.unsigned_abs() > MAX_LIRA.unsigned_abs() {
            return Err(E::custom(format!("amount {v} is out of range")));
        }
        Ok(Money::from_cents(v * 100))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        let v = i64::try_from(v).map_err(|_| E::custom(format!("amount {v} is out of range")))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Money::from_lira(v).ok_or_else(|| E::custom(format!("amount {v} is out of range")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Money::parse_decimal(v).ok_or_else(|| E::custom(format!("invalid amount: {v:?}")))
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LiraVisitor)
    }
}

/// Field helper for optional amounts posted by forms, where an empty string
/// means "not given".
///
/// Use with `#[serde(default, deserialize_with = "common::money::optional_lira")]`.
pub fn optional_lira<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Money>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Amount(Money),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => Money::parse_decimal(&text)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid amount: {text:?}"))),
        Some(Raw::Amount(money)) => Ok(Some(money)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_string_pads_cents() {
        assert_eq!(Money::from_cents(1250).to_decimal_string(), "12.50");
        assert_eq!(Money::from_cents(5).to_decimal_string(), "0.05");
        assert_eq!(Money::from_cents(-199).to_decimal_string(), "-1.99");
    }

    #[test]
    fn multiply_and_sum() {
        let line = Money::from_cents(450).multiply(3);
        assert_eq!(line.cents(), 1350);

        let total: Money = [Money::from_cents(100), Money::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(350));
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        assert_eq!(
            Money::from_cents(450).checked_multiply(3),
            Some(Money::from_cents(1350))
        );
        assert_eq!(Money::from_cents(i64::MAX / 2).checked_multiply(u32::MAX), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MAX).multiply(2).cents(), i64::MAX);
    }

    #[test]
    fn serializes_as_lira() {
        assert_eq!(serde_json::to_string(&Money::from_cents(1550)).unwrap(), "15.5");
        assert_eq!(serde_json::to_string(&Money::from_cents(999)).unwrap(), "9.99");
        assert_eq!(serde_json::to_string(&Money::from_cents(12000)).unwrap(), "120.0");
    }

    #[test]
    fn reads_lira_from_numbers_and_strings() {
        let parse = |json: &str| serde_json::from_str::<Money>(json).map(|m| m.cents());
        assert_eq!(parse("15").unwrap(), 1500);
        assert_eq!(parse("15.5").unwrap(), 1550);
        assert_eq!(parse("0.1").unwrap(), 10);
        assert_eq!(parse("\"15.50\"").unwrap(), 1550);
        assert_eq!(parse("\" 7 \"").unwrap(), 700);
        assert_eq!(parse("\"-0.05\"").unwrap(), -5);
        assert!(parse("\"15.505\"").is_err());
        assert!(parse("\"abc\"").is_err());
        assert!(parse("\"\"").is_err());
        assert!(parse("1e300").is_err());
        assert!(parse("true").is_err());
    }

    #[test]
    fn optional_lira_treats_blank_as_missing() {
        #[derive(Deserialize)]
        struct Form {
            #[serde(default, deserialize_with = "optional_lira")]
            price: Option<Money>,
        }
        let parse = |json: &str| serde_json::from_str::<Form>(json).map(|f| f.price);
        assert_eq!(parse(r#"{}"#).unwrap(), None);
        assert_eq!(parse(r#"{"price":null}"#).unwrap(), None);
        assert_eq!(parse(r#"{"price":""}"#).unwrap(), None);
        assert_eq!(parse(r#"{"price":"12.5"}"#).unwrap(), Some(Money::from_cents(1250)));
        assert_eq!(parse(r#"{"price":40}"#).unwrap(), Some(Money::from_cents(4000)));
        assert!(parse(r#"{"price":"x"}"#).is_err());
    }

    #[test]
    fn display_includes_currency() {
        assert_eq!(Money::from_cents(12000).to_string(), "120.00 TRY");
    }
}
