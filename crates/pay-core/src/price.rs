//! # Price Types
//!
//! Currency and amount types. Amounts are held in the smallest currency unit
//! and rendered as the decimal strings the payment sheet expects.

use serde::{Deserialize, Serialize};

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    JPY,
    CAD,
    AUD,
    CHF,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::CHF => "CHF",
        }
    }

    /// Returns the number of decimal places for this currency
    /// (JPY has 0 decimals, most others have 2)
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::EUR
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price with amount in smallest currency unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in smallest currency unit (cents for EUR)
    pub amount: i64,
    /// Currency
    pub currency: Currency,
}

impl Price {
    /// Create a price from smallest unit (cents)
    pub fn from_cents(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Zero in the given currency
    pub fn zero(currency: Currency) -> Self {
        Self::from_cents(0, currency)
    }

    /// Sum of two prices. Currencies are expected to match.
    pub fn plus(&self, other: Price) -> Price {
        debug_assert_eq!(self.currency, other.currency);
        Price {
            amount: self.amount + other.amount,
            currency: self.currency,
        }
    }

    /// Decimal string without symbol, e.g. `"0.49"`
    pub fn amount_string(&self) -> String {
        let places = self.currency.decimal_places() as u32;
        if places == 0 {
            return self.amount.to_string();
        }
        let divisor = 10_i64.pow(places);
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.abs();
        format!(
            "{}{}.{:0width$}",
            sign,
            abs / divisor,
            abs % divisor,
            width = places as usize
        )
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount_string(), self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_string() {
        assert_eq!(Price::from_cents(0, Currency::EUR).amount_string(), "0.00");
        assert_eq!(Price::from_cents(1, Currency::EUR).amount_string(), "0.01");
        assert_eq!(Price::from_cents(49, Currency::EUR).amount_string(), "0.49");
        assert_eq!(Price::from_cents(1999, Currency::USD).amount_string(), "19.99");
        assert_eq!(Price::from_cents(500, Currency::JPY).amount_string(), "500");
        assert_eq!(Price::from_cents(-5, Currency::EUR).amount_string(), "-0.05");
    }

    #[test]
    fn test_plus() {
        let total = Price::from_cents(1, Currency::EUR).plus(Price::from_cents(49, Currency::EUR));
        assert_eq!(total, Price::from_cents(50, Currency::EUR));
    }

    #[test]
    fn test_currency_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Currency::EUR).unwrap(), "\"EUR\"");
        assert_eq!(Currency::GBP.to_string(), "GBP");
    }
}
