//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., ringgit, not sen).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the shop's default currency.
    #[must_use]
    pub const fn ringgit(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::MYR)
    }

    /// Format for display (e.g., "RM 25.00").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{} {:.2}", self.currency_code.symbol(), self.amount)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// Malaysian Ringgit - the shop's home currency.
    #[default]
    MYR,
    SGD,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::MYR => "RM",
            Self::SGD | Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MYR => "MYR",
            Self::SGD => "SGD",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_to_two_decimals() {
        let price = Price::ringgit(Decimal::new(25, 0));
        assert_eq!(price.display(), "RM 25.00");

        let price = Price::ringgit(Decimal::new(850, 2));
        assert_eq!(price.display(), "RM 8.50");
    }

    #[test]
    fn test_default_currency_is_ringgit() {
        assert_eq!(CurrencyCode::default(), CurrencyCode::MYR);
        assert_eq!(CurrencyCode::default().code(), "MYR");
    }
}
