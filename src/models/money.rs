use rust_decimal::Decimal;

use crate::models::errors::LedgerError;

/// Converts between client-facing decimal amounts and the internal
/// minor-unit representation used by the ledger.
///
/// Balances are stored as signed i64 minor units (e.g. paise for INR
/// with `decimals = 2`) so financial math never touches floating point.
#[derive(Debug, Clone)]
pub struct CurrencyConverter {
    currency: String,
    decimals: u32,
}

impl CurrencyConverter {
    pub fn new(currency: impl Into<String>, decimals: u32) -> Self {
        Self { currency: currency.into(), decimals }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Convert a client decimal amount to minor units.
    ///
    /// Rejects inputs with more fractional digits than the currency
    /// scale. Example: with decimals=2, 10.50 is valid, 10.505 is not.
    pub fn to_minor_units(&self, amount: Decimal) -> Result<i64, LedgerError> {
        if amount.normalize().scale() > self.decimals {
            return Err(LedgerError::InvalidPrecision {
                value: amount.to_string(),
                expected: self.decimals,
            });
        }

        let multiplier = Decimal::from(10_i64.checked_pow(self.decimals).ok_or_else(|| {
            LedgerError::InvalidAmount("Currency decimals too large".to_string())
        })?);

        let scaled = amount.checked_mul(multiplier).ok_or_else(|| {
            LedgerError::InvalidAmount(format!("Amount {} overflows", amount))
        })?;

        scaled
            .round()
            .to_string()
            .parse::<i64>()
            .map_err(|_| LedgerError::InvalidAmount(format!("Amount {} overflows", amount)))
    }

    /// Convert minor units back to a client decimal amount
    pub fn to_decimal(&self, minor: i64) -> Decimal {
        Decimal::new(minor, self.decimals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromStr;

    #[test]
    fn test_conversion_precision() {
        let conv = CurrencyConverter::new("INR", 2);

        // 123.45 INR -> 12345 paise
        let amount = Decimal::from_str("123.45").unwrap();
        assert_eq!(conv.to_minor_units(amount).unwrap(), 12_345);

        // 1.234 INR -> Error (max 2 decimals)
        let amount = Decimal::from_str("1.234").unwrap();
        let result = conv.to_minor_units(amount);
        assert!(result.is_err(), "Should fail due to precision limit");
        assert_eq!(result.unwrap_err().error_code(), "INVALID_PRECISION");

        // Zero value
        assert_eq!(conv.to_minor_units(Decimal::from(0)).unwrap(), 0);

        // Negative passes conversion; sign validation is the ledger's job
        let amount = Decimal::from_str("-5.00").unwrap();
        assert_eq!(conv.to_minor_units(amount).unwrap(), -500);

        // Round trip
        assert_eq!(conv.to_decimal(12_345).to_string(), "123.45");
        assert_eq!(conv.to_decimal(-500).to_string(), "-5.00");
    }

    #[test]
    fn test_trailing_zeros_are_not_precision() {
        let conv = CurrencyConverter::new("INR", 2);

        // 10.500 normalizes to 10.5, which fits in 2 decimals
        let amount = Decimal::from_str("10.500").unwrap();
        assert_eq!(conv.to_minor_units(amount).unwrap(), 1_050);
    }

    #[test]
    fn test_overflow() {
        let conv = CurrencyConverter::new("INR", 2);

        // i64::MAX is about 9.2e18; 1e17 rupees = 1e19 paise overflows
        let amount = Decimal::from_str("100000000000000000").unwrap();
        let result = conv.to_minor_units(amount);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().error_code(), "INVALID_AMOUNT");

        // Large but representable
        let amount = Decimal::from_str("1000000000000.00").unwrap();
        assert_eq!(conv.to_minor_units(amount).unwrap(), 100_000_000_000_000);
    }
}
