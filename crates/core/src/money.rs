use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A number together with its commodity, e.g. `-650.00 EUR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    pub number: Decimal,
    pub currency: String,
}

impl Amount {
    pub fn new(number: Decimal, currency: &str) -> Self {
        Amount {
            number,
            currency: currency.to_string(),
        }
    }

    /// Rounds half-to-even at two decimal places, the precision bank exports carry.
    pub fn rounded(number: Decimal, currency: &str) -> Self {
        Amount::new(number.round_dp(2), currency)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut number = self.number;
        if number.scale() < 2 {
            number.rescale(2);
        }
        write!(f, "{} {}", number, self.currency)
    }
}
