use rust_decimal::Decimal;
use saldo_core::{Account, Amount, Posting};
use thiserror::Error;

use crate::history::HistoryIndex;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuessError {
    #[error("Previous transaction for '{payee}' has no positive legs to split by")]
    ZeroDenominator { payee: String },
    #[error("Previous transaction for '{payee}' has no leg for {account}")]
    MissingImportingLeg { payee: String, account: Account },
    #[error("Splitting the value for '{payee}' overflows")]
    Overflow { payee: String },
}

/// Proposes the postings of a new bank transaction from the payee's last booking.
pub struct PostingGuesser<'a> {
    history: &'a HistoryIndex,
    default_account: &'a Account,
    currency: &'a str,
}

impl<'a> PostingGuesser<'a> {
    pub fn new(history: &'a HistoryIndex, default_account: &'a Account, currency: &'a str) -> Self {
        Self {
            history,
            default_account,
            currency,
        }
    }

    /// Splits `total` over the accounts of the payee's most recent transaction,
    /// in the same proportions. The importing account's leg always comes last.
    ///
    /// Without history the whole value goes against the default account.
    pub fn guess(&self, payee: &str, total: Decimal) -> Result<Vec<Posting>, GuessError> {
        let importing = self.history.importing_account();

        let Some(previous) = self.history.latest(payee) else {
            return Ok(vec![
                Posting::new(self.default_account.clone(), Amount::rounded(-total, self.currency)),
                Posting::new(importing.clone(), Amount::rounded(total, self.currency)),
            ]);
        };
        let legs = &previous.postings;

        let anchor = legs
            .iter()
            .rposition(|p| &p.account == importing)
            .ok_or_else(|| GuessError::MissingImportingLeg {
                payee: payee.to_string(),
                account: importing.clone(),
            })?;
        let overflow = || GuessError::Overflow {
            payee: payee.to_string(),
        };
        // A refund from a payee we usually pay (or vice versa) flips every leg.
        let anchor_number = legs[anchor].units.number;
        let reversed = !anchor_number.is_zero()
            && !total.is_zero()
            && anchor_number.is_sign_negative() != total.is_sign_negative();

        let denominator = legs
            .iter()
            .map(|p| p.units.number)
            .filter(|n| *n > Decimal::ZERO)
            .try_fold(Decimal::ZERO, |acc, n| acc.checked_add(n))
            .ok_or_else(overflow)?;
        if denominator.is_zero() {
            return Err(GuessError::ZeroDenominator {
                payee: payee.to_string(),
            });
        }

        let magnitude = total.abs();
        let mut postings = legs
            .iter()
            .map(|leg| {
                let number = leg
                    .units
                    .number
                    .checked_div(denominator)
                    .and_then(|share| share.checked_mul(magnitude))
                    .ok_or_else(overflow)?
                    .round_dp(2);
                let number = if reversed { -number } else { number };
                Ok(Posting::new(leg.account.clone(), Amount::new(number, self.currency)))
            })
            .collect::<Result<Vec<_>, GuessError>>()?;

        let own = postings.remove(anchor);
        postings.push(own);

        tracing::debug!("guessed {} legs for '{payee}' from {}", postings.len(), previous.date);
        Ok(postings)
    }
}
