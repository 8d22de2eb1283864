use chrono::NaiveDate;
use saldo_core::{Amount, Balance, Directive, Metadata, Transaction};
use thiserror::Error;

use crate::config::ImporterConfig;
use crate::guess::{GuessError, PostingGuesser};
use crate::history::HistoryIndex;
use crate::statement::Statement;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("line {line}: {source}")]
    Guess {
        line: usize,
        #[source]
        source: GuessError,
    },
    #[error("No day after closing date {0}")]
    DateOutOfRange(NaiveDate),
}

/// Turns a parsed statement into ledger directives.
pub struct EntryBuilder<'a> {
    config: &'a ImporterConfig,
    guesser: PostingGuesser<'a>,
}

impl<'a> EntryBuilder<'a> {
    pub fn new(config: &'a ImporterConfig, history: &'a HistoryIndex) -> Self {
        Self {
            config,
            guesser: PostingGuesser::new(history, &config.default_adjacent_account, &config.currency),
        }
    }

    /// One transaction per record in file order, then the balance assertion
    /// for the day after the closing date. Nothing is returned if any record fails.
    pub fn build(&self, filename: &str, statement: &Statement) -> Result<Vec<Directive>, BuildError> {
        let mut directives = Vec::with_capacity(statement.records.len() + 1);

        for record in &statement.records {
            let postings = self
                .guesser
                .guess(&record.counterparty, record.amount)
                .map_err(|source| BuildError::Guess {
                    line: record.line,
                    source,
                })?;
            let payee = (!record.counterparty.is_empty()).then(|| record.counterparty.clone());

            let txn = Transaction {
                meta: Metadata::new(filename, record.line),
                date: record.date,
                flag: self.config.flag,
                payee,
                narration: record.purpose.clone(),
                postings,
            };
            if !txn.is_balanced() {
                tracing::warn!(
                    "{filename}:{}: generated transaction does not balance: {:?}",
                    record.line,
                    txn.residual()
                );
            }
            directives.push(Directive::Transaction(txn));
        }

        let closing = &statement.closing;
        let date = closing
            .date
            .succ_opt()
            .ok_or(BuildError::DateOutOfRange(closing.date))?;
        directives.push(Directive::Balance(Balance {
            meta: Metadata::new(filename, closing.line),
            date,
            account: self.config.importing_account.clone(),
            amount: Amount::rounded(closing.balance, &self.config.currency),
        }));

        tracing::debug!(
            "{filename}: built {} transactions from {} export",
            statement.records.len(),
            statement.variant
        );
        Ok(directives)
    }
}
