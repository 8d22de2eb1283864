use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A colon-separated ledger account name such as `Assets:Volksbank:Giro`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Account(String);

impl Account {
    pub fn new(name: &str) -> Result<Self, LedgerError> {
        let valid = !name.is_empty()
            && name
                .split(':')
                .all(|part| !part.is_empty() && !part.chars().any(char::is_whitespace));
        if valid {
            Ok(Account(name.to_string()))
        } else {
            Err(LedgerError::InvalidAccount(name.to_string()))
        }
    }

    /// The counter account used when nothing better is known.
    pub fn default_adjacent() -> Self {
        Account(DEFAULT_ADJACENT_ACCOUNT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Account {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Account::new(s)
    }
}

impl TryFrom<String> for Account {
    type Error = LedgerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Account::new(&s)
    }
}

impl From<Account> for String {
    fn from(account: Account) -> Self {
        account.0
    }
}

impl PartialEq<str> for Account {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Account {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Invalid account name: '{0}'")]
    InvalidAccount(String),
}

pub const DEFAULT_ADJACENT_ACCOUNT: &str = "Unknown:account";
