use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::account::Account;
use super::money::Amount;

/// Where a directive came from: the source file and the 1-based line that completed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub filename: String,
    pub lineno: usize,
}

impl Metadata {
    pub fn new(filename: &str, lineno: usize) -> Self {
        Metadata {
            filename: filename.to_string(),
            lineno,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub account: Account,
    pub units: Amount,
}

impl Posting {
    pub fn new(account: Account, units: Amount) -> Self {
        Posting { account, units }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub meta: Metadata,
    pub date: NaiveDate,
    pub flag: char,
    pub payee: Option<String>,
    pub narration: String,
    pub postings: Vec<Posting>,
}

impl Transaction {
    pub fn has_account(&self, account: &Account) -> bool {
        self.postings.iter().any(|p| &p.account == account)
    }

    /// Sum of posting units per currency; empty when every currency nets to zero.
    pub fn residual(&self) -> BTreeMap<String, Decimal> {
        let mut sums: BTreeMap<String, Decimal> = BTreeMap::new();
        for p in &self.postings {
            *sums.entry(p.units.currency.clone()).or_default() += p.units.number;
        }
        sums.retain(|_, v| !v.is_zero());
        sums
    }

    pub fn is_balanced(&self) -> bool {
        self.residual().is_empty()
    }
}

/// A `balance` assertion: the account holds `amount` at the start of `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub meta: Metadata,
    pub date: NaiveDate,
    pub account: Account,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Directive {
    Transaction(Transaction),
    Balance(Balance),
}

impl Directive {
    pub fn meta(&self) -> &Metadata {
        match self {
            Directive::Transaction(t) => &t.meta,
            Directive::Balance(b) => &b.meta,
        }
    }
}

// Beancount rendering. The alternate flag (`{:#}`) also writes the source metadata.

fn quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn write_meta(f: &mut fmt::Formatter<'_>, meta: &Metadata) -> fmt::Result {
    f.write_str("\n  filename: ")?;
    quoted(f, &meta.filename)?;
    write!(f, "\n  lineno: {}", meta.lineno)
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.account, self.units)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.flag)?;
        if let Some(payee) = &self.payee {
            f.write_str(" ")?;
            quoted(f, payee)?;
        }
        f.write_str(" ")?;
        quoted(f, &self.narration)?;
        if f.alternate() {
            write_meta(f, &self.meta)?;
        }
        for p in &self.postings {
            write!(f, "\n  {p}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} balance {}  {}", self.date, self.account, self.amount)?;
        if f.alternate() {
            write_meta(f, &self.meta)?;
        }
        Ok(())
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, f.alternate()) {
            (Directive::Transaction(t), false) => write!(f, "{t}"),
            (Directive::Transaction(t), true) => write!(f, "{t:#}"),
            (Directive::Balance(b), false) => write!(f, "{b}"),
            (Directive::Balance(b), true) => write!(f, "{b:#}"),
        }
    }
}
