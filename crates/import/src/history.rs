use chrono::NaiveDate;
use saldo_core::{Account, Posting, Transaction};
use std::collections::BTreeMap;

/// The legs of one earlier transaction, in journal order.
#[derive(Debug, Clone, PartialEq)]
pub struct PostingGroup {
    pub date: NaiveDate,
    pub postings: Vec<Posting>,
}

/// Earlier bookings of the importing account, grouped by payee.
///
/// Built once from the journal and never modified afterwards, so a single index
/// can serve any number of extract calls.
#[derive(Debug, Clone)]
pub struct HistoryIndex {
    importing_account: Account,
    by_payee: BTreeMap<String, Vec<PostingGroup>>,
}

impl HistoryIndex {
    /// Keeps transactions that touch `importing_account` and name a payee,
    /// ordered by date within each payee (journal order breaks ties).
    pub fn build<'a, I>(importing_account: &Account, transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut relevant: Vec<&Transaction> = transactions
            .into_iter()
            .filter(|t| t.has_account(importing_account))
            .filter(|t| t.payee.as_deref().is_some_and(|p| !p.is_empty()))
            .collect();
        relevant.sort_by_key(|t| t.date);

        let mut by_payee: BTreeMap<String, Vec<PostingGroup>> = BTreeMap::new();
        for t in relevant {
            let Some(payee) = &t.payee else { continue };
            by_payee.entry(payee.clone()).or_default().push(PostingGroup {
                date: t.date,
                postings: t.postings.clone(),
            });
        }

        tracing::info!(
            "history for {}: {} payees",
            importing_account,
            by_payee.len()
        );

        HistoryIndex {
            importing_account: importing_account.clone(),
            by_payee,
        }
    }

    pub fn empty(importing_account: &Account) -> Self {
        HistoryIndex {
            importing_account: importing_account.clone(),
            by_payee: BTreeMap::new(),
        }
    }

    pub fn importing_account(&self) -> &Account {
        &self.importing_account
    }

    /// The most recent group for `payee`, the one guesses are based on.
    pub fn latest(&self, payee: &str) -> Option<&PostingGroup> {
        self.by_payee.get(payee).and_then(|groups| groups.last())
    }

    /// Payees with at least one group, in sorted order.
    pub fn payees(&self) -> impl Iterator<Item = &str> {
        self.by_payee.keys().map(String::as_str)
    }

    pub fn groups(&self, payee: &str) -> &[PostingGroup] {
        self.by_payee.get(payee).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_payee.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_payee.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn push_group(&mut self, payee: &str, group: PostingGroup) {
        self.by_payee.entry(payee.to_string()).or_default().push(group);
    }
}
