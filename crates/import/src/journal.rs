//! A small reader for existing beancount journals.
//!
//! Only what the history index needs is understood: `option` and `include`
//! lines, transactions and their postings. Everything else is skipped.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use saldo_core::{Account, Amount, Metadata, Posting, Transaction};
use thiserror::Error;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_option, r#"^option\s+"([^"]*)"\s+"([^"]*)""#);
re!(re_txn_header, r"^(\d{4}-\d{2}-\d{2})\s+(\*|!|txn)(?:\s+(.*))?$");
re!(re_string, r#""((?:[^"\\]|\\.)*)""#);
re!(re_include, r#"^include\s+"((?:[^"\\]|\\.)*)""#);
re!(re_dated, r"^\d{4}-\d{2}-\d{2}\s+(\S+)");
re!(re_posting, r"^(?:[*!]\s+)?([A-Z]\S*)(?:\s+(\S+)\s+([A-Z][A-Z0-9'._-]*))?");

// ── Public types ──────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Cannot read journal {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A problem with one entry. The entry is left out, loading goes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub filename: String,
    pub lineno: usize,
    pub message: String,
}

/// An `include` line: the path as written and where it appeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub filename: String,
    pub lineno: usize,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedLedger {
    pub transactions: Vec<Transaction>,
    pub errors: Vec<LoadError>,
    pub options: BTreeMap<String, String>,
    pub includes: Vec<Include>,
}

/// Reads a journal and every file it includes, relative to the including file.
///
/// Only the top-level file must be readable. Unreadable or cyclic includes
/// are reported in `errors`. Options of the top-level file take precedence.
pub fn load_file(path: &Path) -> Result<LoadedLedger, JournalError> {
    let text = std::fs::read_to_string(path).map_err(|source| JournalError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut ledger = LoadedLedger::default();
    let mut seen = BTreeSet::from([canonical(path)]);
    merge(path, &text, &mut ledger, &mut seen);
    tracing::info!(
        "loaded {} transactions from {} ({} errors)",
        ledger.transactions.len(),
        path.display(),
        ledger.errors.len()
    );
    Ok(ledger)
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn merge(path: &Path, text: &str, ledger: &mut LoadedLedger, seen: &mut BTreeSet<PathBuf>) {
    let parsed = parse_journal(text, &path.display().to_string());
    ledger.transactions.extend(parsed.transactions);
    ledger.errors.extend(parsed.errors);
    for (key, value) in parsed.options {
        ledger.options.entry(key).or_insert(value);
    }

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    for include in parsed.includes {
        let target = dir.join(&include.target);
        let fail = |message: String| LoadError {
            filename: include.filename.clone(),
            lineno: include.lineno,
            message,
        };
        if !seen.insert(canonical(&target)) {
            ledger
                .errors
                .push(fail(format!("include cycle through {}", target.display())));
        } else {
            match std::fs::read_to_string(&target) {
                Ok(included) => {
                    tracing::debug!("following include {}", target.display());
                    merge(&target, &included, ledger, seen);
                }
                Err(e) => ledger
                    .errors
                    .push(fail(format!("cannot read include {}: {e}", target.display()))),
            }
        }
        ledger.includes.push(include);
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

struct PendingPosting {
    account: Account,
    units: Option<Amount>,
}

struct Pending {
    meta: Metadata,
    date: NaiveDate,
    flag: char,
    payee: Option<String>,
    narration: String,
    postings: Vec<PendingPosting>,
    error: Option<LoadError>,
}

impl Pending {
    fn fail(&mut self, lineno: usize, message: String) {
        if self.error.is_none() {
            self.error = Some(LoadError {
                filename: self.meta.filename.clone(),
                lineno,
                message,
            });
        }
    }

    fn add_posting(&mut self, line: &str, lineno: usize) {
        let body = line.split(';').next().unwrap_or_default().trim();
        let Some(caps) = re_posting().captures(body) else {
            // metadata or something we do not model
            return;
        };
        let account = match Account::new(&caps[1]) {
            Ok(a) => a,
            Err(e) => return self.fail(lineno, e.to_string()),
        };
        let units = match (caps.get(2), caps.get(3)) {
            (Some(number), Some(currency)) => {
                match Decimal::from_str(&number.as_str().replace(',', "")) {
                    Ok(n) => Some(Amount::new(n, currency.as_str())),
                    Err(_) => {
                        return self.fail(lineno, format!("invalid number '{}'", number.as_str()))
                    }
                }
            }
            _ => None,
        };
        self.postings.push(PendingPosting { account, units });
    }

    /// Fills in a single posting without units from the others.
    fn finish(self) -> Result<Transaction, LoadError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let lineno = self.meta.lineno;
        let filename = self.meta.filename.clone();
        let missing = self.postings.iter().filter(|p| p.units.is_none()).count();

        let postings = match missing {
            0 => self
                .postings
                .into_iter()
                .filter_map(|p| p.units.map(|u| Posting::new(p.account, u)))
                .collect(),
            1 => {
                let mut sums: BTreeMap<&str, Decimal> = BTreeMap::new();
                for units in self.postings.iter().filter_map(|p| p.units.as_ref()) {
                    *sums.entry(units.currency.as_str()).or_default() += units.number;
                }
                let (currency, sum) = match sums.len() {
                    1 => sums.into_iter().next().map(|(c, s)| (c.to_string(), s)),
                    _ => None,
                }
                .ok_or_else(|| LoadError {
                    filename,
                    lineno,
                    message: "cannot interpolate a posting without exactly one currency"
                        .to_string(),
                })?;
                let fill = Amount::new(-sum, &currency);
                self.postings
                    .into_iter()
                    .map(|p| Posting::new(p.account, p.units.unwrap_or_else(|| fill.clone())))
                    .collect()
            }
            n => {
                return Err(LoadError {
                    filename,
                    lineno,
                    message: format!("{n} postings without amounts"),
                })
            }
        };

        Ok(Transaction {
            meta: self.meta,
            date: self.date,
            flag: self.flag,
            payee: self.payee,
            narration: self.narration,
            postings,
        })
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn header(caps: &regex::Captures<'_>, filename: &str, lineno: usize) -> Pending {
    let flag = match &caps[2] {
        "!" => '!',
        _ => '*',
    };
    let strings: Vec<String> = caps
        .get(3)
        .map(|rest| {
            re_string()
                .captures_iter(rest.as_str())
                .map(|c| unescape(&c[1]))
                .collect()
        })
        .unwrap_or_default();
    let (payee, narration) = match strings.as_slice() {
        [] => (None, String::new()),
        [narration] => (None, narration.clone()),
        [payee, narration, ..] => (Some(payee.clone()), narration.clone()),
    };

    let mut pending = Pending {
        meta: Metadata::new(filename, lineno),
        date: NaiveDate::MIN,
        flag,
        payee,
        narration,
        postings: Vec::new(),
        error: None,
    };
    match NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d") {
        Ok(date) => pending.date = date,
        Err(_) => pending.fail(lineno, format!("invalid date '{}'", &caps[1])),
    }
    pending
}

/// Reads journal text. Entries that cannot be read are reported in
/// `errors` and left out of `transactions`.
pub fn parse_journal(text: &str, filename: &str) -> LoadedLedger {
    let mut ledger = LoadedLedger::default();
    let mut current: Option<Pending> = None;

    for (idx, line) in text.lines().enumerate() {
        let lineno = idx + 1;
        let trimmed = line.trim();

        if line.starts_with([' ', '\t']) {
            if let Some(pending) = current.as_mut() {
                if !trimmed.is_empty() && !trimmed.starts_with(';') {
                    pending.add_posting(trimmed, lineno);
                }
            }
            continue;
        }

        if trimmed.is_empty() {
            flush(current.take(), &mut ledger, filename);
            continue;
        }
        if trimmed.starts_with([';', '#', '*']) {
            continue;
        }

        flush(current.take(), &mut ledger, filename);

        if let Some(caps) = re_option().captures(trimmed) {
            ledger.options.insert(unescape(&caps[1]), unescape(&caps[2]));
        } else if let Some(caps) = re_txn_header().captures(trimmed) {
            current = Some(header(&caps, filename, lineno));
        } else if let Some(caps) = re_include().captures(trimmed) {
            ledger.includes.push(Include {
                filename: filename.to_string(),
                lineno,
                target: unescape(&caps[1]),
            });
        } else if let Some(caps) = re_dated().captures(trimmed) {
            tracing::trace!("{filename}:{lineno}: skipping {} directive", &caps[1]);
        }
    }
    flush(current, &mut ledger, filename);

    ledger
}

fn flush(pending: Option<Pending>, ledger: &mut LoadedLedger, filename: &str) {
    let Some(pending) = pending else { return };
    match pending.finish() {
        Ok(txn) => ledger.transactions.push(txn),
        Err(err) => {
            tracing::debug!("{filename}:{}: {}", err.lineno, err.message);
            ledger.errors.push(err);
        }
    }
}
