//! The uniform output of every layout parser and the variant → parser dispatch.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::codec::CodecError;
use crate::detect::{FormatVariant, ALL_VARIANTS};

/// One booking line of a bank export.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub date: NaiveDate,
    pub value_date: NaiveDate,
    pub counterparty: String,
    pub purpose: String,
    pub amount: Decimal,
    pub running_balance: Option<Decimal>,
    pub line: usize,
}

/// The end-of-period balance the bank reports for the exported account.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosingBalance {
    pub date: NaiveDate,
    pub balance: Decimal,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub variant: FormatVariant,
    pub records: Vec<RawRecord>,
    pub closing: ClosingBalance,
}

#[derive(Error, Debug)]
pub enum StatementError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: {source}")]
    Field {
        line: usize,
        #[source]
        source: CodecError,
    },
    #[error("line {line}: expected at least {expected} columns, found {found}")]
    MissingColumn {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("No {0} header line found")]
    MissingHeader(FormatVariant),
    #[error("No closing balance found")]
    MissingClosingBalance,
    #[error("Unknown export layout: '{0}'")]
    UnknownVariant(String),
}

impl StatementError {
    pub(crate) fn field(line: usize) -> impl FnOnce(CodecError) -> StatementError {
        move |source| StatementError::Field { line, source }
    }
}

/// A layout parser: full decoded file text in, uniform statement out.
pub type ParserStrategy = fn(&str) -> Result<Statement, StatementError>;

impl FormatVariant {
    pub fn parser(self) -> ParserStrategy {
        match self {
            FormatVariant::V1 => crate::legacy::parse,
            FormatVariant::V2 => crate::delimited::parse_v2,
            FormatVariant::V3 => crate::delimited::parse_v3,
            FormatVariant::V4 => crate::delimited::parse_v4,
        }
    }

    pub fn parse(self, text: &str) -> Result<Statement, StatementError> {
        (self.parser())(text)
    }
}

impl FromStr for FormatVariant {
    type Err = StatementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_VARIANTS
            .iter()
            .copied()
            .find(|v| v.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StatementError::UnknownVariant(s.to_string()))
    }
}

/// Splits the text at the first line satisfying `is_header`.
///
/// Returns the 1-based number of that line and the text that follows it.
pub(crate) fn after_header<'a>(
    text: &'a str,
    is_header: impl Fn(&str) -> bool,
) -> Option<(usize, &'a str)> {
    let mut offset = 0;
    for (idx, line) in text.split_inclusive('\n').enumerate() {
        offset += line.len();
        if is_header(line) {
            return Some((idx + 1, &text[offset..]));
        }
    }
    None
}
