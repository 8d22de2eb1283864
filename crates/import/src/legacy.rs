//! The quoted V1 layout, where the purpose text may wrap over several physical lines.
//!
//! Lines are collected until the buffer holds a quoted Soll/Haben marker, which
//! only ever appears in the last column of a record.

use crate::codec::{parse_amount, parse_date, unquote};
use crate::detect::FormatVariant;
use crate::statement::{after_header, ClosingBalance, RawRecord, Statement, StatementError};

const DATE: usize = 0;
const VALUE_DATE: usize = 1;
const COUNTERPARTY: usize = 3;
const PURPOSE: usize = 8;
const AMOUNT: usize = 11;
const MARKER: usize = 12;

enum State {
    Idle,
    Collecting(String),
}

/// A record whose marker column has been seen.
struct Complete {
    text: String,
    line: usize,
}

fn is_complete(buffer: &str) -> bool {
    buffer.contains("\"S\"") || buffer.contains("\"H\"")
}

impl State {
    fn feed(self, line: &str, lineno: usize) -> (State, Option<Complete>) {
        let line = line.trim_end_matches(['\n', '\r']);
        let mut buffer = match self {
            State::Idle if line.trim().is_empty() => return (State::Idle, None),
            State::Idle => String::new(),
            State::Collecting(buffer) => buffer,
        };
        buffer.push_str(line);
        buffer.push(' ');

        if is_complete(&buffer) {
            let done = Complete {
                text: buffer,
                line: lineno,
            };
            (State::Idle, Some(done))
        } else {
            (State::Collecting(buffer), None)
        }
    }
}

fn column<'a>(fields: &[&'a str], idx: usize, line: usize) -> Result<&'a str, StatementError> {
    fields.get(idx).copied().ok_or(StatementError::MissingColumn {
        line,
        expected: idx + 1,
        found: fields.len(),
    })
}

pub fn parse(text: &str) -> Result<Statement, StatementError> {
    let (header_line, body) = after_header(text, |l| l.contains("Valuta"))
        .ok_or(StatementError::MissingHeader(FormatVariant::V1))?;

    let mut state = State::Idle;
    let mut records = Vec::new();
    let mut closing = None;

    for (idx, raw_line) in body.split_inclusive('\n').enumerate() {
        let lineno = header_line + idx + 1;
        let (next, complete) = state.feed(raw_line, lineno);
        state = next;

        let Some(Complete { text, line }) = complete else {
            continue;
        };

        if text.contains("Anfangssaldo") {
            tracing::debug!("line {line}: skipping opening balance");
            continue;
        }

        let fields: Vec<&str> = text.split(';').collect();
        if unquote(fields[0]).is_empty() {
            continue;
        }

        if text.contains("Endsaldo") {
            let date = parse_date(column(&fields, DATE, line)?).map_err(StatementError::field(line))?;
            let balance = parse_amount(column(&fields, AMOUNT, line)?, column(&fields, MARKER, line)?)
                .map_err(StatementError::field(line))?;
            closing = Some(ClosingBalance {
                date,
                balance,
                line,
            });
            continue;
        }

        let marker = text.trim_end().rsplit(';').next().unwrap_or_default();
        let amount = parse_amount(column(&fields, AMOUNT, line)?, marker)
            .map_err(StatementError::field(line))?;

        records.push(RawRecord {
            date: parse_date(column(&fields, DATE, line)?).map_err(StatementError::field(line))?,
            value_date: parse_date(column(&fields, VALUE_DATE, line)?)
                .map_err(StatementError::field(line))?,
            counterparty: unquote(column(&fields, COUNTERPARTY, line)?),
            purpose: unquote(column(&fields, PURPOSE, line)?),
            amount,
            running_balance: None,
            line,
        });
    }

    if let State::Collecting(rest) = state {
        tracing::warn!("dropping incomplete record at end of file: {}", rest.trim());
    }

    Ok(Statement {
        variant: FormatVariant::V1,
        records,
        closing: closing.ok_or(StatementError::MissingClosingBalance)?,
    })
}
