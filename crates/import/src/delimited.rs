//! Single-line layouts (V2, V3, V4): one `;`-separated record per physical line.

use csv::StringRecord;

use crate::codec::{parse_amount, parse_date, parse_signed_amount, unquote};
use crate::detect::FormatVariant;
use crate::statement::{after_header, ClosingBalance, RawRecord, Statement, StatementError};

const DATE: usize = 4;
const VALUE_DATE: usize = 5;
const COUNTERPARTY: usize = 6;
const BOOKING_TEXT: usize = 9;
const PURPOSE: usize = 10;
const AMOUNT: usize = 11;
/// Soll/Haben marker in V2.
const MARKER: usize = 13;
/// "Saldo nach Buchung" in V3 and V4.
const RUNNING_BALANCE: usize = 13;

/// Data rows after the variant's header line, paired with their 1-based line number.
fn rows(variant: FormatVariant, text: &str) -> Result<Vec<(usize, StringRecord)>, StatementError> {
    let signature = variant.signature();
    let (header_line, body) = after_header(text, |l| l.contains(signature.as_str()))
        .ok_or(StatementError::MissingHeader(variant))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = header_line + record.position().map_or(0, |p| p.line() as usize);

        if record.get(0).map_or(true, |f| f.trim().is_empty()) {
            continue;
        }
        rows.push((line, record));
    }
    Ok(rows)
}

fn field(record: &StringRecord, idx: usize, line: usize) -> Result<&str, StatementError> {
    record.get(idx).ok_or(StatementError::MissingColumn {
        line,
        expected: idx + 1,
        found: record.len(),
    })
}

fn booking(
    record: &StringRecord,
    line: usize,
    amount: rust_decimal::Decimal,
) -> Result<RawRecord, StatementError> {
    Ok(RawRecord {
        date: parse_date(field(record, DATE, line)?).map_err(StatementError::field(line))?,
        value_date: parse_date(field(record, VALUE_DATE, line)?)
            .map_err(StatementError::field(line))?,
        counterparty: unquote(field(record, COUNTERPARTY, line)?),
        purpose: unquote(field(record, PURPOSE, line)?),
        amount,
        running_balance: None,
        line,
    })
}

pub fn parse_v2(text: &str) -> Result<Statement, StatementError> {
    let mut records = Vec::new();
    let mut closing = None;

    for (line, row) in rows(FormatVariant::V2, text)? {
        let booking_text = field(&row, BOOKING_TEXT, line)?;
        if booking_text.contains("Anfangssaldo") {
            tracing::debug!("line {line}: skipping opening balance");
            continue;
        }

        let amount = parse_amount(field(&row, AMOUNT, line)?, field(&row, MARKER, line)?)
            .map_err(StatementError::field(line))?;

        if booking_text.contains("Endsaldo") {
            let date = parse_date(field(&row, DATE, line)?).map_err(StatementError::field(line))?;
            closing = Some(ClosingBalance {
                date,
                balance: amount,
                line,
            });
            continue;
        }

        records.push(booking(&row, line, amount)?);
    }

    Ok(Statement {
        variant: FormatVariant::V2,
        records,
        closing: closing.ok_or(StatementError::MissingClosingBalance)?,
    })
}

pub fn parse_v3(text: &str) -> Result<Statement, StatementError> {
    parse_with_running_balance(FormatVariant::V3, text)
}

pub fn parse_v4(text: &str) -> Result<Statement, StatementError> {
    parse_with_running_balance(FormatVariant::V4, text)
}

fn parse_with_running_balance(
    variant: FormatVariant,
    text: &str,
) -> Result<Statement, StatementError> {
    let mut records = Vec::new();

    for (line, row) in rows(variant, text)? {
        let amount =
            parse_signed_amount(field(&row, AMOUNT, line)?).map_err(StatementError::field(line))?;
        let running_balance = match field(&row, RUNNING_BALANCE, line)?.trim() {
            "" => None,
            raw => Some(parse_signed_amount(raw).map_err(StatementError::field(line))?),
        };
        records.push(RawRecord {
            running_balance,
            ..booking(&row, line, amount)?
        });
    }

    // These layouts carry no Endsaldo row. The first row's running balance stands
    // in for it; that is only the period's closing figure if the export lists the
    // newest booking first.
    let first = records
        .first()
        .ok_or(StatementError::MissingClosingBalance)?;
    let closing = ClosingBalance {
        date: first.date,
        balance: first
            .running_balance
            .ok_or(StatementError::MissingClosingBalance)?,
        line: first.line,
    };

    Ok(Statement {
        variant,
        records,
        closing,
    })
}
