//! Decoding of the German number, date and text conventions used by the bank exports.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid amount: '{0}'")]
    InvalidAmount(String),
    #[error("Invalid date: '{0}'")]
    InvalidDate(String),
}

/// Exports are ISO-8859-1; every byte maps to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Removes quote characters and surrounding whitespace from a raw field.
pub fn unquote(field: &str) -> String {
    field.replace('"', "").trim().to_string()
}

/// `S` (Soll) marks a debit, anything else (normally `H`, Haben) a credit.
pub fn is_debit(marker: &str) -> bool {
    marker.contains('S')
}

/// Converts `1.200,30` style numerals whose sign is already part of the text.
pub fn parse_signed_amount(raw: &str) -> Result<Decimal, CodecError> {
    let s = unquote(raw).replace('.', "").replace(',', ".");
    if s.is_empty() {
        return Err(CodecError::InvalidAmount(raw.to_string()));
    }
    Decimal::from_str(&s).map_err(|_| CodecError::InvalidAmount(raw.to_string()))
}

/// Converts an unsigned numeral and applies the sign given by the Soll/Haben marker.
///
/// A numeral that is already negative stays negative under an `S` marker.
pub fn parse_amount(raw: &str, marker: &str) -> Result<Decimal, CodecError> {
    let value = parse_signed_amount(raw)?;
    if is_debit(marker) {
        Ok(-value.abs())
    } else {
        Ok(value)
    }
}

/// Parses `dd.mm.yyyy`, ignoring quotes.
pub fn parse_date(raw: &str) -> Result<NaiveDate, CodecError> {
    let invalid = || CodecError::InvalidDate(raw.to_string());
    let s = unquote(raw);
    let mut parts = s.split('.');
    let (Some(day), Some(month), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let day: u32 = day.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ── parse_amount ──────────────────────────────────────────────────────────

    #[test]
    fn parse_amount_soll_is_negative() {
        assert_eq!(parse_amount("1.200,30", "S").unwrap(), dec("-1200.30"));
    }

    #[test]
    fn parse_amount_haben_is_positive() {
        assert_eq!(parse_amount("1.200,30", "H").unwrap(), dec("1200.30"));
    }

    #[test]
    fn parse_amount_strips_quotes() {
        assert_eq!(parse_amount("\"12,50\"", "\"S\"").unwrap(), dec("-12.50"));
    }

    #[test]
    fn parse_amount_does_not_double_negate() {
        assert_eq!(parse_amount("-650,00", "S").unwrap(), dec("-650.00"));
    }

    #[test]
    fn parse_amount_keeps_two_places() {
        assert_eq!(parse_amount("650,00", "H").unwrap().scale(), 2);
    }

    #[test]
    fn parse_amount_invalid() {
        assert!(parse_amount("abc", "S").is_err());
        assert!(parse_amount("", "H").is_err());
        assert!(parse_amount("\"\"", "H").is_err());
    }

    // ── parse_signed_amount ───────────────────────────────────────────────────

    #[test]
    fn parse_signed_amount_keeps_sign() {
        assert_eq!(parse_signed_amount("-1.234,56").unwrap(), dec("-1234.56"));
        assert_eq!(parse_signed_amount("89,90").unwrap(), dec("89.90"));
    }

    #[test]
    fn parse_signed_amount_large_values() {
        assert_eq!(parse_signed_amount("1.000.000,01").unwrap(), dec("1000000.01"));
    }

    // ── parse_date ────────────────────────────────────────────────────────────

    #[test]
    fn parse_date_german_format() {
        assert_eq!(
            parse_date("04.10.2020").unwrap(),
            NaiveDate::from_ymd_opt(2020, 10, 4).unwrap()
        );
    }

    #[test]
    fn parse_date_quoted() {
        assert_eq!(
            parse_date("\"31.12.2021\"").unwrap(),
            NaiveDate::from_ymd_opt(2021, 12, 31).unwrap()
        );
    }

    #[test]
    fn parse_date_rejects_non_calendar_dates() {
        assert!(parse_date("31.02.2021").is_err());
        assert!(parse_date("00.01.2021").is_err());
    }

    #[test]
    fn parse_date_rejects_malformed() {
        assert!(parse_date("2021-01-04").is_err());
        assert!(parse_date("04.10").is_err());
        assert!(parse_date("04.10.2020.1").is_err());
        assert!(parse_date("aa.10.2020").is_err());
        assert!(parse_date("").is_err());
    }

    // ── decode_latin1 ─────────────────────────────────────────────────────────

    #[test]
    fn decode_latin1_maps_umlauts() {
        let bytes = b"Empf\xe4nger;W\xe4hrung";
        assert_eq!(decode_latin1(bytes), "Empfänger;Währung");
    }
}
