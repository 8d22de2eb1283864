use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use saldo_core::{Account, Directive};
use saldo_import::{parse_journal, FormatVariant, ImportError, Importer, ImporterConfig};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn config() -> ImporterConfig {
    ImporterConfig::new(Account::new("Assets:Volksbank:Giro").unwrap())
}

fn v2_export(rows: &[&str]) -> String {
    let mut text = String::from("Umsatzanzeige;Volksbank Musterstadt eG\n\n");
    text.push_str(&FormatVariant::V2.signature());
    text.push('\n');
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text
}

const RENT: &str =
    "Giro;DE02100100109307118603;GENODEF1;Volksbank;01.03.2022;01.03.2022;Landlord;DE11;BIC;Dauerauftrag;Miete Maerz;-650,00;EUR;S";
const CLOSING: &str =
    "Giro;DE02100100109307118603;GENODEF1;Volksbank;31.03.2022;31.03.2022;;;;Endsaldo;;1200,00;EUR;H";

const JOURNAL: &str = r#"
2022-02-01 * "Landlord" "Miete Februar"
  Expenses:Rent            500.00 EUR
  Expenses:Rent:Parking    150.00 EUR
  Assets:Volksbank:Giro

2022-02-10 * "Bakery" "Broetchen"
  Expenses:Food    4.20 EUR
  Assets:Cash
"#;

fn render(directives: &[Directive]) -> String {
    directives
        .iter()
        .map(|d| format!("{d}\n"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── end to end ────────────────────────────────────────────────────────────────

#[test]
fn v2_without_history() {
    let importer = Importer::new(config()).unwrap();
    let out = importer.extract_text("maerz.csv", &v2_export(&[RENT, CLOSING])).unwrap();

    assert_eq!(out.len(), 2);
    let Directive::Transaction(txn) = &out[0] else {
        panic!("expected transaction first");
    };
    assert_eq!(txn.date, NaiveDate::from_ymd_opt(2022, 3, 1).unwrap());
    assert_eq!(txn.postings[0].account, "Unknown:account");
    assert_eq!(txn.postings[0].units.number, dec("650.00"));
    assert_eq!(txn.postings[1].account, "Assets:Volksbank:Giro");
    assert_eq!(txn.postings[1].units.number, dec("-650.00"));
    assert_eq!(txn.meta.lineno, 4);

    let Directive::Balance(bal) = &out[1] else {
        panic!("expected trailing balance");
    };
    assert_eq!(bal.date, NaiveDate::from_ymd_opt(2022, 4, 1).unwrap());
    assert_eq!(bal.amount.number, dec("1200.00"));
    assert_eq!(bal.meta.lineno, 5);

    assert_eq!(
        render(&out),
        "2022-03-01 ! \"Landlord\" \"Miete Maerz\"\n  \
         Unknown:account  650.00 EUR\n  \
         Assets:Volksbank:Giro  -650.00 EUR\n\
         \n\
         2022-04-01 balance Assets:Volksbank:Giro  1200.00 EUR\n"
    );
}

#[test]
fn balance_is_dated_the_day_after_endsaldo() {
    let closing =
        "Giro;DE02100100109307118603;GENODEF1;Volksbank;01.03.2022;01.03.2022;;;;Endsaldo;;1200,00;EUR;H";
    let importer = Importer::new(config()).unwrap();
    let out = importer.extract_text("maerz.csv", &v2_export(&[RENT, closing])).unwrap();

    let Directive::Transaction(txn) = &out[0] else {
        panic!("expected transaction first");
    };
    let legs: Vec<(&str, Decimal)> = txn
        .postings
        .iter()
        .map(|p| (p.account.as_str(), p.units.number))
        .collect();
    assert_eq!(
        legs,
        vec![
            ("Unknown:account", dec("650.00")),
            ("Assets:Volksbank:Giro", dec("-650.00")),
        ]
    );

    let Directive::Balance(bal) = &out[1] else {
        panic!("expected trailing balance");
    };
    assert_eq!(bal.date, NaiveDate::from_ymd_opt(2022, 3, 2).unwrap());
    assert_eq!(bal.amount.number, dec("1200.00"));
    assert_eq!(bal.account, "Assets:Volksbank:Giro");
}

#[test]
fn v2_with_history_splits_like_last_time() {
    let ledger = parse_journal(JOURNAL, "main.beancount");
    assert!(ledger.errors.is_empty());
    let importer = Importer::with_ledger(config(), &ledger.transactions).unwrap();
    assert_eq!(importer.history().len(), 1);

    let out = importer.extract_text("maerz.csv", &v2_export(&[RENT, CLOSING])).unwrap();
    let Directive::Transaction(txn) = &out[0] else {
        panic!("expected transaction first");
    };
    let legs: Vec<(&str, Decimal)> = txn
        .postings
        .iter()
        .map(|p| (p.account.as_str(), p.units.number))
        .collect();
    assert_eq!(
        legs,
        vec![
            ("Expenses:Rent", dec("500.00")),
            ("Expenses:Rent:Parking", dec("150.00")),
            ("Assets:Volksbank:Giro", dec("-650.00")),
        ]
    );
    assert!(txn.is_balanced());
}

#[test]
fn extraction_is_idempotent() {
    let ledger = parse_journal(JOURNAL, "main.beancount");
    let importer = Importer::with_ledger(config(), &ledger.transactions).unwrap();
    let text = v2_export(&[RENT, CLOSING]);
    let first = importer.extract_text("maerz.csv", &text).unwrap();
    let second = importer.extract_text("maerz.csv", &text).unwrap();
    assert_eq!(first, second);
}

#[test]
fn malformed_row_yields_no_output() {
    let bad = RENT.replace("01.03.2022;01.03.2022", "1.3.22x;01.03.2022");
    let importer = Importer::new(config()).unwrap();
    assert!(matches!(
        importer.extract_text("maerz.csv", &v2_export(&[&bad, CLOSING])),
        Err(ImportError::Statement { .. })
    ));
}

// ── files on disk ─────────────────────────────────────────────────────────────

#[test]
fn extract_latin1_file_with_journal() {
    let dir = tempfile::tempdir().unwrap();

    let journal = dir.path().join("main.beancount");
    std::fs::write(&journal, JOURNAL).unwrap();

    let export = dir.path().join("umsaetze.csv");
    let text = v2_export(&[
        &RENT.replace("Landlord", "B\u{e4}ckerei M\u{fc}ller"),
        CLOSING,
    ]);
    let latin1: Vec<u8> = text.chars().map(|c| c as u8).collect();
    std::fs::write(&export, latin1).unwrap();

    let mut config = config();
    config.target_journal = Some(journal);
    let importer = Importer::new(config).unwrap();

    assert!(importer.identify(&export).unwrap());
    let out = importer.extract(&export).unwrap();
    let Directive::Transaction(txn) = &out[0] else {
        panic!("expected transaction first");
    };
    assert_eq!(txn.payee.as_deref(), Some("B\u{e4}ckerei M\u{fc}ller"));
    assert_eq!(txn.meta.filename, export.display().to_string());
}

#[test]
fn v1_multi_line_export() {
    let header = FormatVariant::V1.signature();
    let text = format!(
        "\"Volksbank\"\n{header}\n\
         \"02.03.2022\";\"02.03.2022\";\"Ich\";\"Landlord\";\"1\";\"DE11\";\"\";\"BIC\";\"Miete\n\
         Maerz\";\"\";\"EUR\";\"650,00\";\"S\"\n\
         \"31.03.2022\";;;;;;;;;\"Endsaldo\";\"EUR\";\"1.200,00\";\"H\"\n"
    );
    let importer = Importer::new(config()).unwrap();
    let out = importer.extract_text("alt.csv", &text).unwrap();
    assert_eq!(out.len(), 2);
    let Directive::Transaction(txn) = &out[0] else {
        panic!("expected transaction first");
    };
    assert_eq!(txn.narration, "Miete Maerz");
    assert_eq!(txn.postings[1].units.number, dec("-650.00"));
    assert_eq!(txn.meta.lineno, 4);
}
