use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use saldo_core::Directive;
use saldo_import::{FormatVariant, Importer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Beancount,
    BeancountWithMeta,
    Json,
}

pub fn identify(importer: &Importer, files: &[PathBuf], out: &mut impl Write) -> Result<()> {
    for file in files {
        match importer.detect(file)? {
            Some(variant) => writeln!(out, "{}: {variant}", file.display())?,
            None => writeln!(out, "{}: not recognized", file.display())?,
        }
    }
    Ok(())
}

/// Files that are not bank exports are skipped; any other failure stops the run.
///
/// With a `layout`, detection is skipped and every file is parsed as that layout.
pub fn extract(
    importer: &Importer,
    files: &[PathBuf],
    layout: Option<FormatVariant>,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let mut directives: Vec<Directive> = Vec::new();
    for file in files {
        let extracted = match layout {
            Some(variant) => importer.extract_file_as(variant, file),
            None if importer.identify(file)? => importer.extract(file),
            None => {
                tracing::info!("skipping {}: not a known export", file.display());
                continue;
            }
        };
        directives.extend(extracted.with_context(|| format!("extracting {}", file.display()))?);
    }

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &directives)?;
            writeln!(out)?;
        }
        OutputFormat::Beancount => {
            for d in &directives {
                writeln!(out, "{d}\n")?;
            }
        }
        OutputFormat::BeancountWithMeta => {
            for d in &directives {
                writeln!(out, "{d:#}\n")?;
            }
        }
    }
    Ok(())
}

/// Without a payee, lists every payee the journal has bookings for.
pub fn history(importer: &Importer, payee: Option<&str>, out: &mut impl Write) -> Result<()> {
    let Some(payee) = payee else {
        for payee in importer.history().payees() {
            writeln!(out, "{payee}")?;
        }
        return Ok(());
    };
    let groups = importer.history().groups(payee);
    if groups.is_empty() {
        writeln!(
            out,
            "no history for '{payee}' on {}",
            importer.file_account()
        )?;
        return Ok(());
    }
    for group in groups {
        writeln!(out, "{}", group.date)?;
        for posting in &group.postings {
            writeln!(out, "  {posting}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use saldo_core::Account;
    use saldo_import::{parse_journal, FormatVariant, ImporterConfig};

    fn importer() -> Importer {
        let ledger = parse_journal(
            "2022-02-01 * \"Landlord\" \"Miete\"\n  Expenses:Rent  650.00 EUR\n  Assets:Giro\n",
            "main.beancount",
        );
        let config = ImporterConfig::new(Account::new("Assets:Giro").unwrap());
        Importer::with_ledger(config, &ledger.transactions).unwrap()
    }

    fn write_export(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("export.csv");
        let text = format!(
            "{}\nGiro;DE00;BIC;VB;01.03.2022;01.03.2022;Landlord;DE11;BIC;Dauerauftrag;Miete;650,00;EUR;S\n\
             Giro;DE00;BIC;VB;31.03.2022;31.03.2022;;;;Endsaldo;;100,00;EUR;H\n",
            FormatVariant::V2.signature()
        );
        std::fs::write(&path, text).unwrap();
        path
    }

    fn run(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn identify_lists_variants() {
        let dir = tempfile::tempdir().unwrap();
        let export = write_export(dir.path());
        let other = dir.path().join("notes.txt");
        std::fs::write(&other, "nothing here").unwrap();

        let importer = importer();
        let text = run(|out| identify(&importer, &[export.clone(), other.clone()], out));
        assert_eq!(
            text,
            format!(
                "{}: v2\n{}: not recognized\n",
                export.display(),
                other.display()
            )
        );
    }

    #[test]
    fn extract_prints_beancount_and_skips_unknown_files() {
        let dir = tempfile::tempdir().unwrap();
        let export = write_export(dir.path());
        let other = dir.path().join("notes.txt");
        std::fs::write(&other, "nothing here").unwrap();

        let importer = importer();
        let text = run(|out| {
            extract(&importer, &[other, export], None, OutputFormat::Beancount, out)
        });
        assert_eq!(
            text,
            "2022-03-01 ! \"Landlord\" \"Miete\"\n  Expenses:Rent  650.00 EUR\n  Assets:Giro  -650.00 EUR\n\n\
             2022-04-01 balance Assets:Giro  100.00 EUR\n\n"
        );
    }

    #[test]
    fn extract_with_meta_adds_line_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let export = write_export(dir.path());
        let importer = importer();
        let text = run(|out| {
            extract(&importer, &[export], None, OutputFormat::BeancountWithMeta, out)
        });
        assert!(text.contains("\n  lineno: 2\n"));
        assert!(text.contains("\n  lineno: 3\n"));
    }

    #[test]
    fn extract_json_is_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let export = write_export(dir.path());
        let importer = importer();
        let text = run(|out| extract(&importer, &[export], None, OutputFormat::Json, out));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["type"], "transaction");
        assert_eq!(value[1]["type"], "balance");
    }

    #[test]
    fn extract_with_layout_skips_detection() {
        let dir = tempfile::tempdir().unwrap();
        let export = write_export(dir.path());
        let importer = importer();

        let layout = Some("V2".parse::<FormatVariant>().unwrap());
        let text = run(|out| extract(&importer, &[export.clone()], layout, OutputFormat::Beancount, out));
        assert!(text.starts_with("2022-03-01 ! \"Landlord\" \"Miete\"\n"));

        let other = dir.path().join("notes.txt");
        std::fs::write(&other, "nothing here").unwrap();
        let mut out = Vec::new();
        let err = extract(&importer, &[other], layout, OutputFormat::Beancount, &mut out);
        assert!(err.is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn history_without_payee_lists_payees() {
        let ledger = parse_journal(
            "2022-02-01 * \"Landlord\" \"Miete\"\n  Expenses:Rent  650.00 EUR\n  Assets:Giro\n\n\
             2022-02-03 * \"Bakery\" \"Brot\"\n  Expenses:Food  4.20 EUR\n  Assets:Giro\n",
            "main.beancount",
        );
        let config = ImporterConfig::new(Account::new("Assets:Giro").unwrap());
        let importer = Importer::with_ledger(config, &ledger.transactions).unwrap();
        let text = run(|out| history(&importer, None, out));
        assert_eq!(text, "Bakery\nLandlord\n");
    }

    #[test]
    fn history_prints_groups() {
        let importer = importer();
        let text = run(|out| history(&importer, Some("Landlord"), out));
        assert_eq!(
            text,
            "2022-02-01\n  Expenses:Rent  650.00 EUR\n  Assets:Giro  -650.00 EUR\n"
        );
        let text = run(|out| history(&importer, Some("Nobody"), out));
        assert_eq!(text, "no history for 'Nobody' on Assets:Giro\n");
    }
}
