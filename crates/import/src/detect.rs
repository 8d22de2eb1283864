use std::fmt;

const V1_HEADER: &str = "\"Buchungstag\";\"Valuta\";\"Auftraggeber/Zahlungsempfänger\";\"Empfänger/Zahlungspflichtiger\";\"Konto-Nr.\";\"IBAN\";\"BLZ\";\"BIC\";\"Vorgang/Verwendungszweck\";\"Kundenreferenz\";\"Währung\";\"Umsatz\";\" \"";

const ACCOUNT_COLUMNS: &str = "Bezeichnung Auftragskonto;IBAN Auftragskonto;BIC Auftragskonto;Bankname Auftragskonto;Buchungstag;Valutadatum;Name Zahlungsbeteiligter;IBAN Zahlungsbeteiligter;BIC (SWIFT-Code) Zahlungsbeteiligter;Buchungstext;Verwendungszweck;Betrag;Waehrung";

/// The four export layouts the bank has shipped over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVariant {
    /// Quoted columns, free text may wrap over several physical lines.
    V1,
    /// One line per record with a separate Soll/Haben column.
    V2,
    /// Signed amounts with running balance, `Kategorie` column.
    V3,
    /// Signed amounts with running balance, `Gekennzeichneter Umsatz` column.
    V4,
}

/// Detection order. A line is tested against each signature in turn.
pub const ALL_VARIANTS: &[FormatVariant] = &[
    FormatVariant::V1,
    FormatVariant::V2,
    FormatVariant::V3,
    FormatVariant::V4,
];

impl FormatVariant {
    /// The header line identifying this layout.
    pub fn signature(self) -> String {
        match self {
            FormatVariant::V1 => V1_HEADER.to_string(),
            FormatVariant::V2 => format!("{ACCOUNT_COLUMNS};Soll/Haben"),
            FormatVariant::V3 => format!(
                "{ACCOUNT_COLUMNS};Saldo nach Buchung;Bemerkung;Kategorie;Steuerrelevant;Glaeubiger ID;Mandatsreferenz"
            ),
            FormatVariant::V4 => format!(
                "{ACCOUNT_COLUMNS};Saldo nach Buchung;Bemerkung;Gekennzeichneter Umsatz;Steuerrelevant;Glaeubiger ID;Mandatsreferenz"
            ),
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            FormatVariant::V1 => "v1",
            FormatVariant::V2 => "v2",
            FormatVariant::V3 => "v3",
            FormatVariant::V4 => "v4",
        }
    }
}

impl fmt::Display for FormatVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Returns the variant of the first line containing a known header signature.
///
/// `None` means the file is not a bank export this importer understands; that is
/// an ordinary answer, not an error.
pub fn detect<'a, I>(lines: I) -> Option<FormatVariant>
where
    I: IntoIterator<Item = &'a str>,
{
    let signatures: Vec<(FormatVariant, String)> =
        ALL_VARIANTS.iter().map(|v| (*v, v.signature())).collect();

    for (idx, line) in lines.into_iter().enumerate() {
        if let Some((variant, _)) = signatures.iter().find(|(_, sig)| line.contains(sig.as_str())) {
            tracing::debug!("header for {variant} found on line {}", idx + 1);
            return Some(*variant);
        }
    }

    tracing::info!("no known export header found");
    None
}
