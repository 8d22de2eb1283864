use std::path::{Path, PathBuf};

use saldo_core::{Account, Directive, Transaction};
use thiserror::Error;

use crate::builder::{BuildError, EntryBuilder};
use crate::codec::decode_latin1;
use crate::config::{ConfigError, ImporterConfig};
use crate::detect::{detect, FormatVariant};
use crate::history::HistoryIndex;
use crate::journal::{self, JournalError};
use crate::statement::StatementError;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Journal(#[from] JournalError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{file}: {source}")]
    Statement {
        file: String,
        #[source]
        source: StatementError,
    },
    #[error("{file}: {source}")]
    Build {
        file: String,
        #[source]
        source: BuildError,
    },
    #[error("{0}: not a Volksbank or GLS export")]
    NotApplicable(String),
}

/// Importer for one bank account's CSV exports.
///
/// The history index is built once here and reused by every extract call.
#[derive(Debug)]
pub struct Importer {
    config: ImporterConfig,
    history: HistoryIndex,
}

impl Importer {
    /// Loads the target journal when one is configured. Entries the journal
    /// loader rejects are logged and left out of the history.
    pub fn new(config: ImporterConfig) -> Result<Self, ImportError> {
        config.validate()?;
        let history = match &config.target_journal {
            Some(path) => {
                let ledger = journal::load_file(path)?;
                for err in &ledger.errors {
                    tracing::warn!("{}:{}: {}", err.filename, err.lineno, err.message);
                }
                HistoryIndex::build(&config.importing_account, &ledger.transactions)
            }
            None => HistoryIndex::empty(&config.importing_account),
        };
        Ok(Self { config, history })
    }

    pub fn with_ledger(config: ImporterConfig, transactions: &[Transaction]) -> Result<Self, ImportError> {
        config.validate()?;
        let history = HistoryIndex::build(&config.importing_account, transactions);
        Ok(Self { config, history })
    }

    pub fn history(&self) -> &HistoryIndex {
        &self.history
    }

    pub fn file_account(&self) -> &Account {
        &self.config.importing_account
    }

    pub fn detect(&self, path: &Path) -> Result<Option<FormatVariant>, ImportError> {
        let text = read_latin1(path)?;
        Ok(detect(text.lines()))
    }

    pub fn identify(&self, path: &Path) -> Result<bool, ImportError> {
        Ok(self.detect(path)?.is_some())
    }

    pub fn extract(&self, path: &Path) -> Result<Vec<Directive>, ImportError> {
        let text = read_latin1(path)?;
        self.extract_text(&path.display().to_string(), &text)
    }

    /// Extracts from already decoded text; `filename` only ends up in metadata.
    pub fn extract_text(&self, filename: &str, text: &str) -> Result<Vec<Directive>, ImportError> {
        let variant =
            detect(text.lines()).ok_or_else(|| ImportError::NotApplicable(filename.to_string()))?;
        self.extract_as(variant, filename, text)
    }

    /// Reads `path` as the given layout, whatever its header says.
    pub fn extract_file_as(
        &self,
        variant: FormatVariant,
        path: &Path,
    ) -> Result<Vec<Directive>, ImportError> {
        let text = read_latin1(path)?;
        self.extract_as(variant, &path.display().to_string(), &text)
    }

    /// Skips detection and parses `text` as the given layout.
    pub fn extract_as(
        &self,
        variant: FormatVariant,
        filename: &str,
        text: &str,
    ) -> Result<Vec<Directive>, ImportError> {
        let statement = variant.parse(text).map_err(|source| ImportError::Statement {
            file: filename.to_string(),
            source,
        })?;
        tracing::info!(
            "{filename}: {} records in {variant} layout",
            statement.records.len()
        );
        EntryBuilder::new(&self.config, &self.history)
            .build(filename, &statement)
            .map_err(|source| ImportError::Build {
                file: filename.to_string(),
                source,
            })
    }
}

fn read_latin1(path: &Path) -> Result<String, ImportError> {
    let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decode_latin1(&bytes))
}
