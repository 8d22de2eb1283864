use saldo_core::Account;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for one bank account's imports.
///
/// ```toml
/// importing_account = "Assets:Volksbank:Giro"
/// target_journal = "ledger.beancount"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImporterConfig {
    pub importing_account: Account,
    #[serde(default = "default_adjacent_account")]
    pub default_adjacent_account: Account,
    #[serde(default)]
    pub target_journal: Option<PathBuf>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_flag")]
    pub flag: char,
}

fn default_adjacent_account() -> Account {
    Account::default_adjacent()
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_flag() -> char {
    '!'
}

impl ImporterConfig {
    pub fn new(importing_account: Account) -> Self {
        Self {
            importing_account,
            default_adjacent_account: default_adjacent_account(),
            target_journal: None,
            currency: default_currency(),
            flag: default_flag(),
        }
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: ImporterConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file. A relative `target_journal` is taken relative to
    /// the directory holding the config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        if let (Some(journal), Some(dir)) = (&config.target_journal, path.parent()) {
            if journal.is_relative() {
                config.target_journal = Some(dir.join(journal));
            }
        }
        tracing::debug!("loaded config for {} from {}", config.importing_account, path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.flag, '*' | '!') {
            return Err(ConfigError::Invalid(format!(
                "flag must be '*' or '!', got '{}'",
                self.flag
            )));
        }
        let currency_ok = !self.currency.is_empty()
            && self
                .currency
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        if !currency_ok {
            return Err(ConfigError::Invalid(format!(
                "currency must be an upper-case commodity, got '{}'",
                self.currency
            )));
        }
        Ok(())
    }
}
