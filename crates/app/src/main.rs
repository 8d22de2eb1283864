use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use saldo_core::Account;
use saldo_import::{FormatVariant, Importer, ImporterConfig};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(version, about = "Volksbank / GLS CSV exports to beancount", long_about = None)]
struct Cli {
    /// TOML config file (defaults to the user config directory's saldo.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger account of the exported bank account
    #[arg(long, global = true)]
    account: Option<Account>,

    /// Existing beancount journal to learn postings from
    #[arg(long, global = true)]
    journal: Option<PathBuf>,

    /// Counter account for payees without history
    #[arg(long, global = true)]
    default_account: Option<Account>,

    #[arg(long, global = true)]
    currency: Option<String>,

    /// Flag for generated transactions, `*` or `!`
    #[arg(long, global = true)]
    flag: Option<char>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report which export layout each file uses
    Identify { files: Vec<PathBuf> },

    /// Print ledger entries for each recognized export
    Extract {
        files: Vec<PathBuf>,

        /// Emit JSON instead of beancount
        #[arg(long)]
        json: bool,

        /// Add filename and lineno metadata to each entry
        #[arg(long)]
        with_meta: bool,

        /// Parse every file as this layout (v1 to v4) instead of detecting it
        #[arg(long)]
        layout: Option<FormatVariant>,
    },

    /// Show the earlier bookings known for a payee, or list all payees
    History { payee: Option<String> },
}

fn default_config_path() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("org", "saldo", "saldo")?;
    let path = dirs.config_dir().join("saldo.toml");
    path.exists().then_some(path)
}

fn resolve_config(cli: &Cli) -> Result<ImporterConfig> {
    let path = cli.config.clone().or_else(default_config_path);
    let mut config = match (path, &cli.account) {
        (Some(path), _) => ImporterConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        (None, Some(account)) => ImporterConfig::new(account.clone()),
        (None, None) => anyhow::bail!("no config file found; pass --config or --account"),
    };

    if let Some(account) = &cli.account {
        config.importing_account = account.clone();
    }
    if let Some(journal) = &cli.journal {
        config.target_journal = Some(journal.clone());
    }
    if let Some(account) = &cli.default_account {
        config.default_adjacent_account = account.clone();
    }
    if let Some(currency) = &cli.currency {
        config.currency = currency.clone();
    }
    if let Some(flag) = cli.flag {
        config.flag = flag;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let importer = Importer::new(config).context("setting up importer")?;

    let mut out = std::io::stdout().lock();
    match &cli.command {
        Command::Identify { files } => commands::identify(&importer, files, &mut out),
        Command::Extract {
            files,
            json,
            with_meta,
            layout,
        } => {
            let format = if *json {
                commands::OutputFormat::Json
            } else if *with_meta {
                commands::OutputFormat::BeancountWithMeta
            } else {
                commands::OutputFormat::Beancount
            };
            commands::extract(&importer, files, *layout, format, &mut out)
        }
        Command::History { payee } => commands::history(&importer, payee.as_deref(), &mut out),
    }
}
