pub mod builder;
pub mod codec;
pub mod config;
pub mod delimited;
pub mod detect;
pub mod guess;
pub mod history;
pub mod importer;
pub mod journal;
pub mod legacy;
pub mod statement;

pub use builder::{BuildError, EntryBuilder};
pub use codec::CodecError;
pub use config::{ConfigError, ImporterConfig};
pub use detect::{detect, FormatVariant, ALL_VARIANTS};
pub use guess::{GuessError, PostingGuesser};
pub use history::{HistoryIndex, PostingGroup};
pub use importer::{ImportError, Importer};
pub use journal::{load_file, parse_journal, Include, JournalError, LoadError, LoadedLedger};
pub use statement::{ClosingBalance, ParserStrategy, RawRecord, Statement, StatementError};
