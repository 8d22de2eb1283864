pub mod account;
pub mod money;
pub mod transaction;

pub use account::{Account, LedgerError, DEFAULT_ADJACENT_ACCOUNT};
pub use money::Amount;
pub use transaction::{Balance, Directive, Metadata, Posting, Transaction};
