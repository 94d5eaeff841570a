//! Domain engine: users and their settings, accounts, transactions, and the
//! account-log projection kept up to date by asynchronous messages.

pub use account_logs::AccountLog;
pub use accounts::Account;
pub use currency::Currency;
pub use error::EngineError;
pub use log_manager::{AccountLogManager, Rebuild, RebuildSummary, coalesce};
pub use messages::{
    AccountLogMessage, LogMessageRouter, LogWorker, MessageBus, MessageHandler,
    TransactionCreated, TransactionCreatedHandler, TransactionRemoved, TransactionRemovedHandler,
    TransactionUpdated, TransactionUpdatedHandler, log_pipeline,
};
pub use commands::{
    CreateAccountCmd, CreateTransactionCmd, TransactionListFilter, UpdateTransactionCmd,
};
pub use ops::{Engine, EngineBuilder};
pub use ownership::{Ownable, OwnedQuery, Scope};
pub use pagination::{DEFAULT_PER_PAGE, MAX_PER_PAGE, Page, PageRequest, paginate};
pub use transactions::Transaction;
pub use user_settings::{UserSettings, UserSettingsPatch};
pub use users::User;

mod account_logs;
mod accounts;
mod commands;
mod currency;
mod error;
mod log_manager;
mod messages;
mod ops;
mod ownership;
mod pagination;
mod transactions;
mod user_settings;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
