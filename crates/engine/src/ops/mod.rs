use sea_orm::DatabaseConnection;

use crate::{AccountLogManager, AccountLogMessage, MessageBus, ResultEngine};

mod accounts;
mod logs;
mod transactions;
mod users;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    bus: Option<MessageBus>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The manager of the account-log projection, sharing this engine's
    /// database.
    pub fn log_manager(&self) -> AccountLogManager {
        AccountLogManager::new(self.database.clone())
    }

    /// Fire-and-forget an account-log message. Must only be called once the
    /// mutation it describes is committed.
    fn dispatch(&self, message: impl Into<AccountLogMessage>) {
        match &self.bus {
            Some(bus) => bus.dispatch(message),
            None => {
                let message = message.into();
                tracing::debug!(
                    kind = message.kind(),
                    "no message bus configured, account logs left stale"
                );
            }
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    bus: Option<MessageBus>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Pass the bus transaction mutations report to
    pub fn message_bus(mut self, bus: MessageBus) -> EngineBuilder {
        self.bus = Some(bus);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            bus: self.bus,
        })
    }
}
