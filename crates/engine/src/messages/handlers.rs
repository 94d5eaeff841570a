use std::future::Future;

use crate::{
    ResultEngine,
    log_manager::{AccountLogManager, Rebuild},
};

use super::{AccountLogMessage, TransactionCreated, TransactionRemoved, TransactionUpdated};

/// Consumer side of a message/handler pair.
pub trait MessageHandler<M>: Send + Sync {
    /// Account logs invalidated by `message`.
    fn rebuilds(&self, message: &M) -> Vec<Rebuild>;

    /// Bring the invalidated logs up to date.
    fn handle(&self, message: M) -> impl Future<Output = ResultEngine<()>> + Send;
}

#[derive(Clone, Debug)]
pub struct TransactionCreatedHandler {
    manager: AccountLogManager,
}

impl TransactionCreatedHandler {
    pub fn new(manager: AccountLogManager) -> Self {
        Self { manager }
    }
}

impl MessageHandler<TransactionCreated> for TransactionCreatedHandler {
    fn rebuilds(&self, message: &TransactionCreated) -> Vec<Rebuild> {
        vec![Rebuild {
            account_id: message.account_id,
            from: message.occurred_on,
        }]
    }

    async fn handle(&self, message: TransactionCreated) -> ResultEngine<()> {
        self.manager.apply(self.rebuilds(&message)).await
    }
}

#[derive(Clone, Debug)]
pub struct TransactionUpdatedHandler {
    manager: AccountLogManager,
}

impl TransactionUpdatedHandler {
    pub fn new(manager: AccountLogManager) -> Self {
        Self { manager }
    }
}

impl MessageHandler<TransactionUpdated> for TransactionUpdatedHandler {
    fn rebuilds(&self, message: &TransactionUpdated) -> Vec<Rebuild> {
        if message.account_id == message.previous_account_id {
            return vec![Rebuild {
                account_id: message.account_id,
                from: message.occurred_on.min(message.previous_occurred_on),
            }];
        }
        vec![
            Rebuild {
                account_id: message.previous_account_id,
                from: message.previous_occurred_on,
            },
            Rebuild {
                account_id: message.account_id,
                from: message.occurred_on,
            },
        ]
    }

    async fn handle(&self, message: TransactionUpdated) -> ResultEngine<()> {
        self.manager.apply(self.rebuilds(&message)).await
    }
}

#[derive(Clone, Debug)]
pub struct TransactionRemovedHandler {
    manager: AccountLogManager,
}

impl TransactionRemovedHandler {
    pub fn new(manager: AccountLogManager) -> Self {
        Self { manager }
    }
}

impl MessageHandler<TransactionRemoved> for TransactionRemovedHandler {
    fn rebuilds(&self, message: &TransactionRemoved) -> Vec<Rebuild> {
        vec![Rebuild {
            account_id: message.account_id,
            from: message.occurred_on,
        }]
    }

    async fn handle(&self, message: TransactionRemoved) -> ResultEngine<()> {
        self.manager.apply(self.rebuilds(&message)).await
    }
}

/// Dispatches [`AccountLogMessage`]s to their handler.
#[derive(Clone, Debug)]
pub struct LogMessageRouter {
    created: TransactionCreatedHandler,
    updated: TransactionUpdatedHandler,
    removed: TransactionRemovedHandler,
    manager: AccountLogManager,
}

impl LogMessageRouter {
    pub fn new(manager: AccountLogManager) -> Self {
        Self {
            created: TransactionCreatedHandler::new(manager.clone()),
            updated: TransactionUpdatedHandler::new(manager.clone()),
            removed: TransactionRemovedHandler::new(manager.clone()),
            manager,
        }
    }

    pub fn rebuilds(&self, message: &AccountLogMessage) -> Vec<Rebuild> {
        match message {
            AccountLogMessage::TransactionCreated(m) => self.created.rebuilds(m),
            AccountLogMessage::TransactionUpdated(m) => self.updated.rebuilds(m),
            AccountLogMessage::TransactionRemoved(m) => self.removed.rebuilds(m),
        }
    }

    pub async fn handle(&self, message: AccountLogMessage) -> ResultEngine<()> {
        match message {
            AccountLogMessage::TransactionCreated(m) => self.created.handle(m).await,
            AccountLogMessage::TransactionUpdated(m) => self.updated.handle(m).await,
            AccountLogMessage::TransactionRemoved(m) => self.removed.handle(m).await,
        }
    }

    /// Handle several messages with one rebuild per affected account.
    pub async fn handle_batch(&self, messages: &[AccountLogMessage]) -> ResultEngine<()> {
        let requests: Vec<Rebuild> = messages.iter().flat_map(|m| self.rebuilds(m)).collect();
        self.manager.apply(requests).await
    }
}
