use sea_orm::DatabaseConnection;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};

use crate::log_manager::AccountLogManager;

use super::{AccountLogMessage, LogMessageRouter};

/// Producer handle of the account-log queue.
///
/// Cheap to clone. Dispatching never waits for the message to be handled.
#[derive(Clone, Debug)]
pub struct MessageBus {
    sender: mpsc::Sender<AccountLogMessage>,
}

impl MessageBus {
    /// Enqueue `message` and return immediately.
    ///
    /// A full queue does not drop the message: it is handed to a detached
    /// task that waits for capacity. A stopped worker only gets logged.
    pub fn dispatch(&self, message: impl Into<AccountLogMessage>) {
        let message = message.into();
        match self.sender.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                tracing::warn!(
                    kind = message.kind(),
                    transaction_id = %message.transaction_id(),
                    "account log queue is full, deferring message"
                );
                let sender = self.sender.clone();
                tokio::spawn(async move {
                    if let Err(err) = sender.send(message).await {
                        tracing::error!(
                            kind = err.0.kind(),
                            "account log worker stopped, message lost"
                        );
                    }
                });
            }
            Err(TrySendError::Closed(message)) => {
                tracing::error!(
                    kind = message.kind(),
                    transaction_id = %message.transaction_id(),
                    "account log worker stopped, message lost"
                );
            }
        }
    }
}

/// Consumer of the account-log queue.
#[derive(Debug)]
pub struct LogWorker {
    receiver: mpsc::Receiver<AccountLogMessage>,
    router: LogMessageRouter,
}

impl LogWorker {
    pub fn new(receiver: mpsc::Receiver<AccountLogMessage>, router: LogMessageRouter) -> Self {
        Self { receiver, router }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process messages until every [`MessageBus`] handle is dropped.
    ///
    /// Each wake-up drains whatever is already queued and rebuilds every
    /// affected account once. Failures are logged; the loop keeps going.
    pub async fn run(mut self) {
        tracing::info!("account log worker started");
        while let Some(first) = self.receiver.recv().await {
            let mut batch = vec![first];
            while let Ok(next) = self.receiver.try_recv() {
                batch.push(next);
            }

            for message in &batch {
                tracing::debug!(
                    kind = message.kind(),
                    transaction_id = %message.transaction_id(),
                    "handling account log message"
                );
            }

            if let Err(err) = self.router.handle_batch(&batch).await {
                tracing::error!(
                    messages = batch.len(),
                    "failed to rebuild account logs: {err}"
                );
            }
        }
        tracing::info!("account log worker stopped");
    }
}

/// Wire a bus to a worker rebuilding logs on `database`.
///
/// `capacity` is clamped to at least 1.
pub fn log_pipeline(database: DatabaseConnection, capacity: usize) -> (MessageBus, LogWorker) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let router = LogMessageRouter::new(AccountLogManager::new(database));
    (MessageBus { sender }, LogWorker::new(receiver, router))
}
