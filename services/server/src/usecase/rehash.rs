//! Background upgrade of seed-path password hashes to the full bcrypt cost.

use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::domain::query::Query;
use crate::domain::repository::QueryRunner;
use crate::domain::types::RehashSettings;
use crate::usecase::password::hash_password;

const UPDATE_PASSWORDS: &str = "FOR u IN @users\nUPDATE u IN users";

/// A freshly inserted record whose stored hash is a low-cost placeholder.
#[derive(Debug, Clone)]
pub struct PendingRehash {
    pub key: String,
    pub password: String,
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the single rehash task. Starting a new one cancels the previous task
/// and waits until it has stopped.
pub struct RehashSupervisor {
    settings: RehashSettings,
    current: Mutex<Option<RunningTask>>,
}

impl RehashSupervisor {
    pub fn new(settings: RehashSettings) -> Self {
        Self {
            settings,
            current: Mutex::new(None),
        }
    }

    /// Stops any running task, then spawns a new one for `pending` unless it
    /// is empty.
    pub async fn restart<Q>(&self, runner: Q, pending: Vec<PendingRehash>)
    where
        Q: QueryRunner + 'static,
    {
        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            previous.cancel.cancel();
            if let Err(e) = previous.handle.await {
                tracing::warn!(error = %e, "previous rehash task ended abnormally");
            }
        }
        if pending.is_empty() {
            return;
        }

        let cancel = CancellationToken::new();
        let task = RehashTask {
            runner,
            settings: self.settings,
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(task.run(pending));
        *current = Some(RunningTask { cancel, handle });
    }

    /// Waits for the running task, if any, to finish on its own. The slot
    /// stays locked meanwhile, so a concurrent `restart` queues behind it.
    pub async fn wait(&self) {
        let mut current = self.current.lock().await;
        if let Some(task) = current.as_mut() {
            if let Err(e) = (&mut task.handle).await {
                tracing::warn!(error = %e, "rehash task ended abnormally");
            }
        }
        *current = None;
    }
}

struct RehashTask<Q> {
    runner: Q,
    settings: RehashSettings,
    cancel: CancellationToken,
}

impl<Q: QueryRunner> RehashTask<Q> {
    async fn run(self, pending: Vec<PendingRehash>) {
        let total = pending.len();
        let batch_size = self.settings.batch_size.max(1);
        let mut batch: Vec<Value> = Vec::with_capacity(batch_size);

        for item in pending {
            if self.cancel.is_cancelled() {
                tracing::info!(abandoned = batch.len(), "rehash cancelled");
                return;
            }
            tokio::time::sleep(self.settings.item_delay).await;

            let hashed = match hash_password(item.password, self.settings.cost).await {
                Ok(hashed) => hashed,
                Err(e) => {
                    tracing::error!(error = %e, key = %item.key, "rehash failed, stopping");
                    self.flush(&mut batch).await;
                    return;
                }
            };
            batch.push(json!({"_key": item.key, "password": hashed}));
            if batch.len() >= batch_size {
                self.flush(&mut batch).await;
            }
        }
        self.flush(&mut batch).await;
        tracing::info!(total, "rehash finished");
    }

    async fn flush(&self, batch: &mut Vec<Value>) {
        if batch.is_empty() {
            return;
        }
        let users = std::mem::take(batch);
        let count = users.len();
        let query = Query::new(UPDATE_PASSWORDS).bind("users", users);
        match self.runner.run::<Map<String, Value>>(&query).await {
            Ok(_) => tracing::debug!(count, "rehashed batch stored"),
            Err(e) => tracing::warn!(error = %e, count, "could not store rehashed batch"),
        }
    }
}
