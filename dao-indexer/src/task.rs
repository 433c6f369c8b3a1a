use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Handle over the background tasks of the indexing subsystem.
///
/// Producers (the poll loop, the live listener and its per-watch
/// subscription forwarders) are aborted outright on `stop`; the projection
/// worker is tracked separately and awaited instead, so in-flight handler
/// executions complete and nothing is cancelled mid-write. The worker ends
/// on its own once the aborted producers drop their sink handles.
#[derive(Clone, Debug, Default)]
pub struct IndexerTasks {
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl IndexerTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, task: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().await;
        tasks.push(task);
    }

    pub async fn set_worker(&self, worker: JoinHandle<()>) {
        let mut slot = self.worker.lock().await;
        *slot = Some(worker);
    }

    pub async fn stop(&self) {
        {
            let tasks = self.tasks.lock().await;
            for task in tasks.iter() {
                task.abort();
            }
        }

        let worker = self.worker.lock().await.take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
    }
}
