use crate::filter::SaleFilter;
use crate::models::DashboardResponse;
use crate::stats::build_dashboard;
use crate::store::Store;
use std::sync::Arc;
use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Dashboard for one filter, recomputed from the store on every change
/// notification.
pub struct LiveDashboard {
    updates: watch::Receiver<Arc<DashboardResponse>>,
    task: JoinHandle<()>,
}

impl LiveDashboard {
    pub async fn spawn(store: Store, filter: SaleFilter) -> Self {
        // Subscribe before taking the first snapshot so no write slips between.
        let mut changes = store.subscribe();
        let initial = build_dashboard(&store.snapshot().await, &filter);
        let (sender, updates) = watch::channel(Arc::new(initial));

        let task = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(event) => {
                        debug!(collection = %event.collection, kind = ?event.kind, "recomputing dashboard")
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "dashboard subscriber lagged, recomputing from snapshot")
                    }
                    Err(RecvError::Closed) => break,
                }

                let dashboard = build_dashboard(&store.snapshot().await, &filter);
                if sender.send(Arc::new(dashboard)).is_err() {
                    break;
                }
            }
        });

        Self { updates, task }
    }

    pub fn current(&self) -> Arc<DashboardResponse> {
        Arc::clone(&self.updates.borrow())
    }

    /// Waits for the next recomputation. `None` once the feed has stopped.
    pub async fn changed(&mut self) -> Option<Arc<DashboardResponse>> {
        self.updates.changed().await.ok()?;
        Some(Arc::clone(&self.updates.borrow_and_update()))
    }
}

impl Drop for LiveDashboard {
    fn drop(&mut self) {
        self.task.abort();
    }
}
