//! In-process record store with the semantics of the hosted document
//! database the dashboard was built against: ordered collections, point
//! writes, an atomic multi-delete and change notifications for subscribers.

use crate::models::{Account, AppData, Host, Sale, Target, WorkHourDeduction};
use crate::storage::persist_data;
use crate::validation::ValidationError;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, broadcast};
use tracing::{error, info};
use uuid::Uuid;

const CHANGE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Hosts,
    Accounts,
    Sales,
    Targets,
    Deductions,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Hosts => "hosts",
            Collection::Accounts => "accounts",
            Collection::Sales => "sales",
            Collection::Targets => "targets",
            Collection::Deductions => "deductions",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreEvent {
    pub collection: Collection,
    pub kind: ChangeKind,
    pub ids: Vec<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection} record '{id}' not found")]
    NotFound { collection: Collection, id: String },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("failed to write data file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode data file: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A record type stored in one of the collections of [`AppData`].
pub trait Record: Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn rows(data: &AppData) -> &[Self];
    fn rows_mut(data: &mut AppData) -> &mut Vec<Self>;
    /// Order in which subscribers observe the collection.
    fn order(a: &Self, b: &Self) -> Ordering;
}

impl Record for Host {
    const COLLECTION: Collection = Collection::Hosts;

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn rows(data: &AppData) -> &[Self] {
        &data.hosts
    }
    fn rows_mut(data: &mut AppData) -> &mut Vec<Self> {
        &mut data.hosts
    }
    fn order(a: &Self, b: &Self) -> Ordering {
        a.name.cmp(&b.name)
    }
}

impl Record for Account {
    const COLLECTION: Collection = Collection::Accounts;

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn rows(data: &AppData) -> &[Self] {
        &data.accounts
    }
    fn rows_mut(data: &mut AppData) -> &mut Vec<Self> {
        &mut data.accounts
    }
    fn order(a: &Self, b: &Self) -> Ordering {
        a.name.cmp(&b.name)
    }
}

impl Record for Sale {
    const COLLECTION: Collection = Collection::Sales;

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn rows(data: &AppData) -> &[Self] {
        &data.sales
    }
    fn rows_mut(data: &mut AppData) -> &mut Vec<Self> {
        &mut data.sales
    }
    // newest first, undated last
    fn order(a: &Self, b: &Self) -> Ordering {
        b.sale_date.cmp(&a.sale_date)
    }
}

impl Record for Target {
    const COLLECTION: Collection = Collection::Targets;

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn rows(data: &AppData) -> &[Self] {
        &data.targets
    }
    fn rows_mut(data: &mut AppData) -> &mut Vec<Self> {
        &mut data.targets
    }
    fn order(a: &Self, b: &Self) -> Ordering {
        b.year.cmp(&a.year).then(b.month.cmp(&a.month))
    }
}

impl Record for WorkHourDeduction {
    const COLLECTION: Collection = Collection::Deductions;

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn rows(data: &AppData) -> &[Self] {
        &data.deductions
    }
    fn rows_mut(data: &mut AppData) -> &mut Vec<Self> {
        &mut data.deductions
    }
    fn order(a: &Self, b: &Self) -> Ordering {
        b.date.cmp(&a.date)
    }
}

fn sort_all(data: &mut AppData) {
    data.hosts.sort_by(Host::order);
    data.accounts.sort_by(Account::order);
    data.sales.sort_by(Sale::order);
    data.targets.sort_by(Target::order);
    data.deductions.sort_by(WorkHourDeduction::order);
}

fn not_found<R: Record>(id: &str) -> StoreError {
    StoreError::NotFound {
        collection: R::COLLECTION,
        id: id.to_string(),
    }
}

#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    path: PathBuf,
    data: Mutex<AppData>,
    changes: broadcast::Sender<StoreEvent>,
}

impl Store {
    pub fn new(path: PathBuf, mut data: AppData) -> Self {
        sort_all(&mut data);
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                path,
                data: Mutex::new(data),
                changes,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub async fn snapshot(&self) -> AppData {
        self.inner.data.lock().await.clone()
    }

    pub async fn list<R: Record>(&self) -> Vec<R> {
        R::rows(&*self.inner.data.lock().await).to_vec()
    }

    /// Every successful write is announced after the new state is in place.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.changes.subscribe()
    }

    pub async fn insert<R: Record>(&self, mut record: R) -> Result<R, StoreError> {
        let id = Uuid::new_v4().to_string();
        record.set_id(id.clone());

        let mut data = self.inner.data.lock().await;
        let mut next = data.clone();
        let rows = R::rows_mut(&mut next);
        rows.push(record.clone());
        rows.sort_by(R::order);

        self.commit(&mut data, next, R::COLLECTION, ChangeKind::Inserted, vec![id.clone()])
            .await?;
        info!(collection = %R::COLLECTION, %id, "record inserted");
        Ok(record)
    }

    /// Applies `merge` to a copy of the stored record and commits it only if
    /// `merge` succeeds and the file write goes through.
    pub async fn update<R, F>(&self, id: &str, merge: F) -> Result<R, StoreError>
    where
        R: Record,
        F: FnOnce(&mut R) -> Result<(), ValidationError>,
    {
        let mut data = self.inner.data.lock().await;
        let mut next = data.clone();
        let rows = R::rows_mut(&mut next);
        let record = rows
            .iter_mut()
            .find(|row| row.id() == id)
            .ok_or_else(|| not_found::<R>(id))?;
        merge(record)?;
        let updated = record.clone();
        rows.sort_by(R::order);

        self.commit(&mut data, next, R::COLLECTION, ChangeKind::Updated, vec![id.to_string()])
            .await?;
        info!(collection = %R::COLLECTION, %id, "record updated");
        Ok(updated)
    }

    pub async fn delete<R: Record>(&self, id: &str) -> Result<(), StoreError> {
        let mut data = self.inner.data.lock().await;
        let mut next = data.clone();
        let rows = R::rows_mut(&mut next);
        let position = rows
            .iter()
            .position(|row| row.id() == id)
            .ok_or_else(|| not_found::<R>(id))?;
        rows.remove(position);

        self.commit(&mut data, next, R::COLLECTION, ChangeKind::Deleted, vec![id.to_string()])
            .await?;
        info!(collection = %R::COLLECTION, %id, "record deleted");
        Ok(())
    }

    /// Removes every record whose id is in `ids` as one write: either all of
    /// them are gone afterwards or none are. Unknown ids are ignored.
    pub async fn delete_many<R: Record>(&self, ids: &HashSet<String>) -> Result<usize, StoreError> {
        let mut data = self.inner.data.lock().await;
        let mut next = data.clone();
        let rows = R::rows_mut(&mut next);
        let removed: Vec<String> = rows
            .iter()
            .filter(|row| ids.contains(row.id()))
            .map(|row| row.id().to_string())
            .collect();
        if removed.is_empty() {
            return Ok(0);
        }
        rows.retain(|row| !ids.contains(row.id()));

        let count = removed.len();
        self.commit(&mut data, next, R::COLLECTION, ChangeKind::Deleted, removed)
            .await?;
        info!(collection = %R::COLLECTION, count, "records deleted");
        Ok(count)
    }

    async fn commit(
        &self,
        current: &mut AppData,
        next: AppData,
        collection: Collection,
        kind: ChangeKind,
        ids: Vec<String>,
    ) -> Result<(), StoreError> {
        if let Err(err) = persist_data(&self.inner.path, &next).await {
            error!(%collection, "write rejected: {err}");
            return Err(err);
        }
        *current = next;
        // nobody listening is not an error
        let _ = self.inner.changes.send(StoreEvent {
            collection,
            kind,
            ids,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{Patch, SalePatch, Validate};
    use chrono::NaiveDate;

    fn temp_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("live_sales_store_{name}_{}_{nanos}.json", std::process::id()))
    }

    fn host(name: &str) -> Host {
        Host {
            name: name.to_string(),
            ..Host::default()
        }
    }

    fn sale(day: u32, net: i64) -> Sale {
        Sale {
            host_id: "h1".into(),
            account_id: "k1".into(),
            sale_date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap().and_hms_opt(10, 0, 0),
            duration_minutes: 60,
            revenue_start: 0,
            revenue_end: net,
            ..Sale::default()
        }
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_keeps_order() {
        let store = Store::new(temp_path("insert"), AppData::default());

        let bima = store.insert(host("Bima")).await.unwrap();
        let ayu = store.insert(host("Ayu")).await.unwrap();
        assert!(!bima.id.is_empty());
        assert_ne!(bima.id, ayu.id);

        let names: Vec<_> = store.list::<Host>().await.into_iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["Ayu", "Bima"]);

        store.insert(sale(3, 10)).await.unwrap();
        store.insert(sale(5, 10)).await.unwrap();
        store.insert(Sale::default()).await.unwrap();
        let days: Vec<_> = store.list::<Sale>().await.iter().map(|s| s.sale_day()).collect();
        assert_eq!(
            days,
            vec![NaiveDate::from_ymd_opt(2026, 10, 5), NaiveDate::from_ymd_opt(2026, 10, 3), None]
        );

        let _ = tokio::fs::remove_file(store.path()).await;
    }

    #[tokio::test]
    async fn update_merges_and_rejects_invalid_results() {
        let store = Store::new(temp_path("update"), AppData::default());
        let created = store.insert(sale(3, 100)).await.unwrap();

        let updated: Sale = store
            .update(&created.id, |record: &mut Sale| {
                SalePatch { revenue_end: Some(400), ..SalePatch::default() }.merge_into(record)?;
                record.validate()
            })
            .await
            .unwrap();
        assert_eq!(updated.net_turnover(), 400);
        assert_eq!(updated.host_id, "h1");

        let err = store
            .update(&created.id, |record: &mut Sale| {
                SalePatch { revenue_start: Some(1_000), ..SalePatch::default() }.merge_into(record)?;
                record.validate()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(ValidationError::RevenueDecreased)));
        assert_eq!(store.list::<Sale>().await[0].revenue_start, 0);

        let err = store
            .update::<Sale, _>("missing", |_| Ok(()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { collection: Collection::Sales, .. }));

        let _ = tokio::fs::remove_file(store.path()).await;
    }

    #[tokio::test]
    async fn delete_many_removes_exactly_the_selection() {
        let store = Store::new(temp_path("bulk"), AppData::default());
        let mut ids = Vec::new();
        for day in 1..=4 {
            ids.push(store.insert(sale(day, 10)).await.unwrap().id);
        }
        let mut changes = store.subscribe();

        let selection: HashSet<String> =
            [ids[0].clone(), ids[2].clone(), "unknown".to_string()].into_iter().collect();
        assert_eq!(store.delete_many::<Sale>(&selection).await.unwrap(), 2);

        let event = changes.recv().await.unwrap();
        assert_eq!(event.collection, Collection::Sales);
        assert_eq!(event.kind, ChangeKind::Deleted);
        assert_eq!(event.ids.len(), 2);

        let mut remaining: Vec<String> = store.list::<Sale>().await.into_iter().map(|s| s.id).collect();
        remaining.sort();
        let mut expected = vec![ids[1].clone(), ids[3].clone()];
        expected.sort();
        assert_eq!(remaining, expected);

        let reloaded = crate::storage::load_data(store.path()).await;
        assert_eq!(reloaded.sales.len(), 2);

        let _ = tokio::fs::remove_file(store.path()).await;
    }

    #[tokio::test]
    async fn failed_write_leaves_state_and_subscribers_untouched() {
        let path = std::env::temp_dir()
            .join(format!("live_sales_missing_dir_{}", std::process::id()))
            .join("data.json");
        let store = Store::new(path, AppData::default());
        let mut changes = store.subscribe();

        let err = store.insert(host("Ayu")).await.unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(store.list::<Host>().await.is_empty());
        assert!(matches!(changes.try_recv(), Err(broadcast::error::TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let store = Store::new(temp_path("delete"), AppData::default());
        let err = store.delete::<Target>("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { collection: Collection::Targets, .. }));
    }
}
