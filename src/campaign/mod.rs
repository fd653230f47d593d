//! Campaign state resolution across the remote and local stores.
//!
//! Reads and writes walk an ordered provider list (remote first when
//! configured, local last). Every answer carries the [`Source`] that produced
//! it.
//!
//! Reads and writes treat an empty remote table differently. A read keeps
//! looking and prefers a local file over the seed default; a write takes the
//! seed default as its base and never consults the local file when the remote
//! answered.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::StorageConfig;
use crate::errors::AppError;
use crate::models::{
    CampaignChanges, CampaignRecord, Resolved, Source, UpdateCampaignRequest, CAMPAIGN_ID,
};
use crate::store::{CampaignStore, LocalStore, StoreError, SupabaseStore};

/// What to do when the primary store answers with no row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnEmpty {
    /// Ask the remaining stores, seeding only if none has a record.
    TryFallbacks,
    /// Use the seed default straight away.
    Seed,
}

/// A requested change to the campaign, stripped of credentials.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignUpdate {
    pub change: Option<f64>,
    pub manual: Option<f64>,
    pub goal: Option<f64>,
    pub title: Option<String>,
}

impl From<&UpdateCampaignRequest> for CampaignUpdate {
    fn from(request: &UpdateCampaignRequest) -> Self {
        Self {
            change: request.change,
            manual: request.manual,
            goal: request.goal,
            title: request.title.clone(),
        }
    }
}

impl CampaignUpdate {
    /// Compute the written fields against the current record.
    ///
    /// `manual` sets the total absolutely and wins over `change`. Counts are
    /// rounded and clamped at zero. `last_updated` is refreshed even when
    /// nothing else moves, and never goes backwards.
    pub fn apply(&self, current: &CampaignRecord, now: DateTime<Utc>) -> CampaignChanges {
        let current_bags = match (self.manual, self.change) {
            (Some(manual), _) => coerce_count(manual),
            (None, Some(change)) => coerce_count(current.current_bags as f64 + change),
            (None, None) => current.current_bags,
        };

        CampaignChanges {
            current_bags,
            goal: self.goal.map(coerce_count).unwrap_or(current.goal),
            title: self.title.clone().unwrap_or_else(|| current.title.clone()),
            last_updated: current.last_updated.map_or(now, |previous| previous.max(now)),
        }
    }
}

/// `max(0, round(x))`, saturating at the integer bounds.
fn coerce_count(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    value.round().max(0.0) as i64
}

fn merge(base: CampaignRecord, changes: &CampaignChanges) -> CampaignRecord {
    CampaignRecord {
        id: CAMPAIGN_ID.to_string(),
        title: changes.title.clone(),
        current_bags: changes.current_bags,
        goal: changes.goal,
        last_updated: Some(changes.last_updated),
        ..base
    }
}

/// Produces the authoritative campaign record and applies admin updates.
pub struct CampaignResolver {
    readers: Vec<Arc<dyn CampaignStore>>,
    writers: Vec<Arc<dyn CampaignStore>>,
}

impl CampaignResolver {
    /// Build from explicit provider lists, tried in order.
    pub fn new(readers: Vec<Arc<dyn CampaignStore>>, writers: Vec<Arc<dyn CampaignStore>>) -> Self {
        Self { readers, writers }
    }

    /// Remote reads use the public key and remote writes the privileged key;
    /// each is enabled only when its credentials are configured.
    pub fn from_config(storage: &StorageConfig, client: &reqwest::Client) -> Self {
        let local: Arc<dyn CampaignStore> = Arc::new(LocalStore::new(&storage.data_dir));

        let mut readers: Vec<Arc<dyn CampaignStore>> = Vec::new();
        if let Some((url, key)) = storage.remote_read() {
            readers.push(Arc::new(SupabaseStore::with_client(client.clone(), url, key)));
        }
        readers.push(local.clone());

        let mut writers: Vec<Arc<dyn CampaignStore>> = Vec::new();
        if let Some((url, key)) = storage.remote_write() {
            writers.push(Arc::new(SupabaseStore::with_client(client.clone(), url, key)));
        }
        writers.push(local);

        Self::new(readers, writers)
    }

    /// Current campaign record and the store that served it.
    pub async fn read(&self) -> Result<Resolved<CampaignRecord>, AppError> {
        self.fetch(&self.readers, OnEmpty::TryFallbacks).await
    }

    /// Apply an update and persist the merged record.
    ///
    /// Callers must have passed the admin gate. The response echoes only the
    /// written fields, tagged with the store that accepted them.
    pub async fn write(&self, update: &CampaignUpdate) -> Result<Resolved<CampaignChanges>, AppError> {
        let base = self.fetch(&self.writers, OnEmpty::Seed).await?.value;
        let changes = update.apply(&base, Utc::now());
        let record = merge(base, &changes);

        let source = self.persist(&record).await?;
        tracing::info!(
            source = ?source,
            current_bags = changes.current_bags,
            goal = changes.goal,
            "Campaign updated"
        );
        Ok(Resolved::new(changes, source))
    }

    async fn fetch(
        &self,
        stores: &[Arc<dyn CampaignStore>],
        on_empty: OnEmpty,
    ) -> Result<Resolved<CampaignRecord>, AppError> {
        let mut primary_empty = false;
        let mut failure: Option<StoreError> = None;

        for (position, store) in stores.iter().enumerate() {
            match store.fetch().await {
                Ok(Some(record)) => return Ok(Resolved::new(record, store.source())),
                Ok(None) if position == 0 => {
                    primary_empty = true;
                    if on_empty == OnEmpty::Seed {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(source = ?store.source(), "Campaign fetch failed: {}", e);
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        if primary_empty {
            return Ok(Resolved::new(CampaignRecord::seed(), Source::SeedDefault));
        }

        Err(failure.map(AppError::from).unwrap_or_else(|| {
            AppError::BackendUnavailable("No campaign store configured".to_string())
        }))
    }

    async fn persist(&self, record: &CampaignRecord) -> Result<Source, AppError> {
        let mut failure: Option<StoreError> = None;

        for store in &self.writers {
            match store.upsert(record).await {
                Ok(()) => return Ok(store.source()),
                Err(e) => {
                    tracing::warn!(source = ?store.source(), "Campaign upsert failed: {}", e);
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        Err(failure.map(AppError::from).unwrap_or_else(|| {
            AppError::BackendUnavailable("No campaign store configured".to_string())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Duration;

    /// In-memory store with switchable failures.
    struct FakeStore {
        source: Source,
        record: Mutex<Option<CampaignRecord>>,
        fail_fetch: bool,
        fail_upsert: bool,
    }

    impl FakeStore {
        fn new(source: Source, record: Option<CampaignRecord>) -> Arc<Self> {
            Arc::new(Self {
                source,
                record: Mutex::new(record),
                fail_fetch: false,
                fail_upsert: false,
            })
        }

        fn failing(source: Source, fail_fetch: bool, fail_upsert: bool) -> Arc<Self> {
            Arc::new(Self {
                source,
                record: Mutex::new(None),
                fail_fetch,
                fail_upsert,
            })
        }

        fn stored(&self) -> Option<CampaignRecord> {
            self.record.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CampaignStore for FakeStore {
        fn source(&self) -> Source {
            self.source
        }

        async fn fetch(&self) -> Result<Option<CampaignRecord>, StoreError> {
            if self.fail_fetch {
                return Err(StoreError::Remote {
                    status: 503,
                    message: format!("{:?} unreachable", self.source),
                });
            }
            Ok(self.stored())
        }

        async fn upsert(&self, record: &CampaignRecord) -> Result<(), StoreError> {
            if self.fail_upsert {
                return Err(StoreError::Remote {
                    status: 500,
                    message: format!("{:?} rejected write", self.source),
                });
            }
            *self.record.lock().unwrap() = Some(record.clone());
            Ok(())
        }
    }

    fn record_with(bags: i64, goal: i64) -> CampaignRecord {
        CampaignRecord {
            current_bags: bags,
            goal,
            last_updated: Some(Utc::now() - Duration::hours(1)),
            ..CampaignRecord::default()
        }
    }

    fn resolver(
        readers: Vec<Arc<FakeStore>>,
        writers: Vec<Arc<FakeStore>>,
    ) -> CampaignResolver {
        let cast = |stores: Vec<Arc<FakeStore>>| {
            stores
                .into_iter()
                .map(|s| s as Arc<dyn CampaignStore>)
                .collect::<Vec<_>>()
        };
        CampaignResolver::new(cast(readers), cast(writers))
    }

    // ---- read ----

    #[tokio::test]
    async fn test_read_remote_row() {
        let remote = FakeStore::new(Source::Supabase, Some(record_with(10, 100)));
        let local = FakeStore::new(Source::Local, Some(record_with(99, 100)));

        let resolved = resolver(vec![remote, local], vec![]).read().await.unwrap();
        assert_eq!(resolved.source, Source::Supabase);
        assert_eq!(resolved.value.current_bags, 10);
    }

    #[tokio::test]
    async fn test_read_remote_error_falls_back_to_local() {
        let remote = FakeStore::failing(Source::Supabase, true, false);
        let local = FakeStore::new(Source::Local, Some(record_with(7, 100)));

        let resolved = resolver(vec![remote, local], vec![]).read().await.unwrap();
        assert_eq!(resolved.source, Source::Local);
        assert_eq!(resolved.value.current_bags, 7);
    }

    #[tokio::test]
    async fn test_read_remote_error_without_local_fails() {
        let remote = FakeStore::failing(Source::Supabase, true, false);
        let local = FakeStore::new(Source::Local, None);

        let err = resolver(vec![remote, local], vec![]).read().await.unwrap_err();
        match err {
            AppError::BackendUnavailable(message) => assert!(message.contains("Supabase unreachable")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_read_local_wins_over_seed() {
        let remote = FakeStore::new(Source::Supabase, None);
        let local = FakeStore::new(Source::Local, Some(record_with(3, 50)));

        let resolved = resolver(vec![remote, local], vec![]).read().await.unwrap();
        assert_eq!(resolved.source, Source::Local);
        assert_eq!(resolved.value.goal, 50);
    }

    #[tokio::test]
    async fn test_read_seed_when_nothing_stored() {
        let remote = FakeStore::new(Source::Supabase, None);
        let local = FakeStore::new(Source::Local, None);

        let resolved = resolver(vec![remote, local], vec![]).read().await.unwrap();
        assert_eq!(resolved.source, Source::SeedDefault);
        assert_eq!(resolved.source.tag(), None);
        assert_eq!(resolved.value.current_bags, 0);
        assert_eq!(resolved.value.goal, 5000);
        assert!(resolved.value.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_read_seed_when_remote_empty_and_local_corrupt() {
        let remote = FakeStore::new(Source::Supabase, None);
        let local = FakeStore::failing(Source::Local, true, false);

        let resolved = resolver(vec![remote, local], vec![]).read().await.unwrap();
        assert_eq!(resolved.source, Source::SeedDefault);
    }

    #[tokio::test]
    async fn test_read_local_only() {
        let local = FakeStore::new(Source::Local, Some(record_with(5, 5)));
        let resolved = resolver(vec![local], vec![]).read().await.unwrap();
        assert_eq!(resolved.source, Source::Local);

        let empty = FakeStore::new(Source::Local, None);
        let resolved = resolver(vec![empty], vec![]).read().await.unwrap();
        assert_eq!(resolved.source, Source::SeedDefault);
    }

    // ---- write ----

    #[tokio::test]
    async fn test_write_change_is_additive_and_clamped() {
        let local = FakeStore::new(Source::Local, Some(record_with(10, 100)));
        let resolver = resolver(vec![], vec![local.clone()]);

        let up = CampaignUpdate {
            change: Some(5.0),
            ..Default::default()
        };
        let resolved = resolver.write(&up).await.unwrap();
        assert_eq!(resolved.value.current_bags, 15);
        assert_eq!(resolved.source, Source::Local);

        let down = CampaignUpdate {
            change: Some(-40.0),
            ..Default::default()
        };
        let resolved = resolver.write(&down).await.unwrap();
        assert_eq!(resolved.value.current_bags, 0);
        assert_eq!(local.stored().unwrap().current_bags, 0);
    }

    #[tokio::test]
    async fn test_write_manual_sets_absolute_value() {
        let local = FakeStore::new(Source::Local, Some(record_with(10, 100)));
        let resolver = resolver(vec![], vec![local.clone()]);

        let update = CampaignUpdate {
            manual: Some(250.0),
            change: Some(1.0),
            ..Default::default()
        };
        let resolved = resolver.write(&update).await.unwrap();
        assert_eq!(resolved.value.current_bags, 250);
        assert_eq!(local.stored().unwrap().current_bags, 250);

        let negative = CampaignUpdate {
            manual: Some(-3.0),
            ..Default::default()
        };
        assert_eq!(resolver.write(&negative).await.unwrap().value.current_bags, 0);
    }

    #[tokio::test]
    async fn test_write_refreshes_timestamp_without_count_change() {
        let previous = record_with(42, 100);
        let before = previous.last_updated.unwrap();
        let local = FakeStore::new(Source::Local, Some(previous));
        let resolver = resolver(vec![], vec![local.clone()]);

        let resolved = resolver.write(&CampaignUpdate::default()).await.unwrap();
        assert_eq!(resolved.value.current_bags, 42);
        assert!(resolved.value.last_updated > before);
        assert_eq!(local.stored().unwrap().last_updated, Some(resolved.value.last_updated));
    }

    #[tokio::test]
    async fn test_write_goal_is_idempotent() {
        let local = FakeStore::new(Source::Local, Some(record_with(12, 100)));
        let resolver = resolver(vec![], vec![local.clone()]);

        let update = CampaignUpdate {
            goal: Some(5000.0),
            ..Default::default()
        };
        resolver.write(&update).await.unwrap();
        let second = resolver.write(&update).await.unwrap();

        assert_eq!(second.value.goal, 5000);
        assert_eq!(second.value.current_bags, 12);
        assert_eq!(local.stored().unwrap().goal, 5000);
    }

    #[tokio::test]
    async fn test_write_goal_and_title_are_coerced_and_optional() {
        let local = FakeStore::new(Source::Local, Some(record_with(1, 100)));
        let resolver = resolver(vec![], vec![local.clone()]);

        let update = CampaignUpdate {
            goal: Some(-12.6),
            title: Some("New title".into()),
            ..Default::default()
        };
        let resolved = resolver.write(&update).await.unwrap();
        assert_eq!(resolved.value.goal, 0);
        assert_eq!(resolved.value.title, "New title");

        let update = CampaignUpdate {
            goal: Some(7499.5),
            ..Default::default()
        };
        let resolved = resolver.write(&update).await.unwrap();
        assert_eq!(resolved.value.goal, 7500);
        assert_eq!(resolved.value.title, "New title");
    }

    #[tokio::test]
    async fn test_write_preserves_untouched_fields() {
        let mut previous = record_with(1, 100);
        previous.school_name = Some("Hope School".into());
        previous
            .extra
            .insert("qr_url".into(), serde_json::json!("https://example.com/qr"));
        let local = FakeStore::new(Source::Local, Some(previous));
        let resolver = resolver(vec![], vec![local.clone()]);

        resolver
            .write(&CampaignUpdate {
                change: Some(1.0),
                ..Default::default()
            })
            .await
            .unwrap();

        let stored = local.stored().unwrap();
        assert_eq!(stored.school_name.as_deref(), Some("Hope School"));
        assert_eq!(stored.extra["qr_url"], "https://example.com/qr");
        assert_eq!(stored.id, CAMPAIGN_ID);
    }

    #[tokio::test]
    async fn test_write_remote_success_is_tagged_supabase() {
        let remote = FakeStore::new(Source::Supabase, Some(record_with(8, 100)));
        let local = FakeStore::new(Source::Local, None);
        let resolver = resolver(vec![], vec![remote.clone(), local.clone()]);

        let resolved = resolver
            .write(&CampaignUpdate {
                change: Some(2.0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(resolved.source, Source::Supabase);
        assert_eq!(remote.stored().unwrap().current_bags, 10);
        assert!(local.stored().is_none());
    }

    #[tokio::test]
    async fn test_write_empty_remote_ignores_local_file() {
        let remote = FakeStore::new(Source::Supabase, None);
        let local = FakeStore::new(Source::Local, Some(record_with(900, 1000)));
        let resolver = resolver(vec![], vec![remote.clone(), local]);

        let resolved = resolver
            .write(&CampaignUpdate {
                change: Some(1.0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(resolved.value.current_bags, 1);
        assert_eq!(resolved.value.goal, 5000);
        assert_eq!(resolved.source, Source::Supabase);
    }

    #[tokio::test]
    async fn test_write_failed_upsert_falls_back_to_local() {
        let remote = Arc::new(FakeStore {
            source: Source::Supabase,
            record: Mutex::new(Some(record_with(20, 100))),
            fail_fetch: false,
            fail_upsert: true,
        });
        let local = FakeStore::new(Source::Local, None);
        let resolver = resolver(vec![], vec![remote.clone(), local.clone()]);

        let resolved = resolver
            .write(&CampaignUpdate {
                change: Some(1.0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(resolved.source, Source::Local);
        assert_eq!(local.stored().unwrap().current_bags, 21);
        assert_eq!(remote.stored().unwrap().current_bags, 20);
    }

    #[tokio::test]
    async fn test_write_remote_fetch_error_uses_local_base() {
        let remote = FakeStore::failing(Source::Supabase, true, false);
        let local = FakeStore::new(Source::Local, Some(record_with(30, 100)));
        let resolver = resolver(vec![], vec![remote.clone(), local]);

        let resolved = resolver
            .write(&CampaignUpdate {
                change: Some(1.0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(resolved.value.current_bags, 31);
        assert_eq!(resolved.source, Source::Supabase);
    }

    #[tokio::test]
    async fn test_write_fails_when_no_base_is_available() {
        let remote = FakeStore::failing(Source::Supabase, true, false);
        let local = FakeStore::new(Source::Local, None);
        let resolver = resolver(vec![], vec![remote, local.clone()]);

        let err = resolver.write(&CampaignUpdate::default()).await.unwrap_err();
        assert!(matches!(err, AppError::BackendUnavailable(_)));
        assert!(local.stored().is_none());
    }

    #[tokio::test]
    async fn test_write_fails_when_every_store_rejects() {
        let remote = Arc::new(FakeStore {
            source: Source::Supabase,
            record: Mutex::new(Some(record_with(1, 1))),
            fail_fetch: false,
            fail_upsert: true,
        });
        let local = FakeStore::failing(Source::Local, false, true);
        let resolver = resolver(vec![], vec![remote, local]);

        let err = resolver.write(&CampaignUpdate::default()).await.unwrap_err();
        match err {
            AppError::BackendUnavailable(message) => assert!(message.contains("Supabase rejected write")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_coerce_count() {
        assert_eq!(coerce_count(2.4), 2);
        assert_eq!(coerce_count(2.5), 3);
        assert_eq!(coerce_count(-0.4), 0);
        assert_eq!(coerce_count(f64::NAN), 0);
    }
}
