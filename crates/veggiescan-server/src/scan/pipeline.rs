use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use veggiescan_ai::{content_fingerprint, ScanAnalyzer};
use veggiescan_common::types::User;
use veggiescan_storage::VeggieStore;

use crate::error::AppError;
use crate::scan::archive::archive_image;
use crate::scan::strategy::{
    CacheLookup, LiveAnalysis, MockAnalysis, ResultSource, ScanContext, ScanOutcome,
    ScanStrategy,
};

/// Hash, run the fallback chain, persist fresh results and archive admin
/// uploads.
pub struct ScanPipeline {
    store: Arc<VeggieStore>,
    strategies: Vec<Box<dyn ScanStrategy>>,
    dataset_dir: PathBuf,
}

impl ScanPipeline {
    /// Cache, then the vision model when one is configured, then the mock.
    pub fn new(
        store: Arc<VeggieStore>,
        analyzer: Option<Arc<dyn ScanAnalyzer>>,
        dataset_dir: PathBuf,
    ) -> Self {
        let mut strategies: Vec<Box<dyn ScanStrategy>> =
            vec![Box::new(CacheLookup::new(store.clone()))];
        if let Some(analyzer) = analyzer {
            strategies.push(Box::new(LiveAnalysis::new(analyzer)));
        }
        strategies.push(Box::new(MockAnalysis));
        Self::with_strategies(store, strategies, dataset_dir)
    }

    pub fn with_strategies(
        store: Arc<VeggieStore>,
        strategies: Vec<Box<dyn ScanStrategy>>,
        dataset_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            strategies,
            dataset_dir,
        }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, user: &User, image: &[u8]) -> Result<ScanOutcome, AppError> {
        if image.is_empty() {
            return Err(AppError::InvalidInput("No image uploaded".to_string()));
        }

        let image_hash = content_fingerprint(image);
        let ctx = ScanContext {
            image,
            image_hash: &image_hash,
            analyzed_at: Utc::now(),
        };

        let mut outcome = None;
        for strategy in &self.strategies {
            if let Some(found) = strategy.attempt(&ctx).await {
                outcome = Some(found);
                break;
            }
        }
        let outcome = outcome.ok_or_else(|| {
            AppError::Internal("Error processing image: no scan strategy produced a result".to_string())
        })?;

        if outcome.source != ResultSource::Cache {
            if let Err(e) = self
                .store
                .insert_scan_record(&user.id, &image_hash, &outcome.result)
                .await
            {
                tracing::error!(
                    user_id = %user.id,
                    image_hash = %image_hash,
                    error = %e,
                    "Failed to persist scan record"
                );
            }
        }

        if user.is_admin {
            match archive_image(&self.dataset_dir, &image_hash, image).await {
                Ok(path) => tracing::debug!(path = %path.display(), "Archived admin upload"),
                Err(e) => tracing::warn!(error = %e, "Failed to archive admin upload"),
            }
        }

        tracing::info!(
            user_id = %user.id,
            image_hash = %image_hash,
            source = outcome.source.as_str(),
            vegetable = %outcome.result.vegetable_name,
            safe = outcome.result.safe_to_eat,
            "Scan completed"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::archive::archive_path;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct Silent;

    #[async_trait]
    impl ScanStrategy for Silent {
        fn name(&self) -> &'static str {
            "silent"
        }
        async fn attempt(&self, _ctx: &ScanContext<'_>) -> Option<ScanOutcome> {
            None
        }
    }

    async fn setup() -> (TempDir, Arc<VeggieStore>, User, User) {
        veggiescan_common::id::init(1, 1);
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}/t.db?mode=rwc", dir.path().display());
        let store = Arc::new(VeggieStore::new(&url, dir.path()).await.unwrap());
        let user = store.create_user("u@x.io", "u", "h", false).await.unwrap();
        let admin = store.create_user("a@x.io", "a", "h", true).await.unwrap();
        (dir, store, user, admin)
    }

    #[tokio::test]
    async fn mock_only_chain_is_deterministic_and_cached() {
        let (dir, store, user, _) = setup().await;
        let pipeline = ScanPipeline::new(store.clone(), None, dir.path().join("dataset"));
        assert_eq!(pipeline.strategy_names(), vec!["cache", "mock"]);

        let first = pipeline.run(&user, b"abc").await.unwrap();
        assert_eq!(first.source, ResultSource::Mock);
        let second = pipeline.run(&user, b"abc").await.unwrap();
        assert_eq!(second.source, ResultSource::Cache);
        assert!(second.result.same_verdict(&first.result));
        assert_eq!(second.result.confidence, 90);

        // Cache hits are not stored again
        assert_eq!(store.count_scan_records(None, None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_image_is_invalid_input() {
        let (dir, store, user, _) = setup().await;
        let pipeline = ScanPipeline::new(store, None, dir.path().join("dataset"));
        let err = pipeline.run(&user, b"").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn exhausted_chain_is_internal_error() {
        let (dir, store, user, _) = setup().await;
        let pipeline =
            ScanPipeline::with_strategies(store, vec![Box::new(Silent)], dir.path().join("d"));
        let err = pipeline.run(&user, b"abc").await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn only_admin_uploads_are_archived() {
        let (dir, store, user, admin) = setup().await;
        let dataset = dir.path().join("dataset");
        let pipeline = ScanPipeline::new(store, None, dataset.clone());

        pipeline.run(&user, b"user-bytes").await.unwrap();
        assert!(!archive_path(&dataset, &content_fingerprint(b"user-bytes")).exists());

        pipeline.run(&admin, b"admin-bytes").await.unwrap();
        // Cache hit path archives too
        pipeline.run(&admin, b"user-bytes").await.unwrap();
        assert!(archive_path(&dataset, &content_fingerprint(b"admin-bytes")).exists());
        assert!(archive_path(&dataset, &content_fingerprint(b"user-bytes")).exists());
    }

    #[tokio::test]
    async fn persist_failure_does_not_fail_the_scan() {
        let (dir, store, user, _) = setup().await;
        let pipeline = ScanPipeline::new(store.clone(), None, dir.path().join("dataset"));
        // Owner row does not exist, so the foreign key rejects the insert
        let ghost = User {
            id: "ghost".to_string(),
            ..user
        };
        let out = pipeline.run(&ghost, b"abc").await.unwrap();
        assert_eq!(out.source, ResultSource::Mock);
        assert_eq!(store.count_scan_records(None, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn archive_failure_does_not_fail_the_scan() {
        let (dir, store, _, admin) = setup().await;
        let blocker = dir.path().join("dataset");
        std::fs::write(&blocker, b"not a dir").unwrap();
        let pipeline = ScanPipeline::new(store, None, blocker);
        assert!(pipeline.run(&admin, b"abc").await.is_ok());
    }
}
