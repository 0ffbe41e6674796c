use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use veggiescan_ai::mock::mock_result;
use veggiescan_ai::{normalize, ScanAnalyzer, CACHED_CONFIDENCE};
use veggiescan_common::types::ScanResult;
use veggiescan_storage::VeggieStore;

/// Which link of the fallback chain produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    Cache,
    Live,
    Mock,
}

impl ResultSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultSource::Cache => "cache",
            ResultSource::Live => "live",
            ResultSource::Mock => "mock",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub result: ScanResult,
    pub source: ResultSource,
}

/// Inputs shared by every strategy for one upload.
pub struct ScanContext<'a> {
    pub image: &'a [u8],
    pub image_hash: &'a str,
    pub analyzed_at: DateTime<Utc>,
}

/// One link in the fallback chain. `None` hands over to the next link.
#[async_trait]
pub trait ScanStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, ctx: &ScanContext<'_>) -> Option<ScanOutcome>;
}

/// Reuse the first stored verdict for identical bytes.
pub struct CacheLookup {
    store: Arc<VeggieStore>,
}

impl CacheLookup {
    pub fn new(store: Arc<VeggieStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ScanStrategy for CacheLookup {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn attempt(&self, ctx: &ScanContext<'_>) -> Option<ScanOutcome> {
        let record = match self.store.find_scan_by_hash(ctx.image_hash).await {
            Ok(record) => record?,
            Err(e) => {
                tracing::warn!(image_hash = %ctx.image_hash, error = %e, "Cache lookup failed");
                return None;
            }
        };
        tracing::info!(
            image_hash = %ctx.image_hash,
            record_id = %record.id,
            "Cache hit"
        );
        Some(ScanOutcome {
            result: ScanResult {
                vegetable_name: record.vegetable_name,
                safe_to_eat: record.safe_to_eat,
                disease_name: record.disease_name,
                recommendation: record.recommendation,
                confidence: CACHED_CONFIDENCE,
                analysis_date: ctx.analyzed_at,
            },
            source: ResultSource::Cache,
        })
    }
}

/// Ask the vision model and normalize whatever text it returns.
pub struct LiveAnalysis {
    analyzer: Arc<dyn ScanAnalyzer>,
}

impl LiveAnalysis {
    pub fn new(analyzer: Arc<dyn ScanAnalyzer>) -> Self {
        Self { analyzer }
    }
}

#[async_trait]
impl ScanStrategy for LiveAnalysis {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn attempt(&self, ctx: &ScanContext<'_>) -> Option<ScanOutcome> {
        let content = match self.analyzer.analyze(ctx.image).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    provider = %self.analyzer.provider(),
                    model = %self.analyzer.model_name(),
                    error = %e,
                    "Vision model unavailable, falling back"
                );
                return None;
            }
        };
        if content.trim().is_empty() {
            tracing::warn!(
                provider = %self.analyzer.provider(),
                "Vision model returned blank content, falling back"
            );
            return None;
        }
        Some(ScanOutcome {
            result: normalize(Some(&content), ctx.image, ctx.analyzed_at),
            source: ResultSource::Live,
        })
    }
}

/// Last resort: deterministic verdict keyed by the image bytes.
pub struct MockAnalysis;

#[async_trait]
impl ScanStrategy for MockAnalysis {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn attempt(&self, ctx: &ScanContext<'_>) -> Option<ScanOutcome> {
        Some(ScanOutcome {
            result: mock_result(ctx.image, ctx.analyzed_at),
            source: ResultSource::Mock,
        })
    }
}
