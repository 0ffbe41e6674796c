use crate::config::{AiConfig, ServerConfig};
use crate::scan::ScanPipeline;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use veggiescan_ai::{OpenAiCompatProvider, ScanAnalyzer};
use veggiescan_storage::VeggieStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<VeggieStore>,
    pub pipeline: Arc<ScanPipeline>,
    /// `None` in mock mode
    pub analyzer: Option<Arc<dyn ScanAnalyzer>>,
    pub start_time: DateTime<Utc>,
    pub jwt_secret: Arc<String>,
    pub token_expire_secs: u64,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        store: Arc<VeggieStore>,
        analyzer: Option<Arc<dyn ScanAnalyzer>>,
        jwt_secret: String,
    ) -> Self {
        let pipeline = ScanPipeline::new(
            store.clone(),
            analyzer.clone(),
            PathBuf::from(&config.scan.dataset_dir),
        );
        Self {
            store,
            pipeline: Arc::new(pipeline),
            analyzer,
            start_time: Utc::now(),
            jwt_secret: Arc::new(jwt_secret),
            token_expire_secs: config.auth.token_expire_secs,
            config: Arc::new(config),
        }
    }
}

/// Vision model client for the configured endpoint, or `None` in mock mode.
pub fn build_analyzer(ai: &AiConfig) -> anyhow::Result<Option<Arc<dyn ScanAnalyzer>>> {
    if ai.mock_mode {
        return Ok(None);
    }
    let provider = OpenAiCompatProvider::new(
        ai.api_key.clone(),
        Some(ai.model.clone()),
        Some(ai.base_url.clone()),
        Some(ai.timeout_secs),
        Some(ai.max_tokens),
        Some(ai.temperature),
    )?
    .with_health_timeout(Duration::from_secs(ai.health_timeout_secs));
    Ok(Some(Arc::new(provider)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_mode_has_no_analyzer() {
        let ai = AiConfig {
            mock_mode: true,
            ..Default::default()
        };
        assert!(build_analyzer(&ai).unwrap().is_none());
    }

    #[test]
    fn live_mode_uses_configured_model() {
        let ai = AiConfig {
            model: "llava-1.6".to_string(),
            ..Default::default()
        };
        let analyzer = build_analyzer(&ai).unwrap().unwrap();
        assert_eq!(analyzer.model_name(), "llava-1.6");
        assert_eq!(analyzer.provider(), "openai-compatible");
    }
}
