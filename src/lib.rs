pub mod api;
pub mod config;
pub mod detection;
pub mod intake;
pub mod models;
pub mod orchestrator;
pub mod presentation;
pub mod report;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::detection::{DetectionClient, DetectionError, HttpDetectionClient, MockDetectionClient};
use crate::intake::PreviewRegistry;
use crate::orchestrator::AnalysisOrchestrator;

/// Pick the detection collaborator: HTTP when a URL is configured, mock otherwise.
pub fn build_detector(config: &AppConfig) -> Result<Arc<dyn DetectionClient>, DetectionError> {
    match &config.detection_url {
        Some(url) => {
            let client = HttpDetectionClient::new(url, config.detection_timeout)?;
            tracing::info!(url = %client.base_url(), "Using HTTP detection service");
            Ok(Arc::new(client))
        }
        None => {
            tracing::info!(
                delay_ms = config.mock_delay.as_millis() as u64,
                "No detection service configured, using mock detector"
            );
            Ok(Arc::new(MockDetectionClient::new(config.mock_delay)))
        }
    }
}

/// Wire the application state from configuration.
pub fn build_state(config: &AppConfig) -> Result<api::AppState, DetectionError> {
    let previews = PreviewRegistry::new();
    let orchestrator = AnalysisOrchestrator::new(
        config.intake.clone(),
        previews.clone(),
        build_detector(config)?,
        config.detection_timeout,
    );
    Ok(api::AppState::new(
        Arc::new(orchestrator),
        previews,
        &config.patient_id,
    ))
}

pub async fn run() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env();
    let state = build_state(&config).map_err(|e| e.to_string())?;
    let mut server = api::start_server(state, config.bind_addr).await?;

    tracing::info!(
        "Open http://{} to start an analysis",
        server.session.server_addr
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    server.shutdown();
    server.stopped().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_detector_without_url() {
        let detector = build_detector(&AppConfig::default()).unwrap();
        assert_eq!(detector.name(), "mock");
    }

    #[test]
    fn http_detector_with_url() {
        let config = AppConfig {
            detection_url: Some("http://127.0.0.1:9".into()),
            ..AppConfig::default()
        };
        let detector = build_detector(&config).unwrap();
        assert_eq!(detector.name(), "http");
    }

    #[test]
    fn state_uses_configured_patient() {
        let config = AppConfig {
            patient_id: "P-7".into(),
            ..AppConfig::default()
        };
        let state = build_state(&config).unwrap();
        assert_eq!(&*state.patient_id, "P-7");
        assert_eq!(state.orchestrator.detector_name(), "mock");
    }
}
