use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::intake::IntakePolicy;

/// Application-level constants
pub const APP_NAME: &str = "UrineVision";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Label stamped on generated reports as the performing technician.
pub const TECHNICIAN_LABEL: &str = "AI System v1.0";

/// Prefix for every environment variable read by `AppConfig::from_env`.
const ENV_PREFIX: &str = "URINEVISION_";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3001";
const DEFAULT_DETECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MOCK_DELAY_MS: u64 = 3000;
const DEFAULT_PATIENT_ID: &str = "P2025-001234";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,urinevision_lib=debug,tower_http=info"
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Base URL of the external detection service. `None` selects the mock.
    pub detection_url: Option<String>,
    pub detection_timeout: Duration,
    pub mock_delay: Duration,
    pub intake: IntakePolicy,
    /// Patient identifier used for the default report case.
    pub patient_id: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 3001))),
            detection_url: None,
            detection_timeout: Duration::from_secs(DEFAULT_DETECTION_TIMEOUT_SECS),
            mock_delay: Duration::from_millis(DEFAULT_MOCK_DELAY_MS),
            intake: IntakePolicy::default(),
            patient_id: DEFAULT_PATIENT_ID.to_string(),
        }
    }
}

impl AppConfig {
    /// Build configuration from `URINEVISION_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unparseable values fall back to the default and are logged.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(addr) = parse_or_warn::<SocketAddr>("BIND_ADDR", get("BIND_ADDR")) {
            config.bind_addr = addr;
        }
        config.detection_url = get("DETECTION_URL").map(|u| u.trim_end_matches('/').to_string());
        if let Some(secs) = parse_or_warn::<u64>("DETECTION_TIMEOUT_SECS", get("DETECTION_TIMEOUT_SECS")) {
            config.detection_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(ms) = parse_or_warn::<u64>("MOCK_DELAY_MS", get("MOCK_DELAY_MS")) {
            config.mock_delay = Duration::from_millis(ms);
        }
        if let Some(mb) = parse_or_warn::<u64>("MAX_FILE_MB", get("MAX_FILE_MB")) {
            match mb.checked_mul(1024 * 1024) {
                Some(bytes) => config.intake.max_file_size = bytes,
                None => tracing::warn!(
                    variable = %format!("{ENV_PREFIX}MAX_FILE_MB"),
                    value = mb,
                    "File size limit out of range, using default"
                ),
            }
        }
        if let Some(max) = parse_or_warn::<usize>("MAX_IMAGES", get("MAX_IMAGES")) {
            config.intake.max_images = max;
        }
        if let Some(patient_id) = get("PATIENT_ID") {
            config.patient_id = patient_id;
        }

        config
    }
}

fn parse_or_warn<T: FromStr>(name: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(
                variable = %format!("{ENV_PREFIX}{name}"),
                value = %raw,
                "Ignoring invalid configuration value, using default"
            );
            None
        }
    }
}
