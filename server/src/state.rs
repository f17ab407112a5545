//! Application state for the inference server
//!
//! The model is loaded once at startup and shared across requests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use oncolens::backend::DefaultBackend;
use oncolens::inference::Predictor;
use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the model checkpoint on disk
    pub model_path: PathBuf,
    /// URL the model is fetched from if the file is absent
    pub model_url: Option<String>,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/cancer_classifier.mpk"),
            model_url: None,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Shared application state
///
/// Burn modules lazily initialize internal tensors, so the predictor is not
/// `Sync` on its own; the mutex makes the state shareable across handlers.
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// The loaded model, ready for inference
    pub predictor: Mutex<Predictor<DefaultBackend>>,
    /// Server start time
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig, predictor: Predictor<DefaultBackend>) -> Self {
        Self {
            config,
            predictor: Mutex::new(predictor),
            started_at: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_shareable<T: Send + Sync + 'static>() {}

    #[test]
    fn test_state_is_shareable_across_handlers() {
        // Axum handlers require the shared state to be Send + Sync
        assert_shareable::<SharedState>();
    }
}
