// Application state module
// Shared, read-only state handed to every connection

use std::sync::Arc;
use tokio::sync::Notify;

use super::types::Config;
use crate::transcode::Transcoder;

/// Application state
pub struct AppState {
    pub config: Config,
    pub transcoder: Transcoder,
    pub shutdown_signal: Arc<Notify>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            transcoder: Transcoder::new(config.transcoder.clone()),
            shutdown_signal: Arc::new(Notify::new()),
        }
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_log_follows_config() {
        let mut cfg = Config::load_from("definitely-missing-config-file").unwrap();
        assert!(AppState::new(&cfg).access_log_enabled());

        cfg.logging.access_log = false;
        assert!(!AppState::new(&cfg).access_log_enabled());
    }
}
