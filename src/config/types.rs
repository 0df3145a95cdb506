// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub transcoder: TranscoderConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

impl LoggingConfig {
    pub fn is_debug(&self) -> bool {
        matches!(self.level.to_ascii_lowercase().as_str(), "debug" | "trace")
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// HTTP/1.1 persistent connections
    pub keep_alive: bool,
    /// Seconds a client may take to send a request head
    pub header_read_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
    /// Path the transcode handler is mounted on
    pub transcode_path: String,
    /// Form field carrying the recording identifier
    pub field_name: String,
    /// Serve `/healthz` and `/readyz`
    #[serde(default = "default_health_enabled")]
    pub health_enabled: bool,
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_enabled() -> bool {
    true
}

/// External transcoder configuration
///
/// Handed to [`crate::transcode::Transcoder::new`]; nothing in the
/// transcode path reads global state.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TranscoderConfig {
    /// Location of the ffmpeg-compatible executable
    pub tool_path: PathBuf,
    /// Directory holding the recorded `.flv` files
    pub source_root: PathBuf,
    /// Directory receiving extracted audio
    pub temp_root: PathBuf,
    pub source_extension: String,
    pub output_extension: String,
    /// Value passed to `-f`
    pub output_format: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub timeout_secs: u64,
}

impl TranscoderConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            tool_path: PathBuf::from("/usr/bin/ffmpeg"),
            source_root: PathBuf::from("/var/lib/flvwav/recordings"),
            temp_root: PathBuf::from("/tmp/flvwav"),
            source_extension: "flv".to_string(),
            output_extension: "wav".to_string(),
            output_format: "wav".to_string(),
            sample_rate: 16_000,
            channels: 1,
            timeout_secs: 120,
        }
    }
}
