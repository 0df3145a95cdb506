// Configuration module entry point
// Loads configuration from config.toml and FLVWAV_* environment variables

mod state;
mod types;

use std::net::SocketAddr;
use std::time::Duration;

// Re-export public types
pub use state::AppState;
pub use types::{Config, TranscoderConfig};

/// Default config file name (extension resolved by the `config` crate)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Environment variable prefix, e.g. `FLVWAV_TRANSCODER__TOOL_PATH`
const ENV_PREFIX: &str = "FLVWAV";

/// Grace period added on top of the transcoder timeout for a connection
const CONNECTION_GRACE_SECS: u64 = 5;

impl Config {
    /// Load configuration from specified file path (with or without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let defaults = TranscoderConfig::default();
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.header_read_timeout", 30)?
            .set_default("http.server_name", "flvwav/0.1")?
            .set_default("http.max_body_size", 65_536)?
            .set_default("http.transcode_path", "/transcode")?
            .set_default("http.field_name", "name")?
            .set_default(
                "transcoder.tool_path",
                defaults.tool_path.to_string_lossy().into_owned(),
            )?
            .set_default(
                "transcoder.source_root",
                defaults.source_root.to_string_lossy().into_owned(),
            )?
            .set_default(
                "transcoder.temp_root",
                defaults.temp_root.to_string_lossy().into_owned(),
            )?
            .set_default("transcoder.source_extension", defaults.source_extension)?
            .set_default("transcoder.output_extension", defaults.output_extension)?
            .set_default("transcoder.output_format", defaults.output_format)?
            .set_default("transcoder.sample_rate", i64::from(defaults.sample_rate))?
            .set_default("transcoder.channels", i64::from(defaults.channels))?
            .set_default("transcoder.timeout_secs", 120)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Upper bound on the lifetime of a single connection.
    ///
    /// Must outlast a full transcode, otherwise a slow job would be cut off
    /// by the connection timeout before its own timeout can be reported.
    pub fn connection_timeout(&self) -> Duration {
        let job = self
            .transcoder
            .timeout_secs
            .saturating_add(CONNECTION_GRACE_SECS);
        Duration::from_secs(std::cmp::max(self.performance.header_read_timeout, job))
    }

    pub const fn header_read_timeout(&self) -> Duration {
        Duration::from_secs(self.performance.header_read_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("definitely-missing-config-file").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.http.field_name, "name");
        assert_eq!(cfg.http.transcode_path, "/transcode");
        assert_eq!(cfg.transcoder, TranscoderConfig::default());
        assert_eq!(cfg.logging.access_log_format, "combined");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090

[transcoder]
tool_path = "/opt/ffmpeg/bin/ffmpeg"
source_root = "/data/rec"
temp_root = "/data/tmp"
sample_rate = 8000
timeout_secs = 10
"#
        )
        .unwrap();

        let cfg = Config::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.transcoder.tool_path.to_str(), Some("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(cfg.transcoder.source_root.to_str(), Some("/data/rec"));
        assert_eq!(cfg.transcoder.sample_rate, 8000);
        assert_eq!(cfg.transcoder.channels, 1);
        assert_eq!(cfg.transcoder.output_extension, "wav");
    }

    #[test]
    fn test_connection_timeout_covers_transcode() {
        let mut cfg = Config::load_from("definitely-missing-config-file").unwrap();
        cfg.transcoder.timeout_secs = 300;
        assert_eq!(cfg.connection_timeout(), Duration::from_secs(305));

        cfg.transcoder.timeout_secs = 1;
        assert_eq!(cfg.connection_timeout(), Duration::from_secs(30));

        cfg.transcoder.timeout_secs = u64::MAX;
        assert_eq!(cfg.connection_timeout(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_performance_defaults() {
        let cfg = Config::load_from("definitely-missing-config-file").unwrap();
        assert!(cfg.performance.keep_alive);
        assert_eq!(cfg.header_read_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.performance.max_connections, None);
    }
}
