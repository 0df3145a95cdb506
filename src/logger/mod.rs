//! Logger module
//!
//! Provides logging utilities for the transcode server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Transcode start/finish logging
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Set from `logging.level` at init
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    DEBUG_ENABLED.store(config.logging.is_debug(), Ordering::Relaxed);
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

pub fn debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Transcode server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!(
        "Transcode endpoint: POST {} (field '{}')",
        config.http.transcode_path, config.http.field_name
    ));
    write_info(&format!(
        "Transcoder: {}",
        config.transcoder.tool_path.display()
    ));
    write_info(&format!(
        "Source root: {}",
        config.transcoder.source_root.display()
    ));
    write_info(&format!(
        "Output root: {}",
        config.transcoder.temp_root.display()
    ));
    write_info(&format!(
        "Timeout: {}s",
        config.transcoder.timeout_secs
    ));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_shutdown(reason: &str) {
    write_info(&format!("[Shutdown] {reason}, no longer accepting connections"));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_debug(message: &str) {
    if debug_enabled() {
        write_info(&format!("[DEBUG] {message}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_transcode_started(identifier: &str, command: &str) {
    write_info(&format!("[Transcode] {identifier}: {command}"));
}

pub fn log_transcode_finished(identifier: &str, exit_code: Option<i32>, elapsed: Duration) {
    let exit = exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());
    write_info(&format!(
        "[Transcode] {identifier}: exit {exit} after {}ms",
        elapsed.as_millis()
    ));
}

/// Captured transcoder output, only at debug level
pub fn log_transcoder_output(identifier: &str, lines: &[String]) {
    if debug_enabled() {
        for line in lines {
            write_info(&format!("[DEBUG] [{identifier}] {line}"));
        }
    }
}
