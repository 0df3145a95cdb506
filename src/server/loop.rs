// Server loop module
// Accepts connections until a shutdown signal arrives, then drains

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// How often the drain phase re-checks the connection counter
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Accept connections until `state.shutdown_signal` fires.
///
/// After shutdown the listener is closed and in-flight requests get up to
/// one connection timeout to finish.
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = state.shutdown_signal.notified() => {
                logger::log_shutdown("Shutdown signal received");
                break;
            }
        }
    }

    drop(listener);
    drain_connections(&active_connections, state.config.connection_timeout()).await;
    Ok(())
}

/// Wait until no connection is active or `deadline` passes
async fn drain_connections(active_connections: &AtomicUsize, deadline: Duration) {
    let started = tokio::time::Instant::now();
    loop {
        let active = active_connections.load(Ordering::SeqCst);
        if active == 0 {
            logger::log_shutdown("All connections closed");
            return;
        }
        if started.elapsed() >= deadline {
            logger::log_warning(&format!(
                "Shutting down with {active} connection(s) still active"
            ));
            return;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_reusable_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn test_serves_then_shuts_down() {
        let mut cfg = Config::load_from("definitely-missing-config-file").unwrap();
        cfg.logging.access_log = false;
        let state = Arc::new(AppState::new(&cfg));
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                let server = tokio::task::spawn_local(start_server_loop(
                    listener,
                    Arc::clone(&state),
                    Arc::new(AtomicUsize::new(0)),
                ));

                let mut stream = TcpStream::connect(addr).await.unwrap();
                stream
                    .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
                    .await
                    .unwrap();
                let mut response = String::new();
                stream.read_to_string(&mut response).await.unwrap();
                assert!(response.starts_with("HTTP/1.1 200"), "{response}");
                assert!(response.ends_with("ok\n"), "{response}");

                state.shutdown_signal.notify_one();
                tokio::time::timeout(Duration::from_secs(5), server)
                    .await
                    .unwrap()
                    .unwrap()
                    .unwrap();
            })
            .await;
    }

    #[tokio::test]
    async fn test_incomplete_request_head_is_dropped() {
        let mut cfg = Config::load_from("definitely-missing-config-file").unwrap();
        cfg.logging.access_log = false;
        cfg.performance.header_read_timeout = 1;
        let state = Arc::new(AppState::new(&cfg));
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                let server = tokio::task::spawn_local(start_server_loop(
                    listener,
                    Arc::clone(&state),
                    Arc::new(AtomicUsize::new(0)),
                ));

                let mut stream = TcpStream::connect(addr).await.unwrap();
                stream.write_all(b"GET /healthz HTTP/1.1\r\n").await.unwrap();

                let mut response = String::new();
                let closed = tokio::time::timeout(
                    Duration::from_secs(10),
                    stream.read_to_string(&mut response),
                )
                .await;
                assert!(closed.is_ok(), "connection left open");
                assert!(!response.starts_with("HTTP/1.1 200"), "{response}");

                state.shutdown_signal.notify_one();
                tokio::time::timeout(Duration::from_secs(5), server)
                    .await
                    .unwrap()
                    .unwrap()
                    .unwrap();
            })
            .await;
    }

    #[tokio::test]
    async fn test_drain_returns_when_idle() {
        let counter = AtomicUsize::new(0);
        tokio::time::timeout(
            Duration::from_secs(1),
            drain_connections(&counter, Duration::from_secs(60)),
        )
        .await
        .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_gives_up_at_deadline() {
        let counter = AtomicUsize::new(2);
        drain_connections(&counter, Duration::from_secs(3)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
