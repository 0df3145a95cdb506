//! Transcoder process execution
//!
//! Runs one [`Invocation`] to completion, merging stdout and stderr into a
//! single ordered list of lines. Lines from the same stream keep their
//! order; lines from different streams are interleaved as they arrive.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use super::command::Invocation;
use super::error::TranscodeError;
use crate::logger;

/// How long to keep collecting output after a timed out child was killed
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Captured result of a finished process
#[derive(Debug, Clone)]
pub struct JobOutput {
    pub lines: Vec<String>,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
}

/// Spawn the invocation and wait for it, at most `timeout`.
///
/// On timeout the child is killed and [`TranscodeError::Timeout`] carries
/// whatever output was captured so far.
pub async fn run(invocation: &Invocation, timeout: Duration) -> Result<JobOutput, TranscodeError> {
    let started = Instant::now();

    let mut child = invocation
        .to_command()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(TranscodeError::Spawn)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    if let Some(stdout) = child.stdout.take() {
        spawn_forwarder(stdout, tx.clone(), "stdout");
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_forwarder(stderr, tx.clone(), "stderr");
    }
    // Channel closes once both forwarders hit EOF
    drop(tx);

    let mut lines = Vec::new();
    let wait = async {
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        child.wait().await
    };
    let result = tokio::time::timeout(timeout, wait).await;

    match result {
        Ok(status) => {
            let status = status?;
            Ok(JobOutput {
                lines,
                exit_code: status.code(),
                elapsed: started.elapsed(),
            })
        }
        Err(_) => {
            if let Err(e) = child.start_kill() {
                logger::log_warning(&format!("Failed to kill timed out transcoder: {e}"));
            }
            let _ = child.wait().await;
            // Forwarders flush their unterminated tail once the pipes hit EOF.
            // A grandchild still holding a pipe open only costs the grace period.
            while let Ok(Some(line)) = tokio::time::timeout(DRAIN_GRACE, rx.recv()).await {
                lines.push(line);
            }
            Err(TranscodeError::Timeout {
                command: invocation.to_string(),
                after: timeout,
                partial: lines,
            })
        }
    }
}

fn spawn_forwarder<R>(reader: R, tx: mpsc::UnboundedSender<String>, stream: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = forward_lines(reader, &tx).await {
            logger::log_warning(&format!("Failed to read transcoder {stream}: {e}"));
        }
    });
}

async fn forward_lines<R>(reader: R, tx: &mpsc::UnboundedSender<String>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        for line in split_lines(&buf) {
            if tx.send(line).is_err() {
                // Receiver gone, nobody is listening anymore
                return Ok(());
            }
        }
    }
}

/// Split a raw chunk on `\n` and `\r`, dropping empty pieces.
///
/// ffmpeg redraws its progress line with bare carriage returns; each
/// redraw becomes its own line.
fn split_lines(chunk: &[u8]) -> impl Iterator<Item = String> + '_ {
    chunk
        .split(|b| *b == b'\n' || *b == b'\r')
        .filter(|piece| !piece.is_empty())
        .map(|piece| String::from_utf8_lossy(piece).into_owned())
}
