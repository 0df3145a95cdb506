//! Audio extraction module
//!
//! Turns a recording identifier into a transcoder run: validate the
//! identifier, derive source and destination paths, run the external tool
//! and capture everything it prints.

pub mod command;
pub mod error;
pub mod identifier;
pub mod job;

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::config::TranscoderConfig;
use crate::logger;

pub use command::{Invocation, RecordingPaths};
pub use error::TranscodeError;
pub use identifier::Identifier;

/// Result of one transcode request
///
/// The exit code is reported but never interpreted: a failing transcoder
/// still produces a report whose lines carry its diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct TranscodeReport {
    /// Display form of the invocation
    pub command: String,
    pub destination: PathBuf,
    pub output: Vec<String>,
    pub exit_code: Option<i32>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl TranscodeReport {
    /// Plain-text body: the command line, then every captured line
    pub fn to_text(&self) -> String {
        render_lines(&self.command, &self.output)
    }
}

/// `command` followed by `lines`, each newline-terminated
pub fn render_lines(command: &str, lines: &[String]) -> String {
    let mut body = String::with_capacity(
        command.len() + 1 + lines.iter().map(|l| l.len() + 1).sum::<usize>(),
    );
    body.push_str(command);
    body.push('\n');
    for line in lines {
        body.push_str(line);
        body.push('\n');
    }
    body
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Runs the external transcoder for validated identifiers
#[derive(Debug, Clone)]
pub struct Transcoder {
    config: TranscoderConfig,
}

impl Transcoder {
    pub const fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &TranscoderConfig {
        &self.config
    }

    pub fn paths_for(&self, id: &Identifier) -> RecordingPaths {
        RecordingPaths::new(&self.config, id)
    }

    pub fn invocation_for(&self, paths: &RecordingPaths) -> Invocation {
        Invocation::extract_audio(&self.config, paths)
    }

    /// Extract the audio track of recording `id`.
    ///
    /// A transcoder that cannot be started is reported like a shell would:
    /// as a single output line, not as an error.
    pub async fn transcode(&self, id: &Identifier) -> Result<TranscodeReport, TranscodeError> {
        let paths = self.paths_for(id);
        let invocation = self.invocation_for(&paths);
        let command = invocation.to_string();

        tokio::fs::create_dir_all(&self.config.temp_root).await?;

        logger::log_transcode_started(id.as_str(), &command);

        match job::run(&invocation, self.config.timeout()).await {
            Ok(output) => {
                logger::log_transcode_finished(id.as_str(), output.exit_code, output.elapsed);
                Ok(TranscodeReport {
                    command,
                    destination: paths.destination,
                    output: output.lines,
                    exit_code: output.exit_code,
                    elapsed: output.elapsed,
                })
            }
            Err(TranscodeError::Spawn(e)) => {
                logger::log_error(&format!(
                    "Failed to start transcoder '{}': {e}",
                    self.config.tool_path.display()
                ));
                Ok(TranscodeReport {
                    command,
                    destination: paths.destination,
                    output: vec![format!("{}: {e}", self.config.tool_path.display())],
                    exit_code: None,
                    elapsed: Duration::ZERO,
                })
            }
            Err(e) => {
                logger::log_error(&format!("Transcode of '{id}' failed: {e}"));
                Err(e)
            }
        }
    }
}

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Write an executable `/bin/sh` script standing in for the transcoder
    pub fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// A transcoder that behaves like `ffmpeg -y -i <in> ... <out>`:
    /// fails when the input is missing, otherwise writes the output file.
    pub fn fake_ffmpeg(dir: &Path) -> PathBuf {
        write_script(
            dir,
            r#"in="$3"
eval out=\${$#}
echo "ffmpeg version fake"
if [ ! -f "$in" ]; then
  echo "$in: No such file or directory" >&2
  exit 1
fi
echo "Output #0, wav, to '$out':" >&2
printf 'RIFF' > "$out"
"#,
        )
    }
}
