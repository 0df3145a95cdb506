//! Path derivation and transcoder invocation
//!
//! The transcoder is started with a discrete argument vector, never through
//! a shell. [`Invocation`]'s `Display` output is only a human-readable
//! rendering for the response and the logs.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use super::identifier::Identifier;
use crate::config::TranscoderConfig;

/// Source and destination of one transcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingPaths {
    /// `<source root>/<identifier>.<source extension>`
    pub source: PathBuf,
    /// `<temp root>/<flattened identifier>.<output extension>`
    pub destination: PathBuf,
}

impl RecordingPaths {
    pub fn new(config: &TranscoderConfig, id: &Identifier) -> Self {
        let mut source = config.source_root.clone();
        let mut segments = id.segments().peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_some() {
                source.push(segment);
            } else {
                source.push(with_extension(segment, &config.source_extension));
            }
        }

        let destination = config
            .temp_root
            .join(with_extension(&id.flattened(), &config.output_extension));

        Self {
            source,
            destination,
        }
    }
}

/// Appends rather than replaces, `take.v2` keeps its `.v2`
fn with_extension(stem: &str, extension: &str) -> String {
    if extension.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{extension}")
    }
}

/// Program plus argument vector for one transcoder run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
}

impl Invocation {
    /// `<tool> -y -i <source> -vn -f <format> -ar <rate> -ac <channels> <destination>`
    pub fn extract_audio(config: &TranscoderConfig, paths: &RecordingPaths) -> Self {
        let args = vec![
            OsString::from("-y"),
            OsString::from("-i"),
            paths.source.clone().into_os_string(),
            OsString::from("-vn"),
            OsString::from("-f"),
            OsString::from(&config.output_format),
            OsString::from("-ar"),
            OsString::from(config.sample_rate.to_string()),
            OsString::from("-ac"),
            OsString::from(config.channels.to_string()),
            paths.destination.clone().into_os_string(),
        ];

        Self {
            program: config.tool_path.clone(),
            args,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn to_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(self.program());
        cmd.args(self.args());
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote(&self.program().to_string_lossy()))?;
        for arg in self.args() {
            write!(f, " {}", quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

/// POSIX-shell style single quoting for display
fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=+,@%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TranscoderConfig {
        TranscoderConfig {
            tool_path: PathBuf::from("/usr/bin/ffmpeg"),
            source_root: PathBuf::from("/srv/rec"),
            temp_root: PathBuf::from("/tmp/wav"),
            ..TranscoderConfig::default()
        }
    }

    #[test]
    fn test_nested_identifier_paths() {
        let id = Identifier::parse("user2/Sentence_1").unwrap();
        let paths = RecordingPaths::new(&test_config(), &id);
        assert_eq!(paths.source, PathBuf::from("/srv/rec/user2/Sentence_1.flv"));
        assert_eq!(paths.destination, PathBuf::from("/tmp/wav/user2-Sentence_1.wav"));
    }

    #[test]
    fn test_destination_is_single_component() {
        let id = Identifier::parse("a/b/c/d").unwrap();
        let cfg = test_config();
        let paths = RecordingPaths::new(&cfg, &id);
        assert_eq!(paths.destination.parent(), Some(cfg.temp_root.as_path()));
        assert_eq!(
            paths.destination.file_name().and_then(|n| n.to_str()),
            Some("a-b-c-d.wav")
        );
        assert!(paths.source.starts_with(&cfg.source_root));
    }

    #[test]
    fn test_extension_appended_not_replaced() {
        let id = Identifier::parse("take.v2").unwrap();
        let paths = RecordingPaths::new(&test_config(), &id);
        assert_eq!(paths.source, PathBuf::from("/srv/rec/take.v2.flv"));
        assert_eq!(paths.destination, PathBuf::from("/tmp/wav/take.v2.wav"));
    }

    #[test]
    fn test_argument_template() {
        let cfg = test_config();
        let id = Identifier::parse("user2/Sentence_1").unwrap();
        let inv = Invocation::extract_audio(&cfg, &RecordingPaths::new(&cfg, &id));

        assert_eq!(inv.program(), Path::new("/usr/bin/ffmpeg"));
        let args: Vec<_> = inv.args().iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(
            args,
            vec![
                "-y",
                "-i",
                "/srv/rec/user2/Sentence_1.flv",
                "-vn",
                "-f",
                "wav",
                "-ar",
                "16000",
                "-ac",
                "1",
                "/tmp/wav/user2-Sentence_1.wav",
            ]
        );
        assert_eq!(
            inv.to_string(),
            "/usr/bin/ffmpeg -y -i /srv/rec/user2/Sentence_1.flv -vn -f wav -ar 16000 -ac 1 /tmp/wav/user2-Sentence_1.wav"
        );
    }

    #[test]
    fn test_display_quotes_unusual_arguments() {
        assert_eq!(quote("plain/path.flv"), "plain/path.flv");
        assert_eq!(quote("with space"), "'with space'");
        assert_eq!(quote("it's"), r"'it'\''s'");
        assert_eq!(quote(""), "''");
    }
}
