//! Helpers for running external media tools.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use thiserror::Error;
use tokio::process::Command;

/// Failure to run an external tool to completion.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Binary missing from the configured path.
    #[error("{tool} not found at path: {path}")]
    NotFound { tool: String, path: PathBuf },

    /// Tool ran and exited unsuccessfully.
    #[error("{tool} exited with code {code:?}: {stderr}")]
    Failed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// I/O error while spawning or waiting.
    #[error("I/O error running {tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    /// Captured stderr of a failed run.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Whether the binary itself is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Short display name for a tool path.
pub fn tool_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Runs `program` with `args` and returns its output on success.
///
/// The child is killed if the returned future is dropped.
pub async fn run(program: &Path, args: &[String]) -> Result<Output, ToolError> {
    let tool = tool_name(program);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::NotFound {
                    tool: tool.clone(),
                    path: program.to_path_buf(),
                }
            } else {
                ToolError::Io {
                    tool: tool.clone(),
                    source: e,
                }
            }
        })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            tool,
            code: output.status.code(),
            stderr: last_lines(&String::from_utf8_lossy(&output.stderr), 8),
        });
    }

    Ok(output)
}

/// Keeps the last `n` non-empty lines of tool output.
fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

/// Path argument as a string.
pub(crate) fn arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_name() {
        assert_eq!(tool_name(Path::new("/usr/bin/ffmpeg")), "ffmpeg");
        assert_eq!(tool_name(Path::new("yt-dlp")), "yt-dlp");
    }

    #[test]
    fn test_last_lines() {
        let text = "a\n\nb\nc\n  \nd\n";
        assert_eq!(last_lines(text, 2), "c\nd");
        assert_eq!(last_lines(text, 10), "a\nb\nc\nd");
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let err = run(Path::new("/nonexistent/definitely-not-a-tool"), &[])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("definitely-not-a-tool"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_run_captures_stderr() {
        let args = vec!["-c".to_string(), "echo boom >&2; exit 3".to_string()];
        let err = run(Path::new("sh"), &args).await.unwrap_err();
        match err {
            ToolError::Failed { code, ref stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
