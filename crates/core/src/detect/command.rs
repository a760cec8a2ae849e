//! Detector backed by an external command.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{DetectedEvents, DetectionError, EventDetector};
use crate::config::DetectionConfig;
use crate::steps::StepAnnotation;
use crate::tool;

/// Runs a configured detector command on the percussive track.
///
/// The command gets the configured arguments followed by the audio path and
/// must print a JSON object with `beats` and `downbeats` arrays of seconds.
/// `tempo`, `duration` and `steps` are optional.
pub struct CommandDetector {
    command: Option<PathBuf>,
    args: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DetectorOutput {
    #[serde(default)]
    beats: Vec<f64>,
    #[serde(default)]
    downbeats: Vec<f64>,
    #[serde(default)]
    tempo: Option<f64>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    steps: Vec<StepAnnotation>,
}

impl CommandDetector {
    /// Creates a detector from configuration.
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }

    /// Parses the detector's stdout.
    fn parse_output(stdout: &str) -> Result<DetectedEvents, DetectionError> {
        let output: DetectorOutput =
            serde_json::from_str(stdout.trim()).map_err(|e| DetectionError::ParseError {
                reason: e.to_string(),
            })?;

        let mut events = DetectedEvents::from_events(output.beats, output.downbeats)
            .with_steps(output.steps);
        if let Some(tempo) = output.tempo {
            events = events.with_tempo(tempo);
        }
        if let Some(duration) = output.duration {
            events = events.with_duration(duration);
        }
        Ok(events)
    }
}

#[async_trait]
impl EventDetector for CommandDetector {
    fn name(&self) -> &str {
        "command"
    }

    async fn detect(&self, audio_path: &Path) -> Result<DetectedEvents, DetectionError> {
        let command = self
            .command
            .as_ref()
            .ok_or_else(|| DetectionError::unavailable("no detector command configured"))?;

        let mut args = self.args.clone();
        args.push(tool::arg(audio_path));

        let output = tool::run(command, &args).await.map_err(|e| {
            if e.is_not_found() {
                DetectionError::unavailable(e.to_string())
            } else {
                DetectionError::Tool(e)
            }
        })?;

        let events = Self::parse_output(&String::from_utf8_lossy(&output.stdout))?;
        debug!(
            beats = events.beats.len(),
            downbeats = events.downbeats.len(),
            tempo = events.tempo_bpm,
            "Detector finished"
        );
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_minimal() {
        let events =
            CommandDetector::parse_output(r#"{"beats": [0.5, 1.0, 1.5], "downbeats": [0.5]}"#)
                .unwrap();
        assert_eq!(events.beats, vec![0.5, 1.0, 1.5]);
        assert_eq!(events.downbeats, vec![0.5]);
        assert!((events.tempo_bpm - 120.0).abs() < 1e-9);
        assert!(events.steps.is_empty());
    }

    #[test]
    fn test_parse_output_full() {
        let json = r#"{
            "beats": [0.0, 0.6],
            "downbeats": [],
            "tempo": 101.5,
            "duration": 30.0,
            "steps": [{"start": 0.0, "end": 0.6, "description": "Box Step"}]
        }"#;
        let events = CommandDetector::parse_output(json).unwrap();
        assert_eq!(events.tempo_bpm, 101.5);
        assert_eq!(events.duration_secs, Some(30.0));
        assert_eq!(events.steps[0].label, "Box Step");
    }

    #[test]
    fn test_parse_output_sanitizes_steps() {
        let json = r#"{
            "beats": [0.0, 0.5, 1.0],
            "downbeats": [],
            "steps": [
                {"start": 5.0, "end": 1.0, "description": "Backwards"},
                {"start": 0.0, "end": 3.0, "description": "Box Step"},
                {"start": 2.0, "end": 4.0, "description": "Grapevine"}
            ]
        }"#;
        let events = CommandDetector::parse_output(json).unwrap();
        assert_eq!(events.steps.len(), 1);
        assert_eq!(events.steps[0].label, "Box Step");
        assert!(events.steps.iter().all(|s| s.start < s.end));
    }

    #[test]
    fn test_parse_output_garbage() {
        let result = CommandDetector::parse_output("Traceback (most recent call last):");
        assert!(matches!(result, Err(DetectionError::ParseError { .. })));
    }

    #[tokio::test]
    async fn test_unconfigured_is_unavailable() {
        let detector = CommandDetector::new(&DetectionConfig::default());
        let err = detector.detect(Path::new("/tmp/p.wav")).await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let detector = CommandDetector::new(&DetectionConfig {
            command: Some(PathBuf::from("/nonexistent/beat-detector")),
            args: vec![],
        });
        let err = detector.detect(Path::new("/tmp/p.wav")).await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_command() {
        let detector = CommandDetector::new(&DetectionConfig {
            command: Some(PathBuf::from("sh")),
            args: vec![
                "-c".to_string(),
                r#"echo '{"beats": [1.0, 2.0, 3.0], "downbeats": [1.0]}'"#.to_string(),
            ],
        });
        let events = detector.detect(Path::new("/tmp/p.wav")).await.unwrap();
        assert_eq!(events.beats.len(), 3);
        assert!((events.tempo_bpm - 60.0).abs() < 1e-9);
    }
}
