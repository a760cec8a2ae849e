//! Detected event lists and tempo estimation.

use serde::{Deserialize, Serialize};

use crate::steps::StepAnnotation;

/// Tempo reported when there are too few beats to estimate one.
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// Output of a detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEvents {
    /// Beat times in seconds, strictly increasing.
    pub beats: Vec<f64>,
    /// Downbeat times in seconds, strictly increasing.
    pub downbeats: Vec<f64>,
    /// Tempo in BPM.
    pub tempo_bpm: f64,
    /// Step annotations supplied by the detector, if any.
    pub steps: Vec<StepAnnotation>,
    /// Track duration as seen by the detector.
    pub duration_secs: Option<f64>,
}

impl DetectedEvents {
    /// Builds events from raw lists, estimating the tempo from the beats.
    ///
    /// Negative and non-finite times are dropped and both lists are sorted
    /// and deduplicated.
    pub fn from_events(beats: Vec<f64>, downbeats: Vec<f64>) -> Self {
        let beats = clean(beats);
        let downbeats = clean(downbeats);
        let tempo_bpm = estimate_tempo(&beats);
        Self {
            beats,
            downbeats,
            tempo_bpm,
            steps: Vec::new(),
            duration_secs: None,
        }
    }

    /// No events at the default tempo.
    pub fn empty() -> Self {
        Self::from_events(Vec::new(), Vec::new())
    }

    /// Overrides the estimated tempo.
    pub fn with_tempo(mut self, bpm: f64) -> Self {
        if bpm.is_finite() && bpm > 0.0 {
            self.tempo_bpm = bpm;
        }
        self
    }

    /// Sets detector-provided steps.
    ///
    /// Intervals that are not finite, empty or reversed are dropped, the rest
    /// are sorted by start, and any interval overlapping the previous kept one
    /// is dropped.
    pub fn with_steps(mut self, steps: Vec<StepAnnotation>) -> Self {
        self.steps = clean_steps(steps);
        self
    }

    /// Sets the detected duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            self.duration_secs = Some(secs);
        }
        self
    }
}

fn clean(mut times: Vec<f64>) -> Vec<f64> {
    times.retain(|t| t.is_finite() && *t >= 0.0);
    times.sort_by(|a, b| a.total_cmp(b));
    times.dedup();
    times
}

fn clean_steps(mut steps: Vec<StepAnnotation>) -> Vec<StepAnnotation> {
    steps.retain(|s| s.start.is_finite() && s.end.is_finite() && s.start >= 0.0 && s.start < s.end);
    steps.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut kept: Vec<StepAnnotation> = Vec::with_capacity(steps.len());
    for step in steps {
        if kept.last().is_some_and(|prev| step.start < prev.end) {
            continue;
        }
        kept.push(step);
    }
    kept
}

/// Tempo as 60 / median inter-beat interval.
///
/// Returns [`DEFAULT_TEMPO_BPM`] with fewer than two beats.
pub fn estimate_tempo(beats: &[f64]) -> f64 {
    let mut intervals: Vec<f64> = beats
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0)
        .collect();
    if intervals.is_empty() {
        return DEFAULT_TEMPO_BPM;
    }

    intervals.sort_by(|a, b| a.total_cmp(b));
    let mid = intervals.len() / 2;
    let median = if intervals.len() % 2 == 0 {
        (intervals[mid - 1] + intervals[mid]) / 2.0
    } else {
        intervals[mid]
    };
    60.0 / median
}
