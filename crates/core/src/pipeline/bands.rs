//! Pipeline stages and their progress bands.

use std::fmt;

/// A `[start, end)` slice of the 0-100 progress scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageBand {
    pub start: u8,
    pub end: u8,
}

impl StageBand {
    /// Overall progress for a stage-internal fraction in `[0.0, 1.0]`.
    pub fn at(&self, fraction: f64) -> u8 {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let span = (self.end - self.start) as f64;
        self.start + (fraction * span).floor() as u8
    }
}

/// Ordered stages of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Acquire,
    Prepare,
    Separate,
    Detect,
    Steps,
    Visualize,
    ClickTracks,
    Assemble,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 8] = [
        Stage::Acquire,
        Stage::Prepare,
        Stage::Separate,
        Stage::Detect,
        Stage::Steps,
        Stage::Visualize,
        Stage::ClickTracks,
        Stage::Assemble,
    ];

    /// Reserved progress band.
    pub fn band(&self) -> StageBand {
        let (start, end) = match self {
            Stage::Acquire => (5, 15),
            Stage::Prepare => (15, 20),
            Stage::Separate => (40, 48),
            Stage::Detect => (55, 70),
            Stage::Steps => (70, 72),
            Stage::Visualize => (72, 80),
            Stage::ClickTracks => (80, 95),
            Stage::Assemble => (95, 100),
        };
        StageBand { start, end }
    }

    /// Overall progress at `fraction` through this stage.
    pub fn progress(&self, fraction: f64) -> u8 {
        self.band().at(fraction)
    }

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Acquire => "acquire",
            Stage::Prepare => "prepare",
            Stage::Separate => "separate",
            Stage::Detect => "detect",
            Stage::Steps => "steps",
            Stage::Visualize => "visualize",
            Stage::ClickTracks => "click_tracks",
            Stage::Assemble => "assemble",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
