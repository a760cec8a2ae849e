//! Step annotations derived from beat timestamps.
//!
//! The default strategy is a cosmetic placeholder: it groups beats in fours
//! and cycles through a fixed list of step names. It does no musical
//! analysis. Other strategies plug in through [`StepStrategy`].

use serde::{Deserialize, Serialize};

/// Step names cycled by [`FixedVocabularySteps`], in order.
pub const LABELS: [&str; 10] = [
    "Basic Step",
    "Rock Step",
    "Side Step",
    "Turn Step",
    "Crossover Step",
    "Kick Ball Change",
    "Box Step",
    "Jazz Square",
    "Grapevine",
    "Heel Toe",
];

/// A labeled interval on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepAnnotation {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Step name. Serialized as `description` for the web client.
    #[serde(rename = "description")]
    pub label: String,
}

/// Maps ordered beat timestamps to ordered, non-overlapping steps.
pub trait StepStrategy: Send + Sync {
    /// Returns the name of this strategy.
    fn name(&self) -> &str;

    /// Produces step annotations for the given beats.
    fn synthesize(&self, beats: &[f64]) -> Vec<StepAnnotation>;
}

/// Four beats per step, labels taken from [`LABELS`] in rotation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedVocabularySteps;

impl FixedVocabularySteps {
    /// Fewest beats that yield any step.
    pub const MIN_BEATS: usize = 5;
}

impl StepStrategy for FixedVocabularySteps {
    fn name(&self) -> &str {
        "fixed-vocabulary"
    }

    fn synthesize(&self, beats: &[f64]) -> Vec<StepAnnotation> {
        if beats.len() < Self::MIN_BEATS {
            return Vec::new();
        }

        (0..beats.len() - 4)
            .step_by(4)
            .map(|i| StepAnnotation {
                start: beats[i],
                end: beats[i + 3],
                label: LABELS[(i / 4) % LABELS.len()].to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beats(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_too_few_beats() {
        let steps = FixedVocabularySteps;
        assert!(steps.synthesize(&[]).is_empty());
        assert!(steps.synthesize(&beats(4)).is_empty());
    }

    #[test]
    fn test_nine_beats_two_steps() {
        let steps = FixedVocabularySteps.synthesize(&beats(9));
        assert_eq!(
            steps,
            vec![
                StepAnnotation {
                    start: 0.0,
                    end: 3.0,
                    label: LABELS[0].to_string(),
                },
                StepAnnotation {
                    start: 4.0,
                    end: 7.0,
                    label: LABELS[1].to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_five_beats_one_step() {
        let steps = FixedVocabularySteps.synthesize(&[0.5, 1.0, 1.5, 2.0, 2.5]);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].start, 0.5);
        assert_eq!(steps[0].end, 2.0);
    }

    #[test]
    fn test_labels_wrap_around() {
        let steps = FixedVocabularySteps.synthesize(&beats(60));
        assert_eq!(steps.len(), 14);
        assert_eq!(steps[10].label, LABELS[0]);
        assert_eq!(steps[13].label, LABELS[3]);
    }

    #[test]
    fn test_steps_ordered_and_disjoint() {
        let steps = FixedVocabularySteps.synthesize(&beats(41));
        for step in &steps {
            assert!(step.start < step.end);
        }
        for pair in steps.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_serializes_label_as_description() {
        let step = StepAnnotation {
            start: 0.0,
            end: 1.5,
            label: "Box Step".to_string(),
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["description"], "Box Step");
        assert!(json.get("label").is_none());
    }
}
