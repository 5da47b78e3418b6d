use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_THRESHOLD: f32 = 0.30;
pub const DEFAULT_FALLBACK: &str = "Sorry, I don't have a confident answer for that. \
Please contact support or try rephrasing your question.";

/// Confidence threshold, always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Threshold(f32);

impl Threshold {
    /// Clamps into `[0, 1]`; NaN falls back to the default.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            Self(DEFAULT_THRESHOLD)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

impl From<f32> for Threshold {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Threshold {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        f32::deserialize(deserializer).map(Threshold::new)
    }
}

/// Accept/reject decision plus the text returned on rejection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceGate {
    threshold: Threshold,
    fallback: String,
}

impl ConfidenceGate {
    pub fn new(threshold: impl Into<Threshold>, fallback: impl Into<String>) -> Self {
        Self {
            threshold: threshold.into(),
            fallback: fallback.into(),
        }
    }

    pub fn decide(&self, score: f32) -> bool {
        decide(score, self.threshold)
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Copy of this gate with a different threshold, for per-request overrides.
    pub fn with_threshold(&self, threshold: impl Into<Threshold>) -> Self {
        Self {
            threshold: threshold.into(),
            fallback: self.fallback.clone(),
        }
    }
}

impl Default for ConfidenceGate {
    fn default() -> Self {
        Self::new(Threshold::default(), DEFAULT_FALLBACK)
    }
}

pub fn decide(score: f32, threshold: Threshold) -> bool {
    score >= threshold.value()
}
