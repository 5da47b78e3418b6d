use serde::{Deserialize, Serialize};

/// One known question with its stored answer.
///
/// Missing fields deserialize to empty strings so a partially bad corpus row
/// never stops the corpus from loading.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CorpusEntry {
    #[serde(default)]
    pub question: String,
    #[serde(default, alias = "response")]
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

impl CorpusEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            intent: None,
        }
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Hit,
    Miss,
}

impl From<bool> for Decision {
    fn from(accepted: bool) -> Self {
        if accepted {
            Decision::Hit
        } else {
            Decision::Miss
        }
    }
}

/// Best corpus entry for one query and whether the gate accepted it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub best_index: usize,
    pub score: f32,
    pub accepted: bool,
}

impl MatchResult {
    pub fn decision(&self) -> Decision {
        Decision::from(self.accepted)
    }
}

/// What the engine hands back to the front end for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub answer: String,
    pub matched: MatchResult,
    pub matched_question: String,
    pub matched_intent: Option<String>,
}

impl Reply {
    pub fn accepted(&self) -> bool {
        self.matched.accepted
    }

    pub fn score(&self) -> f32 {
        self.matched.score
    }
}
