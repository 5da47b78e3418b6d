use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::FaqEngine;
use crate::error::{FaqError, Result};
use crate::gate::ConfidenceGate;
use crate::model::Decision;
use crate::responder::FirstResponse;

pub const DEFAULT_REQUIRED_PASS_RATE: f32 = 0.85;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalCase {
    pub case_id: String,
    pub question: String,
    pub expected_decision: Decision,
    pub expected_question: Option<String>,
    pub expected_answer: Option<String>,
    pub min_similarity: Option<f32>,
}

/// Absent → `None`, null → `Some(None)`, `"text"` → `Some(Some("text"))`.
fn deserialize_optional_nullable_string<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let val: Option<String> = Option::deserialize(deserializer)?;
    Ok(Some(val))
}

/// Accepts either an explicit `expected_decision` or an `expected_answer`
/// whose nullness implies the decision.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvalCase {
    pub case_id: String,
    pub question: Option<String>,
    pub input_question: Option<String>,
    pub expected_decision: Option<Decision>,
    pub expected_question: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable_string")]
    pub expected_answer: Option<Option<String>>,
    pub min_similarity: Option<f32>,
}

impl RawEvalCase {
    pub fn into_eval_case(self) -> Result<EvalCase> {
        let Some(question) = self.question.or(self.input_question) else {
            return Err(FaqError::InvalidEvalCase {
                case_id: self.case_id,
                reason: "missing 'question' or 'input_question'",
            });
        };

        let expected_answer = self.expected_answer.clone().flatten();
        let expected_decision = match (self.expected_decision, &self.expected_answer) {
            (Some(decision), _) => decision,
            (None, Some(answer)) => Decision::from(answer.is_some()),
            (None, None) => {
                return Err(FaqError::InvalidEvalCase {
                    case_id: self.case_id,
                    reason: "needs 'expected_decision' or 'expected_answer'",
                })
            }
        };

        Ok(EvalCase {
            case_id: self.case_id,
            question,
            expected_decision,
            expected_question: self.expected_question,
            expected_answer,
            min_similarity: self.min_similarity,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalOutcome {
    pub case_id: String,
    pub passed: bool,
    pub actual_decision: Decision,
    pub actual_question: String,
    pub actual_answer: String,
    pub score: f32,
    pub latency_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f32,
    pub outcomes: Vec<EvalOutcome>,
}

impl EvalSummary {
    pub fn meets(&self, required_pass_rate: f32) -> bool {
        self.pass_rate >= required_pass_rate
    }

    pub fn mean_latency_ms(&self) -> f64 {
        let total: f64 = self.outcomes.iter().map(|o| o.latency_ms).sum();
        total / self.outcomes.len().max(1) as f64
    }
}

pub struct CaseExpectation;

impl CaseExpectation {
    pub fn matches(case: &EvalCase, outcome: &EvalOutcome) -> bool {
        if case.expected_decision != outcome.actual_decision {
            return false;
        }

        if let Some(expected) = &case.expected_question {
            if outcome.actual_question != *expected {
                return false;
            }
        }

        if let Some(expected) = &case.expected_answer {
            if outcome.actual_answer != *expected {
                return false;
            }
        }

        if let Some(min_sim) = case.min_similarity {
            if outcome.score < min_sim {
                return false;
            }
        }

        true
    }
}

/// Runs every case against the shared engine, in parallel.
pub fn evaluate_cases(
    engine: &FaqEngine,
    cases: &[EvalCase],
    gate: &ConfidenceGate,
) -> EvalSummary {
    let outcomes: Vec<EvalOutcome> = cases
        .par_iter()
        .map(|case| {
            let start = Instant::now();
            let reply = engine.answer_with(&case.question, gate, &mut FirstResponse);
            let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

            let mut outcome = EvalOutcome {
                case_id: case.case_id.clone(),
                passed: false,
                actual_decision: reply.matched.decision(),
                actual_question: reply.matched_question,
                actual_answer: reply.answer,
                score: reply.matched.score,
                latency_ms,
            };
            outcome.passed = CaseExpectation::matches(case, &outcome);
            outcome
        })
        .collect();

    let total = outcomes.len();
    let passed = outcomes.iter().filter(|o| o.passed).count();
    let failed = total.saturating_sub(passed);
    let pass_rate = if total == 0 {
        0.0
    } else {
        passed as f32 / total as f32
    };

    EvalSummary {
        total,
        passed,
        failed,
        pass_rate,
        outcomes,
    }
}
