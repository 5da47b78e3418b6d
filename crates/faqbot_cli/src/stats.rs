use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use faqbot_core::InteractionRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct LogStats {
    pub total: usize,
    pub accepted: usize,
    pub mean_score: f32,
    /// Accepted matches per question, most frequent first.
    pub top_questions: Vec<(String, usize)>,
}

impl LogStats {
    pub fn acceptance_rate(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.accepted as f32 / self.total as f32
        }
    }
}

pub fn read_log(path: &Path) -> Result<Vec<InteractionRecord>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("open {}", path.display()))?;
    let mut records = Vec::new();
    for (row, record) in reader.deserialize::<InteractionRecord>().enumerate() {
        records.push(record.with_context(|| format!("parse log row {}", row + 1))?);
    }
    Ok(records)
}

pub fn summarize(records: &[InteractionRecord], top: usize) -> LogStats {
    let total = records.len();
    let accepted = records.iter().filter(|r| r.accepted).count();
    let mean_score = if total == 0 {
        0.0
    } else {
        records.iter().map(|r| r.score).sum::<f32>() / total as f32
    };

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in records.iter().filter(|r| r.accepted) {
        *counts.entry(r.matched_question.as_str()).or_insert(0) += 1;
    }
    let mut top_questions: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(q, n)| (q.to_string(), n))
        .collect();
    top_questions.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_questions.truncate(top);

    LogStats {
        total,
        accepted,
        mean_score,
        top_questions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(question: &str, score: f32, accepted: bool) -> InteractionRecord {
        InteractionRecord {
            timestamp: "2026-01-01T00:00:00Z".parse().expect("timestamp"),
            raw_query: question.to_string(),
            matched_intent: None,
            matched_question: question.to_string(),
            matched_answer: "a".to_string(),
            score,
            accepted,
        }
    }

    #[test]
    fn counts_accepted_questions() {
        let records = vec![
            record("b", 1.0, true),
            record("a", 0.8, true),
            record("b", 0.6, true),
            record("c", 0.0, false),
        ];
        let stats = summarize(&records, 5);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.accepted, 3);
        assert!((stats.acceptance_rate() - 0.75).abs() < 1e-6);
        assert!((stats.mean_score - 0.6).abs() < 1e-6);
        assert_eq!(
            stats.top_questions,
            vec![("b".to_string(), 2), ("a".to_string(), 1)]
        );
    }

    #[test]
    fn empty_log_has_zero_rates() {
        let stats = summarize(&[], 3);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.acceptance_rate(), 0.0);
        assert!(stats.top_questions.is_empty());
    }
}
