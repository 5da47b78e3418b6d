use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::analyzer::Analyzer;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::gate::ConfidenceGate;
use crate::index::{vectorize, CorpusIndex, SparseVector};
use crate::interaction_log::{InteractionRecord, InteractionSink};
use crate::model::{MatchResult, Reply};
use crate::responder::{FirstResponse, ResponsePicker};
use crate::retrieval::match_query;
use crate::storage::{load_artifact, load_corpus, Corpus, ModelArtifact, ARTIFACT_FORMAT_VERSION};
use crate::vocabulary::VocabularyModel;

/// Immutable matching engine: analyzer, vocabulary, indexed corpus and gate.
///
/// Built once at startup and shared by reference; every query runs the same
/// synchronous normalize → vectorize → match → gate pipeline without
/// touching engine state.
#[derive(Debug)]
pub struct FaqEngine {
    analyzer: Analyzer,
    vocabulary: VocabularyModel,
    index: CorpusIndex,
    responses: BTreeMap<String, Vec<String>>,
    gate: ConfidenceGate,
    group_by_intent: bool,
}

impl FaqEngine {
    /// Scans the corpus and builds vocabulary and document vectors.
    pub fn build(corpus: Corpus, config: &EngineConfig) -> Result<Self> {
        let analyzer = Analyzer::new(config.analyzer_settings())?;
        let questions: Vec<&str> = corpus
            .entries
            .iter()
            .map(|e| e.question.as_str())
            .collect();
        let vocabulary = VocabularyModel::from_texts(&questions, &analyzer)?;
        let index = CorpusIndex::build(corpus.entries, &vocabulary, &analyzer)?;

        info!(
            entries = index.len(),
            terms = vocabulary.len(),
            "engine built from corpus"
        );
        Ok(Self {
            analyzer,
            vocabulary,
            index,
            responses: corpus.responses,
            gate: config.gate(),
            group_by_intent: config.group_by_intent,
        })
    }

    /// Reuses a stored model instead of rescanning the corpus.
    ///
    /// The analyzer settings stored with the model win over the configured
    /// ones so queries are tokenized exactly as the corpus was.
    pub fn from_artifact(
        corpus: Corpus,
        artifact: ModelArtifact,
        config: &EngineConfig,
    ) -> Result<Self> {
        artifact.check_consistency(corpus.len())?;
        if artifact.analyzer != config.analyzer_settings() {
            warn!("model was built with different analyzer settings; using the model's");
        }

        let analyzer = Analyzer::new(artifact.analyzer)?;
        let index = CorpusIndex::from_parts(corpus.entries, artifact.vectors)?;

        info!(
            entries = index.len(),
            terms = artifact.vocabulary.len(),
            built_at = %artifact.built_at,
            "engine loaded from model artifact"
        );
        Ok(Self {
            analyzer,
            vocabulary: artifact.vocabulary,
            index,
            responses: corpus.responses,
            gate: config.gate(),
            group_by_intent: config.group_by_intent,
        })
    }

    /// Loads the configured corpus and, when one is configured, its model.
    pub fn open(config: &EngineConfig) -> Result<Self> {
        let corpus = load_corpus(&config.corpus_path)?;
        match &config.model_path {
            Some(model_path) => {
                let artifact = load_artifact(model_path)?;
                Self::from_artifact(corpus, artifact, config)
            }
            None => Self::build(corpus, config),
        }
    }

    pub fn to_artifact(&self) -> ModelArtifact {
        ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            built_at: Utc::now(),
            analyzer: self.analyzer.settings().clone(),
            corpus_size: self.index.len(),
            vocabulary: self.vocabulary.clone(),
            vectors: self.index.vectors().to_vec(),
        }
    }

    pub fn vectorize_query(&self, query: &str) -> SparseVector {
        vectorize(&self.analyzer.terms(query), &self.vocabulary)
    }

    pub fn match_query(&self, query: &str, gate: &ConfidenceGate) -> MatchResult {
        let result = match_query(&self.vectorize_query(query), &self.index, gate);
        debug!(
            best_index = result.best_index,
            score = result.score,
            accepted = result.accepted,
            "query matched"
        );
        result
    }

    /// Answers with the configured gate and deterministic intent responses.
    pub fn answer(&self, query: &str) -> Reply {
        self.answer_with(query, &self.gate, &mut FirstResponse)
    }

    pub fn answer_with(
        &self,
        query: &str,
        gate: &ConfidenceGate,
        picker: &mut dyn ResponsePicker,
    ) -> Reply {
        let matched = self.match_query(query, gate);
        let Some(entry) = self.index.entry(matched.best_index) else {
            return Reply {
                answer: gate.fallback().to_string(),
                matched,
                matched_question: String::new(),
                matched_intent: None,
            };
        };

        let candidate = match (&entry.intent, self.group_by_intent) {
            (Some(intent), true) => self
                .responses
                .get(intent)
                .and_then(|pool| picker.pick(pool))
                .unwrap_or(entry.answer.as_str()),
            _ => entry.answer.as_str(),
        };
        let answer = if matched.accepted {
            candidate.to_string()
        } else {
            gate.fallback().to_string()
        };

        Reply {
            answer,
            matched,
            matched_question: entry.question.clone(),
            matched_intent: entry.intent.clone(),
        }
    }

    /// Answers and appends the interaction to `sink`.
    ///
    /// A failed append is logged and otherwise ignored; the reply is returned
    /// either way.
    pub fn respond(
        &self,
        query: &str,
        gate: &ConfidenceGate,
        picker: &mut dyn ResponsePicker,
        sink: &dyn InteractionSink,
    ) -> Reply {
        let reply = self.answer_with(query, gate, picker);
        let matched_answer = self
            .index
            .entry(reply.matched.best_index)
            .map(|e| {
                if reply.accepted() {
                    reply.answer.clone()
                } else {
                    e.answer.clone()
                }
            })
            .unwrap_or_default();

        let record = InteractionRecord {
            timestamp: Utc::now(),
            raw_query: query.to_string(),
            matched_intent: reply.matched_intent.clone(),
            matched_question: reply.matched_question.clone(),
            matched_answer,
            score: reply.score(),
            accepted: reply.accepted(),
        };
        if let Err(err) = sink.append(&record) {
            warn!(error = %err, "failed to append interaction record");
        }
        reply
    }

    pub fn gate(&self) -> &ConfidenceGate {
        &self.gate
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn vocabulary(&self) -> &VocabularyModel {
        &self.vocabulary
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    pub fn responses_for(&self, intent: &str) -> Option<&[String]> {
        self.responses.get(intent).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaqError;
    use crate::interaction_log::MemoryInteractionLog;
    use crate::model::CorpusEntry;
    use crate::responder::RandomResponse;
    use crate::storage::IntentSpec;

    fn faq_corpus() -> Corpus {
        Corpus::from_entries(vec![
            CorpusEntry::new("how do i register", "Visit the portal."),
            CorpusEntry::new("what are the benefits", "Outpatient and inpatient care."),
        ])
    }

    fn in_memory_config() -> EngineConfig {
        EngineConfig {
            model_path: None,
            ..EngineConfig::default()
        }
    }

    struct FailingSink;

    impl InteractionSink for FailingSink {
        fn append(&self, _record: &InteractionRecord) -> Result<()> {
            Err(FaqError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn exact_question_is_answered() {
        let engine = FaqEngine::build(faq_corpus(), &in_memory_config()).expect("engine");
        let reply = engine.answer("How do I register?");

        assert!(reply.accepted());
        assert!((reply.score() - 1.0).abs() < 1e-5);
        assert_eq!(reply.answer, "Visit the portal.");
        assert_eq!(reply.matched_question, "how do i register");
    }

    #[test]
    fn unknown_words_get_fallback() {
        let engine = FaqEngine::build(faq_corpus(), &in_memory_config()).expect("engine");
        let reply = engine.answer("banana smoothie recipe");

        assert!(!reply.accepted());
        assert_eq!(reply.score(), 0.0);
        assert_eq!(reply.matched.best_index, 0);
        assert_eq!(reply.answer, engine.gate().fallback());
    }

    #[test]
    fn raising_threshold_rejects_partial_match() {
        let engine = FaqEngine::build(faq_corpus(), &in_memory_config()).expect("engine");

        let lenient = engine.answer_with("register please", engine.gate(), &mut FirstResponse);
        assert!(lenient.accepted());
        assert!((lenient.score() - 0.5).abs() < 1e-4);

        let strict = engine.gate().with_threshold(0.99);
        let rejected = engine.answer_with("register please", &strict, &mut FirstResponse);
        assert!(!rejected.accepted());
        assert_eq!(rejected.answer, engine.gate().fallback());
    }

    #[test]
    fn empty_corpus_cannot_build() {
        let err = FaqEngine::build(Corpus::default(), &in_memory_config()).unwrap_err();
        assert!(matches!(err, FaqError::EmptyCorpus));
    }

    #[test]
    fn rejected_match_is_still_logged() {
        let engine = FaqEngine::build(faq_corpus(), &in_memory_config()).expect("engine");
        let log = MemoryInteractionLog::new();

        let strict = engine.gate().with_threshold(0.99);
        let reply = engine.respond("register please", &strict, &mut FirstResponse, &log);
        assert!(!reply.accepted());

        let records = log.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw_query, "register please");
        assert_eq!(records[0].matched_question, "how do i register");
        assert_eq!(records[0].matched_answer, "Visit the portal.");
        assert!(!records[0].accepted);
    }

    #[test]
    fn log_failure_does_not_block_answer() {
        let engine = FaqEngine::build(faq_corpus(), &in_memory_config()).expect("engine");
        let reply = engine.respond(
            "what are the benefits",
            engine.gate(),
            &mut FirstResponse,
            &FailingSink,
        );
        assert!(reply.accepted());
        assert_eq!(reply.answer, "Outpatient and inpatient care.");
    }

    #[test]
    fn artifact_round_trip_gives_same_scores() {
        let config = in_memory_config();
        let built = FaqEngine::build(faq_corpus(), &config).expect("engine");
        let loaded = FaqEngine::from_artifact(faq_corpus(), built.to_artifact(), &config)
            .expect("loaded");

        for query in ["register please", "benefits", "nothing known"] {
            assert_eq!(
                built.match_query(query, built.gate()),
                loaded.match_query(query, loaded.gate())
            );
        }
    }

    #[test]
    fn artifact_for_other_corpus_is_refused() {
        let config = in_memory_config();
        let built = FaqEngine::build(faq_corpus(), &config).expect("engine");
        let mut bigger = faq_corpus();
        bigger.entries.push(CorpusEntry::new("where", "here"));

        let err = FaqEngine::from_artifact(bigger, built.to_artifact(), &config).unwrap_err();
        assert!(matches!(
            err,
            FaqError::InconsistentArtifacts {
                model: 2,
                corpus: 3
            }
        ));
    }

    #[test]
    fn stop_words_and_synonyms_are_configurable() {
        let config = EngineConfig {
            use_stop_words: true,
            use_synonym_expansion: true,
            ..in_memory_config()
        };
        let engine = FaqEngine::build(faq_corpus(), &config).expect("engine");

        let reply = engine.answer("How can I sign up?");
        assert!(reply.accepted());
        assert_eq!(reply.answer, "Visit the portal.");
        assert!((reply.score() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn synonym_matching_ignores_punctuation_and_spacing() {
        let config = EngineConfig {
            use_synonym_expansion: true,
            ..in_memory_config()
        };
        let engine = FaqEngine::build(faq_corpus(), &config).expect("engine");

        let expected = engine.match_query("sign up", engine.gate());
        assert!(expected.accepted);
        assert_eq!(expected.best_index, 0);
        for query in ["Sign-Up!", "sign   up", "SIGN UP?"] {
            assert_eq!(engine.match_query(query, engine.gate()), expected, "{query}");
        }
    }

    #[test]
    fn stop_word_only_entry_is_never_confident() {
        let config = EngineConfig {
            use_stop_words: true,
            ..in_memory_config()
        };
        let corpus = Corpus::from_entries(vec![
            CorpusEntry::new("what is it", "Nothing."),
            CorpusEntry::new("hospital opening hours", "8am to 5pm."),
        ]);
        let engine = FaqEngine::build(corpus, &config).expect("engine");

        let reply = engine.answer("what is it");
        assert!(!reply.accepted());
        assert_eq!(reply.score(), 0.0);
    }

    fn intent_corpus() -> Corpus {
        Corpus::from_intents(vec![
            IntentSpec {
                tag: "greeting".to_string(),
                patterns: vec!["hello".to_string(), "good morning".to_string()],
                responses: vec!["Hello!".to_string(), "Hi there!".to_string()],
            },
            IntentSpec {
                tag: "hours".to_string(),
                patterns: vec!["when are you open".to_string()],
                responses: vec!["8am to 5pm.".to_string()],
            },
        ])
    }

    #[test]
    fn intent_responses_come_from_the_pool() {
        let config = EngineConfig {
            group_by_intent: true,
            ..in_memory_config()
        };
        let engine = FaqEngine::build(intent_corpus(), &config).expect("engine");
        let pool = engine.responses_for("greeting").expect("pool").to_vec();

        let mut picker = RandomResponse::seeded(3);
        for _ in 0..20 {
            let reply = engine.answer_with("good morning", engine.gate(), &mut picker);
            assert_eq!(reply.matched_intent.as_deref(), Some("greeting"));
            assert!(pool.contains(&reply.answer));
        }

        let deterministic = engine.answer("hello");
        assert_eq!(deterministic.answer, "Hello!");
    }

    #[test]
    fn seeded_pickers_reproduce_answers() {
        let config = EngineConfig {
            group_by_intent: true,
            ..in_memory_config()
        };
        let engine = FaqEngine::build(intent_corpus(), &config).expect("engine");
        let run = |seed| {
            let mut picker = RandomResponse::seeded(seed);
            (0..10)
                .map(|_| engine.answer_with("hello", engine.gate(), &mut picker).answer)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(11), run(11));
    }
}
