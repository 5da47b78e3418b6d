pub mod analyzer;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod gate;
pub mod index;
pub mod interaction_log;
pub mod model;
pub mod normalize;
pub mod responder;
pub mod retrieval;
pub mod storage;
pub mod synonym;
pub mod vocabulary;

pub use analyzer::{Analyzer, AnalyzerSettings};
pub use config::{EngineConfig, DEFAULT_CORPUS_PATH, DEFAULT_LOG_PATH, DEFAULT_MODEL_PATH};
pub use engine::FaqEngine;
pub use error::{FaqError, Result};
pub use eval::{
    evaluate_cases, CaseExpectation, EvalCase, EvalOutcome, EvalSummary, RawEvalCase,
    DEFAULT_REQUIRED_PASS_RATE,
};
pub use gate::{ConfidenceGate, Threshold, DEFAULT_FALLBACK, DEFAULT_THRESHOLD};
pub use index::{vectorize, CorpusIndex, SparseVector};
pub use interaction_log::{
    CsvInteractionLog, InteractionRecord, InteractionSink, MemoryInteractionLog, LOG_COLUMNS,
};
pub use model::{CorpusEntry, Decision, MatchResult, Reply};
pub use normalize::{normalize, normalize_display, tokenize, STOP_WORDS};
pub use responder::{FirstResponse, RandomResponse, ResponsePicker};
pub use retrieval::{cosine_similarity, match_query, top_match};
pub use storage::{
    load_artifact, load_corpus, save_artifact, Corpus, IntentSpec, ModelArtifact,
};
pub use synonym::{default_synonyms, SynonymExpander, SynonymRule, TextExpander};
pub use vocabulary::{TermStats, VocabularyModel};
