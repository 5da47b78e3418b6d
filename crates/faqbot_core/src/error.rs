use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FaqError {
    #[error("{what} not found at {path}; {}", missing_hint(.what))]
    MissingArtifact { what: &'static str, path: PathBuf },

    #[error("corpus contains no entries")]
    EmptyCorpus,

    #[error("model artifact covers {model} entries but the corpus has {corpus}; rebuild the model")]
    InconsistentArtifacts { model: usize, corpus: usize },

    #[error("model artifact vector {entry} is corrupt: {reason}; rebuild the model")]
    CorruptArtifact { entry: usize, reason: &'static str },

    #[error("eval case {case_id}: {reason}")]
    InvalidEvalCase { case_id: String, reason: &'static str },

    #[error("unsupported corpus format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid synonym rule: {0}")]
    Synonym(#[from] regex::Error),
}

fn missing_hint(what: &str) -> &'static str {
    match what {
        "corpus" => "check the corpus path in the config or pass --corpus",
        _ => "run `faqbot build` to rebuild the model",
    }
}

pub type Result<T> = std::result::Result<T, FaqError>;
