use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analyzer::AnalyzerSettings;
use crate::error::{FaqError, Result};
use crate::index::SparseVector;
use crate::model::CorpusEntry;
use crate::vocabulary::VocabularyModel;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// One intent of an intents document: pattern phrases plus a response pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentSpec {
    pub tag: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub responses: Vec<String>,
}

/// Loaded corpus entries plus, for intent corpora, each intent's responses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    pub entries: Vec<CorpusEntry>,
    pub responses: BTreeMap<String, Vec<String>>,
}

impl Corpus {
    pub fn from_entries(entries: Vec<CorpusEntry>) -> Self {
        let entries = entries.into_iter().enumerate().map(sanitize).collect();
        Self {
            entries,
            responses: BTreeMap::new(),
        }
    }

    /// Flattens intents so that every pattern becomes its own entry.
    pub fn from_intents(intents: Vec<IntentSpec>) -> Self {
        let mut entries = Vec::new();
        let mut responses = BTreeMap::new();

        for intent in intents {
            let first = intent.responses.first().cloned().unwrap_or_default();
            if intent.responses.is_empty() {
                warn!(intent = %intent.tag, "intent has no responses");
            }
            for pattern in &intent.patterns {
                entries.push(
                    CorpusEntry::new(pattern.clone(), first.clone()).with_intent(&intent.tag),
                );
            }
            responses.insert(intent.tag, intent.responses);
        }

        Self {
            entries: entries.into_iter().enumerate().map(sanitize).collect(),
            responses,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn responses_for(&self, intent: &str) -> Option<&[String]> {
        self.responses.get(intent).map(Vec::as_slice)
    }
}

fn sanitize((row, mut entry): (usize, CorpusEntry)) -> CorpusEntry {
    if entry.question.trim().is_empty() || entry.answer.trim().is_empty() {
        warn!(row, "corpus entry is missing a question or an answer");
    }
    if entry.intent.as_deref().is_some_and(|i| i.trim().is_empty()) {
        entry.intent = None;
    }
    entry
}

/// Loads a corpus, picking the format from the file extension:
/// `.csv`, `.jsonl` (one entry per line) or `.json` (intents document).
pub fn load_corpus(path: &Path) -> Result<Corpus> {
    if !path.exists() {
        return Err(FaqError::MissingArtifact {
            what: "corpus",
            path: path.to_path_buf(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let corpus = match ext.as_str() {
        "csv" => Corpus::from_entries(load_entries_csv(path)?),
        "jsonl" => Corpus::from_entries(load_entries_jsonl(path)?),
        "json" => Corpus::from_intents(load_intents_json(path)?),
        other => return Err(FaqError::UnsupportedFormat(format!(".{other}"))),
    };

    info!(path = %path.display(), entries = corpus.len(), "corpus loaded");
    Ok(corpus)
}

pub fn load_entries_csv(path: &Path) -> Result<Vec<CorpusEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut entries = Vec::new();
    for row in reader.deserialize::<CorpusEntry>() {
        entries.push(row?);
    }
    Ok(entries)
}

pub fn load_entries_jsonl(path: &Path) -> Result<Vec<CorpusEntry>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str::<CorpusEntry>(&line)?);
    }

    Ok(entries)
}

pub fn load_intents_json(path: &Path) -> Result<Vec<IntentSpec>> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Precomputed vocabulary and document vectors for one corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub built_at: DateTime<Utc>,
    pub analyzer: AnalyzerSettings,
    pub corpus_size: usize,
    pub vocabulary: VocabularyModel,
    pub vectors: Vec<SparseVector>,
}

impl ModelArtifact {
    /// Fails when the artifact was not built from a corpus of `corpus_len`
    /// entries, or when one of its vectors is malformed.
    pub fn check_consistency(&self, corpus_len: usize) -> Result<()> {
        let sizes = [
            self.corpus_size,
            self.vectors.len(),
            self.vocabulary.documents(),
        ];
        if let Some(&model) = sizes.iter().find(|&&n| n != corpus_len) {
            return Err(FaqError::InconsistentArtifacts {
                model,
                corpus: corpus_len,
            });
        }

        let dimension = self.vocabulary.len();
        for (entry, vector) in self.vectors.iter().enumerate() {
            vector
                .validate(dimension)
                .map_err(|reason| FaqError::CorruptArtifact { entry, reason })?;
        }
        Ok(())
    }
}

pub fn save_artifact(path: &Path, artifact: &ModelArtifact) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, artifact)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn load_artifact(path: &Path) -> Result<ModelArtifact> {
    if !path.exists() {
        return Err(FaqError::MissingArtifact {
            what: "model artifact",
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
