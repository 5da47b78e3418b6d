use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analyzer::AnalyzerSettings;
use crate::error::Result;
use crate::gate::{ConfidenceGate, Threshold, DEFAULT_FALLBACK};
use crate::synonym::{default_synonyms, SynonymRule};

pub const DEFAULT_CORPUS_PATH: &str = "data/faq.csv";
pub const DEFAULT_MODEL_PATH: &str = "models/model.json";
pub const DEFAULT_LOG_PATH: &str = "logs/analytics.csv";

/// Everything the hosting front end can tune. Missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub threshold: Threshold,
    pub fallback_message: String,
    pub use_stop_words: bool,
    pub use_synonym_expansion: bool,
    pub group_by_intent: bool,
    pub synonyms: Vec<SynonymRule>,
    pub corpus_path: PathBuf,
    /// `None` builds the model from the corpus at startup.
    pub model_path: Option<PathBuf>,
    pub log_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: Threshold::default(),
            fallback_message: DEFAULT_FALLBACK.to_string(),
            use_stop_words: false,
            use_synonym_expansion: false,
            group_by_intent: false,
            synonyms: default_synonyms(),
            corpus_path: PathBuf::from(DEFAULT_CORPUS_PATH),
            model_path: Some(PathBuf::from(DEFAULT_MODEL_PATH)),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn analyzer_settings(&self) -> AnalyzerSettings {
        AnalyzerSettings {
            use_stop_words: self.use_stop_words,
            synonyms: self
                .use_synonym_expansion
                .then(|| self.synonyms.clone()),
        }
    }

    pub fn gate(&self) -> ConfidenceGate {
        ConfidenceGate::new(self.threshold, self.fallback_message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.threshold.value(), 0.30);
        assert!(!config.use_stop_words);
        assert_eq!(config.analyzer_settings(), AnalyzerSettings::default());
        assert_eq!(config.gate().fallback(), DEFAULT_FALLBACK);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"threshold": 1.5, "use_synonym_expansion": true, "model_path": null}"#,
        )
        .expect("write");

        let config = EngineConfig::load(&path).expect("load");
        assert_eq!(config.threshold.value(), 1.0);
        assert_eq!(config.model_path, None);
        assert_eq!(config.corpus_path, PathBuf::from(DEFAULT_CORPUS_PATH));
        assert_eq!(
            config.analyzer_settings().synonyms,
            Some(default_synonyms())
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(EngineConfig::load(Path::new("/no/such/config.json")).is_err());
    }
}
