use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::normalize::{is_stop_word, normalize, tokenize};
use crate::synonym::{SynonymExpander, SynonymRule, TextExpander};

/// Text processing options that must be identical at build and query time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    #[serde(default)]
    pub use_stop_words: bool,
    /// `None` disables synonym expansion.
    #[serde(default)]
    pub synonyms: Option<Vec<SynonymRule>>,
}

/// Normalization, expansion, tokenization and stop-word filtering in one place.
pub struct Analyzer {
    settings: AnalyzerSettings,
    expander: Option<Box<dyn TextExpander>>,
}

impl Analyzer {
    pub fn new(settings: AnalyzerSettings) -> Result<Self> {
        let expander = match &settings.synonyms {
            Some(rules) => Some(Box::new(SynonymExpander::new(rules)?) as Box<dyn TextExpander>),
            None => None,
        };
        Ok(Self { settings, expander })
    }

    /// Swaps the expansion stage for a custom one.
    pub fn with_expander(mut self, expander: impl TextExpander + 'static) -> Self {
        self.expander = Some(Box::new(expander));
        self
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// Normalizes `text`, then runs the expansion stage over the cleaned
    /// form. Inputs that normalize alike always analyze alike.
    pub fn normalize(&self, text: &str) -> String {
        let cleaned = normalize(text);
        match &self.expander {
            Some(expander) => normalize(&expander.expand(&cleaned)),
            None => cleaned,
        }
    }

    pub fn terms(&self, text: &str) -> Vec<String> {
        let normalized = self.normalize(text);
        tokenize(&normalized)
            .filter(|t| !(self.settings.use_stop_words && is_stop_word(t)))
            .map(str::to_string)
            .collect()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            settings: AnalyzerSettings::default(),
            expander: None,
        }
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("settings", &self.settings)
            .field("expander", &self.expander.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synonym::default_synonyms;
    use std::borrow::Cow;

    #[test]
    fn plain_analyzer_keeps_every_term() {
        let analyzer = Analyzer::default();
        assert_eq!(
            analyzer.terms("How do I register?"),
            vec!["how", "do", "i", "register"]
        );
    }

    #[test]
    fn stop_words_are_dropped_when_enabled() {
        let analyzer = Analyzer::new(AnalyzerSettings {
            use_stop_words: true,
            synonyms: None,
        })
        .expect("analyzer");
        assert_eq!(analyzer.terms("How do I register?"), vec!["register"]);
        assert!(analyzer.terms("what is the").is_empty());
    }

    #[test]
    fn synonyms_ignore_punctuation_and_spacing() {
        let analyzer = Analyzer::new(AnalyzerSettings {
            use_stop_words: false,
            synonyms: Some(default_synonyms()),
        })
        .expect("analyzer");
        for query in ["How can I sign up?", "How can I SIGN-UP!", "how  can i sign   up"] {
            assert_eq!(analyzer.normalize(query), "how can i register");
        }
    }

    struct Greeting;

    impl TextExpander for Greeting {
        fn expand<'a>(&self, text: &'a str) -> Cow<'a, str> {
            Cow::Owned(text.replace("hi", "hello"))
        }
    }

    #[test]
    fn custom_expander_replaces_builtin_stage() {
        let analyzer = Analyzer::default().with_expander(Greeting);
        assert_eq!(analyzer.terms("hi there"), vec!["hello", "there"]);
    }
}
