use std::borrow::Cow;

use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::normalize::normalize;

/// Rewrites normalized text before tokenization.
pub trait TextExpander: Send + Sync {
    fn expand<'a>(&self, text: &'a str) -> Cow<'a, str>;
}

/// One canonical term and the aliases that are rewritten into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymRule {
    pub canonical: String,
    pub aliases: Vec<String>,
}

impl SynonymRule {
    pub fn new(canonical: impl Into<String>, aliases: &[&str]) -> Self {
        Self {
            canonical: canonical.into(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

pub fn default_synonyms() -> Vec<SynonymRule> {
    vec![
        SynonymRule::new(
            "register",
            &["sign up", "signup", "enroll", "enrol", "registration", "join"],
        ),
        SynonymRule::new("benefits", &["benefit", "coverage", "cover", "perks"]),
        SynonymRule::new(
            "contribution",
            &["contributions", "premium", "premiums", "deduction"],
        ),
        SynonymRule::new("hospital", &["clinic", "facility", "facilities"]),
    ]
}

/// Applies synonym rules in order as case-insensitive whole-word replacements.
///
/// Aliases are normalized when the expander is built, so they match the
/// output of [`normalize`] regardless of how the query was punctuated.
#[derive(Debug, Clone)]
pub struct SynonymExpander {
    rules: Vec<(Regex, String)>,
}

impl SynonymExpander {
    pub fn new(rules: &[SynonymRule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());

        for rule in rules {
            let mut aliases: Vec<String> = rule
                .aliases
                .iter()
                .map(|a| normalize(a))
                .filter(|a| !a.is_empty())
                .collect();
            if aliases.is_empty() {
                continue;
            }
            // Longer aliases first so "sign up" wins over "sign".
            aliases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            aliases.dedup();

            let alternation = aliases
                .iter()
                .map(|a| regex::escape(a))
                .collect::<Vec<_>>()
                .join("|");
            let re = Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))?;
            compiled.push((re, rule.canonical.clone()));
        }

        Ok(Self { rules: compiled })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl TextExpander for SynonymExpander {
    fn expand<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(text);
        for (re, canonical) in &self.rules {
            let replaced = match re.replace_all(&current, NoExpand(canonical)) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(_) => None,
            };
            if let Some(s) = replaced {
                current = Cow::Owned(s);
            }
        }
        current
    }
}
