use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::analyzer::Analyzer;
use crate::error::{FaqError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermStats {
    pub index: usize,
    pub idf: f32,
}

/// Fixed term vocabulary with smoothed inverse document frequencies.
///
/// Terms are indexed in sorted order. The weight of a term that appears in
/// `df` of `n` documents is `ln((1 + n) / (1 + df)) + 1`, so a term present in
/// every document still carries a small positive weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyModel {
    documents: usize,
    terms: BTreeMap<String, TermStats>,
}

impl VocabularyModel {
    /// Builds the vocabulary from already-analyzed documents.
    pub fn build<S: AsRef<str>>(documents: &[Vec<S>]) -> Result<Self> {
        if documents.is_empty() {
            return Err(FaqError::EmptyCorpus);
        }

        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for terms in documents {
            let unique: BTreeSet<&str> = terms.iter().map(|t| t.as_ref()).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let terms = doc_freq
            .into_iter()
            .enumerate()
            .map(|(index, (term, df))| {
                let idf = ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0;
                (
                    term.to_string(),
                    TermStats {
                        index,
                        idf: idf as f32,
                    },
                )
            })
            .collect();

        Ok(Self {
            documents: documents.len(),
            terms,
        })
    }

    pub fn from_texts<S: AsRef<str>>(texts: &[S], analyzer: &Analyzer) -> Result<Self> {
        let documents: Vec<Vec<String>> =
            texts.iter().map(|t| analyzer.terms(t.as_ref())).collect();
        Self::build(&documents)
    }

    pub fn get(&self, term: &str) -> Option<TermStats> {
        self.terms.get(term).copied()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    /// Number of documents the weights were computed from.
    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TermStats)> {
        self.terms.iter().map(|(t, s)| (t.as_str(), *s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<Vec<String>> {
        texts
            .iter()
            .map(|t| t.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let err = VocabularyModel::build::<String>(&[]).unwrap_err();
        assert!(matches!(err, FaqError::EmptyCorpus));
    }

    #[test]
    fn terms_are_indexed_in_sorted_order() {
        let vocab = VocabularyModel::build(&docs(&["zeta alpha", "mid alpha"])).expect("vocab");
        let order: Vec<_> = vocab.iter().map(|(t, s)| (t, s.index)).collect();
        assert_eq!(order, vec![("alpha", 0), ("mid", 1), ("zeta", 2)]);
    }

    #[test]
    fn idf_uses_smoothed_formula() {
        let vocab =
            VocabularyModel::build(&docs(&["common rare", "common", "common"])).expect("vocab");
        let common = vocab.get("common").expect("common");
        let rare = vocab.get("rare").expect("rare");

        assert!((common.idf - 1.0).abs() < 1e-6);
        let expected = ((4.0f64 / 2.0).ln() + 1.0) as f32;
        assert!((rare.idf - expected).abs() < 1e-6);
        assert!(rare.idf > common.idf);
    }

    #[test]
    fn repeated_terms_count_once_per_document() {
        let vocab = VocabularyModel::build(&docs(&["card card card", "other"])).expect("vocab");
        let card = vocab.get("card").expect("card");
        let other = vocab.get("other").expect("other");
        assert!((card.idf - other.idf).abs() < 1e-6);
    }

    #[test]
    fn documents_without_terms_still_count() {
        let vocab = VocabularyModel::build(&docs(&["", "word"])).expect("vocab");
        assert_eq!(vocab.documents(), 2);
        assert_eq!(vocab.len(), 1);
        assert!(!vocab.contains("missing"));
    }
}
