use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analyzer::Analyzer;
use crate::error::{FaqError, Result};
use crate::model::CorpusEntry;
use crate::vocabulary::VocabularyModel;

/// Sparse term-index → weight vector, sorted by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(usize, f32)>,
}

impl SparseVector {
    /// Builds a vector from arbitrary pairs, summing duplicate indices and
    /// dropping zero weights.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (usize, f32)>) -> Self {
        let mut merged: BTreeMap<usize, f32> = BTreeMap::new();
        for (index, weight) in pairs {
            *merged.entry(index).or_insert(0.0) += weight;
        }
        Self {
            entries: merged.into_iter().filter(|(_, w)| *w != 0.0).collect(),
        }
    }

    pub fn entries(&self) -> &[(usize, f32)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j, mut sum) = (0, 0, 0.0f32);
        while i < self.entries.len() && j < other.entries.len() {
            let (ai, aw) = self.entries[i];
            let (bi, bw) = other.entries[j];
            match ai.cmp(&bi) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += aw * bw;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Checks the invariants `dot` relies on for a vector read from disk:
    /// strictly increasing indices below `dimension` and finite weights.
    pub fn validate(&self, dimension: usize) -> std::result::Result<(), &'static str> {
        if self.entries.windows(2).any(|pair| pair[0].0 >= pair[1].0) {
            return Err("indices are not strictly increasing");
        }
        if self.entries.iter().any(|&(index, _)| index >= dimension) {
            return Err("index outside the vocabulary");
        }
        if self.entries.iter().any(|(_, w)| !w.is_finite()) {
            return Err("non-finite weight");
        }
        Ok(())
    }

    fn normalized(mut self) -> Self {
        let norm = self.norm();
        if norm > 0.0 {
            for (_, w) in &mut self.entries {
                *w /= norm;
            }
        }
        self
    }
}

/// Turns analyzed terms into a unit-length tf-idf vector.
///
/// Terms outside the vocabulary are ignored; if none are known the zero
/// vector is returned as is.
pub fn vectorize<S: AsRef<str>>(terms: &[S], vocabulary: &VocabularyModel) -> SparseVector {
    SparseVector::from_pairs(terms.iter().filter_map(|t| {
        vocabulary
            .get(t.as_ref())
            .map(|stats| (stats.index, stats.idf))
    }))
    .normalized()
}

/// Corpus entries with their document vectors, frozen after construction.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    entries: Vec<CorpusEntry>,
    vectors: Vec<SparseVector>,
}

impl CorpusIndex {
    pub fn build(
        entries: Vec<CorpusEntry>,
        vocabulary: &VocabularyModel,
        analyzer: &Analyzer,
    ) -> Result<Self> {
        if entries.is_empty() {
            return Err(FaqError::EmptyCorpus);
        }
        let vectors = entries
            .iter()
            .map(|e| vectorize(&analyzer.terms(&e.question), vocabulary))
            .collect();
        Ok(Self { entries, vectors })
    }

    /// Pairs entries with vectors computed earlier, e.g. from a model artifact.
    pub fn from_parts(entries: Vec<CorpusEntry>, vectors: Vec<SparseVector>) -> Result<Self> {
        if entries.is_empty() {
            return Err(FaqError::EmptyCorpus);
        }
        if entries.len() != vectors.len() {
            return Err(FaqError::InconsistentArtifacts {
                model: vectors.len(),
                corpus: entries.len(),
            });
        }
        Ok(Self { entries, vectors })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&CorpusEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn vectors(&self) -> &[SparseVector] {
        &self.vectors
    }
}
