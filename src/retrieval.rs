//! TF-IDF relevance ranking.
//!
//! A small vector retrieval backend: lowercased alphanumeric tokens, an
//! English stopword list, smoothed idf weights, and cosine similarity over
//! l2-normalized sparse vectors. Replace with dense embeddings in production;
//! the rest of the pipeline only sees ranked `EvidenceCandidate`s.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{DocChunk, EvidenceCandidate};

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "he", "in",
    "is", "it", "its", "not", "of", "on", "or", "she", "that", "the", "their", "there", "these",
    "they", "this", "those", "to", "was", "were", "what", "which", "who", "will", "with",
];

fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 1 && !STOPWORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Sparse TF-IDF retriever over a fixed chunk corpus.
pub struct TfidfRetriever {
    chunks: Vec<DocChunk>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    // l2-normalized tf-idf vector per chunk, keyed by vocabulary index
    vectors: Vec<HashMap<usize, f64>>,
}

impl TfidfRetriever {
    /// Build a retriever over a corpus. Fails on an empty corpus.
    pub fn new(chunks: Vec<DocChunk>) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::retrieval("cannot index an empty corpus"));
        }

        let tokenized: Vec<Vec<String>> = chunks.iter().map(|c| tokenize(&c.text)).collect();

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: Vec<usize> = Vec::new();
        for tokens in &tokenized {
            let mut seen: Vec<usize> = Vec::new();
            for token in tokens {
                let index = *vocabulary.entry(token.clone()).or_insert_with(|| {
                    document_frequency.push(0);
                    document_frequency.len() - 1
                });
                if !seen.contains(&index) {
                    seen.push(index);
                    document_frequency[index] += 1;
                }
            }
        }

        // Smoothed idf: ln((1 + n) / (1 + df)) + 1.
        let n = chunks.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let vectors = tokenized
            .iter()
            .map(|tokens| Self::vectorize(tokens, &vocabulary, &idf))
            .collect();

        Ok(Self {
            chunks,
            vocabulary,
            idf,
            vectors,
        })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn vectorize(
        tokens: &[String],
        vocabulary: &HashMap<String, usize>,
        idf: &[f64],
    ) -> HashMap<usize, f64> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokens {
            if let Some(&index) = vocabulary.get(token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        for (index, weight) in counts.iter_mut() {
            *weight *= idf[*index];
        }

        let norm = counts.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in counts.values_mut() {
                *weight /= norm;
            }
        }
        counts
    }

    /// Rank chunks by cosine similarity to the query, best first.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<EvidenceCandidate> {
        let query_vector = Self::vectorize(&tokenize(query), &self.vocabulary, &self.idf);

        let mut scored: Vec<(usize, f64)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, vector)| {
                let score = query_vector
                    .iter()
                    .map(|(index, weight)| weight * vector.get(index).copied().unwrap_or(0.0))
                    .sum::<f64>();
                (i, score)
            })
            .collect();

        // Descending score, ascending index on ties for determinism.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        scored
            .into_iter()
            .take(top_k)
            .map(|(i, score)| EvidenceCandidate::new(self.chunks[i].clone(), score))
            .collect()
    }
}
