//! Core data model shared across the pipeline.
//!
//! Evidence flows through three shapes: a `DocChunk` is a retrievable text
//! unit with policy metadata, an `EvidenceCandidate` is a chunk plus the
//! relevance score the ranker assigned it, and a `LeasedEvidence` is a
//! candidate the leasing controller admitted, enriched with its calibrated
//! likelihood, the belief delta it produced, and the cost charged for it.
//! All three are produced and consumed within a single query; nothing is
//! cached or mutated across queries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Policy metadata attached to each document chunk.
///
/// Drives the admissibility rules (license, freshness TTL, PII flag,
/// jurisdiction, source class) applied before retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyMetadata {
    /// License label, e.g. "internal", "cc-by", "proprietary"
    pub license: String,
    /// Freshness TTL threshold for the chunk, in days
    pub ttl_days: Option<i64>,
    /// Creation date used for staleness checks
    pub created_at: Option<NaiveDate>,
    /// Whether the chunk contains personally identifiable information
    pub contains_pii: bool,
    /// Jurisdiction label, e.g. "US", "EU"
    pub jurisdiction: Option<String>,
    /// Source class, e.g. "peer_reviewed", "internal", "web"
    pub source_class: String,
    /// Free-form additional metadata
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for PolicyMetadata {
    fn default() -> Self {
        Self {
            license: "unknown".to_string(),
            ttl_days: None,
            created_at: None,
            contains_pii: false,
            jurisdiction: None,
            source_class: "unknown".to_string(),
            extra: HashMap::new(),
        }
    }
}

impl PolicyMetadata {
    /// Set the license label.
    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = license.into();
        self
    }

    /// Set the freshness TTL in days.
    pub fn with_ttl_days(mut self, ttl_days: i64) -> Self {
        self.ttl_days = Some(ttl_days);
        self
    }

    /// Set the creation date.
    pub fn with_created_at(mut self, date: NaiveDate) -> Self {
        self.created_at = Some(date);
        self
    }

    /// Mark whether the chunk contains PII.
    pub fn with_pii(mut self, contains_pii: bool) -> Self {
        self.contains_pii = contains_pii;
        self
    }

    /// Set the jurisdiction label.
    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdiction = Some(jurisdiction.into());
        self
    }

    /// Set the source class.
    pub fn with_source_class(mut self, source_class: impl Into<String>) -> Self {
        self.source_class = source_class.into();
        self
    }
}

/// A retrievable text unit with policy metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocChunk {
    /// Identifier of the parent document
    pub doc_id: String,
    /// Identifier of this chunk within the document
    pub chunk_id: String,
    /// Chunk text
    pub text: String,
    /// Policy metadata
    pub metadata: PolicyMetadata,
}

impl DocChunk {
    /// Create a chunk with default metadata.
    pub fn new(
        doc_id: impl Into<String>,
        chunk_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            doc_id: doc_id.into(),
            chunk_id: chunk_id.into(),
            text: text.into(),
            metadata: PolicyMetadata::default(),
        }
    }

    /// Attach policy metadata.
    pub fn with_metadata(mut self, metadata: PolicyMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Stable identity used in audits: `doc_id:chunk_id`.
    pub fn id(&self) -> String {
        format!("{}:{}", self.doc_id, self.chunk_id)
    }
}

/// A chunk paired with the relevance score the ranker assigned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceCandidate {
    /// The candidate chunk
    pub chunk: DocChunk,
    /// Relevance score from the retrieval backend
    pub relevance: f64,
}

impl EvidenceCandidate {
    pub fn new(chunk: DocChunk, relevance: f64) -> Self {
        Self { chunk, relevance }
    }
}

/// An admitted evidence item.
///
/// Created exactly once, at the moment the leasing controller admits a
/// candidate, and never mutated afterward. Audits reference leased items by
/// identity rather than duplicating them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeasedEvidence {
    /// The admitted chunk
    pub chunk: DocChunk,
    /// Relevance score from the ranker
    pub relevance: f64,
    /// Calibrated pseudo-likelihood P(E | claim)
    pub likelihood: f64,
    /// Change in belief this admission produced
    pub delta_belief: f64,
    /// Cost charged for admitting this item
    pub cost: f64,
}

impl LeasedEvidence {
    /// Identity of the underlying chunk.
    pub fn id(&self) -> String {
        self.chunk.id()
    }
}

/// Observability trace from one leasing run. Not used in decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseTrace {
    /// Belief after the initial prior and after each admission
    pub belief_history: Vec<f64>,
    /// Cumulative cost, aligned with `belief_history`
    pub cost_history: Vec<f64>,
    /// Belief when leasing stopped
    pub final_belief: f64,
    /// Total cost charged
    pub final_cost: f64,
    /// Configured confidence threshold τ
    pub threshold: f64,
    /// Configured cost budget
    pub budget: f64,
}

impl LeaseTrace {
    /// Number of admissions recorded in this trace.
    pub fn admissions(&self) -> usize {
        self.belief_history.len().saturating_sub(1)
    }
}

/// Audit result for a single claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimAudit {
    /// The audited claim text
    pub claim: String,
    /// Posterior belief computed from the minimal support
    /// (full-evidence posterior when the support is empty)
    pub posterior: f64,
    /// (lower, upper) leave-one-out sensitivity interval over all
    /// leased evidence; brackets the full-evidence posterior
    pub interval: (f64, f64),
    /// Identities of the minimal sufficient support, in leasing order
    pub minimal_support: Vec<String>,
    /// Per-item necessity verdicts for the minimal support
    pub necessity: HashMap<String, bool>,
    /// Per-item sufficiency verdicts for the minimal support
    pub sufficiency: HashMap<String, bool>,
    /// Confidence fusion score in [0,1] for weights summing to 1
    pub cfs: f64,
}

impl ClaimAudit {
    /// Fraction of minimal-support items marked necessary.
    pub fn necessity_score(&self) -> f64 {
        fraction_true(&self.necessity)
    }

    /// Fraction of minimal-support items marked sufficient.
    pub fn sufficiency_score(&self) -> f64 {
        fraction_true(&self.sufficiency)
    }

    /// Width of the sensitivity interval.
    pub fn sensitivity(&self) -> f64 {
        self.interval.1 - self.interval.0
    }
}

fn fraction_true(verdicts: &HashMap<String, bool>) -> f64 {
    if verdicts.is_empty() {
        0.0
    } else {
        verdicts.values().filter(|&&v| v).count() as f64 / verdicts.len() as f64
    }
}
