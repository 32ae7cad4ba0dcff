//! Policy-aware admissibility filtering.
//!
//! Disallowed chunks are removed before retrieval so the leasing controller
//! only ever sees admissible evidence. A `PolicyRule` is a named predicate
//! over chunk metadata and the per-query directive; a chunk is admissible iff
//! every rule passes. The default rule set covers licenses, jurisdictions,
//! PII, staleness, and source-class restrictions.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{DocChunk, PolicyMetadata};

/// How many rejected chunks to keep in the policy log.
const REJECTION_DETAIL_CAP: usize = 50;

/// Per-query retrieval directive: what to prefer or exclude.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalDirective {
    /// Source classes to rank ahead of others (advisory)
    pub prefer_source_classes: Vec<String>,
    /// If non-empty, only these source classes are admissible
    pub restrict_to_source_classes: Vec<String>,
    /// Whether to drop chunks older than their TTL
    pub exclude_stale: bool,
    /// TTL override applied to every chunk, in days
    pub max_ttl_days: Option<i64>,
    /// Whether chunks flagged as containing PII are inadmissible
    pub forbid_pii: bool,
    /// License allow-list; `None` allows everything
    pub allowed_licenses: Option<Vec<String>>,
    /// Jurisdiction allow-list; `None` allows everything
    pub allowed_jurisdictions: Option<Vec<String>>,
    /// Query-profiling log entries
    pub log: HashMap<String, serde_json::Value>,
}

impl Default for RetrievalDirective {
    fn default() -> Self {
        Self {
            prefer_source_classes: Vec::new(),
            restrict_to_source_classes: Vec::new(),
            exclude_stale: true,
            max_ttl_days: None,
            forbid_pii: true,
            allowed_licenses: None,
            allowed_jurisdictions: None,
            log: HashMap::new(),
        }
    }
}

/// Caller-facing policy options, folded into a directive per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyOptions {
    /// Prefer peer-reviewed sources in the directive
    pub prefer_peer_reviewed: bool,
    /// Forbid PII-bearing chunks
    pub forbid_pii: bool,
    /// Exclude stale chunks
    pub exclude_stale: bool,
    /// TTL override in days
    pub max_ttl_days: Option<i64>,
    /// License allow-list
    pub allowed_licenses: Option<Vec<String>>,
    /// Jurisdiction allow-list
    pub allowed_jurisdictions: Option<Vec<String>>,
}

impl Default for PolicyOptions {
    fn default() -> Self {
        Self {
            prefer_peer_reviewed: true,
            forbid_pii: true,
            exclude_stale: true,
            max_ttl_days: None,
            allowed_licenses: None,
            allowed_jurisdictions: None,
        }
    }
}

/// A chunk rejected by the filter, with the rules that blocked it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedChunk {
    pub doc_id: String,
    pub chunk_id: String,
    pub blocked_by: Vec<String>,
}

/// Summary of one admissibility pass, for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyLog {
    /// Number of chunks kept
    pub kept: usize,
    /// Number of chunks rejected
    pub rejected: usize,
    /// Details for rejected chunks, capped
    pub rejected_details: Vec<RejectedChunk>,
    /// Query-profile entries copied from the directive
    pub profile: HashMap<String, serde_json::Value>,
}

/// A named admissibility predicate. If the predicate returns false the chunk
/// is inadmissible.
pub struct PolicyRule {
    name: String,
    predicate: Box<dyn Fn(&PolicyMetadata, &RetrievalDirective) -> bool + Send + Sync>,
}

impl PolicyRule {
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&PolicyMetadata, &RetrievalDirective) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check(&self, metadata: &PolicyMetadata, directive: &RetrievalDirective) -> bool {
        (self.predicate)(metadata, directive)
    }
}

/// Policy engine: profiles queries into directives and filters inadmissible
/// chunks before retrieval runs.
pub struct PolicyEngine {
    rules: Vec<PolicyRule>,
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl PolicyEngine {
    /// Create an engine with a custom rule set.
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    /// Profile a query into a retrieval directive.
    ///
    /// Sensitive queries force the PII rule on regardless of the caller's
    /// options. The term list is a heuristic stand-in for a real classifier.
    pub fn profile_query(&self, query: &str, opts: &PolicyOptions) -> RetrievalDirective {
        let lowered = query.to_lowercase();
        let sensitive_terms = [
            "patient",
            "diagnosis",
            "medical",
            "ssn",
            "passport",
            "credit card",
            "account number",
        ];
        let is_sensitive = sensitive_terms.iter().any(|t| lowered.contains(t));

        let mut log = HashMap::new();
        log.insert("query".to_string(), serde_json::json!(query));
        log.insert("is_sensitive".to_string(), serde_json::json!(is_sensitive));
        log.insert(
            "prefer_peer_reviewed".to_string(),
            serde_json::json!(opts.prefer_peer_reviewed),
        );

        RetrievalDirective {
            prefer_source_classes: if opts.prefer_peer_reviewed {
                vec!["peer_reviewed".to_string()]
            } else {
                Vec::new()
            },
            restrict_to_source_classes: Vec::new(),
            exclude_stale: opts.exclude_stale,
            max_ttl_days: opts.max_ttl_days,
            forbid_pii: opts.forbid_pii || is_sensitive,
            allowed_licenses: opts.allowed_licenses.clone(),
            allowed_jurisdictions: opts.allowed_jurisdictions.clone(),
            log,
        }
    }

    /// Check a single chunk, returning the names of the rules that block it.
    pub fn is_admissible(
        &self,
        chunk: &DocChunk,
        directive: &RetrievalDirective,
    ) -> (bool, Vec<String>) {
        let blocked_by: Vec<String> = self
            .rules
            .iter()
            .filter(|rule| !rule.check(&chunk.metadata, directive))
            .map(|rule| rule.name().to_string())
            .collect();
        (blocked_by.is_empty(), blocked_by)
    }

    /// Filter a corpus down to the admissible chunks.
    pub fn filter_admissible(
        &self,
        chunks: &[DocChunk],
        directive: &RetrievalDirective,
    ) -> (Vec<DocChunk>, PolicyLog) {
        let mut kept = Vec::new();
        let mut rejected_details = Vec::new();
        let mut rejected = 0usize;

        for chunk in chunks {
            let (ok, blocked_by) = self.is_admissible(chunk, directive);
            if ok {
                kept.push(chunk.clone());
            } else {
                rejected += 1;
                if rejected_details.len() < REJECTION_DETAIL_CAP {
                    rejected_details.push(RejectedChunk {
                        doc_id: chunk.doc_id.clone(),
                        chunk_id: chunk.chunk_id.clone(),
                        blocked_by,
                    });
                }
            }
        }

        debug!("admissibility: kept {} rejected {}", kept.len(), rejected);

        let log = PolicyLog {
            kept: kept.len(),
            rejected,
            rejected_details,
            profile: directive.log.clone(),
        };
        (kept, log)
    }
}

/// The five default rules: license, jurisdiction, PII, staleness, and
/// source-class restriction.
pub fn default_rules() -> Vec<PolicyRule> {
    vec![
        PolicyRule::new("license", |meta, directive| {
            match &directive.allowed_licenses {
                None => true,
                Some(allowed) => allowed.contains(&meta.license),
            }
        }),
        PolicyRule::new("jurisdiction", |meta, directive| {
            match &directive.allowed_jurisdictions {
                None => true,
                Some(allowed) => {
                    let jurisdiction = meta.jurisdiction.as_deref().unwrap_or("unknown");
                    allowed.iter().any(|a| a == jurisdiction)
                }
            }
        }),
        PolicyRule::new("pii", |meta, directive| {
            !directive.forbid_pii || !meta.contains_pii
        }),
        PolicyRule::new("staleness", |meta, directive| {
            if !directive.exclude_stale {
                return true;
            }
            let ttl = match directive.max_ttl_days.or(meta.ttl_days) {
                Some(ttl) => ttl,
                None => return true,
            };
            let created = match meta.created_at {
                Some(date) => date,
                None => return true,
            };
            let age_days = (Utc::now().date_naive() - created).num_days();
            age_days <= ttl
        }),
        PolicyRule::new("source_class", |meta, directive| {
            directive.restrict_to_source_classes.is_empty()
                || directive
                    .restrict_to_source_classes
                    .contains(&meta.source_class)
        }),
    ]
}
