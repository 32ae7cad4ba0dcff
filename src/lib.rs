//! # belrag
//!
//! Budget-gated Bayesian evidence leasing with counterfactual claim auditing.
//!
//! A query is answered by *leasing* a small, cost-bounded set of supporting
//! evidence snippets, then *auditing* each generated claim for how much its
//! belief depends on which specific pieces of evidence. Both halves share one
//! belief-update primitive, so audit posteriors are consistent with the
//! decisions that selected the evidence in the first place.
//!
//! ## Core Components
//!
//! - **Belief**: sequential naive-Bayes fusion of a prior with evidence
//!   likelihoods
//! - **Leasing**: sequential admit/skip decisions under a confidence
//!   threshold, a cost budget, and a net-utility gate
//! - **Auditing**: leave-one-out sensitivity intervals, greedy minimal
//!   support, necessity/sufficiency verdicts, and a confidence fusion score
//! - **Policy / Retrieval / Generation**: admissibility filtering, TF-IDF
//!   ranking, and report formatting around the core
//!
//! ## Example
//!
//! ```rust,ignore
//! use belrag::{DocChunk, Pipeline, PipelineConfig};
//!
//! let corpus = vec![DocChunk::new("doc1", "c1", "Ottawa is the capital of Canada.")];
//! let pipeline = Pipeline::new(corpus, PipelineConfig::default())?;
//!
//! let out = pipeline.run("What is the capital of Canada?")?;
//! println!("{}", out.answer);
//!
//! for claim in &out.claims {
//!     println!(
//!         "{} belief={:.3} interval=[{:.3},{:.3}] cfs={:.3}",
//!         claim.claim, claim.posterior, claim.interval.0, claim.interval.1, claim.cfs
//!     );
//! }
//! ```
//!
//! Each query is processed independently from a fresh prior; the components
//! hold no cross-call state and are safe to share across threads.

pub mod auditing;
pub mod belief;
pub mod error;
pub mod generation;
pub mod leasing;
pub mod pipeline;
pub mod policy;
pub mod retrieval;
pub mod types;

#[cfg(test)]
mod proptest;

// Re-exports for convenience
pub use auditing::{AuditConfig, CounterfactualAuditor};
pub use belief::{bayes_update, fuse};
pub use error::{Error, Result};
pub use generation::{GenerationConfig, SimpleGenerator};
pub use leasing::{Calibrator, EvidenceLeaser, LeasingConfig, LogisticCalibrator};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput};
pub use policy::{
    default_rules, PolicyEngine, PolicyLog, PolicyOptions, PolicyRule, RejectedChunk,
    RetrievalDirective,
};
pub use retrieval::TfidfRetriever;
pub use types::{
    ClaimAudit, DocChunk, EvidenceCandidate, LeaseTrace, LeasedEvidence, PolicyMetadata,
};
