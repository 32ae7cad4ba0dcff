//! End-to-end pipeline driver.
//!
//! Wires the stages together for one query:
//! admissibility filter → TF-IDF ranking → evidence leasing → claim
//! segmentation → per-claim counterfactual audit → report formatting.
//! Every invocation starts from a fresh prior; no state crosses queries.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auditing::{AuditConfig, CounterfactualAuditor};
use crate::error::{Error, Result};
use crate::generation::{GenerationConfig, SimpleGenerator};
use crate::leasing::{Calibrator, EvidenceLeaser, LeasingConfig};
use crate::policy::{PolicyEngine, PolicyLog, PolicyOptions};
use crate::retrieval::TfidfRetriever;
use crate::types::{ClaimAudit, DocChunk, LeaseTrace, LeasedEvidence};

/// Configuration for the full pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Admissibility options folded into each query's directive
    pub policy: PolicyOptions,
    /// How many ranked candidates retrieval hands to leasing
    pub top_k: usize,
    /// Leasing controller configuration
    pub leasing: LeasingConfig,
    /// Counterfactual auditor configuration
    pub auditing: AuditConfig,
    /// Draft/report generation configuration
    pub generation: GenerationConfig,
    /// Fresh prior belief applied to every query and claim
    pub prior: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            policy: PolicyOptions::default(),
            top_k: 15,
            leasing: LeasingConfig::default(),
            auditing: AuditConfig::default(),
            generation: GenerationConfig::default(),
            prior: 0.5,
        }
    }
}

impl PipelineConfig {
    fn validate(&self) -> Result<()> {
        if !self.prior.is_finite() || self.prior <= 0.0 || self.prior >= 1.0 {
            return Err(Error::config(format!(
                "prior must be in (0, 1), got {}",
                self.prior
            )));
        }
        if self.top_k == 0 {
            return Err(Error::config("top_k must be at least 1"));
        }
        Ok(())
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// Draft answer plus the calibrated claim report
    pub answer: String,
    /// One audit per segmented claim
    pub claims: Vec<ClaimAudit>,
    /// Evidence admitted by the leasing controller, in admission order
    pub leased: Vec<LeasedEvidence>,
    /// Admissibility summary for this query
    pub policy_log: PolicyLog,
    /// Leasing observability trace
    pub trace: LeaseTrace,
}

/// Evidence-leasing pipeline over a fixed corpus.
pub struct Pipeline {
    corpus: Vec<DocChunk>,
    cfg: PipelineConfig,
    policy: PolicyEngine,
    base_retriever: TfidfRetriever,
    leaser: EvidenceLeaser,
    auditor: CounterfactualAuditor,
    generator: SimpleGenerator,
}

impl Pipeline {
    /// Build a pipeline over a corpus, failing fast on invalid configuration
    /// or an empty corpus.
    pub fn new(corpus: Vec<DocChunk>, cfg: PipelineConfig) -> Result<Self> {
        cfg.validate()?;
        let base_retriever = TfidfRetriever::new(corpus.clone())?;
        let leaser = EvidenceLeaser::new(cfg.leasing.clone())?;
        let auditor = CounterfactualAuditor::new(cfg.auditing.clone())?;
        let generator = SimpleGenerator::new(cfg.generation.clone());

        Ok(Self {
            corpus,
            cfg,
            policy: PolicyEngine::default(),
            base_retriever,
            leaser,
            auditor,
            generator,
        })
    }

    /// Replace the likelihood calibration capability.
    pub fn with_calibrator(mut self, calibrator: Arc<dyn Calibrator>) -> Self {
        self.leaser = self.leaser.with_calibrator(calibrator);
        self
    }

    /// Replace the policy engine (custom rule sets).
    pub fn with_policy_engine(mut self, policy: PolicyEngine) -> Self {
        self.policy = policy;
        self
    }

    /// Process a single query end to end.
    pub fn run(&self, query: &str) -> Result<PipelineOutput> {
        info!("processing query: {}", query);

        let directive = self.policy.profile_query(query, &self.cfg.policy);
        let (admissible, policy_log) = self.policy.filter_admissible(&self.corpus, &directive);

        // With nothing admissible, fall back to the unfiltered index rather
        // than returning an empty answer for every strict policy.
        let ranked = if admissible.is_empty() {
            debug!("no admissible chunks, ranking over the full corpus");
            self.base_retriever.search(query, self.cfg.top_k)
        } else {
            TfidfRetriever::new(admissible)?.search(query, self.cfg.top_k)
        };

        let (leased, trace) = self.leaser.lease(query, &ranked, self.cfg.prior);
        info!(
            "leased {} of {} candidates (belief={:.3}, cost={:.1})",
            leased.len(),
            ranked.len(),
            trace.final_belief,
            trace.final_cost
        );

        let draft = self.generator.draft_answer(query, &leased);
        let claims = self.generator.segment_claims(&draft);

        let audits: Vec<ClaimAudit> = claims
            .iter()
            .map(|claim| self.auditor.audit(claim, &leased, self.cfg.prior))
            .collect();
        info!("audited {} claims", audits.len());

        let answer = self.generator.format_report(&draft, &audits);

        Ok(PipelineOutput {
            answer,
            claims: audits,
            leased,
            policy_log,
            trace,
        })
    }
}
