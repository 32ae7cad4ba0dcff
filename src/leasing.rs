//! Sequential Bayesian evidence leasing.
//!
//! The leasing controller walks a ranked candidate list and decides, item by
//! item, whether to "lease" (admit) the candidate into the working evidence
//! set. Three gates bound the loop:
//!
//! - **threshold**: stop as soon as belief reaches τ;
//! - **budget**: stop when admitting the next item would exceed the cost cap;
//! - **utility**: skip (without charging) any candidate whose belief gain does
//!   not cover its weighted cost.
//!
//! Worst-case admissions are `min(max_steps, floor(budget / per_item_cost))`,
//! so termination is guaranteed without any timeout machinery. The mapping
//! from relevance score to pseudo-likelihood is an injected capability so the
//! controller can be tested independently of any particular calibration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::belief::{bayes_update, clamp_likelihood, logistic};
use crate::error::{Error, Result};
use crate::types::{DocChunk, EvidenceCandidate, LeaseTrace, LeasedEvidence};

/// Configuration for the leasing controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeasingConfig {
    /// Confidence threshold τ; leasing stops once belief reaches it
    pub tau: f64,
    /// Total cost budget C_max
    pub budget: f64,
    /// Trade-off weight applied to cost in the utility gate
    pub alpha_cost: f64,
    /// Cost charged per admitted item
    pub per_item_cost: f64,
    /// Maximum number of candidates examined
    pub max_steps: usize,
}

impl Default for LeasingConfig {
    fn default() -> Self {
        Self {
            tau: 0.85,
            budget: 10.0,
            alpha_cost: 0.1,
            per_item_cost: 1.0,
            max_steps: 20,
        }
    }
}

impl LeasingConfig {
    /// Validate the configuration, rejecting it before any computation runs.
    ///
    /// τ may sit at 0 or 1: a zero threshold is immediately satisfied by any
    /// prior and a threshold of 1 is unreachable, both of which are
    /// well-defined degenerate setups.
    pub fn validate(&self) -> Result<()> {
        if !self.tau.is_finite() || !(0.0..=1.0).contains(&self.tau) {
            return Err(Error::config(format!(
                "tau must be in [0, 1], got {}",
                self.tau
            )));
        }
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(Error::config(format!(
                "budget must be non-negative, got {}",
                self.budget
            )));
        }
        if !self.alpha_cost.is_finite() || self.alpha_cost < 0.0 {
            return Err(Error::config(format!(
                "alpha_cost must be non-negative, got {}",
                self.alpha_cost
            )));
        }
        if !self.per_item_cost.is_finite() || self.per_item_cost <= 0.0 {
            return Err(Error::config(format!(
                "per_item_cost must be positive, got {}",
                self.per_item_cost
            )));
        }
        Ok(())
    }
}

/// Maps a candidate's retrieval relevance to a pseudo-likelihood.
///
/// Implementations must return values in the open interval (0,1); the
/// controller clamps anything outside to the nearest representable bound
/// rather than failing.
pub trait Calibrator: Send + Sync {
    fn likelihood(&self, query: &str, chunk: &DocChunk, relevance: f64) -> f64;
}

/// Lightweight likelihood proxy mapping retrieval similarity through a
/// logistic curve. Not a real probabilistic calibration; replace with a
/// learned calibrator in production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticCalibrator {
    /// Similarity value mapped to likelihood 0.5
    pub center: f64,
    /// Slope of the logistic curve
    pub steepness: f64,
}

impl Default for LogisticCalibrator {
    fn default() -> Self {
        Self {
            center: 0.35,
            steepness: 8.0,
        }
    }
}

impl Calibrator for LogisticCalibrator {
    fn likelihood(&self, _query: &str, _chunk: &DocChunk, relevance: f64) -> f64 {
        logistic(self.steepness * (relevance - self.center))
    }
}

/// Sequential evidence leasing controller with utility gating and stop
/// criteria.
pub struct EvidenceLeaser {
    cfg: LeasingConfig,
    calibrator: Arc<dyn Calibrator>,
}

impl EvidenceLeaser {
    /// Create a leaser with the default logistic calibrator.
    ///
    /// Fails fast on invalid configuration.
    pub fn new(cfg: LeasingConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            calibrator: Arc::new(LogisticCalibrator::default()),
        })
    }

    /// Replace the calibration capability.
    pub fn with_calibrator(mut self, calibrator: Arc<dyn Calibrator>) -> Self {
        self.calibrator = calibrator;
        self
    }

    /// Get the leaser's configuration.
    pub fn config(&self) -> &LeasingConfig {
        &self.cfg
    }

    /// Lease evidence from a ranked candidate list.
    ///
    /// Walks candidates in ranked order, admitting those that pass the
    /// utility gate until the threshold, the budget, or the step limit stops
    /// the loop. Returns the leased items in admission order together with an
    /// observability trace. An empty candidate list or a prior already at τ
    /// yields zero admissions.
    pub fn lease(
        &self,
        query: &str,
        ranked: &[EvidenceCandidate],
        prior: f64,
    ) -> (Vec<LeasedEvidence>, LeaseTrace) {
        let mut leased: Vec<LeasedEvidence> = Vec::new();
        let mut belief = prior;
        let mut cost = 0.0;
        let mut belief_history = vec![belief];
        let mut cost_history = vec![cost];

        for candidate in ranked.iter().take(self.cfg.max_steps) {
            if belief >= self.cfg.tau {
                debug!(
                    "threshold reached (belief={:.3} >= tau={:.2}), stopping",
                    belief, self.cfg.tau
                );
                break;
            }
            if cost + self.cfg.per_item_cost > self.cfg.budget {
                debug!(
                    "budget exhausted (cost={:.1}, budget={:.1}), stopping",
                    cost, self.cfg.budget
                );
                break;
            }

            let likelihood = clamp_likelihood(self.calibrator.likelihood(
                query,
                &candidate.chunk,
                candidate.relevance,
            ));
            let posterior = bayes_update(belief, likelihood);
            let delta = posterior - belief;
            let utility = delta - self.cfg.alpha_cost * self.cfg.per_item_cost;

            if utility <= 0.0 {
                // Skip without charging: the gain does not cover the cost.
                debug!(
                    "skipped {} (utility={:.3} <= 0)",
                    candidate.chunk.id(),
                    utility
                );
                continue;
            }

            cost += self.cfg.per_item_cost;
            belief = posterior;
            leased.push(LeasedEvidence {
                chunk: candidate.chunk.clone(),
                relevance: candidate.relevance,
                likelihood,
                delta_belief: delta,
                cost: self.cfg.per_item_cost,
            });
            belief_history.push(belief);
            cost_history.push(cost);
            debug!(
                "leased {} (likelihood={:.3}, belief={:.3}, cost={:.1})",
                candidate.chunk.id(),
                likelihood,
                belief,
                cost
            );
        }

        let trace = LeaseTrace {
            belief_history,
            cost_history,
            final_belief: belief,
            final_cost: cost,
            threshold: self.cfg.tau,
            budget: self.cfg.budget,
        };
        (leased, trace)
    }
}
