//! Counterfactual auditing of claims against leased evidence.
//!
//! For each claim the auditor answers two human-interpretable questions per
//! evidence item: "would the claim collapse without this?" (necessity) and
//! "does this alone justify the claim?" (sufficiency). Full counterfactual
//! enumeration is exponential in evidence count, so the auditor probes only
//! single-item removals plus a greedy minimal support set, which is cheap and
//! still covers the most influential counterfactuals.
//!
//! The auditor deliberately reuses the exact belief-update fold from
//! [`crate::belief`] that the leasing controller used to decide what evidence
//! exists, so audit posteriors are consistent with leasing posteriors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::belief::bayes_update;
use crate::error::{Error, Result};
use crate::types::{ClaimAudit, LeasedEvidence};

/// Configuration for the counterfactual auditor.
///
/// `tau` defaults to the same value the leasing controller uses. The two are
/// independent settings: auditing with a different confidence bar than
/// leasing is logically valid, but diverging values couple loosely and are
/// easy to misread, so keep them aligned unless there is a reason not to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Confidence threshold τ for sufficiency and necessity verdicts
    pub tau: f64,
    /// Weight of the necessity score in the confidence fusion score
    pub alpha: f64,
    /// Weight of the sufficiency score in the confidence fusion score
    pub beta: f64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            tau: 0.85,
            alpha: 0.5,
            beta: 0.5,
        }
    }
}

impl AuditConfig {
    /// Validate the configuration.
    ///
    /// The CFS lands in [0,1] when `alpha + beta <= 1`; larger sums are
    /// accepted but scale the score accordingly.
    pub fn validate(&self) -> Result<()> {
        if !self.tau.is_finite() || !(0.0..=1.0).contains(&self.tau) {
            return Err(Error::config(format!(
                "tau must be in [0, 1], got {}",
                self.tau
            )));
        }
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(Error::config(format!(
                "alpha must be non-negative, got {}",
                self.alpha
            )));
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(Error::config(format!(
                "beta must be non-negative, got {}",
                self.beta
            )));
        }
        Ok(())
    }
}

/// Counterfactual auditor: leave-one-out sensitivity, minimal support, and
/// necessity/sufficiency classification per claim.
pub struct CounterfactualAuditor {
    cfg: AuditConfig,
}

impl CounterfactualAuditor {
    /// Create an auditor, failing fast on invalid configuration.
    pub fn new(cfg: AuditConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Get the auditor's configuration.
    pub fn config(&self) -> &AuditConfig {
        &self.cfg
    }

    /// Posterior from the prior and the likelihoods at the given evidence
    /// indices, folded in index order.
    fn posterior_of(&self, indices: &[usize], evidence: &[LeasedEvidence], prior: f64) -> f64 {
        indices
            .iter()
            .fold(prior, |belief, &i| bayes_update(belief, evidence[i].likelihood))
    }

    /// Greedy maximal-marginal-gain minimal support.
    ///
    /// Repeatedly adds the not-yet-selected item whose inclusion maximizes the
    /// recomputed posterior, stopping at τ, at a non-positive best gain, or
    /// when candidates run out. The candidate pool is iterated by index over
    /// the immutable evidence slice; no live list is mutated. The result is a
    /// locally greedy sufficient set, not a guaranteed smallest one, and is
    /// returned in leasing (admission) order.
    pub fn minimal_support(&self, evidence: &[LeasedEvidence], prior: f64) -> Vec<usize> {
        let mut remaining: Vec<usize> = (0..evidence.len()).collect();
        let mut support: Vec<usize> = Vec::new();
        let mut current = prior;

        while current < self.cfg.tau && !remaining.is_empty() {
            let mut best: Option<(usize, f64)> = None;
            for (position, &index) in remaining.iter().enumerate() {
                let mut trial = support.clone();
                trial.push(index);
                let gain = self.posterior_of(&trial, evidence, prior) - current;
                // Strict comparison: ties keep the earliest-leased candidate.
                if best.map_or(true, |(_, best_gain)| gain > best_gain) {
                    best = Some((position, gain));
                }
            }

            match best {
                Some((position, gain)) if gain > 0.0 => {
                    let index = remaining.remove(position);
                    support.push(index);
                    current = self.posterior_of(&support, evidence, prior);
                }
                _ => break,
            }
        }

        support.sort_unstable();
        support
    }

    /// Audit one claim against the full leased-evidence list.
    pub fn audit(&self, claim: &str, evidence: &[LeasedEvidence], prior: f64) -> ClaimAudit {
        let all: Vec<usize> = (0..evidence.len()).collect();
        let full_posterior = self.posterior_of(&all, evidence, prior);

        // Leave-one-out sensitivity interval over all leased evidence. The
        // full posterior participates, so the interval always brackets it.
        let interval = if evidence.is_empty() {
            (full_posterior, full_posterior)
        } else {
            let mut lower = full_posterior;
            let mut upper = full_posterior;
            for skipped in 0..evidence.len() {
                let kept: Vec<usize> = all.iter().copied().filter(|&i| i != skipped).collect();
                let posterior = self.posterior_of(&kept, evidence, prior);
                lower = lower.min(posterior);
                upper = upper.max(posterior);
            }
            (lower, upper)
        };

        let support = self.minimal_support(evidence, prior);

        let mut necessity: HashMap<String, bool> = HashMap::new();
        let mut sufficiency: HashMap<String, bool> = HashMap::new();
        for &index in &support {
            let rest: Vec<usize> = support.iter().copied().filter(|&j| j != index).collect();
            let without = self.posterior_of(&rest, evidence, prior);
            necessity.insert(evidence[index].id(), without < self.cfg.tau);

            let alone = bayes_update(prior, evidence[index].likelihood);
            sufficiency.insert(evidence[index].id(), alone >= self.cfg.tau);
        }

        let necessity_score = fraction_true(&necessity);
        let sufficiency_score = fraction_true(&sufficiency);
        let cfs = self.cfg.alpha * necessity_score + self.cfg.beta * sufficiency_score;

        let posterior = if support.is_empty() {
            full_posterior
        } else {
            self.posterior_of(&support, evidence, prior)
        };

        debug!(
            "audited claim (support={}/{}, posterior={:.3}, cfs={:.3})",
            support.len(),
            evidence.len(),
            posterior,
            cfs
        );

        ClaimAudit {
            claim: claim.to_string(),
            posterior,
            interval,
            minimal_support: support.iter().map(|&i| evidence[i].id()).collect(),
            necessity,
            sufficiency,
            cfs,
        }
    }
}

fn fraction_true(verdicts: &HashMap<String, bool>) -> f64 {
    if verdicts.is_empty() {
        0.0
    } else {
        verdicts.values().filter(|&&v| v).count() as f64 / verdicts.len() as f64
    }
}
