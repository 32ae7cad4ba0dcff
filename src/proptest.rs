//! Property-based tests for the leasing/auditing core using proptest.
//!
//! These tests verify the mathematical invariants of the belief, leasing,
//! and auditing components:
//!
//! - Belief updates stay inside the open unit interval
//! - Leasing traces are monotone and respect budget and step bounds
//! - Audit intervals bracket the full-evidence posterior
//! - Minimal supports are ordered subsequences of the leased evidence
//! - Necessity/sufficiency/CFS scores are bounded

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use std::sync::Arc;

    use crate::auditing::{AuditConfig, CounterfactualAuditor};
    use crate::belief::{bayes_update, fuse};
    use crate::leasing::{Calibrator, EvidenceLeaser, LeasingConfig};
    use crate::types::{DocChunk, EvidenceCandidate, LeasedEvidence};

    struct RawScoreCalibrator;

    impl Calibrator for RawScoreCalibrator {
        fn likelihood(&self, _query: &str, _chunk: &DocChunk, relevance: f64) -> f64 {
            relevance
        }
    }

    fn candidates(likelihoods: &[f64]) -> Vec<EvidenceCandidate> {
        likelihoods
            .iter()
            .enumerate()
            .map(|(i, &lk)| {
                EvidenceCandidate::new(DocChunk::new("doc", format!("c{i}"), "text"), lk)
            })
            .collect()
    }

    fn evidence(likelihoods: &[f64]) -> Vec<LeasedEvidence> {
        likelihoods
            .iter()
            .enumerate()
            .map(|(i, &lk)| LeasedEvidence {
                chunk: DocChunk::new("doc", format!("c{i}"), "text"),
                relevance: lk,
                likelihood: lk,
                delta_belief: 0.0,
                cost: 1.0,
            })
            .collect()
    }

    // Strategy for probabilities away from the extremes
    fn probability() -> impl Strategy<Value = f64> {
        0.01f64..0.99f64
    }

    fn likelihoods() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(probability(), 0..8)
    }

    // =========================================================================
    // Belief Update Properties
    // =========================================================================

    proptest! {
        /// Updates of in-range inputs stay strictly inside (0,1).
        #[test]
        fn update_stays_in_open_interval(
            prior in probability(),
            lk in probability()
        ) {
            let posterior = bayes_update(prior, lk);
            prop_assert!(
                posterior > 0.0 && posterior < 1.0,
                "update({}, {}) = {} left (0,1)",
                prior, lk, posterior
            );
        }

        /// Fusing the empty sequence is the identity.
        #[test]
        fn empty_fuse_is_identity(prior in probability()) {
            prop_assert_eq!(fuse(prior, &[]), prior);
        }

        /// A neutral likelihood of 0.5 leaves belief unchanged up to ε effects.
        #[test]
        fn neutral_likelihood_is_noop(prior in probability()) {
            let posterior = bayes_update(prior, 0.5);
            prop_assert!(
                (posterior - prior).abs() < 1e-6,
                "update({}, 0.5) = {} moved the belief",
                prior, posterior
            );
        }

        /// Supporting likelihoods (> 0.5) never lower belief.
        #[test]
        fn supporting_likelihood_is_monotone(
            prior in probability(),
            lk in 0.5f64..0.99f64
        ) {
            let posterior = bayes_update(prior, lk);
            prop_assert!(
                posterior >= prior - 1e-9,
                "update({}, {}) = {} lowered belief",
                prior, lk, posterior
            );
        }

        /// Fusion is order-invariant up to floating-point rounding.
        #[test]
        fn fusion_is_order_invariant(
            prior in probability(),
            lks in likelihoods()
        ) {
            let forward = fuse(prior, &lks);
            let mut reversed = lks.clone();
            reversed.reverse();
            let backward = fuse(prior, &reversed);
            prop_assert!(
                (forward - backward).abs() < 1e-8,
                "fuse forward {} != backward {}",
                forward, backward
            );
        }
    }

    // =========================================================================
    // Leasing Properties
    // =========================================================================

    fn raw_leaser(cfg: LeasingConfig) -> EvidenceLeaser {
        EvidenceLeaser::new(cfg)
            .unwrap()
            .with_calibrator(Arc::new(RawScoreCalibrator))
    }

    proptest! {
        /// The belief trace is non-decreasing across admissions.
        #[test]
        fn lease_trace_is_monotone(
            prior in probability(),
            lks in likelihoods()
        ) {
            let leaser = raw_leaser(LeasingConfig::default());
            let (_, trace) = leaser.lease("q", &candidates(&lks), prior);

            for pair in trace.belief_history.windows(2) {
                prop_assert!(pair[1] >= pair[0] - 1e-12);
            }
            prop_assert_eq!(
                *trace.belief_history.last().unwrap(),
                trace.final_belief
            );
        }

        /// Charged cost never exceeds the budget and admissions never exceed
        /// the step limit or the candidate count.
        #[test]
        fn lease_respects_bounds(
            prior in probability(),
            lks in likelihoods(),
            budget in 0.0f64..5.0f64,
            max_steps in 0usize..6
        ) {
            let cfg = LeasingConfig {
                budget,
                max_steps,
                ..Default::default()
            };
            let leaser = raw_leaser(cfg);
            let (leased, trace) = leaser.lease("q", &candidates(&lks), prior);

            prop_assert!(trace.final_cost <= budget + 1e-12);
            prop_assert!(leased.len() <= max_steps);
            prop_assert!(leased.len() <= lks.len());
        }

        /// A prior at or above τ admits nothing.
        #[test]
        fn satisfied_prior_admits_nothing(lks in likelihoods()) {
            let leaser = raw_leaser(LeasingConfig::default());
            let (leased, trace) = leaser.lease("q", &candidates(&lks), 0.9);

            prop_assert!(leased.is_empty());
            prop_assert_eq!(trace.admissions(), 0);
        }

        /// Every admitted item carries a positive belief delta.
        #[test]
        fn admissions_have_positive_delta(
            prior in probability(),
            lks in likelihoods()
        ) {
            let leaser = raw_leaser(LeasingConfig::default());
            let (leased, _) = leaser.lease("q", &candidates(&lks), prior);

            for item in &leased {
                prop_assert!(item.delta_belief > 0.0);
            }
        }
    }

    // =========================================================================
    // Auditing Properties
    // =========================================================================

    proptest! {
        /// The sensitivity interval brackets the full-evidence posterior.
        #[test]
        fn interval_brackets_full_posterior(
            prior in probability(),
            lks in likelihoods()
        ) {
            let auditor = CounterfactualAuditor::new(AuditConfig::default()).unwrap();
            let ev = evidence(&lks);
            let audit = auditor.audit("claim", &ev, prior);

            let full = fuse(prior, &lks);
            prop_assert!(
                audit.interval.0 <= full + 1e-12 && full <= audit.interval.1 + 1e-12,
                "interval [{}, {}] does not bracket {}",
                audit.interval.0, audit.interval.1, full
            );
        }

        /// The minimal support is an ordered subsequence of the evidence ids.
        #[test]
        fn minimal_support_is_ordered_subsequence(
            prior in probability(),
            lks in likelihoods()
        ) {
            let auditor = CounterfactualAuditor::new(AuditConfig::default()).unwrap();
            let ev = evidence(&lks);
            let audit = auditor.audit("claim", &ev, prior);

            let ids: Vec<String> = ev.iter().map(|e| e.id()).collect();
            let mut cursor = 0usize;
            for id in &audit.minimal_support {
                let position = ids[cursor..].iter().position(|x| x == id);
                prop_assert!(
                    position.is_some(),
                    "support id {} out of order or absent",
                    id
                );
                cursor += position.unwrap() + 1;
            }
        }

        /// Necessity, sufficiency, and CFS scores are bounded in [0,1]
        /// for weights summing to 1.
        #[test]
        fn audit_scores_are_bounded(
            prior in probability(),
            lks in likelihoods()
        ) {
            let auditor = CounterfactualAuditor::new(AuditConfig::default()).unwrap();
            let audit = auditor.audit("claim", &evidence(&lks), prior);

            prop_assert!((0.0..=1.0).contains(&audit.necessity_score()));
            prop_assert!((0.0..=1.0).contains(&audit.sufficiency_score()));
            prop_assert!((0.0..=1.0).contains(&audit.cfs));
            prop_assert!(audit.posterior > 0.0 && audit.posterior < 1.0);
        }

        /// Verdict maps cover exactly the minimal support.
        #[test]
        fn verdicts_cover_support(
            prior in probability(),
            lks in likelihoods()
        ) {
            let auditor = CounterfactualAuditor::new(AuditConfig::default()).unwrap();
            let audit = auditor.audit("claim", &evidence(&lks), prior);

            prop_assert_eq!(audit.necessity.len(), audit.minimal_support.len());
            prop_assert_eq!(audit.sufficiency.len(), audit.minimal_support.len());
            for id in &audit.minimal_support {
                prop_assert!(audit.necessity.contains_key(id));
                prop_assert!(audit.sufficiency.contains_key(id));
            }
        }
    }
}
