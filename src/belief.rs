//! Sequential naive-Bayes belief fusion.
//!
//! This module provides the shared belief-update primitive used by both the
//! leasing controller and the counterfactual auditor. Beliefs are posterior
//! probabilities that a claim or query is evidentially supported, and each
//! piece of evidence contributes a conditional likelihood that is folded into
//! the running belief under an independence assumption:
//!
//! p' = (lk * p) / (lk * p + (1 - lk) * (1 - p) + ε)
//!
//! The ε stabilizer keeps the denominator away from zero when a likelihood
//! sits at an extreme. The fold is mathematically order-invariant; applying
//! likelihoods in arrival order is a convention that keeps results bit-for-bit
//! reproducible for a given input sequence.

/// Stabilizer added to the update denominator to avoid division by zero
/// for likelihoods at exactly 0 or 1.
pub const EPSILON: f64 = 1e-12;

/// Single naive-Bayes update of a belief with one likelihood.
///
/// For `prior` and `likelihood` in (0,1) the result is again in (0,1):
/// the numerator is strictly positive and strictly smaller than the
/// stabilized denominator.
///
/// # Arguments
/// * `prior` - Current belief, in (0,1)
/// * `likelihood` - Conditional likelihood of the evidence, in (0,1)
pub fn bayes_update(prior: f64, likelihood: f64) -> f64 {
    let num = likelihood * prior;
    let den = num + (1.0 - likelihood) * (1.0 - prior);
    num / (den + EPSILON)
}

/// Fold a sequence of likelihoods into a prior, in arrival order.
///
/// `fuse(p, [])` returns `p` unchanged; a neutral likelihood of 0.5 leaves
/// the belief (approximately) unchanged.
pub fn fuse(prior: f64, likelihoods: &[f64]) -> f64 {
    likelihoods
        .iter()
        .fold(prior, |belief, &lk| bayes_update(belief, lk))
}

/// Standard logistic function, used by the default likelihood calibrator.
pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Clamp a value into the open unit interval expected of likelihoods.
///
/// Calibrators are contracted to return values in (0,1); anything outside
/// is pulled to the nearest representable bound rather than rejected.
pub fn clamp_likelihood(p: f64) -> f64 {
    p.clamp(1e-9, 1.0 - 1e-9)
}
