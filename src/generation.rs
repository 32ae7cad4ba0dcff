//! Offline draft generation and calibrated reporting.
//!
//! No external model is involved: the draft is a template over the top leased
//! evidence, claims are segmented from the draft text, and the report appends
//! each claim's audit (belief, sensitivity interval, CFS, minimal support) in
//! a fixed human-readable layout.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{ClaimAudit, LeasedEvidence};

/// Configuration for draft generation and claim segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum number of claims segmented from a draft
    pub max_claims: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { max_claims: 6 }
    }
}

/// Template-based generator and report formatter.
pub struct SimpleGenerator {
    cfg: GenerationConfig,
    sentence_splitter: Regex,
}

impl SimpleGenerator {
    pub fn new(cfg: GenerationConfig) -> Self {
        Self {
            cfg,
            // Runs of non-terminator characters plus trailing punctuation.
            sentence_splitter: Regex::new(r"[^.!?]+[.!?]*").expect("sentence splitter regex"),
        }
    }

    /// Get the generator's configuration.
    pub fn config(&self) -> &GenerationConfig {
        &self.cfg
    }

    /// Draft an evidence-grounded answer from the leased evidence.
    pub fn draft_answer(&self, query: &str, leased: &[LeasedEvidence]) -> String {
        if leased.is_empty() {
            return format!("I could not find sufficient admissible evidence to answer: {query}");
        }

        let bullets: Vec<String> = leased
            .iter()
            .take(3)
            .map(|e| {
                let text = e.chunk.text.trim();
                let snippet: String = text.chars().take(240).collect();
                format!("- {snippet}")
            })
            .collect();
        format!("Answer (evidence-grounded draft):\n{}", bullets.join("\n"))
    }

    /// Segment a draft into claims.
    ///
    /// Bullet lines are taken verbatim; prose falls back to sentence
    /// splitting. The result is capped at `max_claims`.
    pub fn segment_claims(&self, answer: &str) -> Vec<String> {
        let mut claims: Vec<String> = answer
            .lines()
            .filter(|line| line.trim_start().starts_with('-'))
            .map(|line| line.trim_start().trim_start_matches('-').trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();

        if claims.is_empty() {
            claims = self
                .sentence_splitter
                .find_iter(answer)
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        claims.truncate(self.cfg.max_claims);
        claims
    }

    /// Format the calibrated claim report appended to the draft answer.
    pub fn format_report(&self, answer: &str, audits: &[ClaimAudit]) -> String {
        let mut out = vec![answer.to_string(), String::new(), "Calibrated claim report:".to_string()];
        for (i, audit) in audits.iter().enumerate() {
            let support = if audit.minimal_support.is_empty() {
                "∅".to_string()
            } else {
                audit.minimal_support.join(", ")
            };
            out.push(format!(
                "{}. {}\n   Belief={:.3}  Interval=[{:.3},{:.3}]  CFS={:.3}\n   Minimal-support={}",
                i + 1,
                audit.claim,
                audit.posterior,
                audit.interval.0,
                audit.interval.1,
                audit.cfs,
                support
            ));
        }
        out.join("\n")
    }
}

impl Default for SimpleGenerator {
    fn default() -> Self {
        Self::new(GenerationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocChunk;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn leased(texts: &[&str]) -> Vec<LeasedEvidence> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| LeasedEvidence {
                chunk: DocChunk::new("doc", format!("c{i}"), *text),
                relevance: 0.8,
                likelihood: 0.9,
                delta_belief: 0.4,
                cost: 1.0,
            })
            .collect()
    }

    #[test]
    fn test_draft_without_evidence() {
        let generator = SimpleGenerator::default();
        let draft = generator.draft_answer("what is x?", &[]);
        assert!(draft.contains("could not find sufficient admissible evidence"));
        assert!(draft.contains("what is x?"));
    }

    #[test]
    fn test_draft_uses_top_three_items() {
        let generator = SimpleGenerator::default();
        let draft = generator.draft_answer("q", &leased(&["one.", "two.", "three.", "four."]));
        assert!(draft.contains("- one."));
        assert!(draft.contains("- three."));
        assert!(!draft.contains("four."));
    }

    #[test]
    fn test_segment_claims_from_bullets() {
        let generator = SimpleGenerator::default();
        let claims =
            generator.segment_claims("Answer (evidence-grounded draft):\n- first claim.\n- second claim.");
        assert_eq!(
            claims,
            vec!["first claim.".to_string(), "second claim.".to_string()]
        );
    }

    #[test]
    fn test_segment_claims_from_prose() {
        let generator = SimpleGenerator::default();
        let claims = generator.segment_claims("First sentence. Second sentence! Third?");
        assert_eq!(claims.len(), 3);
        assert_eq!(claims[0], "First sentence.");
    }

    #[test]
    fn test_segment_claims_respects_cap() {
        let generator = SimpleGenerator::new(GenerationConfig { max_claims: 2 });
        let claims = generator.segment_claims("- a.\n- b.\n- c.");
        assert_eq!(claims.len(), 2);
    }

    #[test]
    fn test_format_report() {
        let generator = SimpleGenerator::default();
        let audit = ClaimAudit {
            claim: "Ottawa is the capital of Canada.".to_string(),
            posterior: 0.946,
            interval: (0.5, 0.946),
            minimal_support: vec!["doc1:c1".to_string()],
            necessity: HashMap::from([("doc1:c1".to_string(), true)]),
            sufficiency: HashMap::from([("doc1:c1".to_string(), true)]),
            cfs: 1.0,
        };

        let report = generator.format_report("draft answer", &[audit]);
        assert!(report.starts_with("draft answer"));
        assert!(report.contains("Calibrated claim report:"));
        assert!(report.contains("Belief=0.946"));
        assert!(report.contains("CFS=1.000"));
        assert!(report.contains("Minimal-support=doc1:c1"));
    }

    #[test]
    fn test_format_report_empty_support() {
        let generator = SimpleGenerator::default();
        let audit = ClaimAudit {
            claim: "unsupported".to_string(),
            posterior: 0.5,
            interval: (0.5, 0.5),
            minimal_support: Vec::new(),
            necessity: HashMap::new(),
            sufficiency: HashMap::new(),
            cfs: 0.0,
        };
        let report = generator.format_report("draft", &[audit]);
        assert!(report.contains("Minimal-support=∅"));
    }
}
