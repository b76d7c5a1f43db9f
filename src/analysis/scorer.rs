//! Deterministic risk scoring.
//!
//! A base tier is derived from the declared counts using a fixed,
//! first-match-wins rule list, then possibly escalated by serious-outcome
//! vocabulary found in the raw analysis text.

use crate::models::{RiskAssessment, RiskTier, SafetyCounts};
use thiserror::Error;
use tracing::{debug, warn};

/// Serious-outcome vocabulary. Each term counts once, however often it appears.
pub const SERIOUS_TERMS: &[&str] = &[
    "death",
    "fatal",
    "mortality",
    "life-threatening",
    "hospitalization",
    "serious adverse event",
    "severe",
    "toxicity",
    "black box warning",
    "discontinuation",
    "withdrawal",
    "contraindicated",
];

/// Serious terms needed to escalate any non-HIGH tier to HIGH.
const ESCALATE_TO_HIGH: usize = 3;

/// Serious terms needed to escalate LOW to MEDIUM.
const ESCALATE_TO_MEDIUM: usize = 1;

/// Internal scorer faults. Surfaced only as an UNKNOWN tier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error(
        "safety counts overflow when summed ({adverse_events} adverse events, {drug_interactions} drug interactions, {contraindications} contraindications)"
    )]
    CountOverflow {
        adverse_events: u32,
        drug_interactions: u32,
        contraindications: u32,
    },
}

/// Score one analysis. Never fails; internal faults yield [`RiskTier::Unknown`].
pub fn score(counts: SafetyCounts, raw_text: &str) -> RiskAssessment {
    match try_score(counts, raw_text) {
        Ok(assessment) => assessment,
        Err(e) => {
            warn!("Risk scoring failed: {}", e);
            RiskAssessment::unknown(e)
        }
    }
}

fn try_score(counts: SafetyCounts, raw_text: &str) -> Result<RiskAssessment, ScoreError> {
    let total = counts.checked_total().ok_or(ScoreError::CountOverflow {
        adverse_events: counts.adverse_events_count,
        drug_interactions: counts.drug_interactions_count,
        contraindications: counts.contraindications_count,
    })?;

    let (base, mut rationale) = base_tier(&counts, total);
    let serious_terms_count = count_serious_terms(raw_text);

    let tier = match escalate(base, serious_terms_count) {
        Some(escalated) => {
            rationale.push_str(&format!(
                " (upgraded due to {} serious safety terms)",
                serious_terms_count
            ));
            escalated
        }
        None => base,
    };

    debug!(
        "Scored {} (base {}, total {}, serious terms {})",
        tier, base, total, serious_terms_count
    );

    Ok(RiskAssessment {
        tier,
        rationale,
        counts,
        total_safety_signals: total,
        serious_terms_count,
    })
}

/// Base tier and rationale from counts alone.
///
/// The branch order is a total order over ambiguous evidence; reordering it
/// changes outcomes at boundary values.
fn base_tier(counts: &SafetyCounts, total: u32) -> (RiskTier, String) {
    let SafetyCounts {
        adverse_events_count: ae,
        drug_interactions_count: di,
        contraindications_count: ci,
    } = *counts;
    let detail = format!(
        "{} adverse events, {} drug interactions, {} contraindications",
        ae, di, ci
    );

    if total >= 5 || ci >= 2 || di >= 3 {
        (RiskTier::High, format!("High risk: {}", detail))
    } else if total >= 2 || ci >= 1 || di >= 1 {
        (RiskTier::Medium, format!("Medium risk: {}", detail))
    } else if total > 0 {
        (RiskTier::Low, format!("Low risk: {}", detail))
    } else {
        (
            RiskTier::Low,
            "No specific safety signals identified".to_string(),
        )
    }
}

/// Tier after keyword escalation, or `None` when no escalation applies.
///
/// Never lowers a tier.
fn escalate(tier: RiskTier, serious_terms: usize) -> Option<RiskTier> {
    if serious_terms >= ESCALATE_TO_HIGH && tier != RiskTier::High {
        Some(RiskTier::High)
    } else if serious_terms >= ESCALATE_TO_MEDIUM && tier == RiskTier::Low {
        Some(RiskTier::Medium)
    } else {
        None
    }
}

/// Number of distinct serious terms present in `text` (case-insensitive).
pub fn count_serious_terms(text: &str) -> usize {
    let lower = text.to_lowercase();
    SERIOUS_TERMS
        .iter()
        .filter(|term| lower.contains(*term))
        .count()
}
