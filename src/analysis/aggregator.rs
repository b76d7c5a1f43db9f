//! Cohort aggregation and statistics.
//!
//! This module reduces per-paper analyses into cohort-level statistics and
//! provides ordering and filtering helpers for reports.

use crate::models::{CohortSummary, PaperAnalysis, RiskTier};
use std::cmp::Reverse;

/// Reduce a set of paper analyses into a [`CohortSummary`].
///
/// Pure: the same input always produces the same summary, and the sums do
/// not depend on input order.
pub fn aggregate(papers: &[PaperAnalysis]) -> CohortSummary {
    let mut summary = CohortSummary::default();
    summary.total_papers = papers.len();

    for paper in papers {
        *summary.risk_tiers.entry(paper.tier()).or_insert(0) += 1;

        for domain in &paper.safety_domains {
            let domain = domain.trim();
            if domain.is_empty() {
                continue;
            }
            *summary
                .safety_domains
                .entry(domain.to_string())
                .or_insert(0) += 1;
        }

        let counts = &paper.assessment.counts;
        summary.total_adverse_events += u64::from(counts.adverse_events_count);
        summary.total_drug_interactions += u64::from(counts.drug_interactions_count);
        summary.total_contraindications += u64::from(counts.contraindications_count);
        summary.total_serious_terms += paper.assessment.serious_terms_count as u64;

        if paper.needs_reporting_review() {
            summary.fda_reporting_count += 1;
        }
        if paper.analysis_failed {
            summary.failed_analyses += 1;
        }
    }

    summary
}

/// Sort papers highest risk first, then by total signals (most first).
///
/// Stable, so ties keep their input order.
pub fn rank_by_risk(papers: &mut [PaperAnalysis]) {
    papers.sort_by_key(|p| (p.tier(), Reverse(p.assessment.total_safety_signals)));
}

/// Papers whose tier is at or above `min_tier`.
pub fn filter_by_min_tier(papers: &[PaperAnalysis], min_tier: RiskTier) -> Vec<PaperAnalysis> {
    papers
        .iter()
        .filter(|p| p.tier().at_least(min_tier))
        .cloned()
        .collect()
}

/// The `n` most frequent safety domains, ties broken by name.
pub fn top_domains(summary: &CohortSummary, n: usize) -> Vec<(&str, usize)> {
    let mut domains: Vec<(&str, usize)> = summary
        .safety_domains
        .iter()
        .map(|(name, count)| (name.as_str(), *count))
        .collect();

    // BTreeMap iteration is already name-ordered; a stable sort keeps that for ties.
    domains.sort_by_key(|(_, count)| Reverse(*count));
    domains.truncate(n);
    domains
}

/// Generate a text summary of cohort statistics.
pub fn generate_summary_text(summary: &CohortSummary) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Papers analyzed: {}", summary.total_papers));
    for tier in RiskTier::ALL {
        lines.push(format!(
            "- {} {}: {} ({:.1}%)",
            tier.emoji(),
            tier,
            summary.tier_count(tier),
            summary.tier_share(tier)
        ));
    }
    lines.push(format!(
        "Safety signals: {} adverse events, {} drug interactions, {} contraindications",
        summary.total_adverse_events,
        summary.total_drug_interactions,
        summary.total_contraindications
    ));
    lines.push(format!(
        "Flagged for FDA reporting review: {}",
        summary.fda_reporting_count
    ));

    if summary.failed_analyses > 0 {
        lines.push(format!("Failed analyses: {}", summary.failed_analyses));
    }

    let domains = top_domains(summary, 5);
    if !domains.is_empty() {
        lines.push(String::new());
        lines.push("Top safety domains:".to_string());
        for (domain, count) in domains {
            lines.push(format!("- {}: {}", domain, count));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaperMeta, RiskAssessment, SafetyCounts};

    fn create_test_paper(id: &str, tier: RiskTier, counts: SafetyCounts) -> PaperAnalysis {
        PaperAnalysis {
            paper: PaperMeta {
                identifier: id.to_string(),
                title: format!("Paper {}", id),
                ..PaperMeta::default()
            },
            assessment: RiskAssessment {
                tier,
                rationale: String::new(),
                counts,
                total_safety_signals: counts.checked_total().unwrap_or(0),
                serious_terms_count: 1,
            },
            adverse_events: vec![],
            drug_interactions: vec![],
            contraindications: vec![],
            other_signals: vec![],
            all_safety_signals: vec![],
            key_findings: vec![],
            regulatory_impact: "No specific regulatory action identified".to_string(),
            safety_domains: vec!["Hepatic".to_string()],
            clinical_significance: String::new(),
            full_analysis: String::new(),
            analysis_failed: false,
            analysis_error: None,
        }
    }

    fn cohort() -> Vec<PaperAnalysis> {
        let mut papers = Vec::new();
        for i in 0..3 {
            papers.push(create_test_paper(
                &format!("h{}", i),
                RiskTier::High,
                SafetyCounts::new(5, 0, 0),
            ));
        }
        for i in 0..2 {
            papers.push(create_test_paper(
                &format!("m{}", i),
                RiskTier::Medium,
                SafetyCounts::new(1, 1, 0),
            ));
        }
        for i in 0..5 {
            papers.push(create_test_paper(
                &format!("l{}", i),
                RiskTier::Low,
                SafetyCounts::new(1, 0, 0),
            ));
        }
        papers
    }

    #[test]
    fn test_aggregate_tier_counts() {
        let summary = aggregate(&cohort());

        assert_eq!(summary.total_papers, 10);
        assert_eq!(summary.tier_count(RiskTier::High), 3);
        assert_eq!(summary.tier_count(RiskTier::Medium), 2);
        assert_eq!(summary.tier_count(RiskTier::Low), 5);
        assert_eq!(summary.tier_count(RiskTier::Unknown), 0);
        assert_eq!(summary.risk_tiers.len(), 4);
    }

    #[test]
    fn test_aggregate_empty_cohort_has_all_tiers() {
        let summary = aggregate(&[]);

        assert_eq!(summary.total_papers, 0);
        assert_eq!(summary.risk_tiers.len(), 4);
        assert!(summary.risk_tiers.values().all(|count| *count == 0));
        assert!(summary.safety_domains.is_empty());
    }

    #[test]
    fn test_aggregate_totals() {
        let summary = aggregate(&cohort());

        assert_eq!(summary.total_adverse_events, 3 * 5 + 2 + 5);
        assert_eq!(summary.total_drug_interactions, 2);
        assert_eq!(summary.total_contraindications, 0);
        assert_eq!(summary.total_safety_signals(), 24);
        assert_eq!(summary.total_serious_terms, 10);
        assert_eq!(summary.fda_reporting_count, 3);
    }

    #[test]
    fn test_aggregate_is_idempotent_and_order_independent() {
        let papers = cohort();
        let first = aggregate(&papers);
        let second = aggregate(&papers);
        assert_eq!(first, second);

        let mut reversed = papers.clone();
        reversed.reverse();
        assert_eq!(aggregate(&reversed), first);
    }

    #[test]
    fn test_aggregate_sub_slices_sum_to_whole() {
        let papers = cohort();
        let whole = aggregate(&papers);
        let (left, right) = papers.split_at(4);
        let (a, b) = (aggregate(left), aggregate(right));

        assert_eq!(a.total_papers + b.total_papers, whole.total_papers);
        assert_eq!(
            a.total_adverse_events + b.total_adverse_events,
            whole.total_adverse_events
        );
        for tier in RiskTier::ALL {
            assert_eq!(a.tier_count(tier) + b.tier_count(tier), whole.tier_count(tier));
        }
    }

    #[test]
    fn test_domain_counts_trim_and_accept_arbitrary_tags() {
        let mut a = create_test_paper("a", RiskTier::Low, SafetyCounts::default());
        a.safety_domains = vec![" Cardiac ".to_string(), "Ocular (retinal)".to_string()];
        let mut b = create_test_paper("b", RiskTier::Low, SafetyCounts::default());
        b.safety_domains = vec!["Cardiac".to_string(), "   ".to_string()];
        let mut c = create_test_paper("c", RiskTier::Low, SafetyCounts::default());
        c.safety_domains = vec!["cardiac".to_string()];

        let summary = aggregate(&[a, b, c]);

        assert_eq!(summary.safety_domains.get("Cardiac"), Some(&2));
        assert_eq!(summary.safety_domains.get("cardiac"), Some(&1));
        assert_eq!(summary.safety_domains.get("Ocular (retinal)"), Some(&1));
        assert_eq!(summary.safety_domains.len(), 3);
    }

    #[test]
    fn test_fda_flag_from_regulatory_text() {
        let mut paper = create_test_paper("x", RiskTier::Low, SafetyCounts::default());
        paper.regulatory_impact = "- Meets criteria for 15-day FDA expedited report".to_string();
        let mut failed = create_test_paper("y", RiskTier::Low, SafetyCounts::default());
        failed.analysis_failed = true;

        let summary = aggregate(&[paper, failed]);

        assert_eq!(summary.fda_reporting_count, 1);
        assert_eq!(summary.failed_analyses, 1);
    }

    #[test]
    fn test_rank_by_risk() {
        let mut papers = vec![
            create_test_paper("low", RiskTier::Low, SafetyCounts::new(1, 0, 0)),
            create_test_paper("unknown", RiskTier::Unknown, SafetyCounts::default()),
            create_test_paper("high-small", RiskTier::High, SafetyCounts::new(0, 0, 2)),
            create_test_paper("medium", RiskTier::Medium, SafetyCounts::new(2, 0, 0)),
            create_test_paper("high-big", RiskTier::High, SafetyCounts::new(6, 1, 0)),
        ];

        rank_by_risk(&mut papers);

        let order: Vec<&str> = papers.iter().map(|p| p.paper.identifier.as_str()).collect();
        assert_eq!(order, vec!["high-big", "high-small", "medium", "low", "unknown"]);
    }

    #[test]
    fn test_filter_by_min_tier() {
        let papers = cohort();

        assert_eq!(filter_by_min_tier(&papers, RiskTier::High).len(), 3);
        assert_eq!(filter_by_min_tier(&papers, RiskTier::Medium).len(), 5);
        assert_eq!(filter_by_min_tier(&papers, RiskTier::Low).len(), 10);
    }

    #[test]
    fn test_top_domains_ordering() {
        let mut summary = CohortSummary::default();
        summary.safety_domains.insert("Renal".to_string(), 2);
        summary.safety_domains.insert("Cardiac".to_string(), 2);
        summary.safety_domains.insert("Hepatic".to_string(), 5);
        summary.safety_domains.insert("Other".to_string(), 1);

        let top = top_domains(&summary, 3);

        assert_eq!(top, vec![("Hepatic", 5), ("Cardiac", 2), ("Renal", 2)]);
    }

    #[test]
    fn test_generate_summary_text() {
        let text = generate_summary_text(&aggregate(&cohort()));

        assert!(text.contains("Papers analyzed: 10"));
        assert!(text.contains("HIGH: 3 (30.0%)"));
        assert!(text.contains("Flagged for FDA reporting review: 3"));
        assert!(text.contains("- Hepatic: 10"));
    }
}
