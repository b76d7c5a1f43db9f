//! Data models for literature safety triage.
//!
//! This module contains the value types that flow through the pipeline:
//! paper metadata, per-paper risk assessments, and cohort summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Risk tier assigned to one paper's analysis.
///
/// Declaration order is the display order used by reports (HIGH first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    /// Meets a high-risk count threshold or was escalated by serious terms.
    High,
    /// Some safety signal, below the high-risk thresholds.
    Medium,
    /// Few or no safety signals.
    Low,
    /// The scorer hit an internal fault.
    Unknown,
}

impl RiskTier {
    /// All tiers, in report order.
    pub const ALL: [RiskTier; 4] = [
        RiskTier::High,
        RiskTier::Medium,
        RiskTier::Low,
        RiskTier::Unknown,
    ];

    /// Returns an emoji representation of the tier.
    pub fn emoji(&self) -> &'static str {
        match self {
            RiskTier::High => "🔴",
            RiskTier::Medium => "🟡",
            RiskTier::Low => "🟢",
            RiskTier::Unknown => "⚪",
        }
    }

    /// Severity rank used for threshold comparisons. `Unknown` ranks below everything.
    fn rank(&self) -> u8 {
        match self {
            RiskTier::Unknown => 0,
            RiskTier::Low => 1,
            RiskTier::Medium => 2,
            RiskTier::High => 3,
        }
    }

    /// Whether this tier is at or above `threshold`.
    ///
    /// `Unknown` is never at or above anything, and no threshold is met by it.
    pub fn at_least(&self, threshold: RiskTier) -> bool {
        *self != RiskTier::Unknown && self.rank() >= threshold.rank()
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::High => write!(f, "HIGH"),
            RiskTier::Medium => write!(f, "MEDIUM"),
            RiskTier::Low => write!(f, "LOW"),
            RiskTier::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Declared safety-signal counts from one analysis document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyCounts {
    /// Number of adverse events.
    pub adverse_events_count: u32,
    /// Number of drug interactions.
    pub drug_interactions_count: u32,
    /// Number of contraindications.
    pub contraindications_count: u32,
}

impl SafetyCounts {
    pub fn new(adverse_events: u32, drug_interactions: u32, contraindications: u32) -> Self {
        Self {
            adverse_events_count: adverse_events,
            drug_interactions_count: drug_interactions,
            contraindications_count: contraindications,
        }
    }

    /// Sum of the three counts, or `None` if it does not fit in a `u32`.
    pub fn checked_total(&self) -> Option<u32> {
        self.adverse_events_count
            .checked_add(self.drug_interactions_count)?
            .checked_add(self.contraindications_count)
    }
}

/// Outcome of scoring one analysis document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Assigned tier.
    pub tier: RiskTier,
    /// Human-readable explanation, including any escalation note.
    pub rationale: String,
    /// The counts that produced the tier.
    pub counts: SafetyCounts,
    /// Always the sum of the three counts.
    pub total_safety_signals: u32,
    /// Number of distinct serious-outcome terms found in the text.
    pub serious_terms_count: usize,
}

impl RiskAssessment {
    /// Assessment for a scorer fault. Counts are zeroed so the total invariant holds.
    pub fn unknown(fault: impl fmt::Display) -> Self {
        Self {
            tier: RiskTier::Unknown,
            rationale: format!("Error calculating risk: {}", fault),
            counts: SafetyCounts::default(),
            total_safety_signals: 0,
            serious_terms_count: 0,
        }
    }
}

/// Paper metadata supplied by the literature source.
///
/// Passed through the pipeline unmodified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMeta {
    /// Source identifier (a PubMed ID for PubMed records).
    #[serde(alias = "pmid", alias = "id")]
    pub identifier: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default, alias = "pub_date")]
    pub publication_date: String,
    #[serde(default)]
    pub journal: String,
    #[serde(default)]
    pub url: String,
    /// Any other fields the source supplied (DOI, MeSH terms, ...), kept as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Fully assembled analysis of one paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperAnalysis {
    /// Paper metadata, verbatim from the literature source.
    pub paper: PaperMeta,
    /// Scored risk assessment.
    pub assessment: RiskAssessment,
    pub adverse_events: Vec<String>,
    pub drug_interactions: Vec<String>,
    pub contraindications: Vec<String>,
    /// Safety concerns outside the three counted categories.
    pub other_signals: Vec<String>,
    /// Adverse events, interactions, contraindications, then other signals.
    ///
    /// Not deduplicated.
    pub all_safety_signals: Vec<String>,
    pub key_findings: Vec<String>,
    pub regulatory_impact: String,
    pub safety_domains: Vec<String>,
    pub clinical_significance: String,
    /// Raw analysis text the record was built from.
    pub full_analysis: String,
    /// True when the record was built from the fallback document.
    pub analysis_failed: bool,
    /// Why the analysis backend failed, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_error: Option<String>,
}

impl PaperAnalysis {
    /// Returns the assigned risk tier.
    pub fn tier(&self) -> RiskTier {
        self.assessment.tier
    }

    /// Heuristic flag for papers that may need expedited regulatory reporting.
    ///
    /// Set for HIGH papers and for papers whose regulatory-impact text mentions
    /// "fda" or "reporting" (case-insensitive). Not a regulatory determination.
    pub fn needs_reporting_review(&self) -> bool {
        if self.tier() == RiskTier::High {
            return true;
        }
        let impact = self.regulatory_impact.to_lowercase();
        impact.contains("fda") || impact.contains("reporting")
    }

    /// Flattens the analysis into one export row.
    pub fn to_export_record(&self) -> ExportRecord {
        ExportRecord {
            identifier: self.paper.identifier.clone(),
            title: self.paper.title.clone(),
            authors: self.paper.authors.clone(),
            publication_date: self.paper.publication_date.clone(),
            risk_tier: self.tier(),
            safety_signals: self.all_safety_signals.join("; "),
            safety_domains: self.safety_domains.join("; "),
            regulatory_impact: self.regulatory_impact.clone(),
            url: self.paper.url.clone(),
        }
    }
}

/// One flattened export row per paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    #[serde(rename = "PMID")]
    pub identifier: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Authors")]
    pub authors: String,
    #[serde(rename = "Publication_Date")]
    pub publication_date: String,
    #[serde(rename = "Risk_Level")]
    pub risk_tier: RiskTier,
    #[serde(rename = "Safety_Signals")]
    pub safety_signals: String,
    #[serde(rename = "Safety_Domains")]
    pub safety_domains: String,
    #[serde(rename = "Regulatory_Impact")]
    pub regulatory_impact: String,
    #[serde(rename = "URL")]
    pub url: String,
}

/// Cohort-level statistics over a set of paper analyses.
///
/// Always recomputed from the per-paper records; never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortSummary {
    /// Number of papers in the cohort.
    pub total_papers: usize,
    /// Papers per risk tier. All four tiers are always present.
    pub risk_tiers: BTreeMap<RiskTier, usize>,
    /// Papers per safety-domain tag.
    pub safety_domains: BTreeMap<String, usize>,
    pub total_adverse_events: u64,
    pub total_drug_interactions: u64,
    pub total_contraindications: u64,
    pub total_serious_terms: u64,
    /// Papers flagged by [`PaperAnalysis::needs_reporting_review`].
    pub fda_reporting_count: usize,
    /// Papers built from the fallback document.
    pub failed_analyses: usize,
}

impl Default for CohortSummary {
    fn default() -> Self {
        Self {
            total_papers: 0,
            risk_tiers: RiskTier::ALL.iter().map(|tier| (*tier, 0)).collect(),
            safety_domains: BTreeMap::new(),
            total_adverse_events: 0,
            total_drug_interactions: 0,
            total_contraindications: 0,
            total_serious_terms: 0,
            fda_reporting_count: 0,
            failed_analyses: 0,
        }
    }
}

impl CohortSummary {
    /// Number of papers in `tier`.
    pub fn tier_count(&self, tier: RiskTier) -> usize {
        self.risk_tiers.get(&tier).copied().unwrap_or(0)
    }

    /// Percentage of papers in `tier`; 0 for an empty cohort.
    pub fn tier_share(&self, tier: RiskTier) -> f64 {
        if self.total_papers == 0 {
            return 0.0;
        }
        self.tier_count(tier) as f64 / self.total_papers as f64 * 100.0
    }

    /// Cohort-wide total of all three signal categories.
    pub fn total_safety_signals(&self) -> u64 {
        self.total_adverse_events + self.total_drug_interactions + self.total_contraindications
    }
}

/// Metadata about one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Compound the literature was searched for.
    pub compound: String,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Name of the LLM model used (or the replay directory).
    pub model_used: String,
    /// Where the paper records came from.
    pub source: String,
    /// Number of papers analyzed.
    pub papers_analyzed: usize,
    /// Number of papers whose analysis fell back.
    pub papers_failed: usize,
    /// Duration of the analysis in seconds.
    pub duration_seconds: f64,
}

/// The complete triage report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    /// Statistics over the whole cohort.
    pub summary: CohortSummary,
    /// Papers listed in the report, highest risk first.
    pub papers: Vec<PaperAnalysis>,
}
