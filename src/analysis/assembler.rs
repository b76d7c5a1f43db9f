//! Per-paper record assembly.
//!
//! Combines section extraction and risk scoring into one [`PaperAnalysis`].
//! A missing or failed analysis is replaced by a fixed fallback document, so
//! callers always get a structurally complete record.

use crate::analysis::parser::{LabelledSectionParser, SectionParser};
use crate::analysis::scorer;
use crate::models::{PaperAnalysis, PaperMeta};
use tracing::{debug, warn};

/// Analysis text substituted when the backend produced nothing usable.
///
/// Contains no serious terms and no reporting keywords, so it always scores
/// LOW with the no-signals rationale.
pub const FALLBACK_DOCUMENT: &str = "ADVERSE_EVENTS_COUNT: 0
ADVERSE_EVENTS_LIST:
- Analysis failed due to API error

DRUG_INTERACTIONS_COUNT: 0
DRUG_INTERACTIONS_LIST:
- Analysis failed due to API error

CONTRAINDICATIONS_COUNT: 0
CONTRAINDICATIONS_LIST:
- Analysis failed due to API error

SAFETY_SIGNALS_DETECTED:
- Analysis failed due to API error

KEY_FINDINGS:
- Analysis failed due to API error

REGULATORY_IMPACT:
- Analysis incomplete due to technical error

SAFETY_DOMAINS:
- Other

CLINICAL_SIGNIFICANCE:
- Analysis could not be completed
";

/// Builds [`PaperAnalysis`] records with a pluggable section parser.
#[derive(Debug, Clone)]
pub struct PaperAnalysisAssembler<P = LabelledSectionParser> {
    parser: P,
}

impl Default for PaperAnalysisAssembler<LabelledSectionParser> {
    fn default() -> Self {
        Self {
            parser: LabelledSectionParser,
        }
    }
}

impl<P: SectionParser> PaperAnalysisAssembler<P> {
    /// Creates an assembler using the given extraction strategy.
    #[allow(dead_code)] // Entry point for alternative extraction strategies
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    /// Assemble the record for one paper.
    ///
    /// `None` or a blank document falls back to [`FALLBACK_DOCUMENT`].
    pub fn assemble(&self, paper: PaperMeta, document: Option<&str>) -> PaperAnalysis {
        match document {
            Some(text) if !text.trim().is_empty() => self.build(paper, text, None),
            Some(_) => self.assemble_failed(paper, "analysis backend returned an empty response"),
            None => self.assemble_failed(paper, "no analysis document available"),
        }
    }

    /// Assemble the fallback record for a paper whose analysis call failed.
    pub fn assemble_failed(&self, paper: PaperMeta, reason: impl Into<String>) -> PaperAnalysis {
        let reason = reason.into();
        warn!(
            "Using fallback analysis for paper {}: {}",
            paper.identifier, reason
        );
        self.build(paper, FALLBACK_DOCUMENT, Some(reason))
    }

    fn build(&self, paper: PaperMeta, text: &str, failure: Option<String>) -> PaperAnalysis {
        let sections = self.parser.parse(text);
        let assessment = scorer::score(sections.counts, text);

        debug!(
            "Paper {} assessed as {}: {}",
            paper.identifier, assessment.tier, assessment.rationale
        );

        let all_safety_signals = sections
            .adverse_events
            .iter()
            .chain(&sections.drug_interactions)
            .chain(&sections.contraindications)
            .chain(&sections.other_signals)
            .cloned()
            .collect();

        PaperAnalysis {
            paper,
            assessment,
            adverse_events: sections.adverse_events,
            drug_interactions: sections.drug_interactions,
            contraindications: sections.contraindications,
            other_signals: sections.other_signals,
            all_safety_signals,
            key_findings: sections.key_findings,
            regulatory_impact: sections.regulatory_impact,
            safety_domains: sections.safety_domains,
            clinical_significance: sections.clinical_significance,
            full_analysis: text.to_string(),
            analysis_failed: failure.is_some(),
            analysis_error: failure,
        }
    }
}
