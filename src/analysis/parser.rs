//! Section extraction from free-text safety analyses.
//!
//! The analysis backend answers with a loosely structured document made of
//! uppercase `LABEL:` markers, each followed by a single value or a bulleted
//! list. Nothing here ever fails: missing or garbled sections degrade to
//! zero counts, empty lists and placeholder text.

use crate::models::SafetyCounts;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Regulatory impact text used when the section is absent or empty.
pub const REGULATORY_IMPACT_PLACEHOLDER: &str = "No specific regulatory action identified";

/// Clinical significance text used when the section is absent or empty.
pub const CLINICAL_SIGNIFICANCE_PLACEHOLDER: &str = "No clinical significance assessment provided";

/// Characters accepted as list bullets.
const BULLET_MARKERS: &[char] = &['-', '*', '•'];

/// Labelled sections of an analysis document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    AdverseEventsCount,
    AdverseEventsList,
    DrugInteractionsCount,
    DrugInteractionsList,
    ContraindicationsCount,
    ContraindicationsList,
    SafetySignalsDetected,
    KeyFindings,
    RegulatoryImpact,
    SafetyDomains,
    ClinicalSignificance,
}

impl Section {
    /// Every section, in the order the backend is asked to emit them.
    pub const ALL: [Section; 11] = [
        Section::AdverseEventsCount,
        Section::AdverseEventsList,
        Section::DrugInteractionsCount,
        Section::DrugInteractionsList,
        Section::ContraindicationsCount,
        Section::ContraindicationsList,
        Section::SafetySignalsDetected,
        Section::KeyFindings,
        Section::RegulatoryImpact,
        Section::SafetyDomains,
        Section::ClinicalSignificance,
    ];

    /// The label as it appears in the document, without the colon.
    pub fn label(&self) -> &'static str {
        match self {
            Section::AdverseEventsCount => "ADVERSE_EVENTS_COUNT",
            Section::AdverseEventsList => "ADVERSE_EVENTS_LIST",
            Section::DrugInteractionsCount => "DRUG_INTERACTIONS_COUNT",
            Section::DrugInteractionsList => "DRUG_INTERACTIONS_LIST",
            Section::ContraindicationsCount => "CONTRAINDICATIONS_COUNT",
            Section::ContraindicationsList => "CONTRAINDICATIONS_LIST",
            Section::SafetySignalsDetected => "SAFETY_SIGNALS_DETECTED",
            Section::KeyFindings => "KEY_FINDINGS",
            Section::RegulatoryImpact => "REGULATORY_IMPACT",
            Section::SafetyDomains => "SAFETY_DOMAINS",
            Section::ClinicalSignificance => "CLINICAL_SIGNIFICANCE",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|section| section.label().eq_ignore_ascii_case(label))
    }
}

/// `LABEL: <digits>` for the three count sections. First match per label wins.
static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(ADVERSE_EVENTS_COUNT|DRUG_INTERACTIONS_COUNT|CONTRAINDICATIONS_COUNT):\s*(\d+)")
        .expect("valid count regex")
});

/// Start markers of the sections that carry a body.
static BODY_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(ADVERSE_EVENTS_LIST|DRUG_INTERACTIONS_LIST|CONTRAINDICATIONS_LIST|SAFETY_SIGNALS_DETECTED|KEY_FINDINGS|REGULATORY_IMPACT|SAFETY_DOMAINS|CLINICAL_SIGNIFICANCE):",
    )
    .expect("valid section label regex")
});

/// A line that opens the next section: an all-caps `LABEL:` after optional
/// indentation, or a known section label in any case, optionally wrapped in
/// Markdown emphasis or heading marks (`**KEY_FINDINGS:**`, `## key_findings:`).
static NEXT_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    let known = Section::ALL
        .iter()
        .map(|section| section.label())
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"^[ \t]*(?:[A-Z][A-Z0-9_]*:|[*#]*[ \t]*(?i:{known})[*]*[ \t]*:)"
    ))
    .expect("valid label line regex")
});

/// Structured content extracted from one analysis document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSections {
    pub counts: SafetyCounts,
    pub adverse_events: Vec<String>,
    pub drug_interactions: Vec<String>,
    pub contraindications: Vec<String>,
    pub other_signals: Vec<String>,
    pub key_findings: Vec<String>,
    pub regulatory_impact: String,
    pub safety_domains: Vec<String>,
    pub clinical_significance: String,
}

/// Extraction strategy for analysis documents.
///
/// Implementations must never fail; they degrade to [`ParsedSections`] defaults.
pub trait SectionParser {
    fn parse(&self, document: &str) -> ParsedSections;
}

/// Parser for the `LABEL:` section grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelledSectionParser;

impl SectionParser for LabelledSectionParser {
    fn parse(&self, document: &str) -> ParsedSections {
        let counts = extract_counts(document);
        let bodies = extract_bodies(document);
        debug!(
            "Parsed analysis: {} of {} labelled sections present",
            bodies.len(),
            Section::ALL.len() - 3
        );

        let list = |section: Section| {
            bodies
                .get(&section)
                .map(|body| bullet_entries(body))
                .unwrap_or_default()
        };
        let narrative = |section: Section, placeholder: &str| {
            bodies
                .get(&section)
                .map(|body| body.trim())
                .filter(|text| !text.is_empty())
                .unwrap_or(placeholder)
                .to_string()
        };

        ParsedSections {
            counts,
            adverse_events: list(Section::AdverseEventsList),
            drug_interactions: list(Section::DrugInteractionsList),
            contraindications: list(Section::ContraindicationsList),
            other_signals: list(Section::SafetySignalsDetected),
            key_findings: list(Section::KeyFindings),
            regulatory_impact: narrative(Section::RegulatoryImpact, REGULATORY_IMPACT_PLACEHOLDER),
            safety_domains: list(Section::SafetyDomains),
            clinical_significance: narrative(
                Section::ClinicalSignificance,
                CLINICAL_SIGNIFICANCE_PLACEHOLDER,
            ),
        }
    }
}

/// Extract the three declared counts. Absent sections count as zero.
fn extract_counts(document: &str) -> SafetyCounts {
    let mut found: HashMap<Section, u32> = HashMap::new();

    for caps in COUNT_RE.captures_iter(document) {
        let Some(section) = Section::from_label(&caps[1]) else {
            continue;
        };
        if found.contains_key(&section) {
            continue;
        }
        let value = caps[2].parse::<u32>().unwrap_or_else(|_| {
            warn!("{} value {} out of range, saturating", section.label(), &caps[2]);
            u32::MAX
        });
        found.insert(section, value);
    }

    let count = |section| found.get(&section).copied().unwrap_or(0);
    SafetyCounts::new(
        count(Section::AdverseEventsCount),
        count(Section::DrugInteractionsCount),
        count(Section::ContraindicationsCount),
    )
}

/// Raw body text of every body-carrying section, keyed by section.
///
/// A body runs from its label to the next line that opens another label, or
/// to the end of the document. Only the first occurrence of a label is used.
fn extract_bodies(document: &str) -> HashMap<Section, &str> {
    let mut bodies = HashMap::new();

    for caps in BODY_LABEL_RE.captures_iter(document) {
        let Some(section) = Section::from_label(&caps[1]) else {
            continue;
        };
        if bodies.contains_key(&section) {
            continue;
        }
        let start = caps.get(0).map_or(0, |m| m.end());
        bodies.insert(section, section_body(&document[start..]));
    }

    bodies
}

/// Text up to (not including) the next label line.
fn section_body(rest: &str) -> &str {
    // The remainder of the label's own line belongs to the body.
    let Some(first_newline) = rest.find('\n') else {
        return rest;
    };

    let mut offset = first_newline + 1;
    for line in rest[offset..].split_inclusive('\n') {
        if NEXT_LABEL_RE.is_match(line) {
            return &rest[..offset];
        }
        offset += line.len();
    }
    rest
}

/// Bulleted lines of a section body, markers and surrounding whitespace removed.
fn bullet_entries(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| line.starts_with(BULLET_MARKERS))
        .map(|line| {
            line.trim_start_matches(|c: char| BULLET_MARKERS.contains(&c) || c.is_whitespace())
                .trim_end()
        })
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "ADVERSE_EVENTS_COUNT: 2
ADVERSE_EVENTS_LIST:
- Nausea
- Elevated ALT

DRUG_INTERACTIONS_COUNT: 1
DRUG_INTERACTIONS_LIST:
- Warfarin (increased INR)

CONTRAINDICATIONS_COUNT: 0
CONTRAINDICATIONS_LIST:
- None identified

SAFETY_SIGNALS_DETECTED:
- QT prolongation at high doses

KEY_FINDINGS:
- Generally well tolerated
- Hepatic monitoring advised

REGULATORY_IMPACT:
- Does not meet 15-day FDA reporting criteria

SAFETY_DOMAINS:
- Hepatic
- Cardiac

CLINICAL_SIGNIFICANCE:
- Moderate relevance for patients on anticoagulants
";

    fn parse(document: &str) -> ParsedSections {
        LabelledSectionParser.parse(document)
    }

    #[test]
    fn test_parse_well_formed_document() {
        let parsed = parse(WELL_FORMED);

        assert_eq!(parsed.counts, SafetyCounts::new(2, 1, 0));
        assert_eq!(parsed.adverse_events, vec!["Nausea", "Elevated ALT"]);
        assert_eq!(parsed.drug_interactions, vec!["Warfarin (increased INR)"]);
        assert_eq!(parsed.contraindications, vec!["None identified"]);
        assert_eq!(parsed.other_signals, vec!["QT prolongation at high doses"]);
        assert_eq!(
            parsed.key_findings,
            vec!["Generally well tolerated", "Hepatic monitoring advised"]
        );
        assert_eq!(
            parsed.regulatory_impact,
            "- Does not meet 15-day FDA reporting criteria"
        );
        assert_eq!(parsed.safety_domains, vec!["Hepatic", "Cardiac"]);
        assert_eq!(
            parsed.clinical_significance,
            "- Moderate relevance for patients on anticoagulants"
        );
    }

    #[test]
    fn test_count_only_document() {
        let parsed = parse("ADVERSE_EVENTS_COUNT: 3");

        assert_eq!(parsed.counts.adverse_events_count, 3);
        assert_eq!(parsed.counts.drug_interactions_count, 0);
        assert!(parsed.adverse_events.is_empty());
        assert_eq!(parsed.regulatory_impact, REGULATORY_IMPACT_PLACEHOLDER);
        assert_eq!(parsed.clinical_significance, CLINICAL_SIGNIFICANCE_PLACEHOLDER);
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let parsed = parse("");

        assert_eq!(parsed.counts, SafetyCounts::default());
        assert!(parsed.adverse_events.is_empty());
        assert!(parsed.safety_domains.is_empty());
        assert_eq!(parsed.regulatory_impact, REGULATORY_IMPACT_PLACEHOLDER);
    }

    #[test]
    fn test_counts_case_insensitive_first_match_wins() {
        let parsed = parse(
            "adverse_events_count: 4\nADVERSE_EVENTS_COUNT: 9\nDrug_Interactions_Count:\n  2",
        );

        assert_eq!(parsed.counts.adverse_events_count, 4);
        assert_eq!(parsed.counts.drug_interactions_count, 2);
    }

    #[test]
    fn test_non_numeric_count_is_zero() {
        let parsed = parse("CONTRAINDICATIONS_COUNT: several\nADVERSE_EVENTS_COUNT: [number]");

        assert_eq!(parsed.counts, SafetyCounts::default());
    }

    #[test]
    fn test_oversized_count_saturates() {
        let parsed = parse("ADVERSE_EVENTS_COUNT: 99999999999999999999");

        assert_eq!(parsed.counts.adverse_events_count, u32::MAX);
    }

    #[test]
    fn test_declared_count_trusted_over_list_length() {
        let parsed = parse("ADVERSE_EVENTS_COUNT: 7\nADVERSE_EVENTS_LIST:\n- Headache\n");

        assert_eq!(parsed.counts.adverse_events_count, 7);
        assert_eq!(parsed.adverse_events, vec!["Headache"]);
    }

    #[test]
    fn test_reordered_sections_and_trailing_text() {
        let document = "SAFETY_DOMAINS:
- Renal
CONTRAINDICATIONS_LIST:
- Severe renal impairment
CONTRAINDICATIONS_COUNT: 1

Thanks for the question! Let me know if you need more detail.";
        let parsed = parse(document);

        assert_eq!(parsed.safety_domains, vec!["Renal"]);
        assert_eq!(parsed.contraindications, vec!["Severe renal impairment"]);
        assert_eq!(parsed.counts.contraindications_count, 1);
    }

    #[test]
    fn test_indented_labels_terminate_sections() {
        let document = "
        ADVERSE_EVENTS_LIST:
        - Rash
        DRUG_INTERACTIONS_LIST:
        - Rifampin
        ";
        let parsed = parse(document);

        assert_eq!(parsed.adverse_events, vec!["Rash"]);
        assert_eq!(parsed.drug_interactions, vec!["Rifampin"]);
    }

    #[test]
    fn test_bullet_markers_and_blank_entries() {
        let document = "ADVERSE_EVENTS_LIST:
-   Dizziness
* Fatigue
• Insomnia
-
  -
not a bullet line
";
        let parsed = parse(document);

        assert_eq!(parsed.adverse_events, vec!["Dizziness", "Fatigue", "Insomnia"]);
        assert!(parsed.adverse_events.iter().all(|e| !e.trim().is_empty()));
    }

    #[test]
    fn test_inline_bullet_after_label_is_kept() {
        let parsed = parse("KEY_FINDINGS: - Single finding\nSAFETY_DOMAINS:\n- Other");

        assert_eq!(parsed.key_findings, vec!["Single finding"]);
        assert_eq!(parsed.safety_domains, vec!["Other"]);
    }

    #[test]
    fn test_empty_narrative_uses_placeholder() {
        let parsed = parse("REGULATORY_IMPACT:\n\nSAFETY_DOMAINS:\n- Other");

        assert_eq!(parsed.regulatory_impact, REGULATORY_IMPACT_PLACEHOLDER);
    }

    #[test]
    fn test_lowercase_lines_do_not_terminate_sections() {
        let document = "REGULATORY_IMPACT:
- Consider expedited reporting
note: sponsor should review
SAFETY_DOMAINS:
- Cardiac";
        let parsed = parse(document);

        assert_eq!(
            parsed.regulatory_impact,
            "- Consider expedited reporting\nnote: sponsor should review"
        );
        assert_eq!(parsed.safety_domains, vec!["Cardiac"]);
    }

    #[test]
    fn test_lowercase_labels_terminate_sections() {
        let parsed = parse("adverse_events_list:\n- Rash\ndrug_interactions_list:\n- Warfarin\n");

        assert_eq!(parsed.adverse_events, vec!["Rash"]);
        assert_eq!(parsed.drug_interactions, vec!["Warfarin"]);
    }

    #[test]
    fn test_emphasized_labels_terminate_sections() {
        let document = "ADVERSE_EVENTS_LIST:
- Rash
**DRUG_INTERACTIONS_LIST:**
- Warfarin
## Key_Findings:
- Well tolerated";
        let parsed = parse(document);

        assert_eq!(parsed.adverse_events, vec!["Rash"]);
        assert_eq!(parsed.drug_interactions, vec!["Warfarin"]);
        assert_eq!(parsed.key_findings, vec!["Well tolerated"]);
    }

    #[test]
    fn test_section_labels_round_trip() {
        for section in Section::ALL {
            assert_eq!(Section::from_label(section.label()), Some(section));
        }
        assert_eq!(Section::from_label("key_findings"), Some(Section::KeyFindings));
        assert_eq!(Section::from_label("UNRELATED"), None);
    }
}
