//! Report generation.
//!
//! This module renders triage reports as Markdown, JSON, or CSV from the
//! analysis results.

use crate::analysis::top_domains;
use crate::config::ReportConfig;
use crate::models::{CohortSummary, PaperAnalysis, Report, ReportMetadata, RiskTier};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Domains shown in the Markdown domain table.
const DOMAIN_TABLE_LIMIT: usize = 10;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: &ReportConfig) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!(
        "# LitScan Safety Report: {}\n\n",
        report.metadata.compound
    ));

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.metadata, &report.summary));
    output.push_str(&generate_tier_section(&report.summary));
    output.push_str(&generate_domain_section(&report.summary));
    output.push_str(&generate_papers_section(&report.papers, options));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Compound:** {}\n", metadata.compound));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Papers Analyzed:** {}\n",
        metadata.papers_analyzed
    ));
    if metadata.papers_failed > 0 {
        section.push_str(&format!(
            "- **Papers Failed:** {}\n",
            metadata.papers_failed
        ));
    }
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the executive summary.
fn generate_summary_section(metadata: &ReportMetadata, summary: &CohortSummary) -> String {
    let mut section = String::new();

    section.push_str("## Executive Summary\n\n");
    section.push_str(&format!(
        "{} papers on **{}** were analyzed on {}.\n\n",
        summary.total_papers,
        metadata.compound,
        metadata.analysis_date.format("%Y-%m-%d")
    ));
    section.push_str(&format!(
        "- {} **High risk:** {} ({:.1}%)\n",
        RiskTier::High.emoji(),
        summary.tier_count(RiskTier::High),
        summary.tier_share(RiskTier::High)
    ));
    section.push_str(&format!(
        "- {} **Medium risk:** {} ({:.1}%)\n",
        RiskTier::Medium.emoji(),
        summary.tier_count(RiskTier::Medium),
        summary.tier_share(RiskTier::Medium)
    ));
    section.push_str(&format!(
        "- **Flagged for FDA reporting review:** {}\n",
        summary.fda_reporting_count
    ));
    section.push_str(&format!(
        "- **Safety signals:** {} ({} adverse events, {} drug interactions, {} contraindications)\n",
        summary.total_safety_signals(),
        summary.total_adverse_events,
        summary.total_drug_interactions,
        summary.total_contraindications
    ));
    section.push_str(&format!(
        "- **Serious outcome terms:** {}\n",
        summary.total_serious_terms
    ));
    if summary.failed_analyses > 0 {
        section.push_str(&format!(
            "- **Failed analyses:** {} (listed as LOW from the fallback record)\n",
            summary.failed_analyses
        ));
    }
    section.push('\n');

    section
}

/// Generate the risk-tier table.
fn generate_tier_section(summary: &CohortSummary) -> String {
    let mut section = String::new();

    section.push_str("## Risk Tiers\n\n");
    section.push_str("| Tier | Papers | Share |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for tier in RiskTier::ALL {
        section.push_str(&format!(
            "| {} {} | {} | {:.1}% |\n",
            tier.emoji(),
            tier,
            summary.tier_count(tier),
            summary.tier_share(tier)
        ));
    }
    section.push('\n');

    section
}

/// Generate the safety-domain table.
fn generate_domain_section(summary: &CohortSummary) -> String {
    let domains = top_domains(summary, DOMAIN_TABLE_LIMIT);
    if domains.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Safety Domains\n\n");
    section.push_str("| Domain | Papers |\n");
    section.push_str("|:---|:---:|\n");
    for (domain, count) in domains {
        section.push_str(&format!("| {} | {} |\n", domain, count));
    }
    section.push('\n');

    section
}

/// Generate the per-paper section. Papers are expected in rank order.
fn generate_papers_section(papers: &[PaperAnalysis], options: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str("## Papers\n\n");

    if papers.is_empty() {
        section.push_str("No papers met the reporting threshold.\n\n");
        return section;
    }

    for paper in papers {
        section.push_str(&generate_paper_block(paper, options));
    }

    section
}

/// Generate a single paper block.
fn generate_paper_block(analysis: &PaperAnalysis, options: &ReportConfig) -> String {
    let mut block = String::new();
    let paper = &analysis.paper;
    let tier = analysis.tier();

    let title = if paper.title.is_empty() {
        "(untitled)"
    } else {
        paper.title.as_str()
    };
    block.push_str(&format!(
        "### {} **{}** {}\n\n",
        tier.emoji(),
        tier,
        title
    ));

    // Citation line
    let mut citation = vec![format!("PMID {}", paper.identifier)];
    for part in [&paper.authors, &paper.journal, &paper.publication_date] {
        if !part.is_empty() {
            citation.push(part.clone());
        }
    }
    block.push_str(&format!("*{}*\n\n", citation.join(" | ")));

    if !paper.url.is_empty() {
        block.push_str(&format!("**Link:** <{}>\n\n", paper.url));
    }

    if analysis.analysis_failed {
        block.push_str(&format!(
            "> ⚠️ **Analysis failed:** {}\n\n",
            analysis
                .analysis_error
                .as_deref()
                .unwrap_or("no analysis text returned")
        ));
    }

    if options.include_rationale {
        block.push_str(&format!(
            "**Rationale:** {}\n\n",
            analysis.assessment.rationale
        ));
    }

    let counts = &analysis.assessment.counts;
    block.push_str(&format!(
        "**Signals:** {} adverse events, {} drug interactions, {} contraindications\n\n",
        counts.adverse_events_count, counts.drug_interactions_count, counts.contraindications_count
    ));

    push_list(&mut block, "Adverse Events", &analysis.adverse_events);
    push_list(&mut block, "Drug Interactions", &analysis.drug_interactions);
    push_list(&mut block, "Contraindications", &analysis.contraindications);
    push_list(&mut block, "Other Safety Signals", &analysis.other_signals);
    push_list(&mut block, "Key Findings", &analysis.key_findings);

    if !analysis.safety_domains.is_empty() {
        block.push_str(&format!(
            "**Safety Domains:** {}\n\n",
            analysis.safety_domains.join(", ")
        ));
    }

    block.push_str(&format!(
        "**Regulatory Impact:** {}\n\n",
        analysis.regulatory_impact
    ));
    if analysis.needs_reporting_review() {
        block.push_str("> 📋 Flagged for FDA reporting review\n\n");
    }
    block.push_str(&format!(
        "**Clinical Significance:** {}\n\n",
        analysis.clinical_significance
    ));

    if options.include_full_analysis && !analysis.full_analysis.is_empty() {
        block.push_str("<details>\n<summary>Full Analysis</summary>\n\n```\n");
        block.push_str(&analysis.full_analysis);
        block.push_str("\n```\n</details>\n\n");
    }

    block.push_str("---\n\n");

    block
}

fn push_list(block: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    block.push_str(&format!("**{}:**\n\n", heading));
    for item in items {
        block.push_str(&format!("- {}\n", item));
    }
    block.push('\n');
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(
        "*Generated by LitScan. Risk tiers and reporting flags are heuristics for triage, \
         not regulatory determinations.*\n",
    );

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Generate a CSV export with one row per listed paper.
pub fn generate_csv_export(papers: &[PaperAnalysis]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for paper in papers {
        writer
            .serialize(paper.to_export_record())
            .with_context(|| format!("Failed to export paper {}", paper.paper.identifier))?;
    }

    // An empty export still carries the header row.
    if papers.is_empty() {
        writer.write_record(EXPORT_HEADER)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV export: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV export is not valid UTF-8")
}

/// CSV header, in column order.
pub const EXPORT_HEADER: [&str; 9] = [
    "PMID",
    "Title",
    "Authors",
    "Publication_Date",
    "Risk_Level",
    "Safety_Signals",
    "Safety_Domains",
    "Regulatory_Impact",
    "URL",
];

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(())
}
