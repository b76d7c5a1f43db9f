//! Prompt contract with the analysis backend.
//!
//! The prompt asks for exactly the section labels the parser understands.

use crate::analysis::parser::Section;
use crate::models::PaperMeta;

/// System prompt sent with every analysis request.
pub const SYSTEM_PROMPT: &str = r#"You are a senior drug safety scientist analyzing scientific literature for pharmaceutical regulatory compliance.
Answer only in the requested section format. Do not add introductions or closing remarks."#;

/// Build the analysis prompt for one paper.
pub fn build_prompt(compound: &str, paper: &PaperMeta) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Analyze this research paper about the compound \"{}\" and provide a structured safety assessment.\n\n",
        compound
    ));
    prompt.push_str(&format!("Title: {}\n", paper.title));
    prompt.push_str(&format!("Abstract: {}\n\n", paper.abstract_text));
    prompt.push_str(
        "CRITICAL: Identify and count specific safety signals. Be thorough and specific.\n\n",
    );
    prompt.push_str("Provide your analysis in EXACTLY this format:\n\n");

    for section in Section::ALL {
        prompt.push_str(&format!("{}:{}\n", section.label(), section_instruction(section)));
        if !matches!(
            section,
            Section::AdverseEventsCount | Section::DrugInteractionsCount | Section::ContraindicationsCount
        ) {
            prompt.push('\n');
        }
    }

    prompt.push_str(
        "IMPORTANT:\n\
         - Count EVERY adverse event, drug interaction, and contraindication mentioned\n\
         - Include mild, moderate, and severe events\n\
         - Use one bullet line starting with \"- \" per list entry\n",
    );

    prompt
}

/// What the backend should write after each label.
fn section_instruction(section: Section) -> &'static str {
    match section {
        Section::AdverseEventsCount
        | Section::DrugInteractionsCount
        | Section::ContraindicationsCount => " [number]",
        Section::AdverseEventsList => {
            "\n- [each specific adverse event mentioned, one per line]"
        }
        Section::DrugInteractionsList => {
            "\n- [each specific drug interaction mentioned, one per line]"
        }
        Section::ContraindicationsList => {
            "\n- [each specific contraindication mentioned, one per line]"
        }
        Section::SafetySignalsDetected => "\n- [any other safety concerns not covered above]",
        Section::KeyFindings => "\n- [the main safety-related findings in 2-3 bullet points]",
        Section::RegulatoryImpact => {
            "\n- [whether this requires 15-day FDA reporting or other regulatory action]"
        }
        Section::SafetyDomains => {
            "\n- [one per line from: Hepatic, Cardiac, Neurological, Gastrointestinal, Dermatological, Renal, Hematological, Other]"
        }
        Section::ClinicalSignificance => {
            "\n- [brief assessment of clinical relevance and patient impact]"
        }
    }
}
