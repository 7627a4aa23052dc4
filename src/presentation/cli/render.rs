use crate::application::services::LabReportAnalysis;
use crate::domain::{Answer, StructuredAnswer};

/// Terminal rendering: structured answers become labelled sections.
pub fn render_answer(answer: &Answer) -> String {
    match answer {
        Answer::Text(text) => text.trim().to_string(),
        Answer::Structured(structured) => render_structured(structured),
    }
}

fn render_structured(answer: &StructuredAnswer) -> String {
    format!(
        "Disclaimer: {}\n\nRationale: {}\n\nSummary: {}",
        answer.disclaimer.trim(),
        answer.rationale.trim(),
        answer.summary.trim()
    )
}

pub fn render_analysis(analysis: &LabReportAnalysis) -> String {
    let mut out = format!(
        "Biomarkers:\n{}\n\n{}",
        analysis.biomarkers.as_str().trim(),
        render_structured(&analysis.answer)
    );

    if !analysis.sources.is_empty() {
        out.push_str("\n\nSources:");
        for source in &analysis.sources {
            match source.page {
                Some(page) => out.push_str(&format!("\n- {} (page {page})", source.source)),
                None => out.push_str(&format!("\n- {}", source.source)),
            }
        }
    }

    out
}
