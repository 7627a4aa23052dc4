use crate::domain::StructuredAnswer;

use super::AnswerMode;

pub const GUIDELINE_CONTEXT_SEPARATOR: &str = "\n\n";
pub const LAB_REPORT_CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

pub const BIOMARKER_EXTRACTION_PROMPT: &str = "You are a clinical lab-report reader. \
Examine this blood test report image carefully and extract every numerical biomarker you can find. \
For each biomarker, return the name, value, and unit on its own line. \
Example format:\n  Glucose (Fasting): 126 mg/dL\n  HbA1c: 7.2 %\n\
If a reference range is visible, include it in parentheses. \
Only output the extracted values, nothing else.";

/// Prompt for answering a guideline question from retrieved context.
pub fn guideline_answer_prompt(context: &str, question: &str, mode: AnswerMode) -> String {
    let output_instructions = match mode {
        AnswerMode::Structured => format!(
            "- Output must be valid JSON and match this schema:\n{}\n\nJSON RESPONSE:",
            format_instructions()
        ),
        AnswerMode::Text => "\nRESPONSE:".to_string(),
    };

    format!(
        "You are 'CareGraph AI', a professional clinical decision support assistant.\n\
         Use the following pieces of medical context to answer the user's question.\n\n\
         CONTEXT FROM GUIDELINES:\n{context}\n\n\
         USER QUESTION:\n{question}\n\n\
         INSTRUCTIONS:\n\
         - Start with a medical disclaimer.\n\
         - Answer only from the context above.\n\
         - If the context doesn't have the answer, say you don't know based on the current docs.\n\
         {output_instructions}\n"
    )
}

/// Prompt for reasoning over extracted lab values against retrieved guideline excerpts.
pub fn lab_report_prompt(lab_values: &str, context: &str) -> String {
    format!(
        "You are 'CareGraph AI', a clinical decision-support assistant.\n\n\
         A patient's lab report has been analyzed and the following biomarkers were extracted:\n\n\
         {lab_values}\n\n\
         Relevant excerpts from clinical guidelines:\n\n\
         {context}\n\n\
         INSTRUCTIONS:\n\
         1. Start with a brief medical disclaimer.\n\
         2. Identify which biomarkers are abnormal and explain why.\n\
         3. Cross-reference the abnormal values with the guideline excerpts.\n\
         4. Provide a concise clinical summary and recommended next steps.\n\
         5. If the guidelines do not cover a specific biomarker, state that clearly.\n\
         6. Output must be valid JSON and match this schema:\n{}\n\n\
         JSON RESPONSE:\n",
        format_instructions()
    )
}

fn format_instructions() -> String {
    let schema = serde_json::to_string_pretty(&StructuredAnswer::json_schema())
        .unwrap_or_else(|_| StructuredAnswer::json_schema().to_string());

    format!(
        "The output should be formatted as a JSON instance that conforms to the JSON schema below.\n\
         Put the disclaimer in `disclaimer`, your reasoning in `rationale`, and the clinical \
         summary with next steps in `summary`.\n\n```\n{schema}\n```"
    )
}
