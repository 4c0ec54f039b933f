//! Prompt templates for paper analysis and Q&A.

use crate::models::AnalysisKind;

/// Instruction prefix for the short structured summary.
pub const SUMMARY_PROMPT: &str = r#"Please analyze the following academic paper abstract and provide a structured summary in JSON format.
The JSON object must contain these keys:
- "simplified_summary": A summary in simple language, about 300 characters, highlighting key contributions.
- "keywords": An array of 3 to 5 most relevant keywords.
- "innovation_rating": A rating from 1 to 5 (integer) on the potential novelty of the work, with 5 being highly innovative.
Abstract:
"#;

/// Instruction prefix for the long-form structured analysis.
pub const DETAILED_PROMPT: &str = r#"Please provide a detailed analysis of the following academic paper abstract in JSON format.
The JSON object must contain these keys:
- "background": A brief introduction to the research area and the problem it addresses.
- "methodology": A description of the methods or techniques used in the paper.
- "key_innovations": A bullet-point list (array of strings) of the core innovations or contributions.
- "potential_impact": A discussion on the potential impact or future implications of this research.
Abstract:
"#;

/// System message for JSON-mode requests.
pub const JSON_SYSTEM_PROMPT: &str =
    "You are a helpful assistant designed to output JSON.";

/// Answer returned when the Q&A call fails for any reason.
pub const QNA_FALLBACK_ANSWER: &str =
    "Sorry, I couldn't process the answer for your question.";

/// Instruction prefix for an analysis kind.
pub fn analysis_prompt(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::Summary => SUMMARY_PROMPT,
        AnalysisKind::Detailed => DETAILED_PROMPT,
    }
}

/// Combined prompt for answering a question against article context.
pub fn qna_prompt(question: &str, context: &str) -> String {
    format!(
        "Based on the following context, please answer the user's question.\n\
         Context:\n---\n{context}\n---\nQuestion: {question}\nAnswer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qna_prompt_embeds_both_parts() {
        let prompt = qna_prompt("What is QUBO?", "QUBO is a problem class.");
        assert!(prompt.contains("QUBO is a problem class."));
        assert!(prompt.contains("Question: What is QUBO?"));
    }

    #[test]
    fn test_analysis_prompts_differ_by_kind() {
        assert!(analysis_prompt(AnalysisKind::Summary).contains("simplified_summary"));
        assert!(analysis_prompt(AnalysisKind::Detailed).contains("methodology"));
    }
}
