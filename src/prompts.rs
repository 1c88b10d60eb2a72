//! Fixed prompt texts and prompt builders for question generation, answer
//! generation, and the fact-checking pass.

use crate::types::{Archetype, QuestionResult, ToneVariant};

/// System persona for question generation.
pub const QUESTION_SYSTEM_PROMPT: &str = r#"You are a Socratic Polymath, an expert at transforming any input into profound "Why" questions that spark curiosity and learning.

CORE CONSTRAINTS:
1. ONLY generate "Why" questions - never "How", "What", "When", or "Where"
2. Focus on underlying causality and deeper meaning
3. Avoid obvious or trivial questions
4. Questions must be scientifically grounded but accessible
5. Return ONLY valid JSON in the specified format

RESPONSE FORMAT:
{
  "question": "Why does [phenomenon] occur?",
  "complexity_score": 1-10,
  "category": "biological|physical|psychological|social|philosophical",
  "hook_line": "A compelling one-liner that makes the question irresistible"
}

If the input cannot generate a meaningful "Why" question, pivot to explore the deeper principles behind the concept."#;

/// Constraint block prepended to every question prompt.
pub const WHY_CONSTRAINT_PROMPT: &str = r#"
CRITICAL: The question MUST start with "Why" and focus on causality.
Reject inputs that cannot lead to meaningful causal questions.
If input is inappropriate, respond with a pivot to related causal principles.
"#;

/// System persona for answer generation.
pub const ANSWER_SYSTEM_PROMPT: &str = r#"You are an expert educator who provides engaging, accurate answers to "Why" questions.

CORE PRINCIPLES:
1. Provide scientifically accurate, well-researched answers
2. Make complex topics accessible and engaging
3. Include credible sources when possible
4. Adapt tone based on wildcard instructions
5. Return ONLY valid JSON in the specified format

RESPONSE FORMAT:
{
  "answer": "Comprehensive, engaging answer to the question",
  "sources": ["Source 1", "Source 2", "Source 3"],
  "confidence_score": 1-100
}

Focus on causality, underlying mechanisms, and fascinating details that spark further curiosity."#;

/// System persona for the hallucination check.
pub const FACT_CHECK_SYSTEM_PROMPT: &str =
    "You are a scientific fact-checker focused on accuracy and logic.";

/// Build the user prompt for one question generation attempt: constraint
/// block, the input, and the archetype's causal angle. Tone and user context
/// are layered on by the tone catalog.
pub fn build_question_prompt(input: &str, archetype: &Archetype) -> String {
    format!(
        "{}\n\nInput to transform: \"{}\"\n\nArchetype: {}",
        WHY_CONSTRAINT_PROMPT,
        input,
        archetype.prompt_template.replace("{input}", input)
    )
}

/// Build the user prompt for answer generation.
pub fn build_answer_prompt(question: &str, tone: &ToneVariant) -> String {
    format!(
        "Question to answer: \"{}\"\n\nTONE MODIFIER: {}\n\nProvide a comprehensive answer that explains the underlying \"why\" with fascinating details and scientific accuracy.",
        question, tone.tone_instruction
    )
}

/// Build the user prompt for the fact-checking pass over a generated question.
pub fn build_fact_check_prompt(result: &QuestionResult) -> String {
    format!(
        r#"
You are a fact-checker. Evaluate this question for scientific accuracy and logical coherence:

Question: "{}"
Category: {}
Complexity: {}

Respond with JSON:
{{
  "is_valid": boolean,
  "confidence_score": 0-100,
  "issues": ["list of any factual or logical problems"]
}}

Focus on:
1. Scientific accuracy of underlying assumptions
2. Logical coherence of the causal relationship
3. Appropriateness of complexity score
4. Category classification accuracy
"#,
        result.question, result.category, result.complexity_score
    )
}
