//! Prompt templates for LLM-powered stages
//!
//! These templates use basic `format!()` interpolation for type safety.
//! Missing variables will cause compile-time errors.

/// Generate a prompt for extracting atomic facts from normalized text.
///
/// The atomization rules mirror what the downstream classifier expects:
/// one fact per attribute, names preserved, numbers and dates verbatim.
///
/// # Example
/// ```
/// use engram::llm::prompts::fact_extraction_prompt;
///
/// let prompt = fact_extraction_prompt("Sarah works at Acme and loves sushi");
/// assert!(prompt.contains("Acme"));
/// ```
pub fn fact_extraction_prompt(content: &str) -> String {
    format!(
        r#"Extract atomic facts about the user (or named third parties) from the following text.
Return as a JSON array of fact objects with "content", "kind", "is_permanent", and "confidence" fields.

Atomization rules:
- One fact = one attribute. Split compound statements into separate facts.
- Preserve names exactly as written. Only say "User" when no name is given.
- Preserve roles, numbers, amounts, and dates verbatim; never round or reword them.
- Infer compound labels from behavior when clear (e.g. "eats no meat" implies a vegetarian diet).

Kinds:
- fact: objective information (occupation, location, age, skills, relationships)
- preference: choices, likes, dislikes, favorites
- event: dated occurrences (meetings, deadlines, appointments, trips)

is_permanent: true for biographical/identity facts (name, birthday, education, origin,
family), false for current/contextual state ("currently working on...", "this week...").

Confidence: a score from 0.0 to 1.0 indicating how certain you are about this fact.

Text:
{content}

Respond with valid JSON only. Example format:
[
  {{"content": "Sarah Johnson works at Acme Corp", "kind": "fact", "is_permanent": false, "confidence": 0.9}},
  {{"content": "User's favorite tea is oolong", "kind": "preference", "is_permanent": false, "confidence": 0.85}},
  {{"content": "User has a dentist appointment on 2026-03-02", "kind": "event", "is_permanent": false, "confidence": 0.9}}
]"#
    )
}

/// Generate a prompt for expanding a search query before embedding.
pub fn query_expansion_prompt(query: &str) -> String {
    format!(
        r#"Rewrite the following search query to improve semantic retrieval over a store of
short personal facts. Expand abbreviations, add likely synonyms, and keep the intent.
Keep it to a single line. Do not answer the query.

Query: {query}

Respond with only the rewritten query text, nothing else."#
    )
}

/// Generate a prompt that produces a short title and summary for ingested text.
pub fn title_summary_prompt(content: &str) -> String {
    format!(
        r#"Write a short title (at most 8 words) and a one-sentence summary for the
following text. Return a JSON object with "title" and "summary" fields.

Text:
{content}

Respond with valid JSON only. Example format:
{{"title": "Team planning notes", "summary": "Notes covering the Q3 roadmap and hiring plans."}}"#
    )
}

/// Generate a prompt that scores search results for relevance to a query.
///
/// Expects a JSON array of numbers between 0.0 and 1.0, one per result, in
/// input order.
pub fn rerank_prompt(query: &str, results: &[&str]) -> String {
    let numbered = results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}", i + 1, r))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Score each result below for relevance to the query. Return a JSON array of
numbers between 0.0 (irrelevant) and 1.0 (highly relevant), one per result,
in the same order.

Query: {query}

Results:
{numbered}

Respond with valid JSON only, e.g. [0.9, 0.2, 0.75]"#
    )
}
