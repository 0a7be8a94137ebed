//! Prompt construction and response parsing for AI description summaries.

use serde_json::Value;

use crate::error::CoreError;

/// Returned when the model response carries no generated text.
pub const SUMMARY_UNAVAILABLE: &str = "AI-generated description unavailable.";

/// Build the text-generation prompt for a project description.
///
/// The title and category are optional context. Blank values are treated
/// as missing. Fails when the description itself is missing or blank.
pub fn build_prompt(
    description: Option<&str>,
    title: Option<&str>,
    category: Option<&str>,
) -> Result<String, CoreError> {
    let description = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| {
            CoreError::Validation("Project description is required and cannot be empty.".into())
        })?;

    fn non_blank(v: Option<&str>) -> Option<&str> {
        v.map(str::trim).filter(|v| !v.is_empty())
    }

    let mut prompt = String::from("Generate a summary for the following project description");
    if let Some(title) = non_blank(title) {
        prompt.push_str(&format!(" for the project titled '{title}'"));
    }
    if let Some(category) = non_blank(category) {
        prompt.push_str(&format!(" in the category of '{category}'"));
    }
    prompt.push_str(&format!(". Here is the description: {description}"));

    Ok(prompt)
}

/// Pull the generated text out of an inference response body.
///
/// Accepts either `[{"generated_text": ...}]` or `{"generated_text": ...}`;
/// anything else yields [`SUMMARY_UNAVAILABLE`].
pub fn extract_generated_text(response: &Value) -> String {
    let entry = match response {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(response),
        _ => None,
    };

    entry
        .and_then(|e| e.get("generated_text"))
        .and_then(Value::as_str)
        .unwrap_or(SUMMARY_UNAVAILABLE)
        .to_string()
}
