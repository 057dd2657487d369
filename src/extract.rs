//! Pulls the result object out of whatever text the model sent back.
//!
//! Models are told to answer with bare JSON but regularly wrap it in code
//! fences or surround it with a sentence or two. Extraction is a plain
//! text heuristic: drop the fences, then take everything from the first `{`
//! to the last `}`. The span is greedy, so a reply containing two separate
//! objects yields both (and then fails to parse).

use log::{debug, warn};
use serde_json::Value;

use crate::error::ScanError;
use crate::model::{
    AnalysisResult, LabelReport, MissingIngredientsResult, MISSING_INGREDIENTS_SENTINEL,
};

const FENCE: &str = "```";

/// Remove markdown code fence lines (```` ```json ````, ```` ``` ````), keeping
/// what sits between them. Backticks inside a line are left alone.
pub fn strip_code_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with(FENCE))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Returns the text between the first `{` and the last `}` inclusive,
/// or `None` when there is no such span.
pub fn locate_json_object(text: &str) -> Option<String> {
    let cleaned = strip_code_fences(text);
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end < start {
        return None;
    }
    Some(cleaned[start..=end].to_string())
}

/// Parse a raw model reply into a validated report.
///
/// # Errors
/// * [`ScanError::MalformedJson`] if no object can be found or it fails to parse
/// * [`ScanError::SchemaMismatch`] if the JSON matches neither result shape
pub fn extract_report(raw: &str) -> Result<LabelReport, ScanError> {
    let candidate = locate_json_object(raw).ok_or_else(|| ScanError::MalformedJson {
        reason: "no JSON object found in model reply".to_string(),
        raw: raw.to_string(),
    })?;

    let value: Value = serde_json::from_str(&candidate).map_err(|e| ScanError::MalformedJson {
        reason: e.to_string(),
        raw: raw.to_string(),
    })?;

    classify(value, raw)
}

fn classify(value: Value, raw: &str) -> Result<LabelReport, ScanError> {
    let schema_mismatch = |reason: String| ScanError::SchemaMismatch {
        reason,
        raw: raw.to_string(),
    };

    let Some(object) = value.as_object() else {
        return Err(schema_mismatch("model reply is not a JSON object".to_string()));
    };

    if object.get("error").and_then(Value::as_str) == Some(MISSING_INGREDIENTS_SENTINEL) {
        debug!("Model reports no ingredients list in the image");
        return match object.get("message").and_then(Value::as_str) {
            Some(message) => Ok(LabelReport::MissingIngredients(
                MissingIngredientsResult::new(message),
            )),
            None => Err(schema_mismatch(
                "missing ingredients result has no `message` string".to_string(),
            )),
        };
    }

    let result: AnalysisResult =
        serde_json::from_value(value).map_err(|e| schema_mismatch(e.to_string()))?;

    for issue in result.validation_issues() {
        warn!("Model-supplied value flagged: {}", issue);
    }

    Ok(LabelReport::Analysis(result))
}
