use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Value of the `error` field the model emits when no ingredients list is visible
pub const MISSING_INGREDIENTS_SENTINEL: &str = "missing_ingredients";

/// Number of heaviest ingredients the model is asked to report
pub const TOP_INGREDIENT_COUNT: usize = 3;

/// Outcome of a successful scan: either a full analysis or the
/// "no ingredients list in this photo" sentinel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LabelReport {
    Analysis(AnalysisResult),
    MissingIngredients(MissingIngredientsResult),
}

/// Full breakdown of an ingredients label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Heaviest ingredients, in label order
    pub top_3_by_mass: Vec<String>,
    pub stats: Stats,
    pub lists: IngredientLists,
    /// One-sentence summary from the model
    pub verdict: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(deserialize_with = "deserialize_count")]
    pub total_count: u32,
    #[serde(deserialize_with = "deserialize_percentage")]
    pub simple_pct: f64,
    #[serde(deserialize_with = "deserialize_percentage")]
    pub ultra_processed_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientLists {
    pub simple: Vec<String>,
    pub ultra: Vec<String>,
}

/// Returned when the photo shows no ingredients list (e.g. the nutrition table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingIngredientsResult {
    error: SentinelTag,
    /// Guidance for the user, exactly as the model wrote it
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum SentinelTag {
    #[serde(rename = "missing_ingredients")]
    MissingIngredients,
}

impl MissingIngredientsResult {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: SentinelTag::MissingIngredients,
            message: message.into(),
        }
    }

    /// Always [`MISSING_INGREDIENTS_SENTINEL`]
    pub fn error(&self) -> &'static str {
        MISSING_INGREDIENTS_SENTINEL
    }
}

/// A value the model supplied that falls outside its declared range.
/// Flagged, never corrected.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    PercentageOutOfRange { field: &'static str, value: f64 },
    TooManyTopIngredients { count: usize },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::PercentageOutOfRange { field, value } => {
                write!(f, "{} is {} which is outside 0-100", field, value)
            }
            ValidationIssue::TooManyTopIngredients { count } => write!(
                f,
                "top_3_by_mass lists {} ingredients, expected at most {}",
                count, TOP_INGREDIENT_COUNT
            ),
        }
    }
}

impl Stats {
    /// Sum of both category percentages. Usually 100, but the model does not guarantee it.
    pub fn percentage_sum(&self) -> f64 {
        self.simple_pct + self.ultra_processed_pct
    }
}

impl AnalysisResult {
    /// Range checks on model-supplied numbers
    pub fn validation_issues(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for (field, value) in [
            ("simple_pct", self.stats.simple_pct),
            ("ultra_processed_pct", self.stats.ultra_processed_pct),
        ] {
            if !(0.0..=100.0).contains(&value) {
                issues.push(ValidationIssue::PercentageOutOfRange { field, value });
            }
        }

        if self.top_3_by_mass.len() > TOP_INGREDIENT_COUNT {
            issues.push(ValidationIssue::TooManyTopIngredients {
                count: self.top_3_by_mass.len(),
            });
        }

        issues
    }

    /// Ingredients the model placed in both categories (case-insensitive)
    pub fn overlapping_ingredients(&self) -> Vec<&str> {
        self.lists
            .simple
            .iter()
            .filter(|simple| {
                self.lists
                    .ultra
                    .iter()
                    .any(|ultra| ultra.trim().eq_ignore_ascii_case(simple.trim()))
            })
            .map(String::as_str)
            .collect()
    }
}

impl LabelReport {
    pub fn is_missing_ingredients(&self) -> bool {
        matches!(self, LabelReport::MissingIngredients(_))
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        match self {
            LabelReport::Analysis(result) => Some(result),
            LabelReport::MissingIngredients(_) => None,
        }
    }
}

/// Accepts `60`, `60.5`, `"60"` and `"60 %"`.
fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn coerce_count(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let float = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if float.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&float) {
        Some(float as u32)
    } else {
        None
    }
}

fn deserialize_percentage<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    coerce_f64(&value)
        .ok_or_else(|| de::Error::custom(format!("expected a percentage, found {}", value)))
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    coerce_count(&value).ok_or_else(|| {
        de::Error::custom(format!(
            "expected a non-negative whole number, found {}",
            value
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> AnalysisResult {
        AnalysisResult {
            top_3_by_mass: vec!["Water".into(), "Sugar".into(), "Salt".into()],
            stats: Stats {
                total_count: 5,
                simple_pct: 60.0,
                ultra_processed_pct: 40.0,
            },
            lists: IngredientLists {
                simple: vec!["Water".into(), "Sugar".into(), "Salt".into()],
                ultra: vec!["E102".into(), "E330".into()],
            },
            verdict: "Mostly simple.".into(),
        }
    }

    #[test]
    fn test_coerces_numeric_strings() {
        let stats: Stats = serde_json::from_value(json!({
            "total_count": "7",
            "simple_pct": "42.5%",
            "ultra_processed_pct": " 57.5 "
        }))
        .unwrap();
        assert_eq!(stats.total_count, 7);
        assert_eq!(stats.simple_pct, 42.5);
        assert_eq!(stats.ultra_processed_pct, 57.5);
    }

    #[test]
    fn test_integral_float_count_is_accepted() {
        let stats: Stats = serde_json::from_value(json!({
            "total_count": 4.0,
            "simple_pct": 50,
            "ultra_processed_pct": 50
        }))
        .unwrap();
        assert_eq!(stats.total_count, 4);
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let result: Result<Stats, _> = serde_json::from_value(json!({
            "total_count": -1,
            "simple_pct": 50,
            "ultra_processed_pct": 50
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_non_numeric_percentage_is_rejected() {
        let result: Result<Stats, _> = serde_json::from_value(json!({
            "total_count": 2,
            "simple_pct": "about half",
            "ultra_processed_pct": 50
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_percentages_are_flagged_not_corrected() {
        let mut result = sample();
        result.stats.simple_pct = 120.0;
        result.stats.ultra_processed_pct = -20.0;

        let issues = result.validation_issues();
        assert_eq!(issues.len(), 2);
        assert!(issues.contains(&ValidationIssue::PercentageOutOfRange {
            field: "simple_pct",
            value: 120.0
        }));
        assert_eq!(result.stats.simple_pct, 120.0);
    }

    #[test]
    fn test_too_many_top_ingredients_is_flagged() {
        let mut result = sample();
        result.top_3_by_mass.push("Oil".into());
        assert_eq!(
            result.validation_issues(),
            vec![ValidationIssue::TooManyTopIngredients { count: 4 }]
        );
    }

    #[test]
    fn test_overlapping_ingredients() {
        let mut result = sample();
        assert!(result.overlapping_ingredients().is_empty());
        result.lists.ultra.push("sugar".into());
        assert_eq!(result.overlapping_ingredients(), vec!["Sugar"]);
    }

    #[test]
    fn test_missing_ingredients_serializes_sentinel() {
        let report = LabelReport::MissingIngredients(MissingIngredientsResult::new(
            "Photograph the ingredients paragraph instead.",
        ));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["error"], MISSING_INGREDIENTS_SENTINEL);
        assert_eq!(
            value["message"],
            "Photograph the ingredients paragraph instead."
        );
    }

    #[test]
    fn test_analysis_serializes_without_wrapper() {
        let value = serde_json::to_value(LabelReport::Analysis(sample())).unwrap();
        assert_eq!(value["stats"]["total_count"], 5);
        assert_eq!(value["top_3_by_mass"][0], "Water");
    }
}
