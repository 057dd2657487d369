//! Run the response extractor on a few typical model replies, no network needed
//!
//! Usage: cargo run --example extract_offline

use upf_scanner::{extract_report, LabelReport, ScanError};

fn main() {
    let replies = [
        r#"{"top_3_by_mass": ["Oats", "Sugar", "Palm oil"], "stats": {"total_count": 4, "simple_pct": 50, "ultra_processed_pct": 50}, "lists": {"simple": ["Oats", "Sugar"], "ultra": ["Palm oil", "Glucose syrup"]}, "verdict": "Half simple, half processed."}"#,
        "Sure! Here's the result:\n```json\n{\"error\": \"missing_ingredients\", \"message\": \"That's the nutrition table - flip the pack over.\"}\n```",
        "Sorry, I cannot help with that.",
        r#"{"top_3_by_mass": ["Oats"], "verdict": "Simple."}"#,
    ];

    for raw in replies {
        match extract_report(raw) {
            Ok(LabelReport::Analysis(result)) => println!("analysis: {}", result.verdict),
            Ok(LabelReport::MissingIngredients(missing)) => {
                println!("missing ingredients: {}", missing.message)
            }
            Err(err @ ScanError::MalformedJson { .. }) => println!("malformed: {}", err),
            Err(err @ ScanError::SchemaMismatch { .. }) => println!("schema mismatch: {}", err),
            Err(err) => println!("other: {}", err),
        }
    }
}
