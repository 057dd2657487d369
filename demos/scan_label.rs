//! Scan a label photo with the builder API
//!
//! Usage: cargo run --example scan_label -- path/to/ingredients.jpg
//!
//! Requires GEMINI_API_KEY (or GOOGLE_API_KEY) to be set.

use std::time::Duration;
use upf_scanner::{LabelReport, LabelScanner};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("Please provide an image path as an argument")?;

    let result = LabelScanner::builder()
        .image(path)
        .timeout(Duration::from_secs(30))
        .build()
        .await;

    match result {
        Ok(LabelReport::Analysis(analysis)) => {
            println!("Verdict: {}", analysis.verdict);
            println!(
                "Simple {}% / Ultra processed {}%",
                analysis.stats.simple_pct, analysis.stats.ultra_processed_pct
            );
            for (i, item) in analysis.top_3_by_mass.iter().enumerate() {
                println!("{}. {}", i + 1, item);
            }
        }
        Ok(LabelReport::MissingIngredients(missing)) => {
            println!("No ingredients list found: {}", missing.message);
        }
        Err(err) => {
            eprintln!("{}", err.user_message());
            if let Some(raw) = err.raw_response() {
                eprintln!("Raw response:\n{}", raw);
            }
        }
    }

    Ok(())
}
