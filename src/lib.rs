//! Ingredient label scanner.
//!
//! Sends a photo of a food ingredients label to a multimodal model and turns
//! the reply into a [`LabelReport`]: the three heaviest ingredients, a
//! simple / ultra-processed split with percentages, and a one-line verdict.

pub mod builder;
pub mod config;
pub mod error;
pub mod extract;
pub mod image;
pub mod model;
pub mod prompt;
pub mod providers;
pub mod scanner;

// Re-export commonly used types
pub use builder::LabelScanBuilder;
pub use crate::config::{load_config, ScannerConfig};
pub use error::ScanError;
pub use extract::{extract_report, locate_json_object};
pub use image::{ImageMime, ImageSource, LabelImage};
pub use model::{
    AnalysisResult, IngredientLists, LabelReport, MissingIngredientsResult, Stats,
    ValidationIssue, MISSING_INGREDIENTS_SENTINEL,
};
pub use providers::{GoogleProvider, VisionProvider};
pub use scanner::LabelScanner;

/// Scan an image file using configuration from `config.toml` and the environment
///
/// # Example
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = upf_scanner::scan_label_file("ingredients.jpg").await?;
/// # Ok(())
/// # }
/// ```
pub async fn scan_label_file(path: impl Into<String>) -> Result<LabelReport, ScanError> {
    LabelScanner::builder().image(path).build().await
}

/// Scan image bytes using configuration from `config.toml` and the environment
pub async fn scan_label_bytes(bytes: impl Into<Vec<u8>>) -> Result<LabelReport, ScanError> {
    LabelScanner::builder().image_bytes(bytes).build().await
}
