use log::{debug, info};

use crate::config::ScannerConfig;
use crate::error::ScanError;
use crate::extract::extract_report;
use crate::image::{ImageSource, LabelImage};
use crate::model::LabelReport;
use crate::prompt::LABEL_ANALYSIS_PROMPT;
use crate::providers::{GoogleProvider, VisionProvider};

/// Sends label photos to a vision model and validates what comes back
pub struct LabelScanner {
    provider: Box<dyn VisionProvider>,
    prompt: String,
}

impl LabelScanner {
    /// Create a scanner backed by Google Gemini
    ///
    /// # Errors
    /// Returns [`ScanError::Configuration`] if no API key is configured.
    pub fn from_config(config: &ScannerConfig) -> Result<Self, ScanError> {
        Ok(Self::with_provider(Box::new(GoogleProvider::new(config)?)))
    }

    /// Create a scanner around any provider
    pub fn with_provider(provider: Box<dyn VisionProvider>) -> Self {
        Self {
            provider,
            prompt: LABEL_ANALYSIS_PROMPT.to_string(),
        }
    }

    /// Replace the built-in instruction text
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Load the image and analyse it
    pub async fn scan(&self, source: &ImageSource) -> Result<LabelReport, ScanError> {
        let image = source.load().await?;
        self.scan_image(&image).await
    }

    /// Analyse an already-loaded image. One request, no retries.
    pub async fn scan_image(&self, image: &LabelImage) -> Result<LabelReport, ScanError> {
        let raw = self.provider.generate(&self.prompt, image).await?;
        debug!("Raw model reply: {}", raw);

        let report = extract_report(&raw)?;
        match &report {
            LabelReport::Analysis(result) => info!(
                "Analysed {} ingredients with {}",
                result.stats.total_count,
                self.provider_name()
            ),
            LabelReport::MissingIngredients(_) => {
                info!("No ingredients list found in the image")
            }
        }
        Ok(report)
    }
}
