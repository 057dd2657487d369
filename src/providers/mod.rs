mod google;

pub use google::GoogleProvider;

use async_trait::async_trait;

use crate::error::ScanError;
use crate::image::LabelImage;

/// A multimodal model that can read a label photo
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Get the provider name (e.g., "google")
    fn provider_name(&self) -> &str;

    /// Send the instruction and image, returning the model's raw text reply
    async fn generate(&self, prompt: &str, image: &LabelImage) -> Result<String, ScanError>;
}
