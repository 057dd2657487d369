use std::time::Duration;

use crate::{ImageSource, LabelReport, LabelScanner, ScanError, ScannerConfig};

/// Builder for configuring and executing a single label scan
#[derive(Debug, Default)]
pub struct LabelScanBuilder {
    source: Option<ImageSource>,
    config: Option<ScannerConfig>,
    timeout: Option<Duration>,
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

impl LabelScanBuilder {
    /// Set the input to an image file
    ///
    /// # Example
    /// ```
    /// use upf_scanner::LabelScanner;
    ///
    /// let builder = LabelScanner::builder()
    ///     .image("/path/to/ingredients.jpg");
    /// ```
    pub fn image(mut self, path: impl Into<String>) -> Self {
        self.source = Some(ImageSource::Path(path.into()));
        self
    }

    /// Set the input to image bytes already in memory, e.g. a camera capture
    pub fn image_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.source = Some(ImageSource::Bytes(bytes.into()));
        self
    }

    /// Set the input to base64 image data (a `data:` URL is accepted too)
    pub fn image_base64(mut self, data: impl Into<String>) -> Self {
        self.source = Some(ImageSource::Base64(data.into()));
        self
    }

    /// Use this configuration instead of loading `config.toml` and the environment
    pub fn config(mut self, config: ScannerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a timeout for the model request. Rounded up to whole seconds.
    ///
    /// # Example
    /// ```
    /// use upf_scanner::LabelScanner;
    /// use std::time::Duration;
    ///
    /// let builder = LabelScanner::builder()
    ///     .image("label.jpg")
    ///     .timeout(Duration::from_secs(20));
    /// ```
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Set the API key directly instead of relying on environment variables
    ///
    /// # Example
    /// ```
    /// use upf_scanner::LabelScanner;
    ///
    /// let builder = LabelScanner::builder()
    ///     .image("label.jpg")
    ///     .api_key("your-api-key");
    /// ```
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Point at a different API root (proxies, test servers)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    fn resolve_config(&mut self) -> Result<ScannerConfig, ScanError> {
        let mut config = match self.config.take() {
            Some(config) => config,
            None => ScannerConfig::load()?,
        };

        if let Some(key) = self.api_key.take() {
            config.api_key = Some(key);
        }
        if let Some(model) = self.model.take() {
            config.model = model;
        }
        if let Some(url) = self.base_url.take() {
            config.base_url = url;
        }
        if let Some(timeout) = self.timeout {
            let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
            config.timeout = secs.max(1);
        }
        Ok(config)
    }

    /// Build and execute the scan
    ///
    /// # Returns
    /// A `LabelReport`: either the analysis or the missing-ingredients sentinel
    ///
    /// # Errors
    /// Returns `ScanError` if:
    /// - No image was specified
    /// - No API key is configured
    /// - The image cannot be read or is not JPEG/PNG/WebP
    /// - The request fails, times out, or is blocked
    /// - The model reply cannot be parsed or validated
    ///
    /// # Example
    /// ```no_run
    /// # use upf_scanner::LabelScanner;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let report = LabelScanner::builder()
    ///     .image("ingredients.jpg")
    ///     .build()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn build(mut self) -> Result<LabelReport, ScanError> {
        // Validate that source is set
        let source = self.source.take().ok_or_else(|| {
            ScanError::Builder(
                "No image source specified. Use .image(), .image_bytes() or .image_base64()"
                    .to_string(),
            )
        })?;

        let config = self.resolve_config()?;
        let scanner = LabelScanner::from_config(&config)?;
        scanner.scan(&source).await
    }
}

impl LabelScanner {
    /// Creates a new builder for a one-shot scan
    ///
    /// # Example
    /// ```
    /// use upf_scanner::LabelScanner;
    ///
    /// let builder = LabelScanner::builder();
    /// ```
    pub fn builder() -> LabelScanBuilder {
        LabelScanBuilder::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builder_no_source_error() {
        let err = LabelScanner::builder().build().await.unwrap_err();
        assert!(matches!(err, ScanError::Builder(_)));
        assert!(err.to_string().contains("No image source specified"));
    }

    #[test]
    fn test_builder_overrides_config() {
        let mut builder = LabelScanner::builder()
            .config(ScannerConfig::default())
            .api_key("key")
            .model("gemini-2.0-flash")
            .base_url("http://localhost:1234")
            .timeout(Duration::from_millis(1500));

        let config = builder.resolve_config().unwrap();
        assert_eq!(config.api_key.as_deref(), Some("key"));
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.base_url, "http://localhost:1234");
        assert_eq!(config.timeout, 2);
    }

    #[test]
    fn test_builder_sub_second_timeout_rounds_up() {
        let mut builder = LabelScanner::builder()
            .config(ScannerConfig::default())
            .timeout(Duration::from_millis(1));
        assert_eq!(builder.resolve_config().unwrap().timeout, 1);
    }
}
