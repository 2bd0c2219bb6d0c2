//! Image analysis provider

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{DomainError, ImagePayload, Provider, ProviderInput};

/// Vision front for a multimodal provider.
///
/// Re-validates the attached data URL and refuses inputs without an image,
/// so a malformed payload never reaches the remote service.
#[derive(Debug)]
pub struct VisionProvider {
    inner: Arc<dyn Provider>,
    max_image_bytes: usize,
}

impl VisionProvider {
    pub fn new(inner: Arc<dyn Provider>, max_image_bytes: usize) -> Self {
        Self {
            inner,
            max_image_bytes,
        }
    }
}

#[async_trait]
impl Provider for VisionProvider {
    async fn call(&self, input: ProviderInput) -> Result<String, DomainError> {
        let image = input
            .image
            .as_ref()
            .ok_or_else(|| DomainError::validation("Image analysis requires an image"))?;

        ImagePayload::from_data_url(image.data_url(), self.max_image_bytes)?;

        self.inner.call(input).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}
