//! Compute capability consumed by the job serializer.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ComputeError, Image};

/// Opaque image generator guarded by the serializer.
///
/// Implementations may block: the serializer only ever calls `generate` from
/// its dedicated worker thread, which runs its own single-threaded tokio
/// runtime, and never runs two calls at once.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use imagine_gate::core::{ComputeError, Image, ImageGenerator};
///
/// struct Diffusion { /* model handles */ }
///
/// #[async_trait]
/// impl ImageGenerator for Diffusion {
///     async fn generate(&self, positive: &str, negative: &str) -> Result<Image, ComputeError> {
///         let png = run_pipeline(positive, negative).map_err(|e| ComputeError::new(e.to_string()))?;
///         Ok(Image::new(png))
///     }
/// }
/// ```
#[async_trait]
pub trait ImageGenerator: Send + Sync + 'static {
    /// Produce one image from a positive and a negative prompt.
    ///
    /// # Errors
    ///
    /// Any failure is reported as a [`ComputeError`]; there are no partial
    /// results.
    async fn generate(&self, positive: &str, negative: &str) -> Result<Image, ComputeError>;
}

#[async_trait]
impl<G: ImageGenerator + ?Sized> ImageGenerator for Arc<G> {
    async fn generate(&self, positive: &str, negative: &str) -> Result<Image, ComputeError> {
        (**self).generate(positive, negative).await
    }
}
