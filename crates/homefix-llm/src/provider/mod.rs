//! Generation provider trait definition
//!
//! The diagnosis core depends only on this trait. Which backend implements it
//! is decided at startup.

mod mock;

pub use mock::MockProvider;

use crate::error::Result;
use crate::request::{GenerationRequest, GenerationResponse};

/// Trait for generation providers
#[async_trait::async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Generate text from an ordered list of prompt parts.
    ///
    /// Implementations make exactly one upstream call and never retry.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;
}
