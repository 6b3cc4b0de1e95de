//! GenerationBackend trait definition.
//!
//! The one capability every text generator implements: take the ordered
//! history plus a directive, return the next assistant turn. Backends are
//! stateless between calls and do not retry on their own.

use oilan_types::generation::{GenerationError, GenerationRequest};

/// Trait for generation backends (mock, OpenAI, Gemini).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). The
/// orchestrator is generic over this trait, so the backend chosen at startup
/// is dispatched statically.
pub trait GenerationBackend: Send + Sync {
    /// Human-readable backend name (e.g., "mock", "openai").
    fn name(&self) -> &str;

    /// Produce the next assistant message for `request`.
    ///
    /// Fails with a [`GenerationError`] on transport, quota, authentication,
    /// or malformed/empty responses.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = Result<String, GenerationError>> + Send;
}
