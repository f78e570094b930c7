//! Provider abstraction for the audit pipeline.
//!
//! Two capability traits, `TextGenerator` and `WebSearcher`, with one
//! concrete adapter per vendor, selected by name through the factory.
//! Adapters normalize every vendor-specific failure into `ProviderError`
//! before returning; callers never see wire or transport types.

pub mod claude;
pub mod factory;
pub mod normalize;
pub mod openai;
pub mod retry;
pub mod serper;
pub mod tavily;
pub mod traits;

pub use factory::{text_generator, web_searcher, ProviderKeys};
pub use retry::{call_with_retry, RetryPolicy};
pub use traits::{GenerationRequest, TextGenerator, WebSearcher};
