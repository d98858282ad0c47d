//! Remote music generation.
//!
//! - [`adapter`]: per-family input schemas and version pinning.
//! - [`service`]: the [`GenerationService`] trait and output types.
//! - [`replicate`]: the Replicate HTTP implementation.
//! - [`output`]: locator normalization.
//! - [`invoker`]: retry loop tying the above together.

pub mod adapter;
pub mod invoker;
pub mod output;
pub mod replicate;
pub mod service;

pub use adapter::{family_for, AdaptedRequest, ModelFamily, MODEL_FAMILIES};
pub use invoker::{GenerationError, GenerationRequest, ModelInvoker, RetryPolicy};
pub use output::normalize;
pub use replicate::ReplicateClient;
pub use service::{GenerationService, LocatorHandle, ModelOutput, ServiceError};

#[cfg(test)]
pub use service::MockGenerationService;
