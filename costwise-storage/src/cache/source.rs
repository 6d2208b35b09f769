//! External pricing source abstraction.

use async_trait::async_trait;
use costwise_core::{CityKey, CostIndices, CostwiseResult};

/// Indices quoted by the pricing source for one city.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingQuote {
    pub country: String,
    pub indices: CostIndices,
}

/// Third-party provider of per-city cost indices.
///
/// Only [`CostIndexCache`](super::CostIndexCache) calls this. Implementations
/// must bound their own latency and report failures as `UpstreamError`s:
/// `CityNotFound` when the provider has no such city, anything else when the
/// provider is unreachable or misbehaving.
#[async_trait]
pub trait PricingSource: Send + Sync {
    async fn fetch(&self, city: &CityKey) -> CostwiseResult<PricingQuote>;

    /// Short provider name for logs and metrics.
    fn name(&self) -> &'static str;
}
