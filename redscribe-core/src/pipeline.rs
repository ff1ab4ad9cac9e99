//! Seams between the shell and the two network-calling components.
//!
//! A run always calls [`ContentFetcher::fetch`] to completion before
//! [`PostSynthesizer::synthesize`]; neither trait carries state across runs.

use crate::{CoreError, FetchedContent, GeneratedPost, GenerationRequest, SearchQuery};
use async_trait::async_trait;

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, query: &SearchQuery) -> Result<FetchedContent, CoreError>;
}

#[async_trait]
pub trait PostSynthesizer: Send + Sync {
    async fn synthesize(&self, request: GenerationRequest) -> Result<GeneratedPost, CoreError>;
}
