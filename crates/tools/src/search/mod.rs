//! Search client adapter.
//!
//! [`SearchBackend`] is the seam the tools are written against; [`EsClient`]
//! implements it over the engine's REST API, and tests substitute an
//! in-memory backend.

mod client;
mod error;

use std::future::Future;

use retail_agents_core::query::QueryRequest;
use retail_agents_core::{HitRecord, SearchResult};

pub use client::{ClusterInfo, ClusterVersion, EsClient};
pub use error::SearchError;

/// Executes search requests and point lookups.
pub trait SearchBackend: Send + Sync {
    /// Run `request` and return its parsed hits and raw aggregations.
    fn search(
        &self,
        request: &QueryRequest,
    ) -> impl Future<Output = Result<SearchResult, SearchError>> + Send;

    /// Fetch document `id` from `index`.
    fn get_by_id(
        &self,
        index: &str,
        id: &str,
    ) -> impl Future<Output = Result<HitRecord, SearchError>> + Send;
}

impl SearchBackend for EsClient {
    async fn search(&self, request: &QueryRequest) -> Result<SearchResult, SearchError> {
        Self::search(self, request).await
    }

    async fn get_by_id(&self, index: &str, id: &str) -> Result<HitRecord, SearchError> {
        Self::get_by_id(self, index, id).await
    }
}
