//! Swap service API client and types.
//!
//! This module provides types and an HTTP client for the swap service's REST API, plus the
//! [`SwapService`] seam a running swap session uses to reach the service.

mod client;
mod types;

pub use client::ApiClient;
pub use types::*;

use crate::error::Result;
use std::future::Future;
use std::pin::Pin;

/// Type alias for service call futures.
///
/// On WASM targets, futures don't need to be `Send` since JavaScript is single-threaded.
/// On native targets, futures should be `Send` to allow use with multi-threaded runtimes.
#[cfg(target_arch = "wasm32")]
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a>>;

#[cfg(not(target_arch = "wasm32"))]
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// The calls a swap session makes while it runs.
///
/// [`ApiClient`] implements this against the real service; tests substitute their own.
#[cfg(target_arch = "wasm32")]
pub trait SwapService {
    /// Fetch preimage, service nonce and sighash of the pending claim.
    fn claim_details(&self, swap_id: &str) -> ServiceFuture<'_, ClaimDetailsResponse>;

    /// Submit our public nonce and partial signature.
    fn submit_claim(&self, swap_id: &str, request: &SubmitClaimRequest) -> ServiceFuture<'_, ()>;
}

#[cfg(not(target_arch = "wasm32"))]
pub trait SwapService: Send + Sync {
    /// Fetch preimage, service nonce and sighash of the pending claim.
    fn claim_details(&self, swap_id: &str) -> ServiceFuture<'_, ClaimDetailsResponse>;

    /// Submit our public nonce and partial signature.
    fn submit_claim(&self, swap_id: &str, request: &SubmitClaimRequest) -> ServiceFuture<'_, ()>;
}
