//! API types for the swap service backend.
//!
//! These types match the service's v2 REST schema and are used for request/response
//! serialization.

use crate::amount::{MinerFee, SwapQuote};
use crate::error::Result;
use crate::types::Direction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ticker of the only asset pair this client trades.
pub const BTC: &str = "BTC";

/// Fee schedule response: pairs nested by source then target ticker.
pub type PairMap = HashMap<String, HashMap<String, PairInfo>>;

/// Fees and limits of one asset pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairInfo {
    /// Hash of the pair data, echoed back by some endpoints to pin a quote.
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub rate: Option<Decimal>,
    pub limits: PairLimits,
    pub fees: PairFees,
}

impl PairInfo {
    /// Turn the wire schedule into a quote for `direction`.
    pub fn to_quote(&self, direction: Direction) -> Result<SwapQuote> {
        SwapQuote::new(
            direction,
            self.fees.percentage,
            self.fees.miner_fees,
            self.limits.minimal,
            self.limits.maximal,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairLimits {
    pub minimal: u64,
    pub maximal: u64,
    #[serde(default)]
    pub maximal_zero_conf: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairFees {
    /// Service fee in percent.
    pub percentage: Decimal,
    /// Flat for submarine swaps, split into lockup and claim for reverse swaps.
    pub miner_fees: MinerFee,
}

/// One leaf of the serialized script tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapTreeLeaf {
    /// Tapscript leaf version.
    pub version: u8,
    /// Hex-encoded script.
    pub output: String,
}

/// Serialized Taproot script tree of the lockup output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapTree {
    pub claim_leaf: SwapTreeLeaf,
    pub refund_leaf: SwapTreeLeaf,
}

/// Request to create a submarine swap (on-chain → Lightning).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmarineRequest {
    pub from: String,
    pub to: String,
    /// BOLT11 invoice the service pays.
    pub invoice: String,
    /// Hex-encoded compressed public key of the user's ephemeral keypair.
    pub refund_public_key: String,
}

/// Response to a successful submarine swap creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmarineResponse {
    pub id: String,
    /// Payment URI to fund the lockup address.
    #[serde(default)]
    pub bip21: Option<String>,
    /// Lockup address.
    pub address: String,
    pub swap_tree: SwapTree,
    /// Hex-encoded compressed public key the service claims with.
    pub claim_public_key: String,
    #[serde(default)]
    pub timeout_block_height: Option<u32>,
    #[serde(default)]
    pub expected_amount: Option<u64>,
    #[serde(default)]
    pub accept_zero_conf: Option<bool>,
}

/// Claim details the service publishes once it paid the invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimDetailsResponse {
    /// Hex-encoded preimage of the invoice's payment hash.
    pub preimage: String,
    /// Hex-encoded MuSig2 public nonce of the service.
    pub pub_nonce: String,
    /// Hex-encoded sighash of the claim transaction.
    pub transaction_hash: String,
}

/// Our half of the cooperative claim signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitClaimRequest {
    pub pub_nonce: String,
    pub partial_signature: String,
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}
