//! WASM-friendly type wrappers.
//!
//! These types wrap the core SDK types with wasm_bindgen annotations
//! for seamless JavaScript interop.

use rust_decimal::prelude::ToPrimitive;
use wasm_bindgen::prelude::*;

/// Fees and limits of one swap direction.
#[wasm_bindgen(getter_with_clone)]
#[derive(Debug, Clone)]
pub struct Quote {
    /// "submarine" or "reverse".
    pub direction: String,
    /// Service fee in percent.
    #[wasm_bindgen(js_name = "feePercent")]
    pub fee_percent: f64,
    /// Total miner fee in satoshis.
    #[wasm_bindgen(js_name = "minerFee")]
    pub miner_fee: u64,
    /// Smallest amount the user may send, in satoshis.
    #[wasm_bindgen(js_name = "minSend")]
    pub min_send: u64,
    /// Largest amount the user may send, in satoshis.
    #[wasm_bindgen(js_name = "maxSend")]
    pub max_send: u64,
}

impl From<&lnswap_core::SwapQuote> for Quote {
    fn from(quote: &lnswap_core::SwapQuote) -> Self {
        Self {
            direction: quote.direction.to_string(),
            fee_percent: quote.fee_percent.to_f64().unwrap_or_default(),
            miner_fee: quote.miner_fee.total(),
            min_send: quote.min_send().unwrap_or(0),
            max_send: quote.max_send().unwrap_or(0),
        }
    }
}

/// A freshly created submarine swap.
#[wasm_bindgen(getter_with_clone)]
#[derive(Debug, Clone)]
pub struct CreatedSwap {
    pub id: String,
    /// Lockup address the user funds.
    pub address: String,
    /// Payment URI for the lockup, if the service sent one.
    pub bip21: Option<String>,
    /// Amount the lockup must receive, in satoshis.
    #[wasm_bindgen(js_name = "expectedAmount")]
    pub expected_amount: Option<u64>,
    /// Payment hash of the invoice (hex-encoded).
    #[wasm_bindgen(js_name = "paymentHash")]
    pub payment_hash: String,
}

impl From<&lnswap_core::SwapRecord> for CreatedSwap {
    fn from(record: &lnswap_core::SwapRecord) -> Self {
        Self {
            id: record.id().to_string(),
            address: record.address().to_string(),
            bip21: record.bip21().map(str::to_string),
            expected_amount: record.expected_amount(),
            payment_hash: hex::encode(record.payment_hash()),
        }
    }
}
