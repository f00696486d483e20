//! Lnswap Client SDK - WASM Bindings
//!
//! This crate provides WebAssembly bindings for the Lnswap Client SDK.
//! It wraps the core library with WASM-compatible types and JavaScript interop.
//!
//! **Note:** This crate is WASM-only and will not compile for native targets.
//!
//! # Usage from JavaScript/TypeScript
//!
//! ```javascript
//! import init, { Client, JsEventChannelProvider } from '@lnswap/sdk';
//!
//! // Initialize WASM
//! await init();
//!
//! // Wire the websocket to the client
//! const socket = new WebSocket('wss://api.testnet.boltz.exchange/v2/ws');
//! const client = new Client('testnet', null, new JsEventChannelProvider(
//!     async (text) => socket.send(text),
//!     async () => socket.close(),
//! ));
//! socket.onmessage = (msg) => client.handleMessage(msg.data);
//!
//! // Quote and swap
//! const form = await client.tradeForm();
//! form.setSendInput('100000');
//! const swap = await client.createSubmarineSwap(invoice, (view) => render(view));
//! ```

// This crate only compiles for WASM targets
#![cfg(target_arch = "wasm32")]

mod channel_adapter;
mod client;
mod error;
mod js_types;

use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use channel_adapter::*;
pub use client::*;
pub use error::*;
pub use js_types::*;

use lnswap_core::types as core_types;

/// Initialize the WASM module.
///
/// This sets up logging and panic hooks for better debugging.
#[wasm_bindgen(start)]
pub fn initialize() {
    // Set up panic hook for better error messages
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    // Initialize logging
    console_log::init_with_level(log::Level::Debug).ok();
    log::info!("Lnswap SDK initialized");
}

/// Serialize a value to JsValue as a plain object (not a Map).
fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    value
        .serialize(&serializer)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Swap direction.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy)]
pub struct SwapDirection(core_types::Direction);

#[wasm_bindgen]
impl SwapDirection {
    /// On-chain in, Lightning out.
    pub fn submarine() -> SwapDirection {
        SwapDirection(core_types::Direction::Submarine)
    }

    /// Lightning in, on-chain out.
    pub fn reverse() -> SwapDirection {
        SwapDirection(core_types::Direction::Reverse)
    }

    #[wasm_bindgen(js_name = "toString")]
    pub fn to_js_string(&self) -> String {
        self.0.to_string()
    }

    #[wasm_bindgen(js_name = "fromString")]
    pub fn from_string(s: &str) -> Result<SwapDirection, JsValue> {
        match s {
            "submarine" => Ok(SwapDirection(core_types::Direction::Submarine)),
            "reverse" => Ok(SwapDirection(core_types::Direction::Reverse)),
            other => Err(JsValue::from_str(&format!("Unknown direction: {other}"))),
        }
    }
}

impl From<core_types::Direction> for SwapDirection {
    fn from(d: core_types::Direction) -> Self {
        SwapDirection(d)
    }
}

impl From<SwapDirection> for core_types::Direction {
    fn from(d: SwapDirection) -> Self {
        d.0
    }
}

/// Whether `preimage_hex` hashes to the payment hash of `invoice`.
#[wasm_bindgen(js_name = "validatePreimage")]
pub fn validate_preimage(invoice: &str, preimage_hex: &str) -> bool {
    match hex::decode(preimage_hex) {
        Ok(preimage) => lnswap_core::invoice::validate(invoice, &preimage),
        Err(_) => false,
    }
}

/// Payment hash of a BOLT11 invoice (hex-encoded).
#[wasm_bindgen(js_name = "paymentHash")]
pub fn payment_hash(invoice: &str) -> Result<String, JsValue> {
    let hash = crate::map_err_to_js!(lnswap_core::invoice::payment_hash(invoice))?;
    Ok(hex::encode(hash))
}

/// Parse a user-typed amount; anything unparseable is zero.
#[wasm_bindgen(js_name = "parseAmount")]
pub fn parse_amount(input: &str) -> u64 {
    lnswap_core::amount::parse_amount(input)
}

/// Satoshis with thousands separators.
#[wasm_bindgen(js_name = "formatSats")]
pub fn format_sats(sats: u64) -> String {
    lnswap_core::amount::format_sats(sats)
}
