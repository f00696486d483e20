//! JavaScript event channel adapter for WASM.
//!
//! This module provides the bridge between a websocket owned by JavaScript and the Rust
//! EventChannel trait. TypeScript code opens the socket, passes callbacks for writing to
//! and closing it, and forwards every incoming message to the client.

use js_sys::{Function, Promise};
use lnswap_core::event::{ChannelFuture, EventChannel};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

/// JavaScript event channel provider passed from TypeScript.
///
/// Each callback may return a Promise or nothing.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const socket = new WebSocket(config.wsUrl);
/// const channel = new JsEventChannelProvider(
///     async (text) => socket.send(text),   // send
///     async () => socket.close(),           // close
/// );
/// socket.onmessage = (msg) => client.handleMessage(msg.data);
/// socket.onclose = (ev) => client.handleClose(ev.reason);
/// socket.onerror = () => client.handleError("websocket error");
/// ```
#[wasm_bindgen]
pub struct JsEventChannelProvider {
    send_fn: Function,
    close_fn: Function,
}

#[wasm_bindgen]
impl JsEventChannelProvider {
    /// Create a new JsEventChannelProvider from JavaScript callbacks.
    ///
    /// # Arguments
    /// * `send_fn` - Function: `(text: string) => Promise<void> | void`
    /// * `close_fn` - Function: `() => Promise<void> | void`
    #[wasm_bindgen(constructor)]
    pub fn new(send_fn: Function, close_fn: Function) -> Self {
        Self { send_fn, close_fn }
    }
}

/// Internal adapter that implements the core EventChannel trait using JS callbacks.
pub struct JsEventChannelAdapter {
    provider: JsEventChannelProvider,
}

impl JsEventChannelAdapter {
    pub fn new(provider: JsEventChannelProvider) -> Self {
        Self { provider }
    }
}

/// Await the callback's result if it returned a Promise.
async fn settle(name: &str, result: Result<JsValue, JsValue>) -> lnswap_core::Result<()> {
    let value = result.map_err(|e| {
        lnswap_core::Error::Transport(format!("Failed to call {name}: {:?}", e))
    })?;

    if let Ok(promise) = value.dyn_into::<Promise>() {
        JsFuture::from(promise).await.map_err(|e| {
            lnswap_core::Error::Transport(format!("{name} Promise rejected: {:?}", e))
        })?;
    }
    Ok(())
}

impl EventChannel for JsEventChannelAdapter {
    fn send(&self, text: String) -> ChannelFuture<'_, ()> {
        let result = self
            .provider
            .send_fn
            .call1(&JsValue::NULL, &JsValue::from_str(&text));

        Box::pin(async move { settle("send", result).await })
    }

    fn close(&self) -> ChannelFuture<'_, ()> {
        let result = self.provider.close_fn.call0(&JsValue::NULL);

        Box::pin(async move { settle("close", result).await })
    }
}
