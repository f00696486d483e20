use crate::CreatedSwap;
use crate::JsEventChannelAdapter;
use crate::JsEventChannelProvider;
use crate::Quote;
use crate::SwapDirection;
use crate::to_js_error;
use crate::to_js_value;
use futures::StreamExt;
use js_sys::Function;
use lnswap_core::{ChannelFrame, ClientConfig};
use rust_decimal::prelude::ToPrimitive;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::wasm_bindgen;

/// Two-sided amount form: edit either side, the other follows.
#[wasm_bindgen]
pub struct TradeForm {
    inner: lnswap_core::TradeForm,
}

#[wasm_bindgen]
impl TradeForm {
    /// A form without quotes; all fees and limits are zero until quotes are loaded.
    #[wasm_bindgen(constructor)]
    pub fn new() -> TradeForm {
        TradeForm {
            inner: lnswap_core::TradeForm::unquoted(),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn direction(&self) -> String {
        self.inner.direction().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn send(&self) -> u64 {
        self.inner.send()
    }

    #[wasm_bindgen(getter)]
    pub fn receive(&self) -> u64 {
        self.inner.receive()
    }

    #[wasm_bindgen(getter, js_name = "serviceFee")]
    pub fn service_fee(&self) -> u64 {
        self.inner.service_fee()
    }

    #[wasm_bindgen(getter, js_name = "networkFee")]
    pub fn network_fee(&self) -> u64 {
        self.inner.network_fee()
    }

    #[wasm_bindgen(getter, js_name = "feePercent")]
    pub fn fee_percent(&self) -> f64 {
        self.inner.fee_percent().to_f64().unwrap_or_default()
    }

    #[wasm_bindgen(getter, js_name = "minSend")]
    pub fn min_send(&self) -> u64 {
        self.inner.min_send()
    }

    #[wasm_bindgen(getter, js_name = "maxSend")]
    pub fn max_send(&self) -> u64 {
        self.inner.max_send()
    }

    /// The quote of the current direction.
    pub fn quote(&self) -> Quote {
        self.inner.quote().into()
    }

    #[wasm_bindgen(js_name = "setSendInput")]
    pub fn set_send_input(&mut self, input: &str) {
        self.inner.set_send_input(input);
    }

    #[wasm_bindgen(js_name = "setReceiveInput")]
    pub fn set_receive_input(&mut self, input: &str) {
        self.inner.set_receive_input(input);
    }

    #[wasm_bindgen(js_name = "toggleDirection")]
    pub fn toggle_direction(&mut self) {
        self.inner.toggle_direction();
    }

    #[wasm_bindgen(js_name = "sendError")]
    pub fn send_error(&self) -> bool {
        self.inner.send_error()
    }

    #[wasm_bindgen(js_name = "receiveError")]
    pub fn receive_error(&self) -> bool {
        self.inner.receive_error()
    }

    #[wasm_bindgen(js_name = "hasError")]
    pub fn has_error(&self) -> bool {
        self.inner.has_error()
    }

    /// The send amount to submit; throws if the form is not submittable.
    pub fn validate(&self) -> Result<u64, JsValue> {
        self.inner.validate().map_err(to_js_error)
    }
}

impl Default for TradeForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Lnswap client.
#[wasm_bindgen]
pub struct Client {
    inner: lnswap_core::Client<JsEventChannelAdapter>,
}

#[wasm_bindgen]
impl Client {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `network` - The Bitcoin network ("bitcoin", "testnet" or "regtest")
    /// * `api_url` - Swap service API URL; the network's default if absent
    /// * `channel` - Callbacks writing to the websocket at `wsUrl`
    #[wasm_bindgen(constructor)]
    pub fn new(
        network: String,
        api_url: Option<String>,
        channel: JsEventChannelProvider,
    ) -> Result<Client, JsValue> {
        let network = network.parse().map_err(to_js_error)?;
        let config = match api_url {
            Some(url) => ClientConfig::with_api_url(url, network),
            None => ClientConfig::for_network(network),
        };

        Ok(Client {
            inner: lnswap_core::Client::new(config, JsEventChannelAdapter::new(channel)),
        })
    }

    /// Websocket URL the channel should be connected to.
    #[wasm_bindgen(getter, js_name = "wsUrl")]
    pub fn ws_url(&self) -> String {
        self.inner.config().ws_url.clone()
    }

    /// Get the fees and limits of one direction.
    #[wasm_bindgen(js_name = "getQuote")]
    pub async fn get_quote(&self, direction: SwapDirection) -> Result<Quote, JsValue> {
        let quote = self
            .inner
            .get_quote(direction.into())
            .await
            .map_err(to_js_error)?;

        Ok((&quote).into())
    }

    /// A trade form loaded with both quotes.
    #[wasm_bindgen(js_name = "tradeForm")]
    pub async fn trade_form(&self) -> Result<TradeForm, JsValue> {
        let inner = self.inner.trade_form().await.map_err(to_js_error)?;

        Ok(TradeForm { inner })
    }

    /// Create a submarine swap paying `invoice` and start following it.
    ///
    /// `on_update` is called with a plain object snapshot on creation and after every
    /// status change, until the swap is claimed or failed.
    #[wasm_bindgen(js_name = "createSubmarineSwap")]
    pub async fn create_submarine_swap(
        &self,
        invoice: String,
        on_update: Function,
    ) -> Result<CreatedSwap, JsValue> {
        let mut session = self
            .inner
            .create_submarine_swap(&invoice)
            .await
            .map_err(to_js_error)?;

        let created = CreatedSwap::from(session.record());
        let mut views = session.watch();

        wasm_bindgen_futures::spawn_local(async move {
            while let Some(view) = views.next().await {
                let result = to_js_value(&view)
                    .and_then(|value| on_update.call1(&JsValue::NULL, &value));
                if let Err(e) = result {
                    log::warn!("Swap update callback failed: {:?}", e);
                }
            }
        });

        wasm_bindgen_futures::spawn_local(async move {
            let outcome = session.run().await;
            log::info!("Swap {} finished as {}", outcome.id, outcome.status);
        });

        Ok(created)
    }

    /// Forward a websocket message. Returns the number of swaps it reached.
    #[wasm_bindgen(js_name = "handleMessage")]
    pub fn handle_message(&self, text: String) -> usize {
        self.inner.handle_frame(ChannelFrame::Text(text))
    }

    /// The websocket closed.
    #[wasm_bindgen(js_name = "handleClose")]
    pub fn handle_close(&self, reason: Option<String>) {
        self.inner.handle_frame(ChannelFrame::Closed(reason));
    }

    /// The websocket failed.
    #[wasm_bindgen(js_name = "handleError")]
    pub fn handle_error(&self, message: String) {
        self.inner.handle_frame(ChannelFrame::Error(message));
    }

    #[wasm_bindgen(js_name = "activeSwaps")]
    pub fn active_swaps(&self) -> usize {
        self.inner.active_sessions()
    }

    /// Close the websocket; swaps still running fail.
    pub async fn close(&self) -> Result<(), JsValue> {
        crate::map_err_to_js!(self.inner.close().await)
    }
}
