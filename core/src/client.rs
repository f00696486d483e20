use crate::amount::SwapQuote;
use crate::event::{ChannelFrame, EventChannel};
use crate::invoice;
use crate::keys::SwapKeyMaterial;
use crate::router::SessionRouter;
use crate::session::{SwapRecord, SwapSession};
use crate::trade::TradeForm;
use crate::types::{ClientConfig, Direction, Network};
use crate::{ApiClient, Error};
use std::sync::{Arc, Mutex, MutexGuard};

/// The main client for swapping with the service.
///
/// The client is parameterized by the event channel `C` the host provides. It owns one
/// connection's worth of routing: every frame the host receives goes through
/// [`Client::handle_frame`] and reaches the session of the swap it names.
pub struct Client<C: EventChannel> {
    api_client: Arc<ApiClient>,
    channel: Arc<C>,
    config: ClientConfig,
    router: Mutex<SessionRouter>,
}

impl<C: EventChannel> Client<C> {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `config` - Service endpoints and network
    /// * `channel` - Event channel connected to `config.ws_url`
    pub fn new(config: ClientConfig, channel: C) -> Self {
        let api_client = Arc::new(ApiClient::new(config.api_url.clone()));

        Self {
            api_client,
            channel: Arc::new(channel),
            config,
            router: Mutex::new(SessionRouter::new()),
        }
    }

    pub fn api_client(&self) -> &ApiClient {
        &self.api_client
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn network(&self) -> Network {
        self.config.network
    }

    pub async fn get_quote(&self, direction: Direction) -> crate::Result<SwapQuote> {
        let quote = self.api_client.get_quote(direction).await?;
        Ok(quote)
    }

    /// Fetch the submarine and reverse quotes.
    pub async fn get_quotes(&self) -> crate::Result<(SwapQuote, SwapQuote)> {
        futures::try_join!(
            self.get_quote(Direction::Submarine),
            self.get_quote(Direction::Reverse)
        )
    }

    /// A trade form loaded with fresh quotes.
    pub async fn trade_form(&self) -> crate::Result<TradeForm> {
        let (submarine, reverse) = self.get_quotes().await?;
        Ok(TradeForm::new(submarine, reverse))
    }

    /// Create a submarine swap paying `invoice` and return its session.
    ///
    /// The session is registered for routing but not yet subscribed; drive it with
    /// [`SwapSession::run`].
    pub async fn create_submarine_swap(
        &self,
        invoice: &str,
    ) -> crate::Result<SwapSession<ApiClient, C>> {
        invoice::payment_hash(invoice)
            .map_err(|e| Error::InputValidation(format!("Invalid invoice: {e}")))?;

        let keys = SwapKeyMaterial::generate();
        let response = self
            .api_client
            .create_submarine_swap(invoice, &keys.public_key_hex())
            .await?;

        let record = SwapRecord::new(invoice, keys, response)?;
        let inbox = self.router().register(record.id());
        log::info!(
            "Created submarine swap {} with lockup address {}",
            record.id(),
            record.address()
        );

        Ok(SwapSession::new(
            record,
            self.config.network,
            self.api_client.clone(),
            self.channel.clone(),
            inbox,
        ))
    }

    /// Route one frame from the event channel. Returns the number of sessions reached.
    pub fn handle_frame(&self, frame: ChannelFrame) -> usize {
        self.router().dispatch(frame)
    }

    /// Number of swaps whose session is still running.
    pub fn active_sessions(&self) -> usize {
        self.router().len()
    }

    /// Close the event channel. Sessions still running fail.
    pub async fn close(&self) -> crate::Result<()> {
        self.channel.close().await?;
        self.handle_frame(ChannelFrame::Closed(Some("closed by client".to_string())));
        Ok(())
    }

    fn router(&self) -> MutexGuard<'_, SessionRouter> {
        self.router.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::memory::MemoryChannel;
    use std::sync::atomic::Ordering;

    fn client() -> Client<MemoryChannel> {
        // nothing listens here; tests must not reach the network
        let config = ClientConfig::with_api_url("http://127.0.0.1:9", Network::Regtest);
        Client::new(config, MemoryChannel::new())
    }

    #[tokio::test]
    async fn test_invalid_invoice_fails_before_any_call() {
        let client = client();
        let result = client.create_submarine_swap("not an invoice").await;
        assert!(matches!(result, Err(Error::InputValidation(_))));
        assert_eq!(client.active_sessions(), 0);
    }

    #[test]
    fn test_finished_sessions_are_not_active() {
        let client = client();
        let first = client.router().register("swap1");
        let second = client.router().register("swap2");
        assert_eq!(client.active_sessions(), 2);

        // a session drops its inbox when it ends
        drop(first);
        assert_eq!(client.active_sessions(), 1);
        drop(second);
        assert_eq!(client.active_sessions(), 0);
        assert_eq!(client.handle_frame(ChannelFrame::Closed(None)), 0);
    }

    #[tokio::test]
    async fn test_close_closes_channel() {
        let client = client();
        client.close().await.unwrap();
        client.close().await.unwrap();
        assert_eq!(client.channel.closes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_config_is_kept() {
        let client = client();
        assert_eq!(client.network(), Network::Regtest);
        assert_eq!(client.api_client().base_url(), "http://127.0.0.1:9");
        assert_eq!(client.config().ws_url, "ws://127.0.0.1:9/ws");
    }
}
