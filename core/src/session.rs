//! Per-swap session state machine.
//!
//! A [`SwapSession`] owns the [`SwapRecord`] of exactly one submarine swap and is the only
//! place its status changes. Inputs arrive through a single-consumer inbox and are handled
//! one at a time, so a claim in flight finishes (or fails) before the next event is looked
//! at.
//!
//! ```text
//! Created → InvoiceSet → MempoolSeen → ClaimPending → Claimed
//!    └───────────┴────────────┴─────────────┴────────→ Failed
//! ```
//!
//! Statuses may skip ahead; they never move back. `transaction.claimed` is only accepted
//! while a claim is pending. Failure statuses reported by the service are logged, not acted
//! on.

use crate::api::{CreateSubmarineResponse, SwapService, SwapTree};
use crate::claim::{ClaimSigner, ClaimTransactionDetails};
use crate::error::{Error, Result};
use crate::event::{ControlMessage, EventChannel, ServiceStatus, SwapUpdate};
use crate::invoice;
use crate::keys::SwapKeyMaterial;
use crate::types::{Direction, Network};
use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Client-side status of a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SwapStatus {
    Created,
    InvoiceSet,
    MempoolSeen,
    ClaimPending,
    Claimed,
    Failed,
}

impl SwapStatus {
    fn rank(self) -> u8 {
        match self {
            SwapStatus::Created => 0,
            SwapStatus::InvoiceSet => 1,
            SwapStatus::MempoolSeen => 2,
            SwapStatus::ClaimPending => 3,
            SwapStatus::Claimed => 4,
            SwapStatus::Failed => 5,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SwapStatus::Claimed | SwapStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SwapStatus::Created => "created",
            SwapStatus::InvoiceSet => "invoiceSet",
            SwapStatus::MempoolSeen => "mempoolSeen",
            SwapStatus::ClaimPending => "claimPending",
            SwapStatus::Claimed => "claimed",
            SwapStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything known about one swap.
///
/// Held only in memory. The status can only be changed by the owning session.
#[derive(Debug)]
pub struct SwapRecord {
    id: String,
    direction: Direction,
    invoice: String,
    payment_hash: [u8; 32],
    status: SwapStatus,
    keys: SwapKeyMaterial,
    address: String,
    bip21: Option<String>,
    expected_amount: Option<u64>,
    timeout_block_height: Option<u32>,
    swap_tree: SwapTree,
    claim_public_key: String,
}

impl SwapRecord {
    /// Build the record of a freshly created submarine swap.
    ///
    /// # Arguments
    /// * `invoice` - The invoice the swap pays
    /// * `keys` - The keypair whose public half was sent on creation
    /// * `response` - The service's creation response
    pub fn new(
        invoice: &str,
        keys: SwapKeyMaterial,
        response: CreateSubmarineResponse,
    ) -> Result<Self> {
        let payment_hash = invoice::payment_hash(invoice)
            .map_err(|e| Error::InputValidation(format!("Invalid invoice: {e}")))?;

        Ok(Self {
            id: response.id,
            direction: Direction::Submarine,
            invoice: invoice.trim().to_string(),
            payment_hash,
            status: SwapStatus::Created,
            keys,
            address: response.address,
            bip21: response.bip21,
            expected_amount: response.expected_amount,
            timeout_block_height: response.timeout_block_height,
            swap_tree: response.swap_tree,
            claim_public_key: response.claim_public_key,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn invoice(&self) -> &str {
        &self.invoice
    }

    pub fn payment_hash(&self) -> &[u8; 32] {
        &self.payment_hash
    }

    pub fn status(&self) -> SwapStatus {
        self.status
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn bip21(&self) -> Option<&str> {
        self.bip21.as_deref()
    }

    pub fn expected_amount(&self) -> Option<u64> {
        self.expected_amount
    }

    pub fn timeout_block_height(&self) -> Option<u32> {
        self.timeout_block_height
    }

    pub fn public_key_hex(&self) -> String {
        self.keys.public_key_hex()
    }
}

/// Input to a session's inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    Update(SwapUpdate),
    /// The event channel closed.
    Closed(Option<String>),
    /// The event channel failed.
    Error(String),
}

/// Snapshot of a session for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub status: SwapStatus,
    #[serde(with = "crate::types::hex_bytes")]
    pub payment_hash: Vec<u8>,
    /// Last status string the service reported, verbatim.
    pub service_status: Option<String>,
    pub address: String,
    pub bip21: Option<String>,
    pub expected_amount: Option<u64>,
    pub timeout_block_height: Option<u32>,
    pub error: Option<String>,
    /// Whether the caller should show the payment request to the user.
    pub show_payment_instructions: bool,
}

/// Drives one swap from creation to a terminal status.
pub struct SwapSession<S: SwapService + ?Sized, C: EventChannel + ?Sized> {
    record: SwapRecord,
    network: Network,
    service: Arc<S>,
    channel: Arc<C>,
    inbox: UnboundedReceiver<SessionInput>,
    service_status: Option<ServiceStatus>,
    error: Option<String>,
    subscribed: bool,
    channel_down: bool,
    closed: bool,
    watchers: Vec<UnboundedSender<SessionView>>,
}

impl<S: SwapService + ?Sized, C: EventChannel + ?Sized> SwapSession<S, C> {
    /// # Arguments
    /// * `record` - The swap, in status `Created`
    /// * `network` - Network the lockup address must belong to
    /// * `service` - Where claim details are fetched from and signatures go to
    /// * `channel` - Event channel to subscribe on
    /// * `inbox` - Receiving end of this session's inputs
    pub fn new(
        record: SwapRecord,
        network: Network,
        service: Arc<S>,
        channel: Arc<C>,
        inbox: UnboundedReceiver<SessionInput>,
    ) -> Self {
        Self {
            record,
            network,
            service,
            channel,
            inbox,
            service_status: None,
            error: None,
            subscribed: false,
            channel_down: false,
            closed: false,
            watchers: Vec::new(),
        }
    }

    pub fn record(&self) -> &SwapRecord {
        &self.record
    }

    pub fn status(&self) -> SwapStatus {
        self.record.status
    }

    /// Receive a snapshot now and after every status change.
    pub fn watch(&mut self) -> UnboundedReceiver<SessionView> {
        let (tx, rx) = mpsc::unbounded();
        // receiver is alive, the send cannot fail
        let _ = tx.unbounded_send(self.view());
        self.watchers.push(tx);
        rx
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.record.id.clone(),
            status: self.record.status,
            payment_hash: self.record.payment_hash.to_vec(),
            service_status: self.service_status.as_ref().map(|s| s.to_string()),
            address: self.record.address.clone(),
            bip21: self.record.bip21.clone(),
            expected_amount: self.record.expected_amount,
            timeout_block_height: self.record.timeout_block_height,
            error: self.error.clone(),
            show_payment_instructions: self.record.status == SwapStatus::InvoiceSet,
        }
    }

    /// Subscribe to this swap's updates.
    ///
    /// A failed subscription fails the session.
    pub async fn open(&mut self) -> Result<()> {
        if self.subscribed {
            return Ok(());
        }

        let message = ControlMessage::subscribe(&self.record.id).to_json()?;
        match self.channel.send(message).await {
            Ok(()) => {
                self.subscribed = true;
                log::info!("Subscribed to updates of swap {}", self.record.id);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.channel_down = true;
                self.fail(Error::Transport(message.clone()));
                Err(Error::Transport(message))
            }
        }
    }

    /// Subscribe, then handle inputs until the swap is terminal.
    pub async fn run(mut self) -> SessionView {
        if let Err(e) = self.open().await {
            log::error!("Swap {} could not subscribe: {e}", self.record.id);
            return self.view();
        }

        while !self.record.status.is_terminal() {
            match self.inbox.next().await {
                Some(input) => self.handle(input).await,
                None => {
                    self.channel_down = true;
                    self.fail(Error::Transport("Event channel closed".to_string()));
                }
            }
        }

        self.close_subscription().await;
        self.view()
    }

    /// Handle one input.
    pub async fn handle(&mut self, input: SessionInput) {
        match input {
            SessionInput::Update(update) => self.apply(update).await,
            SessionInput::Closed(reason) => {
                self.channel_down = true;
                if !self.record.status.is_terminal() {
                    let reason = reason.map(|r| format!(": {r}")).unwrap_or_default();
                    self.fail(Error::Transport(format!("Event channel closed{reason}")));
                }
            }
            SessionInput::Error(e) => {
                self.channel_down = true;
                if !self.record.status.is_terminal() {
                    self.fail(Error::Transport(e));
                }
            }
        }

        if self.record.status.is_terminal() {
            self.close_subscription().await;
        }
    }

    async fn apply(&mut self, update: SwapUpdate) {
        if update.id != self.record.id {
            log::debug!(
                "Swap {} ignoring update for swap {}",
                self.record.id,
                update.id
            );
            return;
        }

        if self.record.status.is_terminal() {
            log::debug!(
                "Swap {} is {}, ignoring {}",
                self.record.id,
                self.record.status,
                update.status
            );
            return;
        }

        let Some(next) = self.transition(&update) else {
            return;
        };
        log::info!(
            "Swap {}: {} ({} → {next})",
            self.record.id,
            update.status,
            self.record.status
        );
        self.service_status = Some(update.status.clone());

        match next {
            SwapStatus::ClaimPending => {
                self.set_status(SwapStatus::ClaimPending);
                match self.cooperate_on_claim().await {
                    Ok(()) => log::info!("Swap {}: claim signature submitted", self.record.id),
                    Err(e) => self.fail(e),
                }
            }
            other => self.set_status(other),
        }
    }

    /// Target status for `update`, or `None` if it must be ignored.
    ///
    /// Any status strictly ahead of the current one is expected, so the service may skip
    /// intermediate statuses (a zero-conf lockup goes straight to `transaction.claim.pending`).
    /// Statuses at or behind the current one, and statuses this client does not act on, are
    /// logged and ignored.
    fn transition(&self, update: &SwapUpdate) -> Option<SwapStatus> {
        let current = self.record.status;
        let status = &update.status;
        let target = match status {
            ServiceStatus::InvoiceSet => SwapStatus::InvoiceSet,
            ServiceStatus::TransactionMempool => SwapStatus::MempoolSeen,
            ServiceStatus::TransactionClaimPending => SwapStatus::ClaimPending,
            ServiceStatus::TransactionClaimed => {
                if current != SwapStatus::ClaimPending {
                    log::warn!(
                        "{}",
                        Error::Protocol(format!(
                            "Swap {} reported claimed while {current}",
                            self.record.id
                        ))
                    );
                    return None;
                }
                SwapStatus::Claimed
            }
            ServiceStatus::Other(other) => {
                let detail = update
                    .error
                    .as_deref()
                    .map(|e| format!(" ({e})"))
                    .unwrap_or_default();
                log::warn!(
                    "{}",
                    Error::Protocol(format!(
                        "Swap {} got unhandled status {other}{detail}",
                        self.record.id
                    ))
                );
                return None;
            }
        };

        if target == current {
            log::debug!("Swap {}: duplicate {status}", self.record.id);
            return None;
        }
        if target.rank() < current.rank() {
            log::warn!(
                "{}",
                Error::Protocol(format!(
                    "Swap {} got {status} while {current}",
                    self.record.id
                ))
            );
            return None;
        }
        Some(target)
    }

    async fn cooperate_on_claim(&self) -> Result<()> {
        let response = self.service.claim_details(&self.record.id).await?;
        let details = ClaimTransactionDetails::from_response(
            &response,
            &self.record.swap_tree,
            &self.record.claim_public_key,
        )?;

        if !invoice::validate(&self.record.invoice, &details.preimage) {
            return Err(Error::CryptoValidation(
                "Preimage does not match the invoice's payment hash".to_string(),
            ));
        }

        let payload = {
            let signer = ClaimSigner::new(
                &self.record.keys,
                &self.record.address,
                self.network,
                self.record.payment_hash,
            )?;
            signer.sign(&details)?
        };

        self.service
            .submit_claim(&self.record.id, &payload.to_request())
            .await
    }

    fn fail(&mut self, error: Error) {
        log::error!("Swap {} failed: {error}", self.record.id);
        self.error = Some(error.to_string());
        self.set_status(SwapStatus::Failed);
    }

    fn set_status(&mut self, status: SwapStatus) {
        self.record.status = status;
        let view = self.view();
        self.watchers
            .retain(|watcher| watcher.unbounded_send(view.clone()).is_ok());
    }

    /// Drop this swap's subscription. Calling it again does nothing.
    async fn close_subscription(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if !self.subscribed || self.channel_down {
            return;
        }
        let message = match ControlMessage::unsubscribe(&self.record.id).to_json() {
            Ok(message) => message,
            Err(e) => {
                log::warn!("Swap {}: {e}", self.record.id);
                return;
            }
        };
        if let Err(e) = self.channel.send(message).await {
            log::warn!("Swap {}: failed to unsubscribe: {e}", self.record.id);
        }
    }
}
