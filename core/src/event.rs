//! Push-event channel of the swap service.
//!
//! The transport underneath (a websocket in practice) is owned by the host. It hands every
//! frame it receives to the SDK as a [`ChannelFrame`] and lets the SDK write through the
//! [`EventChannel`] trait. Text frames are parsed into typed messages here, at the boundary;
//! nothing loosely typed reaches a session.
//!
//! Wire format:
//! - client → server: `{"op":"subscribe","channel":"swap.update","args":["<id>"]}`
//! - server → client: `{"event":"update","args":[{"id":"<id>","status":"<status>"}]}`

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Channel carrying swap status updates.
pub const SWAP_UPDATE_CHANNEL: &str = "swap.update";

/// Type alias for channel futures.
///
/// On WASM targets, futures don't need to be `Send` since JavaScript is single-threaded.
/// On native targets, futures should be `Send` to allow use with multi-threaded runtimes.
#[cfg(target_arch = "wasm32")]
pub type ChannelFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a>>;

#[cfg(not(target_arch = "wasm32"))]
pub type ChannelFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Write side of the push-event transport.
///
/// Implementations report failures as [`Error::Transport`].
#[cfg(target_arch = "wasm32")]
pub trait EventChannel {
    /// Send one text frame.
    fn send(&self, text: String) -> ChannelFuture<'_, ()>;

    /// Close the connection.
    ///
    /// Closing an already closed channel succeeds.
    fn close(&self) -> ChannelFuture<'_, ()>;
}

#[cfg(not(target_arch = "wasm32"))]
pub trait EventChannel: Send + Sync {
    /// Send one text frame.
    fn send(&self, text: String) -> ChannelFuture<'_, ()>;

    /// Close the connection.
    ///
    /// Closing an already closed channel succeeds.
    fn close(&self) -> ChannelFuture<'_, ()>;
}

/// What the transport delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelFrame {
    /// A text message from the server.
    Text(String),
    /// The connection closed, with the close reason if any.
    Closed(Option<String>),
    /// The transport failed.
    Error(String),
}

/// Control message sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub op: String,
    pub channel: String,
    pub args: Vec<String>,
}

impl ControlMessage {
    pub fn subscribe(swap_id: &str) -> Self {
        Self {
            op: "subscribe".to_string(),
            channel: SWAP_UPDATE_CHANNEL.to_string(),
            args: vec![swap_id.to_string()],
        }
    }

    pub fn unsubscribe(swap_id: &str) -> Self {
        Self {
            op: "unsubscribe".to_string(),
            channel: SWAP_UPDATE_CHANNEL.to_string(),
            args: vec![swap_id.to_string()],
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Swap status string as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceStatus {
    InvoiceSet,
    TransactionMempool,
    TransactionClaimPending,
    TransactionClaimed,
    /// Any status this client does not act on, failure statuses included.
    Other(String),
}

impl ServiceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ServiceStatus::InvoiceSet => "invoice.set",
            ServiceStatus::TransactionMempool => "transaction.mempool",
            ServiceStatus::TransactionClaimPending => "transaction.claim.pending",
            ServiceStatus::TransactionClaimed => "transaction.claimed",
            ServiceStatus::Other(s) => s,
        }
    }
}

impl From<String> for ServiceStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "invoice.set" => ServiceStatus::InvoiceSet,
            "transaction.mempool" => ServiceStatus::TransactionMempool,
            "transaction.claim.pending" => ServiceStatus::TransactionClaimPending,
            "transaction.claimed" => ServiceStatus::TransactionClaimed,
            _ => ServiceStatus::Other(s),
        }
    }
}

impl From<ServiceStatus> for String {
    fn from(status: ServiceStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status update for one swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapUpdate {
    pub id: String,
    pub status: ServiceStatus,
    /// Failure reason some statuses carry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Typed server message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Status updates, possibly for several swaps.
    Update(Vec<SwapUpdate>),
    /// Subscription acks, pongs and anything else not carrying updates.
    Other(String),
}

#[derive(Deserialize)]
struct RawServerMessage {
    event: String,
    #[serde(default)]
    args: Vec<serde_json::Value>,
}

/// Parse a text frame.
///
/// Malformed JSON, or an `update` whose arguments are not swap updates, is a
/// [`Error::Protocol`].
pub fn parse_server_message(text: &str) -> Result<ServerMessage> {
    let raw: RawServerMessage = serde_json::from_str(text)
        .map_err(|e| Error::Protocol(format!("Unparseable message: {e}")))?;

    if raw.event != "update" {
        return Ok(ServerMessage::Other(raw.event));
    }

    let updates = raw
        .args
        .into_iter()
        .map(serde_json::from_value::<SwapUpdate>)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Protocol(format!("Malformed swap update: {e}")))?;

    Ok(ServerMessage::Update(updates))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_message_shape() {
        let json = ControlMessage::subscribe("abc123").to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"op": "subscribe", "channel": "swap.update", "args": ["abc123"]})
        );
    }

    #[test]
    fn test_parse_update() {
        let message = parse_server_message(
            r#"{"event":"update","args":[{"id":"abc","status":"transaction.mempool"}]}"#,
        )
        .unwrap();
        assert_eq!(
            message,
            ServerMessage::Update(vec![SwapUpdate {
                id: "abc".to_string(),
                status: ServiceStatus::TransactionMempool,
                error: None,
            }])
        );
    }

    #[test]
    fn test_unknown_status_is_kept_verbatim() {
        let message = parse_server_message(
            r#"{"event":"update","args":[{"id":"abc","status":"transaction.confirmed"}]}"#,
        )
        .unwrap();
        let ServerMessage::Update(updates) = message else {
            panic!("expected update");
        };
        assert_eq!(
            updates[0].status,
            ServiceStatus::Other("transaction.confirmed".to_string())
        );
        assert_eq!(updates[0].status.as_str(), "transaction.confirmed");
    }

    #[test]
    fn test_non_update_events_are_other() {
        let message =
            parse_server_message(r#"{"event":"subscribe","channel":"swap.update","args":["abc"]}"#)
                .unwrap();
        assert_eq!(message, ServerMessage::Other("subscribe".to_string()));
    }

    #[test]
    fn test_garbage_is_protocol_error() {
        assert!(matches!(
            parse_server_message("not json"),
            Err(Error::Protocol(_))
        ));
        assert!(matches!(
            parse_server_message(r#"{"event":"update","args":[{"status":"invoice.set"}]}"#),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn test_failure_statuses_are_not_acted_on() {
        for raw in ["swap.expired", "invoice.failedToPay", "transaction.lockupFailed"] {
            let status = ServiceStatus::from(raw.to_string());
            assert_eq!(status, ServiceStatus::Other(raw.to_string()));
            assert_eq!(status.as_str(), raw);
        }
    }
}
