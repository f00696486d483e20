//! Lnswap Client SDK - Core Library
//!
//! Platform-agnostic client for swapping between on-chain bitcoin and Lightning through a
//! swap service.
//!
//! This crate provides the amount and fee math for both swap directions, the state machine
//! that drives a submarine swap from creation to the cooperative claim, and the MuSig2
//! signing step in between. The push-event transport is abstracted through the
//! [`EventChannel`] trait so it can be backed by any websocket implementation (browser,
//! tokio, test double).
//!
//! # Example
//!
//! ```rust,ignore
//! use lnswap_core::{Client, ClientConfig, Network};
//!
//! // Create a client with your event channel implementation
//! let client = Client::new(ClientConfig::for_network(Network::Testnet), my_channel);
//!
//! // Quote both directions
//! let mut form = client.trade_form().await?;
//! form.set_send_input("100000");
//!
//! // Create a swap and drive it to the end; feed incoming frames to `client.handle_frame`
//! let session = client.create_submarine_swap(&invoice).await?;
//! let outcome = session.run().await;
//! ```

pub mod amount;
pub mod api;
pub mod claim;
pub mod client;
pub mod error;
pub mod event;
pub mod invoice;
pub mod keys;
pub mod router;
pub mod session;
pub mod trade;
pub mod types;

pub use amount::{MinerFee, SwapQuote};
pub use api::{ApiClient, ServiceFuture, SwapService};
pub use claim::{ClaimPayload, ClaimSigner, ClaimTransactionDetails};
pub use client::Client;
pub use error::{Error, Result};
pub use event::{ChannelFrame, ChannelFuture, EventChannel, ServiceStatus, SwapUpdate};
pub use keys::SwapKeyMaterial;
pub use router::SessionRouter;
pub use session::{SessionInput, SessionView, SwapRecord, SwapSession, SwapStatus};
pub use trade::{Side, TradeForm};
pub use types::{ClientConfig, Direction, Network};
