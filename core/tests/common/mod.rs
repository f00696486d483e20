//! Test doubles and fixtures shared by the integration tests.

#![allow(dead_code)]

use bitcoin::hashes::{Hash, ripemd160, sha256};
use bitcoin::opcodes::all::{OP_CHECKSIG, OP_CHECKSIGVERIFY, OP_CLTV, OP_EQUALVERIFY, OP_HASH160};
use bitcoin::script::Builder;
use bitcoin::taproot::{LeafVersion, TapNodeHash};
use bitcoin::{Address, ScriptBuf};
use lightning_invoice::{Currency, InvoiceBuilder, PaymentSecret};
use lnswap_core::api::{
    ClaimDetailsResponse, CreateSubmarineResponse, SubmitClaimRequest, SwapTree, SwapTreeLeaf,
};
use lnswap_core::claim::{ScriptTree, lockup_script};
use lnswap_core::{ChannelFuture, Error, EventChannel, ServiceFuture, SwapKeyMaterial, SwapService};
use secp256k1_zkp::{Keypair, Secp256k1};
use sha2::{Digest, Sha256};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const LOCKUP_TIMEOUT: i64 = 2_000;

/// A regtest BOLT11 invoice for `payment_hash`.
pub fn invoice(payment_hash: [u8; 32], amount_sats: u64) -> String {
    let secp = bitcoin::secp256k1::Secp256k1::new();
    let node_key = bitcoin::secp256k1::SecretKey::from_slice(&[0x11; 32]).unwrap();

    InvoiceBuilder::new(Currency::Regtest)
        .description("lnswap test".to_string())
        .payment_hash(sha256::Hash::from_byte_array(payment_hash))
        .payment_secret(PaymentSecret([0x22; 32]))
        .current_timestamp()
        .min_final_cltv_expiry_delta(144)
        .amount_milli_satoshis(amount_sats * 1_000)
        .build_signed(|hash| secp.sign_ecdsa_recoverable(hash, &node_key))
        .unwrap()
        .to_string()
}

fn leaf(script: &ScriptBuf) -> SwapTreeLeaf {
    SwapTreeLeaf {
        version: LeafVersion::TapScript.to_consensus(),
        output: hex::encode(script.as_bytes()),
    }
}

/// One swap as the service would create it.
pub struct SwapFixture {
    pub id: String,
    pub service_key: Keypair,
    pub preimage: [u8; 32],
    pub payment_hash: [u8; 32],
    pub invoice: String,
    pub response: CreateSubmarineResponse,
}

impl SwapFixture {
    pub fn merkle_root(&self) -> TapNodeHash {
        ScriptTree::from_wire(&self.response.swap_tree)
            .unwrap()
            .merkle_root()
    }

    pub fn claim_details(
        &self,
        preimage: &[u8],
        pub_nonce: &[u8],
        sighash: &[u8; 32],
    ) -> ClaimDetailsResponse {
        ClaimDetailsResponse {
            preimage: hex::encode(preimage),
            pub_nonce: hex::encode(pub_nonce),
            transaction_hash: hex::encode(sighash),
        }
    }
}

/// Build a swap whose lockup address commits to `keys` and a fresh service key.
pub fn swap_fixture(id: &str, keys: &SwapKeyMaterial) -> SwapFixture {
    let service_key = Keypair::new(&Secp256k1::new(), &mut rand::thread_rng());
    let preimage = [0x5a; 32];
    let payment_hash: [u8; 32] = Sha256::digest(preimage).into();

    let claim = Builder::new()
        .push_opcode(OP_HASH160)
        .push_slice(ripemd160::Hash::hash(&payment_hash).to_byte_array())
        .push_opcode(OP_EQUALVERIFY)
        .push_slice(service_key.x_only_public_key().0.serialize())
        .push_opcode(OP_CHECKSIG)
        .into_script();
    let refund = Builder::new()
        .push_slice(keys.x_only_public_key().serialize())
        .push_opcode(OP_CHECKSIGVERIFY)
        .push_int(LOCKUP_TIMEOUT)
        .push_opcode(OP_CLTV)
        .into_script();
    let swap_tree = SwapTree {
        claim_leaf: leaf(&claim),
        refund_leaf: leaf(&refund),
    };

    let script = lockup_script(
        &ScriptTree::from_wire(&swap_tree).unwrap(),
        &service_key.public_key(),
        &keys.public_key(),
    )
    .unwrap();
    let address = Address::from_script(&script, bitcoin::Network::Regtest)
        .unwrap()
        .to_string();

    let response = CreateSubmarineResponse {
        id: id.to_string(),
        bip21: Some(format!("bitcoin:{address}?amount=0.001")),
        address,
        swap_tree,
        claim_public_key: hex::encode(service_key.public_key().serialize()),
        timeout_block_height: Some(LOCKUP_TIMEOUT as u32),
        expected_amount: Some(100_000),
        accept_zero_conf: Some(false),
    };

    SwapFixture {
        id: id.to_string(),
        service_key,
        preimage,
        payment_hash,
        invoice: invoice(payment_hash, 99_000),
        response,
    }
}

/// In-memory swap service.
#[derive(Default)]
pub struct MockSwapService {
    details: Mutex<Option<ClaimDetailsResponse>>,
    pub detail_calls: AtomicUsize,
    submissions: Mutex<Vec<SubmitClaimRequest>>,
}

impl MockSwapService {
    pub fn with_claim_details(details: ClaimDetailsResponse) -> Self {
        Self {
            details: Mutex::new(Some(details)),
            ..Default::default()
        }
    }

    pub fn submissions(&self) -> Vec<SubmitClaimRequest> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

impl SwapService for MockSwapService {
    fn claim_details(&self, swap_id: &str) -> ServiceFuture<'_, ClaimDetailsResponse> {
        let swap_id = swap_id.to_string();
        Box::pin(async move {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            self.details
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| Error::Service(format!("no claim details for {swap_id}")))
        })
    }

    fn submit_claim(&self, _swap_id: &str, request: &SubmitClaimRequest) -> ServiceFuture<'_, ()> {
        let request = request.clone();
        Box::pin(async move {
            self.submissions.lock().unwrap().push(request);
            Ok(())
        })
    }
}

/// In-memory event channel recording what was sent.
#[derive(Default)]
pub struct InMemoryChannel {
    sent: Mutex<Vec<String>>,
    pub closes: AtomicUsize,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<serde_json::Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|text| serde_json::from_str(text).unwrap())
            .collect()
    }
}

impl EventChannel for InMemoryChannel {
    fn send(&self, text: String) -> ChannelFuture<'_, ()> {
        Box::pin(async move {
            self.sent.lock().unwrap().push(text);
            Ok(())
        })
    }

    fn close(&self) -> ChannelFuture<'_, ()> {
        Box::pin(async move {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

/// A server `update` frame.
pub fn update_frame(id: &str, status: &str) -> lnswap_core::ChannelFrame {
    lnswap_core::ChannelFrame::Text(
        serde_json::json!({"event": "update", "args": [{"id": id, "status": status}]}).to_string(),
    )
}
