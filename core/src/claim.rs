//! Cooperative claim signing.
//!
//! Once the service proved it paid the user's invoice, the user co-signs the service's claim
//! of the lockup output. Both keys are aggregated with MuSig2, the aggregate is tweaked with
//! the Merkle root of the lockup's script tree, and this side contributes a public nonce and
//! a partial signature. Aggregating the final signature and broadcasting is the service's job.
//!
//! Signing is split in two phases. [`ClaimSigner::prepare`] decodes and checks every input
//! without touching randomness; only a [`PreparedClaim`] can generate a nonce, and it is
//! consumed by doing so.

use crate::api::{ClaimDetailsResponse, SubmitClaimRequest, SwapTree, SwapTreeLeaf};
use crate::error::{Error, Result};
use crate::keys::SwapKeyMaterial;
use crate::types::Network;
use bitcoin::hashes::{Hash, ripemd160};
use bitcoin::key::TweakedPublicKey;
use bitcoin::taproot::{LeafVersion, TapLeafHash, TapNodeHash, TapTweakHash};
use bitcoin::{Address, ScriptBuf};
use secp256k1_zkp::{
    All, Message, MusigAggNonce, MusigKeyAggCache, MusigPubNonce, MusigSession, MusigSessionId,
    PublicKey, Secp256k1, SecretKey, Verification, XOnlyPublicKey,
};
use std::str::FromStr;

const PUB_NONCE_LEN: usize = 66;
const SIGHASH_LEN: usize = 32;

/// Everything the service hands us for one claim attempt.
#[derive(Debug, Clone)]
pub struct ClaimTransactionDetails {
    pub preimage: Vec<u8>,
    pub pub_nonce: Vec<u8>,
    pub transaction_hash: Vec<u8>,
    pub swap_tree: SwapTree,
    pub claim_public_key: Vec<u8>,
}

impl ClaimTransactionDetails {
    /// Combine the claim endpoint's response with what the swap was created with.
    pub fn from_response(
        response: &ClaimDetailsResponse,
        swap_tree: &SwapTree,
        claim_public_key: &str,
    ) -> Result<Self> {
        Ok(Self {
            preimage: decode_hex("preimage", &response.preimage)?,
            pub_nonce: decode_hex("public nonce", &response.pub_nonce)?,
            transaction_hash: decode_hex("transaction hash", &response.transaction_hash)?,
            swap_tree: swap_tree.clone(),
            claim_public_key: decode_hex("claim public key", claim_public_key)?,
        })
    }
}

/// Our nonce and partial signature, submitted once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimPayload {
    pub pub_nonce: Vec<u8>,
    pub partial_signature: Vec<u8>,
}

impl ClaimPayload {
    pub fn to_request(&self) -> SubmitClaimRequest {
        SubmitClaimRequest {
            pub_nonce: hex::encode(&self.pub_nonce),
            partial_signature: hex::encode(&self.partial_signature),
        }
    }
}

/// Decoded two-leaf script tree of a lockup output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTree {
    pub claim: ScriptBuf,
    pub claim_version: LeafVersion,
    pub refund: ScriptBuf,
    pub refund_version: LeafVersion,
}

impl ScriptTree {
    pub fn from_wire(tree: &SwapTree) -> Result<Self> {
        let (claim, claim_version) = decode_leaf("claim", &tree.claim_leaf)?;
        let (refund, refund_version) = decode_leaf("refund", &tree.refund_leaf)?;
        Ok(Self {
            claim,
            claim_version,
            refund,
            refund_version,
        })
    }

    /// Root of the tree; both leaves sit at depth one.
    pub fn merkle_root(&self) -> TapNodeHash {
        let claim = TapLeafHash::from_script(&self.claim, self.claim_version);
        let refund = TapLeafHash::from_script(&self.refund, self.refund_version);
        TapNodeHash::from_node_hashes(claim.into(), refund.into())
    }
}

/// Aggregate `[service, own]` and apply the Taproot tweak for `merkle_root`.
///
/// Returns the tweaked cache and the x-only output key it commits to.
pub fn tweaked_key_agg_cache<C: Verification>(
    secp: &Secp256k1<C>,
    service_key: &PublicKey,
    own_key: &PublicKey,
    merkle_root: TapNodeHash,
) -> Result<(MusigKeyAggCache, XOnlyPublicKey)> {
    let mut cache = MusigKeyAggCache::new(secp, &[*service_key, *own_key]);

    let tweak = TapTweakHash::from_key_and_tweak(cache.agg_pk(), Some(merkle_root));
    let tweak = SecretKey::from_slice(tweak.as_byte_array())
        .map_err(|e| Error::CryptoValidation(format!("Taproot tweak out of range: {e}")))?;

    let output_key = cache
        .pubkey_xonly_tweak_add(secp, tweak)
        .map_err(|e| Error::CryptoValidation(format!("Failed to tweak aggregate key: {e:?}")))?;

    Ok((cache, output_key.x_only_public_key().0))
}

/// Script pubkey of the lockup output spendable by `[service, own]` under `tree`.
pub fn lockup_script(
    tree: &ScriptTree,
    service_key: &PublicKey,
    own_key: &PublicKey,
) -> Result<ScriptBuf> {
    let secp = Secp256k1::verification_only();
    let (_, output_key) = tweaked_key_agg_cache(&secp, service_key, own_key, tree.merkle_root())?;
    Ok(ScriptBuf::new_p2tr_tweaked(
        TweakedPublicKey::dangerous_assume_tweaked(output_key),
    ))
}

/// Produces this side's half of the claim signature for one swap.
pub struct ClaimSigner<'a> {
    secp: Secp256k1<All>,
    keys: &'a SwapKeyMaterial,
    lockup_script: ScriptBuf,
    payment_hash: [u8; 32],
}

impl<'a> ClaimSigner<'a> {
    /// # Arguments
    /// * `keys` - The session's own keypair
    /// * `lockup_address` - Lockup address returned when the swap was created
    /// * `network` - Network the lockup address must belong to
    /// * `payment_hash` - Payment hash of the invoice the service pays
    pub fn new(
        keys: &'a SwapKeyMaterial,
        lockup_address: &str,
        network: Network,
        payment_hash: [u8; 32],
    ) -> Result<Self> {
        let lockup_script = Address::from_str(lockup_address)
            .map_err(|e| Error::CryptoValidation(format!("Invalid lockup address: {e}")))?
            .require_network(network.to_bitcoin_network())
            .map_err(|e| Error::CryptoValidation(format!("Lockup address: {e}")))?
            .script_pubkey();

        Ok(Self {
            secp: Secp256k1::new(),
            keys,
            lockup_script,
            payment_hash,
        })
    }

    /// Validate every input of a claim attempt. No nonce is generated here.
    pub fn prepare(&self, details: &ClaimTransactionDetails) -> Result<PreparedClaim<'a>> {
        let service_key = PublicKey::from_slice(&details.claim_public_key)
            .map_err(|e| Error::CryptoValidation(format!("Invalid claim public key: {e}")))?;
        let own_key = self.keys.public_key();

        let tree = ScriptTree::from_wire(&details.swap_tree)?;
        self.check_leaves(&tree, &service_key)?;

        if details.pub_nonce.len() != PUB_NONCE_LEN {
            return Err(Error::CryptoValidation(format!(
                "Public nonce must be {PUB_NONCE_LEN} bytes, got {}",
                details.pub_nonce.len()
            )));
        }
        let service_nonce = MusigPubNonce::from_slice(&details.pub_nonce)
            .map_err(|e| Error::CryptoValidation(format!("Invalid public nonce: {e:?}")))?;

        let sighash: [u8; SIGHASH_LEN] =
            details.transaction_hash.as_slice().try_into().map_err(|_| {
                Error::CryptoValidation(format!(
                    "Transaction hash must be {SIGHASH_LEN} bytes, got {}",
                    details.transaction_hash.len()
                ))
            })?;

        let (key_agg_cache, output_key) =
            tweaked_key_agg_cache(&self.secp, &service_key, &own_key, tree.merkle_root())?;
        if !commits_to_output_key(&self.lockup_script, &output_key) {
            return Err(Error::CryptoValidation(
                "Script tree and keys do not match the lockup address".to_string(),
            ));
        }

        Ok(PreparedClaim {
            secp: self.secp.clone(),
            keys: self.keys,
            key_agg_cache,
            service_nonce,
            message: Message::from_digest(sighash),
        })
    }

    /// Validate, then sign.
    pub fn sign(&self, details: &ClaimTransactionDetails) -> Result<ClaimPayload> {
        self.prepare(details)?.sign()
    }

    fn check_leaves(&self, tree: &ScriptTree, service_key: &PublicKey) -> Result<()> {
        let own = self.keys.x_only_public_key().serialize();
        if !contains(tree.refund.as_bytes(), &own) {
            return Err(Error::CryptoValidation(
                "Refund leaf does not commit to our key".to_string(),
            ));
        }

        let service = service_key.x_only_public_key().0.serialize();
        let hash_lock = ripemd160::Hash::hash(&self.payment_hash).to_byte_array();
        let claim = tree.claim.as_bytes();
        if !contains(claim, &service) || !contains(claim, &hash_lock) {
            return Err(Error::CryptoValidation(
                "Claim leaf does not commit to the service key and payment hash".to_string(),
            ));
        }
        Ok(())
    }
}

/// A fully validated claim, ready to be signed exactly once.
pub struct PreparedClaim<'a> {
    secp: Secp256k1<All>,
    keys: &'a SwapKeyMaterial,
    key_agg_cache: MusigKeyAggCache,
    service_nonce: MusigPubNonce,
    message: Message,
}

impl PreparedClaim<'_> {
    /// Generate a fresh nonce and produce our partial signature.
    pub fn sign(self) -> Result<ClaimPayload> {
        let session_id = MusigSessionId::new(&mut rand::thread_rng());

        let (sec_nonce, pub_nonce) = self
            .key_agg_cache
            .nonce_gen(
                &self.secp,
                session_id,
                self.keys.public_key(),
                self.message,
                None,
            )
            .map_err(|e| Error::CryptoValidation(format!("Nonce generation failed: {e:?}")))?;

        let agg_nonce = MusigAggNonce::new(&self.secp, &[self.service_nonce, pub_nonce]);
        let session = MusigSession::new(&self.secp, &self.key_agg_cache, agg_nonce, self.message);
        let partial = session
            .partial_sign(
                &self.secp,
                sec_nonce,
                self.keys.keypair(),
                &self.key_agg_cache,
            )
            .map_err(|e| Error::CryptoValidation(format!("Partial signing failed: {e:?}")))?;

        Ok(ClaimPayload {
            pub_nonce: pub_nonce.serialize().to_vec(),
            partial_signature: partial.serialize().to_vec(),
        })
    }
}

fn decode_leaf(name: &str, leaf: &SwapTreeLeaf) -> Result<(ScriptBuf, LeafVersion)> {
    let version = LeafVersion::from_consensus(leaf.version)
        .map_err(|e| Error::CryptoValidation(format!("Invalid {name} leaf version: {e}")))?;
    let script = hex::decode(&leaf.output)
        .map_err(|e| Error::CryptoValidation(format!("Invalid {name} leaf script: {e}")))?;
    if script.is_empty() {
        return Err(Error::CryptoValidation(format!("Empty {name} leaf script")));
    }
    Ok((ScriptBuf::from_bytes(script), version))
}

fn decode_hex(name: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|e| Error::CryptoValidation(format!("Invalid {name}: {e}")))
}

fn commits_to_output_key(script: &ScriptBuf, output_key: &XOnlyPublicKey) -> bool {
    let bytes = script.as_bytes();
    script.is_p2tr() && bytes[2..] == output_key.serialize()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
