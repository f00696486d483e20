//! BOLT11 payment hash extraction and preimage validation.
//!
//! Checking the preimage the service reveals against the invoice is the only thing standing
//! between "the service says it paid" and "the user co-signs the release of their escrow".

use crate::error::Result;
use anyhow::Context;
use bitcoin::hashes::Hash;
use lightning_invoice::Bolt11Invoice;
use sha2::{Digest, Sha256};
use std::str::FromStr;

/// Payment hash committed to by a BOLT11 invoice.
pub fn payment_hash(invoice: &str) -> Result<[u8; 32]> {
    let invoice = decode(invoice)?;
    Ok(invoice.payment_hash().to_byte_array())
}

/// Amount requested by a BOLT11 invoice, if it carries one.
pub fn amount_sats(invoice: &str) -> Result<Option<u64>> {
    let invoice = decode(invoice)?;
    Ok(invoice.amount_milli_satoshis().map(|msat| msat / 1_000))
}

/// Whether `preimage` hashes to the invoice's payment hash.
///
/// An invoice that does not decode never validates.
pub fn validate(invoice: &str, preimage: &[u8]) -> bool {
    match payment_hash(invoice) {
        Ok(hash) => preimage_matches(&hash, preimage),
        Err(e) => {
            log::warn!("Cannot validate preimage: {e}");
            false
        }
    }
}

/// Whether `sha256(preimage) == payment_hash`.
pub fn preimage_matches(payment_hash: &[u8; 32], preimage: &[u8]) -> bool {
    let digest: [u8; 32] = Sha256::digest(preimage).into();
    digest == *payment_hash
}

fn decode(invoice: &str) -> Result<Bolt11Invoice> {
    let parsed = Bolt11Invoice::from_str(invoice.trim())
        .map_err(|e| anyhow::anyhow!("{e:?}"))
        .context("parse BOLT11 invoice")?;
    Ok(parsed)
}
