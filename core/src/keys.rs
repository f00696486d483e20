//! Ephemeral per-swap key material.

use secp256k1_zkp::{Keypair, PublicKey, Secp256k1, XOnlyPublicKey};

/// Keypair generated fresh for one swap attempt.
///
/// Never serialized; `Debug` only shows the public half. The secret is wiped on drop.
pub struct SwapKeyMaterial {
    keypair: Keypair,
}

impl SwapKeyMaterial {
    /// Generate a new keypair from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        Self {
            keypair: Keypair::new(&secp, &mut rand::thread_rng()),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    pub fn x_only_public_key(&self) -> XOnlyPublicKey {
        self.keypair.x_only_public_key().0
    }

    /// Hex-encoded compressed public key, as sent to the swap service.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key().serialize())
    }

    pub(crate) fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl std::fmt::Debug for SwapKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapKeyMaterial")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

impl Drop for SwapKeyMaterial {
    fn drop(&mut self) {
        self.keypair.non_secure_erase();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_fresh() {
        let a = SwapKeyMaterial::generate();
        let b = SwapKeyMaterial::generate();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_debug_hides_secret() {
        let keys = SwapKeyMaterial::generate();
        let secret = hex::encode(keys.keypair().secret_bytes());
        let debug = format!("{keys:?}");
        assert!(!debug.contains(&secret));
        assert!(debug.contains(&keys.public_key_hex()));
    }

    #[test]
    fn test_keys_interoperate_with_bitcoin() {
        let keys = SwapKeyMaterial::generate();
        let key = bitcoin::PublicKey::new(keys.public_key());
        assert!(key.compressed);
        assert_eq!(key.inner, keys.public_key());
    }
}
