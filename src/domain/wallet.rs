use crate::error::{PaymentError, Result};
use ed25519_dalek::{Signer, SigningKey};
use std::fmt;
use stellar_strkey::ed25519::{PrivateKey as StellarPrivateKey, PublicKey as StellarPublicKey};

const SEED_LENGTH: usize = 56;

/// The app wallet that funds app-to-user payments.
#[derive(Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    address: String,
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Wallet {
    /// Loads the wallet from an `S...` private seed.
    pub fn from_seed(seed: &str) -> Result<Self> {
        if !seed.to_uppercase().starts_with('S') {
            return Err(PaymentError::InvalidSeed(
                "Private seed should start with \"S\"".to_string(),
            ));
        }
        if seed.len() != SEED_LENGTH {
            return Err(PaymentError::InvalidSeed(format!(
                "Private seed should be {SEED_LENGTH} characters"
            )));
        }

        let private_key = StellarPrivateKey::from_string(seed)
            .map_err(|e| PaymentError::InvalidSeed(e.to_string()))?;
        let signing_key = SigningKey::from_bytes(&private_key.0);
        let address = StellarPublicKey(signing_key.verifying_key().to_bytes()).to_string();

        Ok(Self {
            signing_key,
            address,
        })
    }

    /// The wallet's `G...` account address.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Last four bytes of the public key, used as the signature hint.
    pub fn signature_hint(&self) -> [u8; 4] {
        let key = self.public_key();
        [key[28], key[29], key[30], key[31]]
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

/// Decodes a `G...` address into its raw ed25519 public key.
pub fn decode_address(field: &'static str, address: &str) -> Result<[u8; 32]> {
    StellarPublicKey::from_string(address)
        .map(|key| key.0)
        .map_err(|e| PaymentError::invalid(field, format!("Invalid address {address}: {e}")))
}
