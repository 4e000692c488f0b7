//! Encrypts the payload of a third-party caveat so that only the authority it
//! is addressed to can read it.
//!
//! A caveat id is the URL-safe base64 text of a JSON envelope:
//!
//! ```json
//! { "v": 1, "tp": "<third party key>", "fp": "<first party key>", "n": "<nonce>", "c": "<ciphertext>" }
//! ```
//!
//! The ciphertext is XChaCha20-Poly1305 over a JSON [CaveatPayload], keyed by
//! the SHA-256 of a domain tag and the X25519 agreement between the first and
//! third party keys. The version and both public keys are authenticated as
//! associated data, so swapping either key breaks decryption.

use crate::{
    error::BakeryError,
    key::{KeyPair, PublicKey},
    store::RootKey,
};
use anyhow::anyhow;
use bakery_macaroon::serde::{base64_bytes, Base64Json};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    Key, XChaCha20Poly1305, XNonce,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const CAVEAT_ID_VERSION: u8 = 1;

const NONCE_LENGTH: usize = 24;
const KEY_DERIVATION_TAG: &[u8] = b"bakery caveat v1";

/// What the third party learns when it opens a caveat id
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct CaveatPayload {
    #[serde(with = "base64_bytes")]
    pub root_key: RootKey,
    pub condition: String,
    /// Reserved for chaining a caveat to the verification id of another
    /// caveat. [crate::service::Service] always leaves it unset; decoders
    /// carry it through untouched.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_bytes::option"
    )]
    pub verification_id: Option<Vec<u8>>,
}

#[derive(Serialize, Deserialize)]
struct CaveatIdEnvelope {
    #[serde(rename = "v")]
    version: u8,
    #[serde(rename = "tp")]
    third_party_key: PublicKey,
    #[serde(rename = "fp")]
    first_party_key: PublicKey,
    #[serde(rename = "n", with = "base64_bytes")]
    nonce: [u8; NONCE_LENGTH],
    #[serde(rename = "c", with = "base64_bytes")]
    ciphertext: Vec<u8>,
}

impl CaveatIdEnvelope {
    fn associated_data(&self) -> Vec<u8> {
        [
            &[self.version][..],
            self.third_party_key.as_bytes(),
            self.first_party_key.as_bytes(),
        ]
        .concat()
    }
}

fn shared_key(own_key: &KeyPair, other: &PublicKey) -> XChaCha20Poly1305 {
    let shared_secret = own_key.private.diffie_hellman(other);
    let digest = <Sha256 as Digest>::new()
        .chain_update(KEY_DERIVATION_TAG)
        .chain_update(shared_secret.as_bytes())
        .finalize();

    XChaCha20Poly1305::new(Key::from_slice(&digest))
}

/// Encrypt `payload` so that only the holder of the private key matching
/// `third_party_key` can read it, authenticated as coming from `own_key`
pub fn encode_caveat_id(
    payload: &CaveatPayload,
    third_party_key: &PublicKey,
    own_key: &KeyPair,
) -> Result<Vec<u8>, BakeryError> {
    let mut envelope = CaveatIdEnvelope {
        version: CAVEAT_ID_VERSION,
        third_party_key: *third_party_key,
        first_party_key: own_key.public,
        nonce: rand::thread_rng().gen(),
        ciphertext: Vec::new(),
    };

    let plaintext = serde_json::to_vec(payload).map_err(anyhow::Error::from)?;
    let associated_data = envelope.associated_data();

    envelope.ciphertext = shared_key(own_key, third_party_key)
        .encrypt(
            XNonce::from_slice(&envelope.nonce),
            Payload {
                msg: &plaintext,
                aad: &associated_data,
            },
        )
        .map_err(|_| anyhow!("Could not encrypt caveat payload"))?;

    Ok(envelope.to_base64_json()?.into_bytes())
}

/// Recover the payload of a caveat id that was addressed to `own_key`
pub fn decode_caveat_id(id: &[u8], own_key: &KeyPair) -> Result<CaveatPayload, BakeryError> {
    let envelope =
        CaveatIdEnvelope::from_base64_json(id).map_err(BakeryError::MalformedCaveatId)?;

    if envelope.version != CAVEAT_ID_VERSION {
        return Err(BakeryError::MalformedCaveatId(anyhow!(
            "Unsupported caveat id version {}",
            envelope.version
        )));
    }

    if envelope.third_party_key != own_key.public {
        return Err(BakeryError::NotAddressedToMe);
    }

    let associated_data = envelope.associated_data();
    let plaintext = shared_key(own_key, &envelope.first_party_key)
        .decrypt(
            XNonce::from_slice(&envelope.nonce),
            Payload {
                msg: &envelope.ciphertext,
                aad: &associated_data,
            },
        )
        .map_err(|_| BakeryError::NotAddressedToMe)?;

    serde_json::from_slice(&plaintext)
        .map_err(|error| BakeryError::MalformedCaveatId(error.into()))
}
