//! The keyed hash chain and the secret box used to hide third-party caveat
//! root keys inside the verification id.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    Key, XChaCha20Poly1305, XNonce,
};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::MacaroonError;

/// A link in a macaroon's signature chain
pub type Signature = [u8; 32];

pub const SIGNATURE_LENGTH: usize = 32;
pub const NONCE_LENGTH: usize = 24;

const KEY_GENERATOR: &[u8] = b"macaroons-key-generator";

type HmacSha256 = Hmac<Sha256>;

pub fn keyed_hash(key: &[u8], data: &[u8]) -> Signature {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Hash two pieces of data under one key without the boundary between them
/// being ambiguous
pub fn keyed_hash2(key: &[u8], first: &[u8], second: &[u8]) -> Signature {
    let first = keyed_hash(key, first);
    let second = keyed_hash(key, second);
    keyed_hash(key, &[first, second].concat())
}

/// Stretch an arbitrary user supplied root key into the fixed size key that
/// seeds a signature chain
pub fn derive_key(root_key: &[u8]) -> Signature {
    keyed_hash(KEY_GENERATOR, root_key)
}

/// Tie a discharge macaroon's signature to the signature of the primary
/// macaroon it accompanies
pub fn bind_for_request(primary_signature: &[u8], signature: &Signature) -> Signature {
    if primary_signature == signature.as_slice() {
        return *signature;
    }

    let mut hasher = <Sha256 as Digest>::new();
    hasher.update(primary_signature);
    hasher.update(signature);
    hasher.finalize().into()
}

/// Seal `plaintext` under a signature-sized key; the output is the random
/// nonce followed by the ciphertext
pub fn seal(key: &Signature, plaintext: &[u8]) -> Result<Vec<u8>, MacaroonError> {
    let nonce: [u8; NONCE_LENGTH] = rand::thread_rng().gen();
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| MacaroonError::Encryption)?;

    Ok([nonce.as_slice(), ciphertext.as_slice()].concat())
}

pub fn open(key: &Signature, sealed: &[u8]) -> Option<Vec<u8>> {
    if sealed.len() < NONCE_LENGTH {
        return None;
    }

    let (nonce, ciphertext) = sealed.split_at(NONCE_LENGTH);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    cipher.decrypt(XNonce::from_slice(nonce), ciphertext).ok()
}
