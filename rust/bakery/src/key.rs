use anyhow::{anyhow, Result};
use base64::Engine;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt::Display, str::FromStr};
use x25519_dalek::{PublicKey as X25519PublicKey, SharedSecret, StaticSecret};

pub const KEY_LENGTH: usize = 32;

/// The public half of a service's [KeyPair]. Third parties encrypt caveat ids
/// for the service with it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(X25519PublicKey);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        self.0.as_bytes()
    }
}

impl From<[u8; KEY_LENGTH]> for PublicKey {
    fn from(bytes: [u8; KEY_LENGTH]) -> Self {
        PublicKey(X25519PublicKey::from(bytes))
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = anyhow::Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| anyhow!("Expected a {KEY_LENGTH} byte public key, got {}", bytes.len()))?;
        Ok(PublicKey::from(bytes))
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(self.as_bytes())
        )
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_string()).finish()
    }
}

impl FromStr for PublicKey {
    type Err = anyhow::Error;

    fn from_str(encoded: &str) -> Result<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(encoded.trim())?;
        PublicKey::try_from(bytes.as_slice())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        PublicKey::from_str(&encoded).map_err(D::Error::custom)
    }
}

/// The secret half of a service's [KeyPair]. Never leaves the service.
#[derive(Clone)]
pub struct PrivateKey(StaticSecret);

impl PrivateKey {
    pub fn public_key(&self) -> PublicKey {
        PublicKey(X25519PublicKey::from(&self.0))
    }

    pub(crate) fn diffie_hellman(&self, other: &PublicKey) -> SharedSecret {
        self.0.diffie_hellman(&other.0)
    }

    pub fn to_bytes(&self) -> [u8; KEY_LENGTH] {
        self.0.to_bytes()
    }
}

impl From<[u8; KEY_LENGTH]> for PrivateKey {
    fn from(bytes: [u8; KEY_LENGTH]) -> Self {
        PrivateKey(StaticSecret::from(bytes))
    }
}

impl FromStr for PrivateKey {
    type Err = anyhow::Error;

    fn from_str(encoded: &str) -> Result<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(encoded.trim())?;
        let bytes: [u8; KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| anyhow!("Expected a {KEY_LENGTH} byte private key"))?;
        Ok(PrivateKey::from(bytes))
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// The asymmetric key material of one service, used to address third-party
/// caveats to others and to read the ones addressed to itself
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the thread-local CSPRNG
    pub fn generate() -> Self {
        let private = PrivateKey(StaticSecret::random_from_rng(rand::thread_rng()));
        KeyPair::from(private)
    }
}

impl From<PrivateKey> for KeyPair {
    fn from(private: PrivateKey) -> Self {
        KeyPair {
            public: private.public_key(),
            private,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyPair, PrivateKey, PublicKey};
    use base64::Engine;

    #[cfg(target_arch = "wasm32")]
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_test_configure!(run_in_browser);

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), test)]
    fn it_generates_distinct_key_pairs() {
        let first = KeyPair::generate();
        let second = KeyPair::generate();

        assert_ne!(first.public, second.public);
        assert_eq!(first.private.public_key(), first.public);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), test)]
    fn it_loads_keys_from_their_text_form() {
        let key_pair = KeyPair::generate();
        let private_text = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(key_pair.private.to_bytes());

        let restored = KeyPair::from(private_text.parse::<PrivateKey>().unwrap());
        let public: PublicKey = key_pair.public.to_string().parse().unwrap();

        assert_eq!(restored.public, key_pair.public);
        assert_eq!(public, key_pair.public);
        assert!("c2hvcnQ".parse::<PublicKey>().is_err());
    }
}
