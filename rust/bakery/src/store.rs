use crate::sync::ConditionalSync;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::Rng;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

/// The secret that seeds a macaroon's signature chain
pub type RootKey = Vec<u8>;

pub const ROOT_KEY_LENGTH: usize = 24;
pub const ID_LENGTH: usize = 24;

/// Generate a fresh root key from the thread-local CSPRNG
pub fn generate_root_key() -> RootKey {
    rand::thread_rng().gen::<[u8; ROOT_KEY_LENGTH]>().to_vec()
}

/// Generate a fresh, printable macaroon id
pub fn generate_id() -> Vec<u8> {
    hex::encode(rand::thread_rng().gen::<[u8; ID_LENGTH]>()).into_bytes()
}

/// This trait is meant to be implemented by a storage backend suitable for
/// remembering the root keys of the macaroons a service has minted, so that
/// they can be verified later
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait RootKeyStore: ConditionalSync {
    /// Read a root key by macaroon id, returning a Result<Option<...>> that
    /// unwraps to None if no key is found, otherwise Some
    async fn get(&self, id: &[u8]) -> Result<Option<RootKey>>;

    /// Remember the root key of the macaroon with the given id
    async fn put(&self, id: &[u8], root_key: &[u8]) -> Result<()>;

    async fn require(&self, id: &[u8]) -> Result<RootKey> {
        match self.get(id).await? {
            Some(root_key) => Ok(root_key),
            None => Err(anyhow!(
                "No root key found for macaroon {:?}",
                String::from_utf8_lossy(id)
            )),
        }
    }

    /// Generate and remember a fresh root key, under a fresh id unless one is
    /// given
    async fn new_key(&self, id: Option<Vec<u8>>) -> Result<(Vec<u8>, RootKey)> {
        let id = match id {
            Some(id) if !id.is_empty() => id,
            _ => generate_id(),
        };
        let root_key = generate_root_key();

        self.put(&id, &root_key).await?;

        Ok((id, root_key))
    }
}

/// A basic in-memory store. This will serve for basic use cases and tests,
/// but a service whose macaroons must outlive the process should be given a
/// store that persists to disk.
#[derive(Clone, Default, Debug)]
pub struct MemoryStore {
    root_keys: Arc<Mutex<HashMap<Vec<u8>, RootKey>>>,
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl RootKeyStore for MemoryStore {
    async fn get(&self, id: &[u8]) -> Result<Option<RootKey>> {
        let root_keys = self.root_keys.lock().map_err(|_| anyhow!("poisoned mutex!"))?;

        Ok(root_keys.get(id).cloned())
    }

    async fn put(&self, id: &[u8], root_key: &[u8]) -> Result<()> {
        let mut root_keys = self.root_keys.lock().map_err(|_| anyhow!("poisoned mutex!"))?;
        root_keys.insert(id.to_vec(), root_key.to_vec());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{generate_id, MemoryStore, RootKeyStore, ID_LENGTH, ROOT_KEY_LENGTH};
    use std::sync::Arc;

    #[cfg(target_arch = "wasm32")]
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_test_configure!(run_in_browser);

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_remembers_generated_keys() {
        let store = MemoryStore::default();

        let (id, root_key) = store.new_key(None).await.unwrap();

        assert_eq!(root_key.len(), ROOT_KEY_LENGTH);
        assert_eq!(store.require(&id).await.unwrap(), root_key);

        let (named, _) = store.new_key(Some(b"named".to_vec())).await.unwrap();
        assert_eq!(named, b"named");
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_shares_keys_between_clones_and_handles() {
        let store = MemoryStore::default();
        let shared: Arc<dyn RootKeyStore> = Arc::new(store.clone());

        shared.put(b"id", b"root key").await.unwrap();

        assert_eq!(store.get(b"id").await.unwrap(), Some(b"root key".to_vec()));
        assert_eq!(store.get(b"other").await.unwrap(), None);
        assert!(store.require(b"other").await.is_err());
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), test)]
    fn it_generates_printable_ids() {
        let id = generate_id();

        assert_eq!(id.len(), ID_LENGTH * 2);
        assert!(hex::decode(&id).is_ok());
        assert_ne!(id, generate_id());
    }
}
