use crate::{error::BakeryError, key::PublicKey, sync::ConditionalSync};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Resolves the location of a third-party authority into the public key that
/// caveats addressed to it should be encrypted for. Lookups must not mutate
/// the locator; it is shared by every service that holds it.
pub trait PublicKeyLocator: ConditionalSync {
    fn public_key_for_location(&self, location: &str) -> Result<PublicKey, BakeryError>;
}

/// A [PublicKeyLocator] backed by a plain map. It serializes as an object of
/// location to base64 public key, so it may be loaded from configuration.
#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PublicKeyLocatorMap(HashMap<String, PublicKey>);

impl PublicKeyLocatorMap {
    pub fn insert(&mut self, location: &str, public_key: PublicKey) -> Option<PublicKey> {
        self.0.insert(location.to_owned(), public_key)
    }
}

impl FromIterator<(String, PublicKey)> for PublicKeyLocatorMap {
    fn from_iter<T: IntoIterator<Item = (String, PublicKey)>>(iter: T) -> Self {
        PublicKeyLocatorMap(iter.into_iter().collect())
    }
}

impl PublicKeyLocator for PublicKeyLocatorMap {
    fn public_key_for_location(&self, location: &str) -> Result<PublicKey, BakeryError> {
        self.0
            .get(location)
            .copied()
            .ok_or_else(|| BakeryError::UnknownThirdParty(location.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::{PublicKeyLocator, PublicKeyLocatorMap};
    use crate::{error::BakeryError, key::KeyPair};

    #[cfg(target_arch = "wasm32")]
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_test_configure!(run_in_browser);

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), test)]
    fn it_finds_known_locations_only() {
        let key_pair = KeyPair::generate();
        let mut locator = PublicKeyLocatorMap::default();
        locator.insert("as-loc", key_pair.public);

        assert_eq!(
            locator.public_key_for_location("as-loc").unwrap(),
            key_pair.public
        );
        assert!(matches!(
            locator.public_key_for_location("elsewhere"),
            Err(BakeryError::UnknownThirdParty(location)) if location == "elsewhere"
        ));
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), test)]
    fn it_can_be_loaded_from_json_configuration() {
        let key_pair = KeyPair::generate();
        let config = format!(r#"{{ "as-loc": "{}" }}"#, key_pair.public);

        let locator: PublicKeyLocatorMap = serde_json::from_str(&config).unwrap();

        assert_eq!(
            locator.public_key_for_location("as-loc").unwrap(),
            key_pair.public
        );
    }
}
