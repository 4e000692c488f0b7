use anyhow::Result;
use base64::Engine;
use serde::{de::DeserializeOwned, Serialize};

/// Serialize raw bytes as URL-safe, unpadded base64 text
pub mod base64_bytes {
    use base64::Engine;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<T, S>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]>,
        S: Serializer,
    {
        serializer
            .serialize_str(&base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: TryFrom<Vec<u8>>,
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(text.as_bytes())
            .map_err(D::Error::custom)?;
        let length = bytes.len();

        T::try_from(bytes)
            .map_err(|_| D::Error::custom(format!("Unexpected byte length {length}")))
    }

    /// The same encoding for fields that may be absent
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match bytes {
                Some(bytes) => super::serialize(bytes, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            #[derive(Deserialize)]
            struct Wrapped(#[serde(with = "super")] Vec<u8>);

            Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(bytes)| bytes))
        }
    }
}

/// Helper trait to ser/de any serde-implementing value to/from base64 encoded
/// JSON, which is how macaroons and caveat ids travel as text
pub trait Base64Json: Serialize + DeserializeOwned {
    fn to_base64_json(&self) -> Result<String> {
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(serde_json::to_vec(self)?))
    }

    fn from_base64_json(encoded: &[u8]) -> Result<Self> {
        let json = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(encoded)?;
        Ok(serde_json::from_slice(&json)?)
    }
}

impl<T> Base64Json for T where T: Serialize + DeserializeOwned {}
