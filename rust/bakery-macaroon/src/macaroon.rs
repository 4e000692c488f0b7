use crate::{
    crypto::{bind_for_request, derive_key, keyed_hash, keyed_hash2, seal, Signature},
    serde::{base64_bytes, Base64Json},
    verify::Verification,
    MacaroonError,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A restriction recorded in a macaroon's signature chain
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Caveat {
    /// A condition the target service checks for itself
    FirstParty { condition: String },
    /// A condition that must be vouched for by the authority at `location`,
    /// which alone is able to read `id`
    ThirdParty {
        location: String,
        #[serde(with = "base64_bytes")]
        id: Vec<u8>,
        #[serde(with = "base64_bytes")]
        verification_id: Vec<u8>,
    },
}

impl Caveat {
    /// The bytes that identify this caveat: the condition itself for a
    /// first-party caveat, or the opaque caveat id otherwise
    pub fn id(&self) -> &[u8] {
        match self {
            Caveat::FirstParty { condition } => condition.as_bytes(),
            Caveat::ThirdParty { id, .. } => id,
        }
    }

    /// The location of the discharging authority; empty for first-party
    /// caveats
    pub fn location(&self) -> &str {
        match self {
            Caveat::FirstParty { .. } => "",
            Caveat::ThirdParty { location, .. } => location,
        }
    }

    pub fn is_third_party(&self) -> bool {
        matches!(self, Caveat::ThirdParty { .. })
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Macaroon {
    location: String,
    #[serde(with = "base64_bytes")]
    id: Vec<u8>,
    caveats: Vec<Caveat>,
    #[serde(with = "base64_bytes")]
    signature: Signature,
}

impl Macaroon {
    /// Mint a macaroon whose signature chain is seeded by `root_key`
    pub fn new(root_key: &[u8], id: Vec<u8>, location: &str) -> Self {
        let signature = keyed_hash(&derive_key(root_key), &id);

        Macaroon {
            location: location.to_owned(),
            id,
            caveats: Vec::new(),
            signature,
        }
    }

    /// Append a condition that the target service will check itself
    pub fn add_first_party_caveat(&mut self, condition: &str) {
        self.signature = keyed_hash(&self.signature, condition.as_bytes());
        self.caveats.push(Caveat::FirstParty {
            condition: condition.to_owned(),
        });
    }

    /// Append a caveat to be discharged by the authority at `location`.
    /// `root_key` must be recoverable by that authority from `id`; it is also
    /// sealed under the current signature so that the target service can
    /// recover it during verification without contacting the authority.
    pub fn add_third_party_caveat(
        &mut self,
        root_key: &[u8],
        id: Vec<u8>,
        location: &str,
    ) -> Result<(), MacaroonError> {
        let verification_id = seal(&self.signature, &derive_key(root_key))?;

        self.signature = keyed_hash2(&self.signature, &verification_id, &id);
        self.caveats.push(Caveat::ThirdParty {
            location: location.to_owned(),
            id,
            verification_id,
        });

        Ok(())
    }

    /// Bind this (discharge) macaroon to the signature of the primary
    /// macaroon it will be presented with. A discharge that is bound to one
    /// primary macaroon cannot be used alongside another.
    pub fn bind(&mut self, primary_signature: &[u8]) {
        self.signature = bind_for_request(primary_signature, &self.signature);
    }

    /// Verify this macaroon as the primary macaroon of a request: every
    /// first-party caveat (including those of the discharges) must be
    /// accepted by `check`, every third-party caveat must be satisfied by a
    /// discharge among `discharges` that is bound to this macaroon, and every
    /// signature chain must be intact. `discharges` may be every macaroon of
    /// the request, including this one.
    pub fn verify<F>(
        &self,
        root_key: &[u8],
        check: F,
        discharges: &[Macaroon],
    ) -> Result<(), MacaroonError>
    where
        F: FnMut(&str) -> anyhow::Result<()>,
    {
        Verification::new(check, discharges).run(self, &derive_key(root_key))
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn id(&self) -> &[u8] {
        &self.id
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn caveats(&self) -> &[Caveat] {
        &self.caveats
    }

    /// Iterate over the caveats that must be discharged by another authority
    pub fn third_party_caveats(&self) -> impl Iterator<Item = &Caveat> {
        self.caveats.iter().filter(|caveat| caveat.is_third_party())
    }

    /// Produce a base64-encoded serialization of the macaroon suitable for
    /// transferring in a header field
    pub fn encode(&self) -> Result<String> {
        self.to_base64_json()
    }
}

/// Deserialize an encoded macaroon string into a [Macaroon]
impl FromStr for Macaroon {
    type Err = MacaroonError;

    fn from_str(encoded: &str) -> Result<Self, Self::Err> {
        Macaroon::from_base64_json(encoded.trim().as_bytes()).map_err(MacaroonError::Decode)
    }
}

impl<'a> TryFrom<&'a str> for Macaroon {
    type Error = MacaroonError;

    fn try_from(encoded: &str) -> Result<Self, Self::Error> {
        Macaroon::from_str(encoded)
    }
}
