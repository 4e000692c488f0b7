use crate::{
    checkers::{Caveat, FirstPartyChecker, ThirdPartyChecker},
    codec::{decode_caveat_id, encode_caveat_id, CaveatPayload},
    error::BakeryError,
    key::{KeyPair, PublicKey},
    locator::PublicKeyLocator,
    request::Request,
    store::{generate_id, generate_root_key, MemoryStore, RootKey, RootKeyStore},
};
use bakery_macaroon::Macaroon;
use std::sync::Arc;

/// Configuration for a [Service]. Only the location is required; a service
/// without a key pair and locator can mint and verify macaroons with
/// first-party caveats, but can neither address nor discharge third-party
/// caveats.
#[derive(Default)]
pub struct ServiceParams {
    /// Where the service can be found; copied into every macaroon it mints
    pub location: String,
    /// Where root keys are kept; an in-memory store is used if omitted
    pub store: Option<Arc<dyn RootKeyStore>>,
    pub key: Option<KeyPair>,
    pub locator: Option<Arc<dyn PublicKeyLocator>>,
}

/// A participant in the macaroon protocol: it mints macaroons, attaches
/// caveats to macaroons (including ones minted elsewhere), discharges
/// third-party caveats addressed to it, and verifies requests.
#[derive(Clone)]
pub struct Service {
    location: String,
    key: Option<KeyPair>,
    locator: Option<Arc<dyn PublicKeyLocator>>,
    store: Arc<dyn RootKeyStore>,
}

impl Service {
    pub fn new(params: ServiceParams) -> Result<Self, BakeryError> {
        if params.location.is_empty() {
            return Err(BakeryError::MissingConfiguration("location"));
        }

        Ok(Service {
            location: params.location,
            key: params.key,
            locator: params.locator,
            store: params
                .store
                .unwrap_or_else(|| Arc::new(MemoryStore::default())),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn public_key(&self) -> Option<&PublicKey> {
        self.key.as_ref().map(|key| &key.public)
    }

    pub fn store(&self) -> &Arc<dyn RootKeyStore> {
        &self.store
    }

    /// Mint a new macaroon at this service's location. A fresh id is
    /// generated unless given. Without a root key, a fresh one is generated
    /// and remembered in the store so that this service can verify the
    /// macaroon later; a given root key is never stored, since its owner
    /// (the caveat id of a discharge, say) already keeps it. The caveats are
    /// attached in order.
    #[instrument(level = "trace", skip(self, root_key, caveats), fields(location = %self.location))]
    pub async fn new_macaroon(
        &self,
        id: Option<Vec<u8>>,
        root_key: Option<RootKey>,
        caveats: &[Caveat],
    ) -> Result<Macaroon, BakeryError> {
        let (id, root_key) = match root_key {
            Some(root_key) => (
                id.filter(|id| !id.is_empty()).unwrap_or_else(generate_id),
                root_key,
            ),
            None => self.store.new_key(id).await?,
        };

        let mut macaroon = Macaroon::new(&root_key, id, &self.location);

        for caveat in caveats {
            self.add_caveat(&mut macaroon, caveat)?;
        }

        debug!(
            "Minted macaroon {:?} with {} caveat(s)",
            String::from_utf8_lossy(macaroon.id()),
            caveats.len()
        );

        Ok(macaroon)
    }

    /// Attach a caveat to `macaroon`. A third-party caveat is encrypted for the
    /// service at its location, which must be known to this service's
    /// locator. The macaroon is left untouched if anything fails.
    pub fn add_caveat(&self, macaroon: &mut Macaroon, caveat: &Caveat) -> Result<(), BakeryError> {
        if caveat.is_first_party() {
            trace!("Adding first party caveat {:?}", caveat.condition);
            macaroon.add_first_party_caveat(&caveat.condition);
            return Ok(());
        }

        let key = self.key.as_ref().ok_or(BakeryError::MissingKey)?;
        let locator = self.locator.as_ref().ok_or(BakeryError::MissingLocator)?;
        let third_party_key = locator.public_key_for_location(&caveat.location)?;

        let root_key = generate_root_key();
        let id = encode_caveat_id(
            &CaveatPayload {
                root_key: root_key.clone(),
                condition: caveat.condition.clone(),
                verification_id: None,
            },
            &third_party_key,
            key,
        )?;

        trace!("Adding third party caveat for {:?}", caveat.location);
        macaroon.add_third_party_caveat(&root_key, id, &caveat.location)?;

        Ok(())
    }

    /// Discharge a third-party caveat that was addressed to this service. The
    /// checker decides whether the condition holds; if it does, the result is
    /// a macaroon with the caveat's id and root key that carries whatever
    /// further caveats the checker asked for. The root key is not stored: a
    /// discharge is only ever verified through the primary it is bound to.
    #[instrument(level = "trace", skip(self, checker, caveat_id), fields(location = %self.location))]
    pub async fn discharge<C>(&self, checker: &C, caveat_id: &[u8]) -> Result<Macaroon, BakeryError>
    where
        C: ThirdPartyChecker + ?Sized,
    {
        let key = self.key.as_ref().ok_or(BakeryError::MissingKey)?;
        let payload = decode_caveat_id(caveat_id, key)?;

        let caveats = checker
            .check_third_party_caveat(caveat_id, &payload.condition)
            .map_err(|error| {
                debug!("Refused to discharge caveat: {}", error);
                BakeryError::Rejected(error)
            })?;

        self.new_macaroon(Some(caveat_id.to_vec()), Some(payload.root_key), &caveats)
            .await
    }

    /// Start a request that verifies client macaroons against this service's
    /// store, checking first-party caveats with `checker`
    pub fn new_request<C>(&self, checker: C) -> Request<C>
    where
        C: FirstPartyChecker,
    {
        Request::new(self.clone(), checker)
    }
}
