use crate::{
    checkers::FirstPartyChecker,
    error::{BakeryError, VerificationError},
    service::Service,
};
use bakery_macaroon::Macaroon;
use std::collections::HashSet;

/// The macaroons a client presented to a service, awaiting verification
pub struct Request<C>
where
    C: FirstPartyChecker,
{
    service: Service,
    checker: C,
    macaroons: Vec<Macaroon>,
}

impl<C> Request<C>
where
    C: FirstPartyChecker,
{
    pub(crate) fn new(service: Service, checker: C) -> Self {
        Request {
            service,
            checker,
            macaroons: Vec::new(),
        }
    }

    /// Present a macaroon with the request; order does not matter
    pub fn add_client_macaroon(&mut self, macaroon: Macaroon) {
        self.macaroons.push(macaroon);
    }

    pub fn client_macaroons(&self) -> &[Macaroon] {
        &self.macaroons
    }

    /// Verify the request. The primary macaroon is the first one whose root
    /// key the service remembers and that no other macaroon of the request
    /// names as a third-party caveat; every macaroon is offered as a
    /// discharge for it. Checking does not consume the request and may be
    /// repeated with the same outcome.
    #[instrument(level = "trace", skip(self), fields(location = %self.service.location()))]
    pub async fn check(&self) -> Result<(), BakeryError> {
        let discharge_ids: HashSet<&[u8]> = self
            .macaroons
            .iter()
            .flat_map(|macaroon| macaroon.third_party_caveats().map(|caveat| caveat.id()))
            .collect();

        let mut found = None;

        for macaroon in &self.macaroons {
            if discharge_ids.contains(macaroon.id()) {
                continue;
            }

            if let Some(root_key) = self.service.store().get(macaroon.id()).await? {
                found = Some((macaroon, root_key));
                break;
            }
        }

        let (primary, root_key) = found.ok_or(VerificationError::NoKnownMacaroon)?;

        primary
            .verify(
                &root_key,
                |condition| self.checker.check_first_party_caveat(condition),
                &self.macaroons,
            )
            .map_err(|error| {
                debug!("Request failed verification: {}", error);
                VerificationError::from(error)
            })?;

        debug!(
            "Request verified with {} discharge(s)",
            self.macaroons.len() - 1
        );

        Ok(())
    }
}
