//! Client-side helpers for collecting and binding the discharges that a
//! macaroon's third-party caveats call for.

use crate::error::BakeryError;
use bakery_macaroon::{Caveat, Macaroon};
use std::{
    collections::{HashSet, VecDeque},
    future::Future,
};

/// Gather a discharge for every third-party caveat of `primary`, and then for
/// every third-party caveat of those discharges, until none are outstanding.
///
/// `get_discharge` is called once per distinct caveat id with the location of
/// `primary` and the caveat to discharge. The first error it returns aborts
/// the whole operation. The discharges are returned unbound, in the order
/// they were obtained; see [bind_for_request].
#[instrument(level = "trace", skip(primary, get_discharge))]
pub async fn discharge_all<F, Fut>(
    primary: &Macaroon,
    mut get_discharge: F,
) -> Result<Vec<Macaroon>, BakeryError>
where
    F: FnMut(String, Caveat) -> Fut,
    Fut: Future<Output = anyhow::Result<Macaroon>>,
{
    let mut discharges = Vec::new();
    let mut seen = HashSet::new();
    let mut pending: VecDeque<Caveat> = VecDeque::new();

    let mut enqueue = |macaroon: &Macaroon, pending: &mut VecDeque<Caveat>| {
        for caveat in macaroon.third_party_caveats() {
            if seen.insert(caveat.id().to_vec()) {
                pending.push_back(caveat.clone());
            }
        }
    };

    enqueue(primary, &mut pending);

    while let Some(caveat) = pending.pop_front() {
        let location = caveat.location().to_owned();

        debug!("Requesting discharge from {:?}", location);

        let discharge = get_discharge(primary.location().to_owned(), caveat)
            .await
            .map_err(|cause| BakeryError::DischargeFailed {
                location: location.clone(),
                cause,
            })?;

        enqueue(&discharge, &mut pending);
        discharges.push(discharge);
    }

    debug!("Gathered {} discharge(s)", discharges.len());

    Ok(discharges)
}

/// Bind every discharge to `primary` so that they are only accepted when
/// presented alongside it
pub fn bind_for_request(primary: &Macaroon, discharges: &mut [Macaroon]) {
    for discharge in discharges.iter_mut() {
        discharge.bind(primary.signature());
    }
}
