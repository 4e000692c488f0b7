use crate::{
    crypto::{bind_for_request, keyed_hash, keyed_hash2, open, Signature},
    Caveat, Macaroon, MacaroonError,
};
use subtle::ConstantTimeEq;

/// The state of one verification pass over a primary macaroon and the
/// discharges presented alongside it
pub(crate) struct Verification<'a, F> {
    check: F,
    discharges: &'a [Macaroon],
    used: Vec<bool>,
}

impl<'a, F> Verification<'a, F>
where
    F: FnMut(&str) -> anyhow::Result<()>,
{
    pub fn new(check: F, discharges: &'a [Macaroon]) -> Self {
        Verification {
            check,
            discharges,
            used: vec![false; discharges.len()],
        }
    }

    pub fn run(mut self, primary: &Macaroon, key: &Signature) -> Result<(), MacaroonError> {
        // The primary may be presented among its discharges but never
        // discharges itself
        for (used, discharge) in self.used.iter_mut().zip(self.discharges) {
            *used = std::ptr::eq(discharge, primary);
        }

        self.verify(primary, primary.signature(), key)
    }

    /// Walk the caveats of `macaroon`, recomputing its signature chain from
    /// `key`. Discharges are verified as they are encountered, and the final
    /// comparison against the carried signature happens strictly after every
    /// caveat was honored.
    fn verify(
        &mut self,
        macaroon: &Macaroon,
        primary_signature: &[u8],
        key: &Signature,
    ) -> Result<(), MacaroonError> {
        let mut signature = keyed_hash(key, macaroon.id());

        for (index, caveat) in macaroon.caveats().iter().enumerate() {
            match caveat {
                Caveat::FirstParty { condition } => {
                    trace!("Checking first party caveat {:?}", condition);
                    (self.check)(condition).map_err(MacaroonError::CaveatNotSatisfied)?;
                    signature = keyed_hash(&signature, condition.as_bytes());
                }
                Caveat::ThirdParty {
                    id,
                    verification_id,
                    ..
                } => {
                    let caveat_key: Signature = open(&signature, verification_id)
                        .and_then(|key| key.try_into().ok())
                        .ok_or(MacaroonError::VerificationIdUnreadable(index))?;

                    self.discharge(id, primary_signature, &caveat_key)?;

                    signature = keyed_hash2(&signature, verification_id, id);
                }
            }
        }

        let bound_signature = bind_for_request(primary_signature, &signature);

        if !bool::from(
            bound_signature
                .as_slice()
                .ct_eq(macaroon.signature().as_slice()),
        ) {
            return Err(MacaroonError::SignatureMismatch);
        }

        Ok(())
    }

    /// Find an unused discharge for the caveat `id` that verifies under
    /// `key` and is bound to the primary. Several discharges may share an id
    /// (a stale one bound to another primary, say); the first that verifies
    /// is taken. A signature mismatch is only reported when no candidate
    /// fails for any other reason.
    fn discharge(
        &mut self,
        id: &[u8],
        primary_signature: &[u8],
        key: &Signature,
    ) -> Result<(), MacaroonError> {
        let discharges = self.discharges;
        let mut found = false;
        let mut failure = None;

        for (position, discharge) in discharges.iter().enumerate() {
            if discharge.id() != id {
                continue;
            }
            found = true;

            if self.used[position] {
                continue;
            }

            // Mark before descending so that a cycle of discharges
            // terminates instead of recursing forever
            let used = self.used.clone();
            self.used[position] = true;

            trace!("Verifying discharge for caveat {:?}", display_id(id));

            match self.verify(discharge, primary_signature, key) {
                Ok(()) => return Ok(()),
                Err(error) => {
                    self.used = used;
                    failure = match failure {
                        None | Some(MacaroonError::SignatureMismatch) => Some(error),
                        kept => kept,
                    };
                }
            }
        }

        Err(match (found, failure) {
            (false, _) => MacaroonError::DischargeNotFound(display_id(id)),
            (true, None) => MacaroonError::DischargeReused(display_id(id)),
            (true, Some(error)) => error,
        })
    }
}

fn display_id(id: &[u8]) -> String {
    String::from_utf8_lossy(id).into_owned()
}
