use thiserror::Error;

/// The ways in which building, decoding or verifying a [crate::Macaroon] may
/// fail
#[derive(Error, Debug)]
pub enum MacaroonError {
    /// A first-party caveat was rejected by the caller's checker; the
    /// checker's error is reported as-is
    #[error("{0}")]
    CaveatNotSatisfied(anyhow::Error),

    /// A third-party caveat had no discharge macaroon with a matching id
    #[error("cannot find discharge macaroon for caveat \"{0}\"")]
    DischargeNotFound(String),

    /// The same discharge macaroon satisfied more than one caveat, which
    /// only happens when discharges form a cycle
    #[error("discharge macaroon \"{0}\" was used more than once")]
    DischargeReused(String),

    /// The verification id of a third-party caveat could not be opened with
    /// the signature preceding it
    #[error("failed to decrypt caveat {0} signature")]
    VerificationIdUnreadable(usize),

    /// The recomputed signature chain does not end in the signature the
    /// macaroon carries
    #[error("signature mismatch after caveat verification")]
    SignatureMismatch,

    #[error("cannot encrypt third party caveat root key")]
    Encryption,

    #[error("cannot decode macaroon: {0}")]
    Decode(anyhow::Error),
}
