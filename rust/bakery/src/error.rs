use bakery_macaroon::MacaroonError;
use thiserror::Error;

/// Errors produced by a bakery service
#[derive(Error, Debug)]
pub enum BakeryError {
    #[error("{0}")]
    Other(anyhow::Error),

    #[error("Missing configuration: {0}")]
    MissingConfiguration(&'static str),

    /// A third-party caveat was requested but the service has no key pair to
    /// encrypt it with (or discharge was requested without a key pair to
    /// decrypt with)
    #[error("service has no key pair; cannot handle third party caveats")]
    MissingKey,

    #[error("service has no public key locator; cannot add third party caveats")]
    MissingLocator,

    #[error("cannot find public key for location \"{0}\"")]
    UnknownThirdParty(String),

    /// The caveat id could not be opened with this service's key: it was
    /// addressed to somebody else, forged or corrupted
    #[error("caveat id is not addressed to this service")]
    NotAddressedToMe,

    #[error("malformed caveat id: {0}")]
    MalformedCaveatId(anyhow::Error),

    /// A caveat checker declined a condition; the checker's own error is
    /// reported as-is
    #[error("{0}")]
    Rejected(anyhow::Error),

    #[error("cannot get discharge from \"{location}\": {cause}")]
    DischargeFailed {
        location: String,
        cause: anyhow::Error,
    },

    #[error("verification failed: {0}")]
    Verification(#[from] VerificationError),

    #[error("{0}")]
    Macaroon(MacaroonError),
}

impl From<anyhow::Error> for BakeryError {
    fn from(error: anyhow::Error) -> Self {
        BakeryError::Other(error)
    }
}

impl From<MacaroonError> for BakeryError {
    fn from(error: MacaroonError) -> Self {
        BakeryError::Macaroon(error)
    }
}

/// The reasons a request's macaroons can fail to check out
#[derive(Error, Debug)]
pub enum VerificationError {
    /// None of the client's macaroons was minted by the checking service
    #[error("no macaroon with a root key known to this service")]
    NoKnownMacaroon,

    #[error(transparent)]
    Macaroon(#[from] MacaroonError),
}

impl VerificationError {
    /// The id of the caveat that had no discharge, if that is why
    /// verification failed
    pub fn missing_discharge(&self) -> Option<&str> {
        match self {
            VerificationError::Macaroon(MacaroonError::DischargeNotFound(id)) => Some(id),
            _ => None,
        }
    }
}
