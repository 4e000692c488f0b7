//! Macaroons are bearer credentials whose authority can be attenuated by
//! anybody holding them, and whose restrictions ("caveats") may be delegated
//! to a third party.
//!
//! A [Macaroon] carries an identifier, a location hint and an ordered list of
//! [Caveat]s. Its signature is an HMAC-SHA256 chain seeded by a secret root
//! key and extended once per caveat, so caveats can be appended by any holder
//! but never removed or reordered without invalidating the signature.
//!
//! A third-party caveat names an authority by location and carries an opaque
//! id that the authority can interpret. The authority proves the caveat holds
//! by minting a *discharge* macaroon with the same id, which the client then
//! binds to the primary macaroon's signature before presenting both.
//!
//! ```rust
//! use bakery_macaroon::Macaroon;
//!
//! let root_key = b"a very secret root key";
//!
//! let mut macaroon = Macaroon::new(root_key, b"macaroon-id".to_vec(), "https://example.com");
//! macaroon.add_first_party_caveat("account = 3735928559");
//!
//! macaroon
//!     .verify(
//!         root_key,
//!         |condition| match condition {
//!             "account = 3735928559" => Ok(()),
//!             _ => Err(anyhow::anyhow!("unknown condition")),
//!         },
//!         &[],
//!     )
//!     .unwrap();
//! ```

#[macro_use]
extern crate tracing;

pub mod crypto;
pub mod error;
pub mod macaroon;
pub mod serde;
mod verify;

pub use self::error::MacaroonError;
pub use self::crypto::Signature;
pub use self::macaroon::{Caveat, Macaroon};

#[cfg(test)]
mod tests;
