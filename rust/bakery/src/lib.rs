//! A bakery mints, attenuates and verifies [macaroons][bakery_macaroon], and
//! lets independent services vouch for third-party caveats without the
//! issuing service ever contacting them.
//!
//! Every participant is a [service::Service]. A service with a
//! [key::KeyPair] and a [locator::PublicKeyLocator] may attach caveats that
//! are encrypted for another service, and may discharge caveats that were
//! encrypted for itself. A client gathers the discharges a macaroon needs
//! with [discharge::discharge_all], binds them to the macaroon and presents
//! everything to the target service in a [request::Request].
//!
//! ```rust
//! use bakery::{
//!     checkers::Caveat,
//!     discharge::{bind_for_request, discharge_all},
//!     key::KeyPair,
//!     locator::PublicKeyLocatorMap,
//!     service::{Service, ServiceParams},
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let auth_key = KeyPair::generate();
//! let locator = Arc::new(PublicKeyLocatorMap::from_iter([(
//!     "auth-loc".to_owned(),
//!     auth_key.public,
//! )]));
//!
//! let target = Service::new(ServiceParams {
//!     location: "target-loc".into(),
//!     key: Some(KeyPair::generate()),
//!     locator: Some(locator.clone()),
//!     ..Default::default()
//! })?;
//! let auth = Service::new(ServiceParams {
//!     location: "auth-loc".into(),
//!     key: Some(auth_key),
//!     locator: Some(locator),
//!     ..Default::default()
//! })?;
//!
//! let macaroon = target
//!     .new_macaroon(None, None, &[Caveat::third_party("auth-loc", "user == bob")])
//!     .await?;
//!
//! let auth = &auth;
//! let mut discharges = discharge_all(&macaroon, |_, caveat| async move {
//!     let accept_bob = |_: &[u8], condition: &str| -> anyhow::Result<Vec<Caveat>> {
//!         match condition {
//!             "user == bob" => Ok(vec![]),
//!             _ => Err(anyhow::anyhow!("not bob")),
//!         }
//!     };
//!     Ok::<_, anyhow::Error>(auth.discharge(&accept_bob, caveat.id()).await?)
//! })
//! .await?;
//! bind_for_request(&macaroon, &mut discharges);
//!
//! let mut request = target.new_request(|_: &str| -> anyhow::Result<()> { Ok(()) });
//! request.add_client_macaroon(macaroon);
//! for discharge in discharges {
//!     request.add_client_macaroon(discharge);
//! }
//! request.check().await?;
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate tracing as extern_tracing;

pub mod checkers;
pub mod codec;
pub mod discharge;
pub mod error;
pub mod key;
pub mod locator;
pub mod request;
pub mod service;
pub mod store;
pub mod sync;
pub mod tracing;

pub use bakery_macaroon::{self as macaroon, Macaroon};
pub use error::{BakeryError, VerificationError};
