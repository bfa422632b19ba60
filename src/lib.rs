//! Per-value cookie session storage for `tower`.
//!
//! Instead of packing a whole session into one cookie, every value is stored in its own
//! cookie named `<session-name>-<key>`. Each cookie is signed with HMAC-SHA256 (and, with
//! the `private` feature, encrypted with AES-GCM) using the cookie name as authenticated
//! context, so a value cannot be moved to another key. Cookies are verified independently:
//! one corrupted or expired cookie does not discard the rest of the session.
//!
//! [`MultiCookieStore`] holds the core protocol and can be driven by any transport.
//! [`MultiCookieSessionLayer`] wires it into a `tower` stack through `tower-cookies` and
//! exposes the session as a [`SessionHandle`] request extension.
//!
//! # Key rotation
//! Pass key pairs newest first. New cookies are signed by the first pair that succeeds;
//! older pairs keep previously issued cookies readable until they expire.

mod codec;
mod config;
mod error;
pub mod format;
mod handle;
pub mod layer;
mod session;
mod store;

pub use tower_cookies::cookie::SameSite;

pub use crate::codec::{
    Codec, CodecSet, DEFAULT_MAX_AGE, DEFAULT_MAX_LENGTH, KeyPair, SecureCookie,
};
pub use crate::config::{CookieOptions, MultiCookieConfig};
pub use crate::error::{
    CodecError, CodecErrors, Error, KeyError, LoadError, Result, SessionErrors,
};
pub use crate::handle::SessionHandle;
pub use crate::layer::MultiCookieSessionLayer;
pub use crate::session::Session;
pub use crate::store::MultiCookieStore;
