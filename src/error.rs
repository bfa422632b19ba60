//! Error types for the codec, the materializer and the persister.
//!
//! Batch operations never stop at the first failing cookie. Every per-cookie or per-key
//! failure is kept as a structured [`Error`] inside a [`SessionErrors`] and is only joined
//! into a single message when displayed.

use std::fmt;

use crate::session::Session;

/// A failure reported by a single [`Codec`](crate::Codec).
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("the value is too long ({len} > {max} bytes)")]
    TooLong { len: usize, max: usize },

    #[error("the value is not valid: {0}")]
    Malformed(&'static str),

    #[error("the value is not valid: signature mismatch")]
    InvalidMac,

    #[error("expired timestamp")]
    Expired,

    #[error("the value could not be encrypted")]
    Encrypt,

    #[error("the value could not be decrypted")]
    Decrypt,

    #[error("envelope: {0}")]
    Envelope(#[from] serde_json::Error),
}

/// The failures of every configured codec for a single value.
#[derive(Debug, Default)]
pub struct CodecErrors(Vec<CodecError>);

impl CodecErrors {
    pub(crate) fn push(&mut self, err: CodecError) {
        self.0.push(err);
    }

    pub fn iter(&self) -> impl Iterator<Item = &CodecError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<CodecError> for CodecErrors {
    fn from(err: CodecError) -> Self {
        Self(vec![err])
    }
}

impl fmt::Display for CodecErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CodecErrors {}

/// Why a [`KeyPair`](crate::KeyPair) could not be turned into a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("signing key is empty")]
    EmptySigningKey,

    #[error("signing key is invalid")]
    InvalidSigningKey,

    #[error("encryption key must be 16, 24 or 32 bytes, got {0}")]
    EncryptionKeyLength(usize),

    #[error("encryption requires the `private` feature")]
    EncryptionUnavailable,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("at least one key pair is required")]
    NoKeys,

    #[error("invalid key pair #{index}: {reason}")]
    InvalidKey {
        index: usize,
        #[source]
        reason: KeyError,
    },

    #[error("decoding cookie {name:?}: {errors}")]
    Decode { name: String, errors: CodecErrors },

    #[error("encoding cookie {name:?}: {errors}")]
    Encode { name: String, errors: CodecErrors },

    #[error("non-stringable key {key:?} found")]
    KeyRender { key: String },

    #[error("serializing value: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("deserializing value: {0}")]
    Deserialize(#[source] serde_json::Error),

    #[error("session lock is poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure collected while materializing or persisting one session.
#[derive(Debug)]
pub struct SessionErrors {
    op: &'static str,
    errors: Vec<Error>,
}

impl SessionErrors {
    pub(crate) fn new(op: &'static str) -> Self {
        Self {
            op,
            errors: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, err: Error) {
        self.errors.push(err);
    }

    pub(crate) fn into_result(self) -> std::result::Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.errors.iter()
    }

    /// Names of the cookies that could not be decoded.
    pub fn failed_cookies(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().filter_map(|err| match err {
            Error::Decode { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn into_vec(self) -> Vec<Error> {
        self.errors
    }
}

impl fmt::Display for SessionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.op)?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SessionErrors {}

/// Returned by [`MultiCookieStore::load`](crate::MultiCookieStore::load) when some of the
/// session's cookies could not be decoded.
///
/// The session is still usable: it holds every value that did decode.
#[derive(Debug)]
pub struct LoadError {
    session: Session,
    errors: SessionErrors,
}

impl LoadError {
    pub(crate) fn new(session: Session, errors: SessionErrors) -> Self {
        Self { session, errors }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn errors(&self) -> &SessionErrors {
        &self.errors
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn into_parts(self) -> (Session, SessionErrors) {
        (self.session, self.errors)
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.errors, f)
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.errors)
    }
}
