//! Authenticated (and optionally encrypted) codecs for single named values.
//!
//! A [`Codec`] turns a cookie name plus payload bytes into an opaque token and back. The
//! cookie name is always part of the authenticated data, so a token cannot be replayed
//! under another name. [`CodecSet`] chains several codecs for key rotation.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde_json::Value;
use sha2::Sha256;
use time::OffsetDateTime;
use zeroize::Zeroizing;

use crate::{
    error::{CodecError, CodecErrors, Error, KeyError},
    format,
};

type HmacSha256 = Hmac<Sha256>;

/// Thirty days, in seconds.
pub const DEFAULT_MAX_AGE: i64 = 86400 * 30;

/// Longest token accepted or produced by [`SecureCookie`] unless configured otherwise.
pub const DEFAULT_MAX_LENGTH: usize = 4096;

#[cfg(feature = "private")]
const NONCE_LEN: usize = 12;
#[cfg(feature = "private")]
const TAG_LEN: usize = 16;

/// Turns a named payload into a cookie-safe token and back.
pub trait Codec: fmt::Debug + Send + Sync + 'static {
    /// Authenticate (and possibly encrypt) `payload` for the cookie called `name`.
    fn encode(&self, name: &str, payload: &[u8]) -> Result<String, CodecError>;

    /// Verify `token` for the cookie called `name` and return the original payload.
    fn decode(&self, name: &str, token: &str) -> Result<Vec<u8>, CodecError>;

    /// Tokens older than `seconds` stop decoding. `0` disables the check.
    fn set_max_age(&mut self, seconds: i64);
}

/// Signing key plus optional encryption key for one [`SecureCookie`].
#[derive(Clone)]
pub struct KeyPair {
    signing: Zeroizing<Vec<u8>>,
    encryption: Option<Zeroizing<Vec<u8>>>,
}

impl KeyPair {
    /// A pair that only signs. Values are readable by the client but tamper-proof.
    pub fn signed(signing: impl Into<Vec<u8>>) -> Self {
        Self {
            signing: Zeroizing::new(signing.into()),
            encryption: None,
        }
    }

    /// A pair that signs and encrypts. The encryption key must be 16, 24 or 32 bytes,
    /// selecting AES-128, AES-192 or AES-256 in GCM mode.
    #[cfg(feature = "private")]
    pub fn private(signing: impl Into<Vec<u8>>, encryption: impl Into<Vec<u8>>) -> Self {
        Self {
            signing: Zeroizing::new(signing.into()),
            encryption: Some(Zeroizing::new(encryption.into())),
        }
    }

    /// A random 64-byte signing key and, with the `private` feature, a random 32-byte
    /// encryption key.
    pub fn generate() -> Self {
        let mut signing = vec![0u8; 64];
        rand::rngs::OsRng.fill_bytes(&mut signing);
        Self {
            signing: Zeroizing::new(signing),
            encryption: generate_encryption_key(),
        }
    }
}

#[cfg(feature = "private")]
fn generate_encryption_key() -> Option<Zeroizing<Vec<u8>>> {
    let mut key = vec![0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut key);
    Some(Zeroizing::new(key))
}

#[cfg(not(feature = "private"))]
fn generate_encryption_key() -> Option<Zeroizing<Vec<u8>>> {
    None
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("signing", &"[redacted]")
            .field("encrypted", &self.encryption.is_some())
            .finish()
    }
}

#[cfg(feature = "private")]
type Aes192Gcm = aes_gcm::AesGcm<aes_gcm::aes::Aes192, aes_gcm::aead::consts::U12>;

#[cfg(feature = "private")]
enum Cipher {
    Aes128(aes_gcm::Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(aes_gcm::Aes256Gcm),
}

#[cfg(feature = "private")]
impl Cipher {
    fn new(key: &[u8]) -> Option<Self> {
        use aes_gcm::{Aes128Gcm, Aes256Gcm, aead::KeyInit};

        match key.len() {
            16 => Aes128Gcm::new_from_slice(key).ok().map(Self::Aes128),
            24 => Aes192Gcm::new_from_slice(key).ok().map(Self::Aes192),
            32 => Aes256Gcm::new_from_slice(key).ok().map(Self::Aes256),
            _ => None,
        }
    }

    fn seal(&self, name: &str, plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
        use aes_gcm::{
            Nonce,
            aead::{Aead, Payload},
        };

        let mut nonce = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce);
        let payload = Payload {
            msg: plaintext,
            aad: name.as_bytes(),
        };

        let ciphertext = match self {
            Self::Aes128(cipher) => cipher.encrypt(Nonce::from_slice(&nonce), payload),
            Self::Aes192(cipher) => cipher.encrypt(Nonce::from_slice(&nonce), payload),
            Self::Aes256(cipher) => cipher.encrypt(Nonce::from_slice(&nonce), payload),
        }
        .map_err(|_| CodecError::Encrypt)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn open(&self, name: &str, sealed: &[u8]) -> Result<Vec<u8>, CodecError> {
        use aes_gcm::{
            Nonce,
            aead::{Aead, Payload},
        };

        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(CodecError::Malformed("ciphertext too short"));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let payload = Payload {
            msg: ciphertext,
            aad: name.as_bytes(),
        };

        match self {
            Self::Aes128(cipher) => cipher.decrypt(Nonce::from_slice(nonce), payload),
            Self::Aes192(cipher) => cipher.decrypt(Nonce::from_slice(nonce), payload),
            Self::Aes256(cipher) => cipher.decrypt(Nonce::from_slice(nonce), payload),
        }
        .map_err(|_| CodecError::Decrypt)
    }
}

/// HMAC-SHA256 signed, optionally AES-GCM encrypted token codec.
///
/// Tokens have the shape `<unix-seconds>.<base64url body>.<base64url mac>`, where the MAC
/// covers the cookie name, the timestamp and the body.
pub struct SecureCookie {
    mac: HmacSha256,
    #[cfg(feature = "private")]
    cipher: Option<Cipher>,
    max_age: i64,
    max_length: usize,
}

impl SecureCookie {
    /// Build a codec with the default max age and max length.
    pub fn new(pair: &KeyPair) -> Result<Self, KeyError> {
        if pair.signing.is_empty() {
            return Err(KeyError::EmptySigningKey);
        }
        let mac =
            HmacSha256::new_from_slice(&pair.signing).map_err(|_| KeyError::InvalidSigningKey)?;

        #[cfg(feature = "private")]
        let cipher = match pair.encryption.as_deref() {
            Some(key) => {
                Some(Cipher::new(key).ok_or(KeyError::EncryptionKeyLength(key.len()))?)
            }
            None => None,
        };

        #[cfg(not(feature = "private"))]
        if pair.encryption.is_some() {
            return Err(KeyError::EncryptionUnavailable);
        }

        Ok(Self {
            mac,
            #[cfg(feature = "private")]
            cipher,
            max_age: DEFAULT_MAX_AGE,
            max_length: DEFAULT_MAX_LENGTH,
        })
    }

    /// Tokens longer than `max_length` are rejected on both encode and decode. `0` disables
    /// the limit.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    fn check_length(&self, len: usize) -> Result<(), CodecError> {
        if self.max_length != 0 && len > self.max_length {
            return Err(CodecError::TooLong {
                len,
                max: self.max_length,
            });
        }
        Ok(())
    }

    fn signature(&self, name: &str, timestamp: &str, body: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(name.as_bytes());
        mac.update(b"|");
        mac.update(timestamp.as_bytes());
        mac.update(b"|");
        mac.update(body.as_bytes());
        mac
    }

    #[cfg_attr(not(feature = "private"), allow(unused_variables))]
    fn seal(&self, name: &str, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
        #[cfg(feature = "private")]
        if let Some(cipher) = &self.cipher {
            return cipher.seal(name, payload);
        }
        Ok(payload.to_vec())
    }

    #[cfg_attr(not(feature = "private"), allow(unused_variables))]
    fn open(&self, name: &str, body: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        #[cfg(feature = "private")]
        if let Some(cipher) = &self.cipher {
            return cipher.open(name, &body);
        }
        Ok(body)
    }

    fn encode_at(&self, name: &str, payload: &[u8], now: i64) -> Result<String, CodecError> {
        let body = URL_SAFE_NO_PAD.encode(self.seal(name, payload)?);
        let timestamp = now.to_string();
        let tag = self
            .signature(name, &timestamp, &body)
            .finalize()
            .into_bytes();

        let token = format!("{timestamp}.{body}.{}", URL_SAFE_NO_PAD.encode(tag));
        self.check_length(token.len())?;
        Ok(token)
    }

    fn decode_at(&self, name: &str, token: &str, now: i64) -> Result<Vec<u8>, CodecError> {
        self.check_length(token.len())?;

        let mut parts = token.splitn(3, '.');
        let (Some(timestamp), Some(body), Some(tag)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(CodecError::Malformed("expected three segments"));
        };
        if tag.contains('.') {
            return Err(CodecError::Malformed("expected three segments"));
        }

        let tag = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| CodecError::Malformed("signature is not base64"))?;
        self.signature(name, timestamp, body)
            .verify_slice(&tag)
            .map_err(|_| CodecError::InvalidMac)?;

        let issued: i64 = timestamp
            .parse()
            .map_err(|_| CodecError::Malformed("invalid timestamp"))?;
        if self.max_age != 0 && issued < now.saturating_sub(self.max_age) {
            return Err(CodecError::Expired);
        }

        let body = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| CodecError::Malformed("body is not base64"))?;
        self.open(name, body)
    }
}

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

impl Codec for SecureCookie {
    fn encode(&self, name: &str, payload: &[u8]) -> Result<String, CodecError> {
        self.encode_at(name, payload, now())
    }

    fn decode(&self, name: &str, token: &str) -> Result<Vec<u8>, CodecError> {
        self.decode_at(name, token, now())
    }

    fn set_max_age(&mut self, seconds: i64) {
        self.max_age = seconds;
    }
}

impl fmt::Debug for SecureCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("SecureCookie");
        #[cfg(feature = "private")]
        s.field("encrypted", &self.cipher.is_some());
        s.field("max_age", &self.max_age)
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

/// Ordered, non-empty list of codecs. The first codec that succeeds wins, for both encode
/// and decode.
#[derive(Debug)]
pub struct CodecSet {
    codecs: Vec<Box<dyn Codec>>,
}

impl CodecSet {
    /// Fails with [`Error::NoKeys`] when `codecs` is empty.
    pub fn new(codecs: Vec<Box<dyn Codec>>) -> Result<Self, Error> {
        if codecs.is_empty() {
            return Err(Error::NoKeys);
        }
        Ok(Self { codecs })
    }

    /// One [`SecureCookie`] per key pair, newest first.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = KeyPair>,
    {
        let codecs = pairs
            .into_iter()
            .enumerate()
            .map(|(index, pair)| {
                SecureCookie::new(&pair)
                    .map(|codec| Box::new(codec) as Box<dyn Codec>)
                    .map_err(|reason| Error::InvalidKey { index, reason })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(codecs)
    }

    /// Wrap `value` in an envelope and encode it with the first codec that succeeds.
    pub fn encode(&self, name: &str, value: &Value) -> Result<String, CodecErrors> {
        let payload = format::encode_value(value)?;
        let mut errors = CodecErrors::default();
        for codec in &self.codecs {
            match codec.encode(name, &payload) {
                Ok(token) => return Ok(token),
                Err(err) => errors.push(err),
            }
        }
        Err(errors)
    }

    /// Decode `token` with the first codec that accepts it.
    pub fn decode(&self, name: &str, token: &str) -> Result<Value, CodecErrors> {
        let mut errors = CodecErrors::default();
        for codec in &self.codecs {
            match codec
                .decode(name, token)
                .and_then(|payload| format::decode_value(&payload))
            {
                Ok(value) => return Ok(value),
                Err(err) => errors.push(err),
            }
        }
        Err(errors)
    }

    pub fn set_max_age(&mut self, seconds: i64) {
        for codec in &mut self.codecs {
            codec.set_max_age(seconds);
        }
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}
