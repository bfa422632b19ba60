use tower_cookies::Cookie;

use crate::{
    codec::{Codec, CodecSet, KeyPair},
    config::CookieOptions,
    error::{Error, LoadError, SessionErrors},
    session::Session,
};

const SEPARATOR: char = '-';

/// Stores each session value in its own signed (and optionally encrypted) cookie.
///
/// All cookies of a session are named `<session-name>-<key>`. Keeping session names apart
/// from each other's keys is the application's responsibility.
#[derive(Debug)]
pub struct MultiCookieStore {
    codecs: CodecSet,
    options: CookieOptions,
}

impl MultiCookieStore {
    /// Build a store from key pairs, newest first. Older pairs are only useful to keep
    /// decoding cookies issued before a rotation.
    pub fn new<I>(key_pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = KeyPair>,
    {
        Ok(Self::with_codec_set(CodecSet::from_pairs(key_pairs)?))
    }

    /// Build a store from custom codecs, tried in order.
    pub fn with_codecs(codecs: Vec<Box<dyn Codec>>) -> Result<Self, Error> {
        Ok(Self::with_codec_set(CodecSet::new(codecs)?))
    }

    fn with_codec_set(codecs: CodecSet) -> Self {
        let mut store = Self {
            codecs,
            options: CookieOptions::default(),
        };
        store.max_age(store.options.max_age);
        store
    }

    /// Replace the default cookie options. The options' max-age is also applied to the
    /// codecs.
    #[must_use]
    pub fn with_options(mut self, options: CookieOptions) -> Self {
        let max_age = options.max_age;
        self.options = options;
        self.max_age(max_age);
        self
    }

    /// Set the default max-age for new sessions and the expiry window of every codec.
    pub fn max_age(&mut self, seconds: i64) {
        self.options.max_age = seconds;
        self.codecs.set_max_age(seconds);
    }

    pub fn options(&self) -> &CookieOptions {
        &self.options
    }

    pub fn codecs(&self) -> &CodecSet {
        &self.codecs
    }

    /// Rebuild the session called `name` from the request's cookies.
    ///
    /// Cookies outside the session's namespace are ignored. A cookie that fails to decode
    /// does not stop the scan: the returned [`LoadError`] still carries every value that did
    /// decode.
    pub fn load<I, N, V>(&self, name: &str, cookies: I) -> Result<Session, LoadError>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let mut session = Session::new(name, self.options.clone());
        let mut errors = SessionErrors::new("creating session");
        let prefix = format!("{name}{SEPARATOR}");

        for (cookie_name, token) in cookies {
            let cookie_name = cookie_name.as_ref();
            let Some(key) = cookie_name.strip_prefix(&prefix) else {
                continue;
            };

            match self.codecs.decode(cookie_name, token.as_ref()) {
                Ok(value) => session.load_value(key.to_owned(), value),
                Err(errs) => {
                    tracing::debug!(cookie = cookie_name, err = %errs, "session cookie decode failed");
                    errors.push(Error::Decode {
                        name: cookie_name.to_owned(),
                        errors: errs,
                    });
                }
            }
        }

        match errors.into_result() {
            Ok(()) => Ok(session),
            Err(errors) => Err(LoadError::new(session, errors)),
        }
    }

    /// Encode every value of `session` and hand one cookie per value to `deliver`.
    ///
    /// Keys that cannot form a cookie name and values that fail to encode are skipped and
    /// reported together; every other value is still delivered.
    pub fn save<F>(&self, session: &Session, mut deliver: F) -> Result<(), SessionErrors>
    where
        F: FnMut(Cookie<'static>),
    {
        let mut errors = SessionErrors::new("saving session");

        for (key, value) in session.values() {
            if !is_cookie_name_safe(key) {
                errors.push(Error::KeyRender { key: key.clone() });
                continue;
            }

            let cookie_name = cookie_name(session.name(), key);
            match self.codecs.encode(&cookie_name, value) {
                Ok(token) => deliver(session.options().build_cookie(cookie_name, token)),
                Err(errs) => errors.push(Error::Encode {
                    name: cookie_name,
                    errors: errs,
                }),
            }
        }

        errors.into_result()
    }
}

pub(crate) fn cookie_name(session: &str, key: &str) -> String {
    format!("{session}{SEPARATOR}{key}")
}

// RFC 6265 cookie-name: an RFC 2616 token.
fn is_cookie_name_safe(key: &str) -> bool {
    !key.is_empty()
        && key.bytes().all(|b| {
            b.is_ascii_graphic()
                && !matches!(
                    b,
                    b'(' | b')'
                        | b'<'
                        | b'>'
                        | b'@'
                        | b','
                        | b';'
                        | b':'
                        | b'\\'
                        | b'"'
                        | b'/'
                        | b'['
                        | b']'
                        | b'?'
                        | b'='
                        | b'{'
                        | b'}'
                )
        })
}
