use std::borrow::Cow;

use time::{Duration, OffsetDateTime};
use tower_cookies::Cookie;

use crate::{SameSite, codec::DEFAULT_MAX_AGE};

/// Attributes shared by every cookie of one session.
///
/// `max_age` is in seconds: a positive value emits `Max-Age`, `0` leaves the attribute off
/// (a browser-session cookie) and a negative value expires the cookies immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: Cow<'static, str>,
    pub domain: Option<Cow<'static, str>>,
    pub max_age: i64,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".into(),
            domain: None,
            max_age: DEFAULT_MAX_AGE,
            secure: false,
            http_only: true,
            same_site: SameSite::Lax,
        }
    }
}

impl CookieOptions {
    #[must_use]
    pub fn with_path<P: Into<Cow<'static, str>>>(mut self, path: P) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn with_domain<D: Into<Cow<'static, str>>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn without_domain(mut self) -> Self {
        self.domain = None;
        self
    }

    #[must_use]
    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = seconds;
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Build the `Set-Cookie` value for `name` carrying `value`.
    pub fn build_cookie(&self, name: String, value: String) -> Cookie<'static> {
        let mut cookie_builder = Cookie::build((name, value))
            .http_only(self.http_only)
            .same_site(self.same_site)
            .secure(self.secure)
            .path(self.path.clone());

        match self.max_age {
            0 => {}
            age if age > 0 => {
                cookie_builder = cookie_builder.max_age(Duration::seconds(age));
            }
            _ => {
                cookie_builder = cookie_builder
                    .max_age(Duration::ZERO)
                    .expires(OffsetDateTime::UNIX_EPOCH);
            }
        }

        if let Some(domain) = self.domain.clone() {
            cookie_builder = cookie_builder.domain(domain);
        }

        cookie_builder.build()
    }

    /// A cookie carrying only the attributes needed to remove `name` from the client.
    pub(crate) fn removal_cookie(&self, name: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(name, "");
        cookie.set_path(self.path.clone());
        if let Some(domain) = self.domain.clone() {
            cookie.set_domain(domain);
        }
        cookie
    }
}

/// Settings for [`MultiCookieSessionLayer`](crate::MultiCookieSessionLayer).
#[derive(Debug, Clone)]
pub struct MultiCookieConfig {
    pub(crate) name: Cow<'static, str>,
    pub(crate) always_save: bool,
    pub(crate) clear_on_decode_error: bool,
}

impl Default for MultiCookieConfig {
    fn default() -> Self {
        Self {
            name: "session".into(),
            always_save: false,
            clear_on_decode_error: true,
        }
    }
}

impl MultiCookieConfig {
    /// Session name. Every cookie of the session is called `<name>-<key>`.
    #[must_use]
    pub fn with_name<N: Into<Cow<'static, str>>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    /// Re-issue every cookie on each successful response, refreshing signed timestamps.
    #[must_use]
    pub fn with_always_save(mut self, always_save: bool) -> Self {
        self.always_save = always_save;
        self
    }

    /// Remove cookies in the session's namespace that fail to decode.
    #[must_use]
    pub fn with_clear_on_decode_error(mut self, clear_on_decode_error: bool) -> Self {
        self.clear_on_decode_error = clear_on_decode_error;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
