use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    error::{Error, Result},
    session::Session,
};

/// Request-scoped access to the [`Session`] loaded by
/// [`MultiCookieSessionLayer`](crate::MultiCookieSessionLayer).
///
/// Clones share the same session. The layer reads it back after the inner service returns.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Session>> {
        self.inner.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Run `f` with exclusive access to the session.
    pub fn with<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Result<R> {
        Ok(f(&mut *self.lock()?))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.lock()?.get(key)
    }

    pub fn get_value(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.lock()?.get_value(key).cloned())
    }

    pub fn insert<T: Serialize>(&self, key: impl Into<String>, value: T) -> Result<()> {
        self.lock()?.insert(key, value)
    }

    pub fn insert_value(&self, key: impl Into<String>, value: Value) -> Result<Option<Value>> {
        Ok(self.lock()?.insert_value(key, value))
    }

    pub fn remove<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.lock()?.remove(key)
    }

    pub fn remove_value(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.lock()?.remove_value(key))
    }

    pub fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    pub fn is_new(&self) -> Result<bool> {
        Ok(self.lock()?.is_new())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    pub fn set_max_age(&self, seconds: i64) -> Result<()> {
        self.lock()?.set_max_age(seconds);
        Ok(())
    }

    /// Expire every cookie of the session on this response.
    pub fn delete(&self) -> Result<()> {
        self.lock()?.delete();
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> Result<Session> {
        Ok(self.lock()?.clone())
    }
}

#[cfg(feature = "axum")]
impl<S> axum_core::extract::FromRequestParts<S> for SessionHandle
where
    S: Send + Sync,
{
    type Rejection = (http::StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts.extensions.get::<SessionHandle>().cloned().ok_or((
            http::StatusCode::INTERNAL_SERVER_ERROR,
            "Can't extract session. Is `MultiCookieSessionLayer` enabled?",
        ))
    }
}
