use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use http::{Request, Response};
use tower_cookies::{CookieManager, Cookies};
use tower_layer::Layer;
use tower_service::Service;

use crate::{
    config::MultiCookieConfig,
    handle::SessionHandle,
    session::Session,
    store::{MultiCookieStore, cookie_name},
};

/// Loads a [`SessionHandle`] into every request and writes its values back as cookies.
///
/// The store is configured up front and shared read-only by every request.
#[derive(Debug, Clone)]
pub struct MultiCookieSessionLayer {
    store: Arc<MultiCookieStore>,
    config: MultiCookieConfig,
}

impl MultiCookieSessionLayer {
    #[must_use]
    pub fn new(store: MultiCookieStore) -> Self {
        Self {
            store: Arc::new(store),
            config: MultiCookieConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: MultiCookieConfig) -> Self {
        self.config = config;
        self
    }
}

#[derive(Debug, Clone)]
pub struct MultiCookieSessionManager<S> {
    inner: S,
    store: Arc<MultiCookieStore>,
    config: MultiCookieConfig,
}

impl<S> Layer<S> for MultiCookieSessionLayer {
    type Service = CookieManager<MultiCookieSessionManager<S>>;

    fn layer(&self, inner: S) -> Self::Service {
        CookieManager::new(MultiCookieSessionManager {
            inner,
            store: self.store.clone(),
            config: self.config.clone(),
        })
    }
}

fn load_session(
    store: &MultiCookieStore,
    config: &MultiCookieConfig,
    cookies: &Cookies,
) -> Session {
    let incoming = cookies.list();
    let pairs = incoming.iter().map(|cookie| (cookie.name(), cookie.value()));

    match store.load(config.name(), pairs) {
        Ok(session) => session,
        Err(err) => {
            let (session, errors) = err.into_parts();
            tracing::warn!(err = %errors, "multi-cookie session decode failed");
            if config.clear_on_decode_error {
                for name in errors.failed_cookies() {
                    cookies.remove(store.options().removal_cookie(name.to_owned()));
                }
            }
            session
        }
    }
}

fn persist_session(store: &MultiCookieStore, session: &Session, cookies: &Cookies) {
    for key in session.removed_keys() {
        let name = cookie_name(session.name(), key);
        cookies.remove(session.options().removal_cookie(name));
    }

    if let Err(errors) = store.save(session, |cookie| cookies.add(cookie)) {
        tracing::error!(err = %errors, "multi-cookie session save failed");
    }
}

impl<ReqBody, ResBody, S> Service<Request<ReqBody>> for MultiCookieSessionManager<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Default + Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let store = self.store.clone();
        let config = self.config.clone();

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let Some(cookies) = req.extensions().get::<Cookies>().cloned() else {
                let mut res = Response::default();
                *res.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
                return Ok(res);
            };

            let handle = SessionHandle::new(load_session(&store, &config, &cookies));
            req.extensions_mut().insert(handle.clone());

            let res = inner.call(req).await?;

            if res.status().is_server_error() {
                return Ok(res);
            }

            match handle.snapshot() {
                Ok(session) if session.is_modified() || config.always_save => {
                    persist_session(&store, &session, &cookies);
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(err = %err, "multi-cookie session save failed");
                }
            }

            Ok(res)
        })
    }
}
