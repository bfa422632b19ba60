#![allow(dead_code)]

// Shared helpers for integration tests.
//
// Set-Cookie headers are parsed with `tower_cookies::Cookie` so assertions see the same
// attributes a browser would.
use std::convert::Infallible;

use axum::body::Body;
use http::{HeaderMap, Request, Response, header};
use http_body_util::BodyExt as _;
use tower_cookies::Cookie;
use tower_sessions_multicookie::{
    KeyPair, MultiCookieConfig, MultiCookieSessionLayer, MultiCookieStore, SessionHandle,
};

pub async fn body_string(body: Body) -> String {
    // Collect an Axum body into a UTF-8 string for assertions.
    let bytes = body
        .collect()
        .await
        .expect("body collects successfully")
        .to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub async fn handler(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    // Basic handler used by many tests: write two keys into the session.
    let session = req
        .extensions()
        .get::<SessionHandle>()
        .cloned()
        .expect("request includes SessionHandle extension");

    session.insert("a", 1).expect("session insert succeeds");
    session.insert("b", 2).expect("session insert succeeds");

    Ok(Response::new(Body::empty()))
}

pub async fn noop_handler(_: Request<Body>) -> Result<Response<Body>, Infallible> {
    // Handler that does not access the session at all.
    Ok(Response::new(Body::empty()))
}

pub fn make_store(keys: Vec<KeyPair>) -> MultiCookieStore {
    MultiCookieStore::new(keys).expect("store builds")
}

pub fn make_layer(config: MultiCookieConfig) -> (KeyPair, MultiCookieSessionLayer) {
    // Create a layer with a single fresh key pair and return the pair for tests that build a
    // second layer sharing the key.
    let key = KeyPair::generate();
    let layer = MultiCookieSessionLayer::new(make_store(vec![key.clone()])).with_config(config);
    (key, layer)
}

pub fn set_cookies(headers: &HeaderMap) -> Vec<Cookie<'static>> {
    // Parse every `Set-Cookie` header, sorted by name.
    let mut cookies: Vec<Cookie<'static>> = headers
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| {
            let value = value
                .to_str()
                .expect("set-cookie header is valid utf-8")
                .to_owned();
            Cookie::parse(value).expect("set-cookie parses successfully")
        })
        .collect();
    cookies.sort_by(|a, b| a.name().cmp(b.name()));
    cookies
}

pub fn set_cookie(headers: &HeaderMap, name: &str) -> Cookie<'static> {
    set_cookies(headers)
        .into_iter()
        .find(|cookie| cookie.name() == name)
        .expect("response sets the named cookie")
}

pub fn cookie_names(cookies: &[Cookie<'_>]) -> Vec<String> {
    cookies.iter().map(|cookie| cookie.name().to_owned()).collect()
}

pub fn is_removal(cookie: &Cookie<'_>) -> bool {
    cookie.value().is_empty() && cookie.max_age() == Some(time::Duration::ZERO)
}

pub fn cookie_header_value(cookies: &[Cookie<'_>]) -> String {
    // Encode cookies for use in a `Cookie` request header.
    cookies
        .iter()
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect::<Vec<_>>()
        .join("; ")
}
