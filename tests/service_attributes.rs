// Tests for how `CookieOptions` and `MultiCookieConfig` map to emitted cookies.
mod common;

use axum::body::Body;
use http::{Request, header};
use tower::{ServiceBuilder, ServiceExt as _};

use tower_sessions_multicookie::{
    CookieOptions, KeyPair, MultiCookieConfig, MultiCookieSessionLayer, SameSite,
};

async fn cookies_for(options: CookieOptions) -> Vec<tower_cookies::Cookie<'static>> {
    let store = common::make_store(vec![KeyPair::generate()]).with_options(options);
    let svc = ServiceBuilder::new()
        .layer(MultiCookieSessionLayer::new(store))
        .service_fn(common::handler);

    let req = Request::builder()
        .body(Body::empty())
        .expect("request builds successfully");
    let res = svc.oneshot(req).await.expect("service call succeeds");
    common::set_cookies(res.headers())
}

#[tokio::test]
async fn foreign_cookies_are_cleared() {
    // Exercise: cookies issued under one key are sent to a layer with another key.
    // Expectation: every cookie fails to decode and is cleared, even though the handler does
    // not touch the session.
    let (_key, writer) = common::make_layer(MultiCookieConfig::default());
    let writer = ServiceBuilder::new()
        .layer(writer)
        .service_fn(common::handler);
    let (_key, reader) = common::make_layer(MultiCookieConfig::default());
    let reader = ServiceBuilder::new()
        .layer(reader)
        .service_fn(common::noop_handler);

    let req = Request::builder()
        .body(Body::empty())
        .expect("request builds successfully");
    let res = writer.oneshot(req).await.expect("service call succeeds");
    let cookies = common::set_cookies(res.headers());
    assert_eq!(common::cookie_names(&cookies), ["session-a", "session-b"]);

    let req = Request::builder()
        .header(header::COOKIE, common::cookie_header_value(&cookies))
        .body(Body::empty())
        .expect("request builds successfully");
    let res = reader.oneshot(req).await.expect("service call succeeds");

    let cleared = common::set_cookies(res.headers());
    assert_eq!(common::cookie_names(&cleared), ["session-a", "session-b"]);
    assert!(cleared.iter().all(common::is_removal));
}

#[tokio::test]
async fn read_only_request_sets_nothing() {
    // Exercise: send valid cookies to a handler that does not touch the session.
    // Expectation: no `Set-Cookie` is emitted.
    let key = KeyPair::generate();
    let writer = ServiceBuilder::new()
        .layer(MultiCookieSessionLayer::new(common::make_store(vec![key.clone()])))
        .service_fn(common::handler);
    let reader = ServiceBuilder::new()
        .layer(MultiCookieSessionLayer::new(common::make_store(vec![key])))
        .service_fn(common::noop_handler);

    let req = Request::builder()
        .body(Body::empty())
        .expect("request builds successfully");
    let res = writer.oneshot(req).await.expect("service call succeeds");
    let cookies = common::set_cookies(res.headers());

    let req = Request::builder()
        .header(header::COOKIE, common::cookie_header_value(&cookies))
        .body(Body::empty())
        .expect("request builds successfully");
    let res = reader.oneshot(req).await.expect("service call succeeds");

    assert!(res.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn always_save_reissues_cookies() {
    // Exercise: `always_save=true` with a handler that does not touch the session.
    // Expectation: every cookie sent by the client is re-issued with a fresh token.
    let key = KeyPair::generate();
    let writer = ServiceBuilder::new()
        .layer(MultiCookieSessionLayer::new(common::make_store(vec![key.clone()])))
        .service_fn(common::handler);
    let reader = ServiceBuilder::new()
        .layer(
            MultiCookieSessionLayer::new(common::make_store(vec![key]))
                .with_config(MultiCookieConfig::default().with_always_save(true)),
        )
        .service_fn(common::noop_handler);

    let req = Request::builder()
        .body(Body::empty())
        .expect("request builds successfully");
    let res = writer.oneshot(req).await.expect("service call succeeds");
    let cookies = common::set_cookies(res.headers());

    let req = Request::builder()
        .header(header::COOKIE, common::cookie_header_value(&cookies))
        .body(Body::empty())
        .expect("request builds successfully");
    let res = reader.oneshot(req).await.expect("service call succeeds");

    let reissued = common::set_cookies(res.headers());
    assert_eq!(common::cookie_names(&reissued), ["session-a", "session-b"]);
    assert!(!reissued.iter().any(common::is_removal));
}

#[tokio::test]
async fn default_attributes() {
    let cookies = cookies_for(CookieOptions::default()).await;

    for cookie in &cookies {
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), None);
        assert_eq!(cookie.domain(), None);
        assert_eq!(
            cookie.max_age().map(|age| age.whole_seconds()),
            Some(tower_sessions_multicookie::DEFAULT_MAX_AGE)
        );
    }
}

#[tokio::test]
async fn http_only_test() {
    let cookies = cookies_for(CookieOptions::default().with_http_only(false)).await;
    assert!(cookies.iter().all(|cookie| cookie.http_only().is_none()));
}

#[tokio::test]
async fn secure_test() {
    let cookies = cookies_for(CookieOptions::default().with_secure(true)).await;
    assert!(cookies.iter().all(|cookie| cookie.secure() == Some(true)));
}

#[tokio::test]
async fn same_site_strict_test() {
    let cookies = cookies_for(CookieOptions::default().with_same_site(SameSite::Strict)).await;
    assert!(
        cookies
            .iter()
            .all(|cookie| cookie.same_site() == Some(SameSite::Strict))
    );
}

#[tokio::test]
async fn path_test() {
    let cookies = cookies_for(CookieOptions::default().with_path("/foo/bar")).await;
    assert!(cookies.iter().all(|cookie| cookie.path() == Some("/foo/bar")));
}

#[tokio::test]
async fn domain_test() {
    let cookies = cookies_for(CookieOptions::default().with_domain("example.com")).await;
    assert!(
        cookies
            .iter()
            .all(|cookie| cookie.domain() == Some("example.com"))
    );
}
