use std::net::SocketAddr;

use axum::{Router, routing::get};
use tower_sessions_multicookie::{
    CookieOptions, KeyPair, MultiCookieConfig, MultiCookieSessionLayer, MultiCookieStore,
    SameSite, SessionHandle,
};

async fn index(session: SessionHandle) -> String {
    let n: usize = session
        .get("n")
        .expect("session get succeeds")
        .unwrap_or(0);
    session.insert("n", n + 1).expect("session insert succeeds");
    session
        .insert("last_visit", time::OffsetDateTime::now_utc().unix_timestamp())
        .expect("session insert succeeds");
    format!("n={n}")
}

async fn logout(session: SessionHandle) -> &'static str {
    session.delete().expect("session delete succeeds");
    "bye"
}

#[tokio::main]
async fn main() {
    // Newest key pair first; older pairs only keep existing cookies readable.
    let current = KeyPair::generate();
    let previous = KeyPair::generate();

    let options = CookieOptions::default()
        // Default: "/"
        .with_path("/")
        // Default: 30 days
        .with_max_age(60 * 60)
        // Default: false (set to true behind HTTPS)
        .with_secure(false)
        // Default: true
        .with_http_only(true)
        // Default: SameSite::Lax
        .with_same_site(SameSite::Lax)
        // Default: None
        .without_domain();
    let store = MultiCookieStore::new([current, previous])
        .expect("key pairs are valid")
        .with_options(options);

    let config = MultiCookieConfig::default()
        // Default: "session"
        .with_name("app-session")
        // Default: false
        .with_always_save(false)
        // Default: true
        .with_clear_on_decode_error(true);
    let session_layer = MultiCookieSessionLayer::new(store).with_config(config);

    let app = Router::new()
        .route("/", get(index))
        .route("/logout", get(logout))
        .layer(session_layer);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("tcp listener binds successfully");
    let local_addr = listener.local_addr().expect("local address is available");
    println!("listening at http://{local_addr}");

    axum::serve(listener, app)
        .await
        .expect("server runs successfully");
}
