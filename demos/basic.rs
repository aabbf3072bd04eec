//! Session demo server
//!
//! Uses the id-based store over an in-memory table by default. Set
//! `SESSION_STORE=cookie` to keep the whole session in the cookie instead.

use salvo::prelude::*;
use salvo_cookie_sessions::{
    CookieStore, IdBasedSessionStore, MemoryStore, SessionConfig, SessionDepotExt, SessionHandler,
};

#[handler]
async fn index(depot: &mut Depot) -> String {
    let session = depot.session().expect("Session not found");

    let views: i32 = session.get("views").unwrap_or(0);
    if let Err(e) = session.set("views", views + 1) {
        return format!("Could not update session: {}", e);
    }

    format!("Hello! You have viewed this page {} time(s).", views + 1)
}

#[handler]
async fn get_user(depot: &mut Depot) -> String {
    let session = depot.session().expect("Session not found");

    match session.get::<String>("user") {
        Some(user) => format!("Logged in as: {}", user),
        None => "Not logged in".to_string(),
    }
}

#[handler]
async fn set_user(req: &mut Request, depot: &mut Depot) -> String {
    let session = depot.session().expect("Session not found");

    let username = req
        .query::<String>("name")
        .unwrap_or_else(|| "anonymous".to_string());
    if let Err(e) = session.set("user", &username) {
        return format!("Could not update session: {}", e);
    }

    format!("User set to: {}", username)
}

#[handler]
async fn logout(depot: &mut Depot) -> &'static str {
    let session = depot.session().expect("Session not found");

    // An emptied session is still saved, so the stored copy is emptied too
    session.clear();

    "Logged out successfully"
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let crypto = SessionConfig::new(
        "change-this-encryption-passphrase",
        "change-this-hmac-passphrase",
    )
    .cryptography()
    .expect("invalid session configuration");

    let session_handler = match std::env::var("SESSION_STORE").as_deref() {
        Ok("cookie") => SessionHandler::new(CookieStore::new(crypto)),
        _ => SessionHandler::new(IdBasedSessionStore::new(crypto, MemoryStore::new())),
    };

    let router = Router::new()
        .hoop(session_handler)
        .get(index)
        .push(Router::with_path("user").get(get_user))
        .push(Router::with_path("login").get(set_user))
        .push(Router::with_path("logout").get(logout));

    let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
    println!("Server running at http://127.0.0.1:5800");
    println!("Try these endpoints:");
    println!("  GET /           - View counter");
    println!("  GET /user       - Get current user");
    println!("  GET /login?name=alice - Set user");
    println!("  GET /logout     - Clear session");

    Server::new(acceptor).serve(router).await;
}
