//! # salvo-cookie-sessions
//!
//! Session middleware for the Salvo web framework with encrypted,
//! HMAC-authenticated session cookies.
//!
//! Every cookie value is `base64(hmac(ciphertext)) ++ ciphertext`: clients can
//! neither read nor alter it without the change being detected. Two
//! interchangeable strategies sit behind the [`SessionStore`] trait:
//!
//! - [`IdBasedSessionStore`]: the cookie carries an encrypted session id and
//!   the items live in an [`IdBackingStore`] ([`MemoryStore`], or `RedisStore`
//!   with the `redis-store` feature)
//! - [`CookieStore`]: the cookie carries the whole encrypted session, nothing
//!   is kept on the server
//!
//! Sessions are only written back when handler code changed them.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salvo::prelude::*;
//! use salvo_cookie_sessions::{
//!     IdBasedSessionStore, MemoryStore, SessionConfig, SessionDepotExt, SessionHandler,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let crypto = SessionConfig::new("encryption passphrase", "hmac passphrase")
//!         .cryptography()
//!         .unwrap();
//!     let store = IdBasedSessionStore::new(crypto, MemoryStore::new());
//!
//!     let router = Router::new()
//!         .hoop(SessionHandler::new(store))
//!         .get(index);
//!
//!     let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
//!     Server::new(acceptor).serve(router).await;
//! }
//!
//! #[handler]
//! async fn index(depot: &mut Depot) -> String {
//!     let session = depot.session().unwrap();
//!     let views: i32 = session.get("views").unwrap_or(0);
//!     session.set("views", views + 1).unwrap();
//!     format!("{} views", views + 1)
//! }
//! ```
//!
//! A runnable version lives in `demos/basic.rs` and is registered as the
//! `basic` example target: `cargo run --example basic`.

pub mod config;
pub mod cookie_codec;
pub mod crypto;
pub mod error;
pub mod handler;
pub mod serializer;
pub mod session;
pub mod store;

pub use config::SessionConfig;
pub use cookie_codec::CookieCodec;
pub use crypto::{
    AesGcmEncryptionProvider, CryptographyConfig, EncryptionProvider, HmacProvider,
    HmacSha256Provider, KeyGenerator, PassphraseKeyGenerator, RandomKeyGenerator,
};
pub use error::SessionError;
pub use handler::{load_session, save_session, SessionHandler};
pub use serializer::{JsonSerializer, ObjectSerializer};
pub use session::{Session, SessionItems};
pub use store::{
    CookieStore, IdBackingStore, IdBasedSessionStore, MemoryStore, SessionStore, ID_COOKIE_NAME,
    SELF_CONTAINED_COOKIE_NAME,
};

#[cfg(feature = "redis-store")]
pub use store::RedisStore;

/// Extension trait for Depot to easily access session
pub mod depot_ext;
pub use depot_ext::SessionDepotExt;
