//! Session store implementations

mod cookie;
mod id_based;
mod memory;
mod traits;

pub use cookie::{CookieStore, SELF_CONTAINED_COOKIE_NAME};
pub use id_based::{IdBasedSessionStore, ID_COOKIE_NAME};
pub use memory::MemoryStore;
pub use traits::{IdBackingStore, SessionStore};

#[cfg(feature = "redis-store")]
mod redis_store;

#[cfg(feature = "redis-store")]
pub use redis_store::RedisStore;
