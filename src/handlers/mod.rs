pub mod fallback;
pub mod health;
pub mod index;
pub mod proxy;

pub use fallback::{method_not_allowed, not_found};
pub use health::health_handler;
pub use index::index_handler;
pub use proxy::proxy_handler;
