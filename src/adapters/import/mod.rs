//! Template import collaborator state.

mod session_cache;

pub use session_cache::{ImportSessionCache, ImportSessionCacheConfig};
