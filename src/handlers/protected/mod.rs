// handlers/protected/mod.rs - endpoints behind the session guard
//
// Every route here is layered with `session_auth_middleware`, so handlers
// may rely on a `SessionUser` in request extensions.
pub mod fob;
pub mod stats;
pub mod summary;

pub use fob::{fob_query, fob_update};
pub use stats::stats_get;
pub use summary::summary_get;
