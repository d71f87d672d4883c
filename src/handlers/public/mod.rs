// handlers/public/mod.rs - endpoints that need no session
//
// Service info, health, and session acquisition/release.
pub mod session;
pub mod status;

pub use session::{login, logout};
pub use status::{health, root};
