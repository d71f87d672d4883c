// handlers/mod.rs - two security tiers
//
// Public (no session) → Protected (session cookie or bearer token)
pub mod public;
pub mod protected;
