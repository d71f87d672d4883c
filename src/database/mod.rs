pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use models::fob::FobData;
pub use postgres::PgStore;
pub use store::{open_store, DashboardStore};
