pub mod fob;
pub mod record;
