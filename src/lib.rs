pub mod app;
pub mod auth;
pub mod cases;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod records;
pub mod stats;
pub mod survey;
