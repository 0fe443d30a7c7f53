pub mod config;
pub mod cookies;
pub mod csrf;
pub mod error;
pub mod identity;
pub mod client;
pub mod server;
