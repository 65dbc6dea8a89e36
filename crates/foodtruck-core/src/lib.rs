pub mod chat;
pub mod config;
pub mod error;
pub mod logger;
