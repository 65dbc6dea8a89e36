pub mod bot;
pub mod types;

pub use bot::TelegramBot;
