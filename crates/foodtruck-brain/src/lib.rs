pub mod brain;
pub mod service;

pub use brain::Brain;
