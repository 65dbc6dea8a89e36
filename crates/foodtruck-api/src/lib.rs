//! Client for the Seattle food-truck REST API.
//!
//! [`FoodTruckApi`] is the seam the bot depends on; [`FoodTruckClient`] implements it over reqwest.

pub mod client;
pub mod types;

pub use client::{FoodTruckApi, FoodTruckClient};
pub use types::*;
