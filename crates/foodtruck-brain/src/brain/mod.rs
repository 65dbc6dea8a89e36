use std::sync::Arc;

use foodtruck_api::FoodTruckApi;
use foodtruck_core::chat::ChatTransport;
use foodtruck_core::config::{BroadcastConfig, Config};

use crate::service::dispatcher::Dispatcher;

mod router;
mod scheduling;

pub use router::addressed_text;

/// Shared bot context: built once at startup and handed to the event loop and the
/// broadcast loop behind an `Arc`.
pub struct Brain {
    pub(crate) dispatcher: Dispatcher,
    pub(crate) chat: Arc<dyn ChatTransport>,
    pub(crate) broadcast: BroadcastConfig,
}

impl Brain {
    pub fn new(config: &Config, api: Arc<dyn FoodTruckApi>, chat: Arc<dyn ChatTransport>) -> Self {
        Self {
            dispatcher: Dispatcher::new(api, config.api.photo_base_url.clone()),
            chat,
            broadcast: config.broadcast.clone(),
        }
    }
}
