use chrono::Local;
use foodtruck_core::error::{FoodtruckError, Result};
use tracing::{info, warn};

use super::Brain;
use crate::service::schedule::Schedule;

impl Brain {
    /// The broadcast schedule, or `None` when no channel or no locations are configured.
    pub fn broadcast_schedule(&self) -> Result<Option<Schedule>> {
        if !self.broadcast.is_enabled() {
            info!("[sched] broadcast channel or locations not set, daily broadcast disabled");
            return Ok(None);
        }
        self.broadcast.schedule.parse().map(Some)
    }

    /// Sleep until each firing of `schedule`, then broadcast. Runs until cancelled.
    pub async fn run_broadcast_loop(&self, schedule: Schedule) -> Result<()> {
        info!(
            channel = %self.broadcast.channel,
            schedule = %self.broadcast.schedule,
            "[sched] daily broadcast loop started"
        );

        loop {
            let now = Local::now();
            let next = schedule.next_after(&now).ok_or_else(|| {
                FoodtruckError::InvalidConfig(format!(
                    "schedule {:?} never fires",
                    self.broadcast.schedule
                ))
            })?;
            info!(next = %next, "[sched] next broadcast");

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            self.broadcast().await;
        }
    }

    /// Today's trucks for every configured location, one block per location.
    pub async fn broadcast_message(&self) -> String {
        let mut segments = Vec::with_capacity(self.broadcast.location_ids.len());
        for location in &self.broadcast.location_ids {
            segments.push(self.dispatcher.trucks_at(location).await);
        }
        segments.join("\n\n")
    }

    pub async fn broadcast(&self) {
        let message = self.broadcast_message().await;
        match self.chat.send_message(&self.broadcast.channel, &message).await {
            Ok(()) => info!(channel = %self.broadcast.channel, "[sched] broadcast sent"),
            Err(e) => warn!(channel = %self.broadcast.channel, error = %e, "[sched] broadcast failed"),
        }
    }
}
