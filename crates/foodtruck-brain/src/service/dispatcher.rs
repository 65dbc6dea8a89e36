use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use foodtruck_api::{Event, FoodTruckApi, LocationEventsQuery, LocationQuery};
use foodtruck_core::error::{FoodtruckError, Result};
use tracing::{debug, warn};

use super::command::{parse_command, Command};

pub const HELP_TEXT: &str = "**You can ask me:**\n\
• **show neighborhoods** - to see neighborhoods served\n\
• **show locations in <neighborhood>** - to see food truck locations in a neighborhood\n\
• **show trucks at <location>** - to see food trucks at a location";

pub const FALLBACK_TEXT: &str =
    "Sorry I cannot help you with this, please try help to see things you can ask me";

/// Turns command text into a reply, calling the food-truck API as needed.
pub struct Dispatcher {
    api: Arc<dyn FoodTruckApi>,
    photo_base_url: String,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn FoodTruckApi>, photo_base_url: impl Into<String>) -> Self {
        Self {
            api,
            photo_base_url: photo_base_url.into(),
        }
    }

    /// Reply to mention-stripped, trimmed, lower-cased text. Failures become the reply.
    pub async fn respond(&self, text: &str) -> String {
        match parse_command(text) {
            Command::Help => HELP_TEXT.to_string(),
            Command::ShowNeighborhoods => reply(self.neighborhoods().await),
            Command::ShowLocations { neighborhood } => {
                reply(self.locations(neighborhood.as_deref()).await)
            }
            Command::ShowTrucks {
                location: Some(location),
            } => self.trucks_at(&location).await,
            Command::ShowTrucks { location: None } => reply(Err(
                FoodtruckError::MissingParameter("Missing location".to_string()),
            )),
            Command::Unknown => FALLBACK_TEXT.to_string(),
        }
    }

    async fn neighborhoods(&self) -> Result<String> {
        let list = self.api.fetch_neighborhoods().await?;
        if list.neighborhoods.is_empty() {
            return Err(FoodtruckError::NotFound("No Neighborhoods found".to_string()));
        }

        let mut message = "**You can find food trucks in following neighborhoods**".to_string();
        for n in &list.neighborhoods {
            message.push_str(&format!("\n• {}", n.id));
        }
        Ok(message)
    }

    async fn locations(&self, neighborhood: Option<&str>) -> Result<String> {
        let neighborhood = neighborhood.ok_or_else(|| {
            FoodtruckError::MissingParameter("Missing neighborhood".to_string())
        })?;

        let list = self
            .api
            .fetch_locations(&LocationQuery::new(neighborhood))
            .await?;
        if list.locations.is_empty() {
            return Err(FoodtruckError::NotFound(format!(
                "No locations found at {neighborhood} neighborhood"
            )));
        }

        let mut message = "**You can find food trucks in following locations**".to_string();
        for l in &list.locations {
            message.push_str(&format!("\n• {} - {}", l.name, l.uid));
        }
        Ok(message)
    }

    /// Today's trucks at a location, as one reply block. Shared with the daily broadcast.
    pub async fn trucks_at(&self, location: &str) -> String {
        let today = Local::now().date_naive();
        self.trucks_on(location, today, &Local).await
    }

    /// Trucks at `location` for the event that starts on `day` in zone `tz`.
    pub async fn trucks_on<Tz>(&self, location: &str, day: NaiveDate, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        reply(self.todays_event_text(location, day, tz).await)
    }

    async fn todays_event_text<Tz>(&self, location: &str, day: NaiveDate, tz: &Tz) -> Result<String>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        // Unparseable ids fall back to 0, which the query turns into the default location.
        let location_id = location.parse::<u32>().unwrap_or(0);
        let list = self
            .api
            .fetch_location_events(&LocationEventsQuery::new(location_id, 1))
            .await?;

        if list.events.is_empty() {
            return Err(FoodtruckError::NotFound(format!("No events at {location}")));
        }

        let index = find_event_on(&list.events, day, tz).ok_or_else(|| {
            FoodtruckError::NotFound(format!("No food trucks found at {location}"))
        })?;

        Ok(self.format_event(&list.events[index], tz))
    }

    fn format_event<Tz>(&self, event: &Event, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let start = local_time(&event.start_time, tz);
        let end = local_time(&event.end_time, tz);

        let mut message = match (start, end) {
            (Some(st), Some(et)) => format!(
                "{} {} - {}",
                st.format("%B %-d"),
                st.format("%-I:%M%p"),
                et.format("%-I:%M%p")
            ),
            _ => format!("{} - {}", event.start_time, event.end_time),
        };

        for booking in &event.bookings {
            let truck = &booking.truck;
            message.push_str(&format!(
                "\n• **{}** ({})",
                truck.name,
                truck.food_categories.join(", ")
            ));
            if let Some(photo) = truck.featured_photo.as_deref().filter(|p| !p.is_empty()) {
                message.push_str(&format!(" {}{photo}", self.photo_base_url));
            }
        }
        message
    }
}

/// Index of the first event (API order) whose start falls on `day` in zone `tz`.
pub fn find_event_on<Tz: TimeZone>(events: &[Event], day: NaiveDate, tz: &Tz) -> Option<usize> {
    events
        .iter()
        .position(|e| local_time(&e.start_time, tz).map(|st| st.date_naive()) == Some(day))
}

fn local_time<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(tz)),
        Err(e) => {
            debug!(raw, error = %e, "[trucks] unparseable event time");
            None
        }
    }
}

fn reply(result: Result<String>) -> String {
    match result {
        Ok(message) => message,
        Err(e @ (FoodtruckError::MissingParameter(_) | FoodtruckError::NotFound(_))) => e.to_string(),
        Err(e) => {
            warn!(error = %e, "[dispatch] request failed");
            e.to_string()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::FixedOffset;
    use foodtruck_api::{EventList, LocationList, NeighborhoodList};
    use serde_json::json;
    use std::sync::Mutex;

    pub(crate) const PHOTO_URL: &str = "https://photos.example/";

    /// In-memory API. Records every call as "<endpoint>?<query>".
    #[derive(Default)]
    pub(crate) struct FakeApi {
        pub neighborhoods: Vec<serde_json::Value>,
        pub locations: Vec<serde_json::Value>,
        pub events: Vec<serde_json::Value>,
        pub fail_locations: Vec<u32>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FoodTruckApi for FakeApi {
        async fn fetch_neighborhoods(&self) -> Result<NeighborhoodList> {
            self.calls.lock().unwrap().push("neighborhoods".to_string());
            Ok(serde_json::from_value(json!({ "neighborhoods": self.neighborhoods }))?)
        }

        async fn fetch_locations(&self, query: &LocationQuery) -> Result<LocationList> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("locations?{}", query.query_string()));
            Ok(serde_json::from_value(json!({ "locations": self.locations }))?)
        }

        async fn fetch_location_events(&self, query: &LocationEventsQuery) -> Result<EventList> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("events?{}", query.query_string()));
            if self.fail_locations.contains(&query.location) {
                return Err(FoodtruckError::Network(format!(
                    "failed to query /api/events: location {} unreachable",
                    query.location
                )));
            }
            Ok(serde_json::from_value(json!({ "events": self.events }))?)
        }
    }

    pub(crate) fn event_json(id: i64, start: &str, end: &str, trucks: &[&str]) -> serde_json::Value {
        let bookings: Vec<_> = trucks
            .iter()
            .enumerate()
            .map(|(i, name)| {
                json!({
                    "id": 100 + i as i64,
                    "status": "approved",
                    "paid": true,
                    "truck": {
                        "name": name,
                        "trailer": false,
                        "food_categories": ["Tacos", "Mexican"],
                        "featured_photo": format!("trucks/{}.jpg", name.to_lowercase()),
                    }
                })
            })
            .collect();
        json!({ "id": id, "name": "Lunch", "start_time": start, "end_time": end, "bookings": bookings })
    }

    fn pacific() -> FixedOffset {
        FixedOffset::west_opt(7 * 3600).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn events(values: Vec<serde_json::Value>) -> Vec<Event> {
        serde_json::from_value(json!(values)).unwrap()
    }

    fn dispatcher(api: FakeApi) -> (Dispatcher, Arc<FakeApi>) {
        let api = Arc::new(api);
        (Dispatcher::new(api.clone(), PHOTO_URL), api)
    }

    #[test]
    fn test_find_event_picks_first_match_for_today() {
        let list = events(vec![
            event_json(1, "2026-10-18T11:00:00-07:00", "2026-10-18T14:00:00-07:00", &[]),
            event_json(2, "2026-10-19T11:00:00-07:00", "2026-10-19T14:00:00-07:00", &[]),
            event_json(3, "2026-10-20T11:00:00-07:00", "2026-10-20T14:00:00-07:00", &[]),
        ]);
        assert_eq!(find_event_on(&list, today(), &pacific()), Some(1));
    }

    #[test]
    fn test_find_event_never_prefers_later_match() {
        let list = events(vec![
            event_json(1, "2026-10-18T11:00:00-07:00", "2026-10-18T14:00:00-07:00", &[]),
            event_json(2, "2026-10-19T11:00:00-07:00", "2026-10-19T14:00:00-07:00", &[]),
            event_json(3, "2026-10-19T17:00:00-07:00", "2026-10-19T20:00:00-07:00", &[]),
        ]);
        assert_eq!(find_event_on(&list, today(), &pacific()), Some(1));
    }

    #[test]
    fn test_find_event_uses_local_calendar_day() {
        // 02:00 UTC on the 20th is still the 19th in Seattle.
        let list = events(vec![event_json(
            1,
            "2026-10-20T02:00:00.000Z",
            "2026-10-20T04:00:00.000Z",
            &[],
        )]);
        assert_eq!(find_event_on(&list, today(), &pacific()), Some(0));
    }

    #[test]
    fn test_find_event_no_match_or_bad_time() {
        let list = events(vec![
            event_json(1, "2026-10-18T11:00:00-07:00", "2026-10-18T14:00:00-07:00", &[]),
            event_json(2, "not a date", "not a date", &[]),
        ]);
        assert_eq!(find_event_on(&list, today(), &pacific()), None);
    }

    #[tokio::test]
    async fn test_help_and_fallback() {
        let (d, api) = dispatcher(FakeApi::default());
        let help = d.respond("help").await;
        assert_eq!(help, HELP_TEXT);
        assert_eq!(help.lines().count(), 4);
        assert_eq!(d.respond("help me").await, FALLBACK_TEXT);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_show_neighborhoods() {
        let (d, _) = dispatcher(FakeApi {
            neighborhoods: vec![json!({"id": "ballard"}), json!({"id": "bellevue"})],
            ..Default::default()
        });
        let reply = d.respond("show neighborhoods").await;
        let lines: Vec<_> = reply.lines().collect();
        assert_eq!(lines[1..], ["• ballard", "• bellevue"]);
    }

    #[tokio::test]
    async fn test_show_neighborhoods_empty() {
        let (d, _) = dispatcher(FakeApi::default());
        assert_eq!(d.respond("show neighborhoods").await, "No Neighborhoods found");
    }

    #[tokio::test]
    async fn test_show_locations() {
        let (d, api) = dispatcher(FakeApi {
            locations: vec![
                json!({"id": "fremont-brewing", "uid": 81, "name": "Fremont Brewing"}),
                json!({"id": "t-mobile", "uid": 44, "name": "T-Mobile Factoria"}),
            ],
            ..Default::default()
        });
        let reply = d.respond("show locations in fremont").await;
        let lines: Vec<_> = reply.lines().collect();
        assert_eq!(lines[1..], ["• Fremont Brewing - 81", "• T-Mobile Factoria - 44"]);
        assert!(api.calls()[0].contains("neighborhood=fremont"));
    }

    #[tokio::test]
    async fn test_show_locations_missing_neighborhood_skips_api() {
        let (d, api) = dispatcher(FakeApi::default());
        assert_eq!(d.respond("show locations in ").await, "Missing neighborhood");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_show_locations_empty() {
        let (d, _) = dispatcher(FakeApi::default());
        assert_eq!(
            d.respond("show locations in ballard").await,
            "No locations found at ballard neighborhood"
        );
    }

    #[tokio::test]
    async fn test_show_trucks_missing_location_skips_api() {
        let (d, api) = dispatcher(FakeApi::default());
        assert_eq!(d.respond("show trucks at ").await, "Missing location");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_trucks_no_events() {
        let (d, _) = dispatcher(FakeApi::default());
        assert_eq!(d.trucks_on("44", today(), &pacific()).await, "No events at 44");
    }

    #[tokio::test]
    async fn test_trucks_no_event_today() {
        let (d, _) = dispatcher(FakeApi {
            events: vec![event_json(
                1,
                "2026-10-20T11:00:00-07:00",
                "2026-10-20T14:00:00-07:00",
                &["Alpha"],
            )],
            ..Default::default()
        });
        assert_eq!(
            d.trucks_on("44", today(), &pacific()).await,
            "No food trucks found at 44"
        );
    }

    #[tokio::test]
    async fn test_trucks_formats_header_and_bookings() {
        let (d, api) = dispatcher(FakeApi {
            events: vec![
                event_json(1, "2026-10-18T11:00:00-07:00", "2026-10-18T14:00:00-07:00", &["Old"]),
                event_json(2, "2026-10-19T11:00:00-07:00", "2026-10-19T14:30:00-07:00", &["Alpha", "Beta"]),
            ],
            ..Default::default()
        });
        let reply = d.trucks_on("44", today(), &pacific()).await;
        let lines: Vec<_> = reply.lines().collect();
        assert_eq!(
            lines,
            [
                "October 19 11:00AM - 2:30PM",
                "• **Alpha** (Tacos, Mexican) https://photos.example/trucks/alpha.jpg",
                "• **Beta** (Tacos, Mexican) https://photos.example/trucks/beta.jpg",
            ]
        );
        assert!(api.calls()[0].contains("for_locations=44"));
    }

    #[tokio::test]
    async fn test_trucks_without_photo_omit_url() {
        let mut event = event_json(
            2,
            "2026-10-19T11:00:00-07:00",
            "2026-10-19T14:00:00-07:00",
            &["Alpha", "Beta", "Gamma"],
        );
        event["bookings"][0]["truck"]["featured_photo"] = json!(null);
        event["bookings"][1]["truck"]["featured_photo"] = json!("");
        let (d, _) = dispatcher(FakeApi {
            events: vec![event],
            ..Default::default()
        });

        let reply = d.trucks_on("44", today(), &pacific()).await;
        let lines: Vec<_> = reply.lines().collect();
        assert_eq!(
            lines[1..],
            [
                "• **Alpha** (Tacos, Mexican)",
                "• **Beta** (Tacos, Mexican)",
                "• **Gamma** (Tacos, Mexican) https://photos.example/trucks/gamma.jpg",
            ]
        );
    }

    #[tokio::test]
    async fn test_trucks_bad_location_uses_default() {
        let (d, api) = dispatcher(FakeApi::default());
        assert_eq!(
            d.trucks_on("factoria", today(), &pacific()).await,
            "No events at factoria"
        );
        assert!(api.calls()[0].contains("for_locations=44"));
    }

    #[tokio::test]
    async fn test_api_failure_becomes_reply() {
        let (d, _) = dispatcher(FakeApi {
            fail_locations: vec![12],
            ..Default::default()
        });
        let reply = d.trucks_on("12", today(), &pacific()).await;
        assert!(reply.starts_with("network error:"), "{reply}");
    }
}
