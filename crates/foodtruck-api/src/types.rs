use serde::{Deserialize, Deserializer};

/// Neighborhood used when a location query names none.
pub const DEFAULT_NEIGHBORHOOD: &str = "bellevue";

/// T-Mobile Factoria, used when an events query names no location.
pub const DEFAULT_LOCATION_ID: u32 = 44;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    #[serde(default, deserialize_with = "null_default")]
    pub page: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub total_pages: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub total_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Neighborhood {
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub uid: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "de_coordinate")]
    pub latitude: f64,
    #[serde(default, deserialize_with = "de_coordinate")]
    pub longitude: f64,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub zoom_level: i64,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NeighborhoodList {
    #[serde(default, deserialize_with = "null_default")]
    pub pagination: Pagination,
    #[serde(default, deserialize_with = "null_default")]
    pub neighborhoods: Vec<Neighborhood>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NeighborhoodRef {
    #[serde(default, deserialize_with = "null_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pod {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub uid: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "de_coordinate")]
    pub latitude: f64,
    #[serde(default, deserialize_with = "de_coordinate")]
    pub longitude: f64,
    pub address: Option<String>,
    pub filtered_address: Option<String>,
    pub slug: Option<String>,
    pub photo: Option<String>,
    pub google_place_id: Option<String>,
    pub created_at: Option<String>,
    pub neighborhood_id: Option<i64>,
    pub neighborhood: Option<NeighborhoodRef>,
    pub pod: Option<Pod>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationList {
    #[serde(default, deserialize_with = "null_default")]
    pub pagination: Pagination,
    #[serde(default, deserialize_with = "null_default")]
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoodTruck {
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub uid: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub trailer: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub food_categories: Vec<String>,
    /// Relative to the photo storage base URL.
    pub featured_photo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Booking {
    #[serde(default, deserialize_with = "null_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_default")]
    pub paid: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub truck: FoodTruck,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    #[serde(default, deserialize_with = "null_default")]
    pub id: i64,
    pub event_id: Option<i64>,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    pub description: Option<String>,
    /// ISO-8601 with offset, e.g. `2026-10-19T11:00:00.000-07:00`.
    #[serde(default, deserialize_with = "null_default")]
    pub start_time: String,
    #[serde(default, deserialize_with = "null_default")]
    pub end_time: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventList {
    #[serde(default, deserialize_with = "null_default")]
    pub pagination: Pagination,
    #[serde(default, deserialize_with = "null_default")]
    pub events: Vec<Event>,
}

/// Query for `/api/locations`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationQuery {
    pub page: u32,
    pub neighborhood: String,
}

impl LocationQuery {
    pub fn new(neighborhood: impl Into<String>) -> Self {
        Self {
            page: 1,
            neighborhood: neighborhood.into(),
        }
    }

    /// Neighborhood is passed through unescaped.
    pub fn query_string(&self) -> String {
        let page = if self.page == 0 { 1 } else { self.page };
        let neighborhood = if self.neighborhood.is_empty() {
            DEFAULT_NEIGHBORHOOD
        } else {
            self.neighborhood.as_str()
        };
        format!(
            "page={page}&only_with_events=true&neighborhood={neighborhood}&with_active_trucks=true"
        )
    }
}

/// Query for `/api/events`, restricted to approved bookings of active trucks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocationEventsQuery {
    pub location: u32,
    pub page: u32,
}

impl LocationEventsQuery {
    pub fn new(location: u32, page: u32) -> Self {
        Self { location, page }
    }

    pub fn query_string(&self) -> String {
        let location = if self.location == 0 {
            DEFAULT_LOCATION_ID
        } else {
            self.location
        };
        let page = if self.page == 0 { 1 } else { self.page };
        format!(
            "page={page}&for_locations={location}&with_active_trucks=true&include_bookings=true&with_booking_status=approved"
        )
    }
}

/// `null` decodes to the type's default, the same as a missing key.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The API sends coordinates as numbers for locations and as strings for neighborhoods.
fn de_coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => n,
        Some(Raw::Text(s)) => s.trim().parse().unwrap_or_default(),
        None => 0.0,
    })
}
