use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, NaiveTime, TimeZone, Weekday};
use foodtruck_core::error::FoodtruckError;

/// When the daily broadcast fires: a local wall-clock time on a set of weekdays.
///
/// Parsed from `"HH:MM <recurrence>"` where recurrence is one of `daily`, `weekdays`,
/// `custom(mon,wed,fri)` or `weekly(fri)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub time: NaiveTime,
    pub days: Vec<Weekday>,
}

impl Schedule {
    /// First firing strictly after `now`, in `now`'s zone. Local times skipped by a
    /// DST gap are passed over; ambiguous ones fire on the earlier instant.
    pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = now.timezone();
        let today = now.date_naive();

        // Two weeks covers a full cycle even when one candidate lands in a DST gap.
        (0..14u64).find_map(|ahead| {
            let date = today.checked_add_days(Days::new(ahead))?;
            if !self.days.contains(&date.weekday()) {
                return None;
            }
            tz.from_local_datetime(&date.and_time(self.time))
                .earliest()
                .filter(|at| at > now)
        })
    }
}

impl FromStr for Schedule {
    type Err = FoodtruckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| FoodtruckError::InvalidConfig(format!("invalid schedule {s:?}: {why}"));

        let (time, recurrence) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| invalid("expected \"HH:MM <recurrence>\""))?;

        let time = NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| invalid("bad time"))?;

        let recurrence = recurrence.trim().to_lowercase();
        let days = match recurrence.as_str() {
            "daily" => ALL_DAYS.to_vec(),
            "weekdays" => ALL_DAYS[..5].to_vec(),
            r if r.starts_with("custom(") && r.ends_with(')') => {
                let list = &r["custom(".len()..r.len() - 1];
                let mut days = Vec::new();
                for name in list.split(',') {
                    let day = parse_day(name.trim()).ok_or_else(|| invalid("unknown day"))?;
                    if !days.contains(&day) {
                        days.push(day);
                    }
                }
                days
            }
            r if r.starts_with("weekly(") && r.ends_with(')') => {
                let name = &r["weekly(".len()..r.len() - 1];
                vec![parse_day(name.trim()).ok_or_else(|| invalid("unknown day"))?]
            }
            _ => return Err(invalid("unknown recurrence")),
        };

        Ok(Self { time, days })
    }
}

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn parse_day(name: &str) -> Option<Weekday> {
    match name {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}
