use chrono::*;
use chrono_tz::Tz;

// Courts are numbered 1..=COURT_COUNT, matching the feed's resourceId
pub const COURT_COUNT: u32 = 12;

// Furthest day offset (inclusive) that can be booked
pub const HORIZON_DAYS: i64 = 14;

// The feed is queried one day past the horizon, since it only returns
// bookings that start before its `end` parameter
pub const FETCH_WINDOW_DAYS: i64 = HORIZON_DAYS + 1;

// Hour of day at which the slot HORIZON_DAYS ahead becomes bookable.
// Fixed regardless of which target hour is being checked.
pub const BOOKING_RELEASE_HOUR: u32 = 17;

pub const CLOSED_WEEKDAYS: [Weekday; 3] = [Weekday::Fri, Weekday::Sat, Weekday::Sun];

pub fn is_closed(date: NaiveDate) -> bool {
    CLOSED_WEEKDAYS.contains(&date.weekday())
}

/// Time zone that the venue's wall clock runs in.
///
/// All availability math happens on naive venue-local times, so both "now"
/// and feed timestamps carrying an offset go through here first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VenueZone {
    System,
    Named(Tz),
}

impl VenueZone {
    pub fn now(&self) -> NaiveDateTime {
        match self {
            VenueZone::System => Local::now().naive_local(),
            VenueZone::Named(tz) => Utc::now().with_timezone(tz).naive_local(),
        }
    }

    pub fn localize(&self, time: DateTime<FixedOffset>) -> NaiveDateTime {
        match self {
            VenueZone::System => time.with_timezone(&Local).naive_local(),
            VenueZone::Named(tz) => time.with_timezone(tz).naive_local(),
        }
    }
}

impl Default for VenueZone {
    fn default() -> Self {
        VenueZone::System
    }
}
