use crate::venue::*;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

const DATE_LABEL_FMT: &str = "%a, %b %-d";
const TIME_LABEL_FMT: &str = "%H:%M";

/// An existing reservation taken from the booking feed, in venue-local time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Booking {
    pub court: u32,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
}

/// A one hour window on a court that is being checked for availability.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateSlot {
    pub court: u32,
    pub date: NaiveDate,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl CandidateSlot {
    pub fn new(court: u32, date: NaiveDate, start_hour: u32) -> Self {
        CandidateSlot {
            court,
            date,
            start_hour,
            end_hour: start_hour + 1,
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::default()) + Duration::hours(self.start_hour as i64)
    }

    pub fn end(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::default()) + Duration::hours(self.end_hour as i64)
    }

    /// Half-open overlap test against a single booking.
    pub fn overlaps(&self, booking: &Booking) -> bool {
        let start = self.start();
        let end = self.end();

        let starts_during_booking = start >= booking.start_date && start < booking.end_date;
        let ends_during_booking = end > booking.start_date && end <= booking.end_date;
        let wraps_booking = start <= booking.start_date && end >= booking.end_date;

        starts_during_booking || ends_during_booking || wraps_booking
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvailabilityResult {
    pub court: u32,
    pub date: NaiveDateTime,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupedAvailability {
    pub date: String,
    pub courts: Vec<u32>,
}

/// Generates every offerable slot at `target_hour` across all courts for the
/// booking horizon, as seen from `now`.
pub fn candidate_slots(now: NaiveDateTime, target_hour: u32) -> Vec<CandidateSlot> {
    let today = now.date();
    let mut slots = Vec::new();

    for court in 1..=COURT_COUNT {
        for i in 0..=HORIZON_DAYS {
            // Today's slot has already started
            if i == 0 && now.hour() >= target_hour {
                continue;
            }
            // Last day of the horizon is released at a fixed hour
            if i == HORIZON_DAYS && now.hour() < BOOKING_RELEASE_HOUR {
                continue;
            }

            let date = today + Duration::days(i);
            if is_closed(date) {
                continue;
            }

            slots.push(CandidateSlot::new(court, date, target_hour));
        }
    }

    slots
}

pub fn is_booked(slot: &CandidateSlot, bookings: &[Booking]) -> bool {
    bookings
        .iter()
        .filter(|b| b.court == slot.court && b.start_date.date() == slot.date)
        .any(|b| slot.overlaps(b))
}

pub fn available_slots(bookings: &[Booking], candidates: &[CandidateSlot]) -> Vec<AvailabilityResult> {
    candidates
        .iter()
        .filter(|slot| !is_booked(slot, bookings))
        .map(|slot| {
            let start = slot.start();
            AvailabilityResult {
                court: slot.court,
                date: start,
                label: format_label(start),
            }
        })
        .collect()
}

/// Display label for a slot start, e.g. "Mon, Jun 10 17:00".
pub fn format_label(start: NaiveDateTime) -> String {
    format!(
        "{} {}",
        start.format(DATE_LABEL_FMT),
        start.format(TIME_LABEL_FMT)
    )
}

pub fn sort_results(results: &mut [AvailabilityResult]) {
    results.sort_by(|a, b| a.date.cmp(&b.date).then(a.court.cmp(&b.court)));
}

/// Collapses runs of identical labels into one group each. Expects `results`
/// to already be sorted.
pub fn group_results(results: Vec<AvailabilityResult>) -> Vec<GroupedAvailability> {
    let mut groups: Vec<GroupedAvailability> = Vec::new();

    for result in results {
        match groups.last_mut() {
            Some(group) if group.date == result.label => group.courts.push(result.court),
            _ => groups.push(GroupedAvailability {
                date: result.label,
                courts: vec![result.court],
            }),
        }
    }

    groups
}

/// Runs the calculator for each target hour against one booking set and
/// assembles the grouped report.
pub fn build_report(
    bookings: &[Booking],
    now: NaiveDateTime,
    target_hours: &[u32],
) -> Vec<GroupedAvailability> {
    let mut results: Vec<AvailabilityResult> = Vec::new();

    for &hour in target_hours {
        let candidates = candidate_slots(now, hour);
        results.extend(available_slots(bookings, &candidates));
    }

    sort_results(&mut results);
    group_results(results)
}

/// Distinct weekdays in the report, mostly useful for logging.
pub fn report_days(report: &[GroupedAvailability]) -> usize {
    let mut days: Vec<&str> = report
        .iter()
        .filter_map(|g| g.date.rsplit_once(' ').map(|(day, _)| day))
        .collect();
    days.dedup();
    days.len()
}
