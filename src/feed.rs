use crate::availability::Booking;
use crate::config::Config;
use crate::venue::*;
use ::serde::Deserialize;
use chrono::*;
use log::{error, info};
use reqwest::header::*;
use reqwest::{Method, StatusCode};
use thiserror::Error;

const FEED_PATH: &str = "/api/booking/feed";
const REFERER_PATH: &str = "/booking";
const QUERY_DATE_FMT: &str = "%Y-%m-%d";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 9; ASUS_X00TD) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.86 Mobile Safari/537.36";

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("booking feed request failed: {0}")]
    Request(reqwest::Error),

    #[error("booking feed timed out")]
    Timeout,

    #[error("booking feed returned {0}")]
    Status(StatusCode),

    #[error("booking feed returned malformed data: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Request(err)
        }
    }
}

// resourceId shows up as either a number or a numeric string
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum ResourceId {
    Number(u32),
    Text(String),
}

#[derive(Deserialize, Debug)]
struct FeedItem {
    start: String,
    end: String,
    #[serde(rename = "resourceId")]
    resource_id: ResourceId,
}

impl FeedItem {
    fn into_booking(self, zone: &VenueZone) -> Result<Booking, UpstreamError> {
        let court = match self.resource_id {
            ResourceId::Number(n) => n,
            ResourceId::Text(text) => text
                .trim()
                .parse::<u32>()
                .map_err(|_| UpstreamError::Malformed(format!("resourceId {:?} is not a court number", text)))?,
        };

        if !(1..=COURT_COUNT).contains(&court) {
            return Err(UpstreamError::Malformed(format!(
                "resourceId {} is outside courts 1..={}",
                court, COURT_COUNT
            )));
        }

        let start_date = parse_timestamp(&self.start, zone)
            .ok_or_else(|| UpstreamError::Malformed(format!("unreadable start {:?}", self.start)))?;
        let end_date = parse_timestamp(&self.end, zone)
            .ok_or_else(|| UpstreamError::Malformed(format!("unreadable end {:?}", self.end)))?;

        // Zero-length bookings would block the slot ending at their start
        if end_date <= start_date {
            return Err(UpstreamError::Malformed(format!(
                "booking on court {} does not end after it starts ({} .. {})",
                court, self.start, self.end
            )));
        }

        Ok(Booking {
            court,
            start_date,
            end_date,
        })
    }
}

/// Parses a feed timestamp into venue-local time. Timestamps with an offset
/// (or a trailing Z) are converted, naive ones are taken as venue-local.
pub fn parse_timestamp(value: &str, zone: &VenueZone) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Some(zone.localize(time));
    }

    for fmt in OFFSET_FORMATS.iter() {
        if let Ok(time) = DateTime::parse_from_str(value, fmt) {
            return Some(zone.localize(time));
        }
    }

    if let Some(utc) = value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        let utc = Utc.from_utc_datetime(&parse_naive(utc)?);
        return Some(zone.localize(utc.with_timezone(&FixedOffset::east_opt(0)?)));
    }

    parse_naive(value)
}

fn parse_naive(value: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Parses a raw feed response body into bookings.
pub fn parse_feed(body: &str, zone: &VenueZone) -> Result<Vec<Booking>, UpstreamError> {
    let items: Vec<FeedItem> =
        serde_json::from_str(body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;

    items.into_iter().map(|item| item.into_booking(zone)).collect()
}

pub struct FeedClient {
    client: reqwest::Client,
    base_url: String,
    zone: VenueZone,
}

impl FeedClient {
    pub fn new(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        // Accept-Encoding is filled in by reqwest so it can decompress the body
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        headers.insert(DNT, HeaderValue::from_static("1"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(
            REFERER,
            HeaderValue::from_str(&format!("{}{}", config.base_url, REFERER_PATH))?,
        );
        headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));
        headers.insert(TE, HeaderValue::from_static("trailers"));

        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .timeout(config.feed_timeout)
            .build()?;

        Ok(FeedClient {
            client,
            base_url: config.base_url.clone(),
            zone: config.venue_zone,
        })
    }

    pub fn zone(&self) -> &VenueZone {
        &self.zone
    }

    pub async fn fetch_bookings(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Booking>, UpstreamError> {
        let start = start.format(QUERY_DATE_FMT).to_string();
        let end = end.format(QUERY_DATE_FMT).to_string();

        info!("Fetching bookings from {} to {}...", start, end);

        let response = self
            .client
            .request(Method::GET, format!("{}{}", self.base_url, FEED_PATH))
            .query(&[("start", &start), ("end", &end)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!("Booking feed responded with {}", status);
            return Err(UpstreamError::Status(status));
        }

        let body = response.text().await?;
        let bookings = parse_feed(&body, &self.zone)?;

        info!("Got {} bookings", bookings.len());

        Ok(bookings)
    }

    /// Fetches everything that could affect the booking horizon starting at
    /// `today`.
    pub async fn fetch_window(&self, today: NaiveDate) -> Result<Vec<Booking>, UpstreamError> {
        self.fetch_bookings(today, today + Duration::days(FETCH_WINDOW_DAYS))
            .await
    }
}
