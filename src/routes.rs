use crate::availability::*;
use crate::feed::*;
use actix_web::http::StatusCode;
use actix_web::*;
use ::serde::{Deserialize, Serialize};
use log::{error, info};

/// Everything a request needs, built once at startup.
pub struct AppState {
    pub feed: FeedClient,
    pub target_hours: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for UpstreamError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_GATEWAY
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

/// Free courts for every target hour over the booking horizon, grouped by
/// slot.
#[get("/")]
pub async fn get_availability(state: web::Data<AppState>) -> Result<HttpResponse, UpstreamError> {
    // Read the clock once so every rule sees the same instant
    let now = state.feed.zone().now();

    let bookings = match state.feed.fetch_window(now.date()).await {
        Ok(bookings) => bookings,
        Err(err) => {
            error!("Error getting bookings: {}", err);
            return Err(err);
        }
    };

    let report = build_report(&bookings, now, &state.target_hours);

    info!(
        "Serving {} slots across {} days",
        report.len(),
        report_days(&report)
    );

    Ok(HttpResponse::Ok().json(report))
}
