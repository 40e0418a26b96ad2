// src/handlers/ticker.rs
use log::{info, warn};
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use super::View;
use crate::config::watchlist_symbol;
use crate::error::FetchErrorKind;
use crate::services::deep_dive::{build_deep_dive, unavailable_message, DeepDive};
use crate::services::Dashboard;

pub async fn get_ticker(symbol: String, dashboard: Arc<Dashboard>) -> Result<Json, Rejection> {
    let ticker = watchlist_symbol(&symbol).ok_or_else(|| {
        warn!("Rejected deep dive for {:?}: not on the watchlist", symbol);
        warp::reject::custom(ApiError::not_found(format!(
            "{} is not on the watchlist",
            symbol
        )))
    })?;
    info!("Handling deep dive request for {}", ticker);

    let view: View<DeepDive> = match dashboard.equity.try_fetch_snapshot(ticker).await {
        Ok(snapshot) => match build_deep_dive(ticker, &snapshot) {
            Some(dive) => View::Ok(dive),
            None => View::unavailable(
                unavailable_message(ticker),
                Some(FetchErrorKind::MissingField),
            ),
        },
        Err(e) => {
            warn!("Deep dive for {} unavailable: {}", ticker, e);
            View::unavailable(unavailable_message(ticker), Some(e.kind()))
        }
    };

    Ok(warp::reply::json(&view))
}
