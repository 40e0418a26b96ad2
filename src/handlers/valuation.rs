// src/handlers/valuation.rs
use log::info;
use serde::Serialize;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::View;
use crate::config::WATCHLIST;
use crate::models::ValuationRow;
use crate::services::valuation::{build_valuation_table, ValuationProgress};
use crate::services::Dashboard;

#[derive(Debug, Serialize)]
pub struct ValuationView {
    pub title: &'static str,
    pub x_axis: &'static str,
    pub y_axis: &'static str,
    pub rows: Vec<ValuationRow>,
    /// One step per watchlist ticker, in fetch order.
    pub progress: Vec<ValuationProgress>,
}

pub async fn get_valuation(dashboard: Arc<Dashboard>) -> Result<Json, Rejection> {
    info!("Handling request for the valuation matrix");

    let mut steps = Vec::with_capacity(WATCHLIST.len());
    let rows = build_valuation_table(&dashboard.equity, &WATCHLIST, |progress| {
        steps.push(progress.clone());
        info!(
            "Fetching {}... ({}/{}, {:.0}%)",
            progress.ticker,
            progress.completed,
            progress.total,
            progress.fraction() * 100.0
        );
    })
    .await;

    let view = if rows.is_empty() {
        View::unavailable(
            "Could not fetch enough data to build the valuation matrix.",
            None,
        )
    } else {
        View::Ok(ValuationView {
            title: "P/E Ratio vs. Revenue Growth (%)",
            x_axis: "P/E Ratio (Trailing)",
            y_axis: "Revenue Growth (YoY %)",
            rows,
            progress: steps,
        })
    };

    Ok(warp::reply::json(&view))
}
