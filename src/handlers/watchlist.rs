// src/handlers/watchlist.rs
use serde_json::json;
use warp::reply::Json;
use warp::Rejection;

use crate::config::{ANALYST_NOTE, PAGE_TITLE, WATCHLIST};

pub async fn get_watchlist() -> Result<Json, Rejection> {
    Ok(warp::reply::json(&json!({
        "title": PAGE_TITLE,
        "tickers": WATCHLIST,
        "caption": format!("Tracking: {}", WATCHLIST.join(", ")),
    })))
}

pub async fn get_note() -> Result<Json, Rejection> {
    Ok(warp::reply::json(&json!({
        "title": "Analyst Note",
        "thesis": ANALYST_NOTE,
    })))
}
