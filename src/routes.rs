// src/routes.rs
use std::convert::Infallible;
use std::sync::Arc;

use log::info;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::error::ApiError;
use crate::handlers::{
    macro_view::get_macro, ticker::get_ticker, valuation::get_valuation,
    watchlist::{get_note, get_watchlist},
};
use crate::services::Dashboard;

// Turns rejections into JSON error bodies
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(
    dashboard: Arc<Dashboard>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let dashboard_filter = warp::any().map(move || dashboard.clone());

    let watchlist_route = warp::path!("api" / "v1" / "watchlist")
        .and(warp::get())
        .and_then(get_watchlist);

    let note_route = warp::path!("api" / "v1" / "note")
        .and(warp::get())
        .and_then(get_note);

    let macro_route = warp::path!("api" / "v1" / "macro")
        .and(warp::get())
        .and(dashboard_filter.clone())
        .and_then(get_macro);

    let valuation_route = warp::path!("api" / "v1" / "valuation")
        .and(warp::get())
        .and(dashboard_filter.clone())
        .and_then(get_valuation);

    let ticker_route = warp::path!("api" / "v1" / "ticker" / String)
        .and(warp::get())
        .and(dashboard_filter.clone())
        .and_then(get_ticker);

    info!("All routes configured successfully.");

    watchlist_route
        .or(note_route)
        .or(macro_route)
        .or(valuation_route)
        .or(ticker_route)
        .recover(handle_rejection)
}
