// src/handlers/macro_view.rs
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::View;
use crate::models::{MacroSeries, Observation};
use crate::services::Dashboard;

#[derive(Debug, Serialize)]
pub struct LineChart {
    pub title: &'static str,
    pub series_id: String,
    pub points: Vec<Observation>,
}

#[derive(Debug, Serialize)]
pub struct MacroView {
    pub header: &'static str,
    pub yield_chart: LineChart,
    pub inflation_chart: LineChart,
}

fn line_chart(title: &'static str, series: MacroSeries) -> LineChart {
    LineChart {
        title,
        series_id: series.series_id,
        points: series.observations,
    }
}

pub async fn get_macro(dashboard: Arc<Dashboard>) -> Result<Json, Rejection> {
    info!("Handling request for the macro backdrop");

    let view = match dashboard.macro_data.try_fetch_macro().await {
        Ok((yields, cpi)) => View::Ok(MacroView {
            header: "The Macro Backdrop: Rates vs. Tech",
            yield_chart: line_chart("US 10-Year Treasury Yield (DGS10)", yields),
            inflation_chart: line_chart("US Inflation Rate (CPIAUCSL)", cpi),
        }),
        Err(e) => {
            warn!("Macro data unavailable: {}", e);
            View::unavailable(macro_warning(), Some(e.kind()))
        }
    };

    Ok(warp::reply::json(&view))
}

fn macro_warning() -> &'static str {
    "Could not fetch macro data. Please check your FRED API key."
}
