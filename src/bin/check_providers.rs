// src/bin/check_providers.rs
use dotenv::dotenv;
use log::{error, info};

use tech_alpha_monitor::config::{Config, WATCHLIST};
use tech_alpha_monitor::services::valuation::valuation_row;
use tech_alpha_monitor::services::Dashboard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    let dashboard = Dashboard::from_config(&config)?;

    info!("Testing FRED macro series...");
    match dashboard.macro_data.try_fetch_macro().await {
        Ok((yields, cpi)) => {
            for series in [yields, cpi] {
                let last = series.observations.last();
                println!(
                    "{:<10} {} points, latest {:?}",
                    series.series_id,
                    series.observations.len(),
                    last
                );
            }
        }
        Err(e) => error!("ERROR: FRED fetch failed: {}", e),
    }

    info!("Testing Yahoo Finance snapshots...");
    for ticker in WATCHLIST {
        match dashboard.equity.try_fetch_snapshot(ticker).await {
            Ok(snapshot) => println!(
                "{:<6} {} bars, {} info fields, valuation row: {:?}",
                ticker,
                snapshot.history.len(),
                snapshot.info.len(),
                valuation_row(ticker, &snapshot.info)
            ),
            Err(e) => error!("ERROR: {} failed: {}", ticker, e),
        }
    }

    Ok(())
}
