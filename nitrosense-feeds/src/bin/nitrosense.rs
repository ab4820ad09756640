//! NitroSense dashboard
//!
//! Polls the soil store and the weather provider and logs a fertilizer
//! recommendation whenever either feed changes. Stops on Ctrl-C.
//!
//! Configuration comes from the environment (see `nitrosense_feeds::config`);
//! a `.env` file in the working directory is loaded first when present.

use anyhow::{Context, Result};
use log::{error, info, warn};
use nitrosense_core::FeedView;
use nitrosense_feeds::{Dashboard, DashboardConfig, TokioScheduler};

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match dotenv {
        Ok(path) => info!("loaded {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e).context("reading .env"),
    }

    let config = DashboardConfig::from_env().context("loading configuration")?;
    let scheduler = TokioScheduler::try_current()?;
    let mut dashboard = Dashboard::connect(&config, &scheduler).context("starting feeds")?;

    info!("NitroSense v{} running, Ctrl-C to stop", env!("CARGO_PKG_VERSION"));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let outcome = loop {
        tokio::select! {
            signal = &mut shutdown => {
                break signal.context("waiting for Ctrl-C");
            }
            alive = dashboard.changed() => {
                if !alive {
                    break Ok(());
                }
                if let Err(e) = report(&dashboard) {
                    break Err(e);
                }
            }
        }
    };

    dashboard.stop();
    for (name, stats) in dashboard.connection_stats() {
        info!(
            "{}: {} ok, {} failed, {} bytes{}",
            name,
            stats.requests_ok,
            stats.requests_failed,
            stats.bytes_received,
            stats.last_error.map(|e| format!(", last error: {e}")).unwrap_or_default()
        );
    }

    outcome
}

fn report(dashboard: &Dashboard) -> Result<()> {
    let panel = dashboard.panel().context("computing recommendation")?;

    match &panel.soil {
        FeedView::Loading => info!("soil: loading"),
        FeedView::Failed(e) => error!("soil: {}", e),
        FeedView::Live(r) => info!("soil: N {:.2}, P {:.2}, K {:.2}", r.nitrogen, r.phosphorus, r.potassium),
        FeedView::Stale(r, e) => warn!("soil: N {:.2} (stale: {})", r.nitrogen, e),
    }

    match &panel.weather {
        FeedView::Loading => info!("weather: loading"),
        FeedView::Failed(e) => error!("weather: {}", e),
        FeedView::Live(r) => info!("weather: {:.2} °C, {:.2} mm", r.temperature, r.precipitation),
        FeedView::Stale(r, e) => warn!("weather: {:.2} °C, {:.2} mm (stale: {})", r.temperature, r.precipitation, e),
    }

    if let Some(rec) = panel.recommendation {
        info!(
            "optimal N {:.2} mg/kg, apply {:.2} mg/kg",
            rec.optimal, rec.suggested
        );
    }

    Ok(())
}
