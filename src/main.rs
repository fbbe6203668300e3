use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skipcost::api::router;
use skipcost::config::AppConfig;
use skipcost::db;
use skipcost::services::TermCalendarRefresher;
use skipcost::state::AppState;
use skipcost::terms::{HttpTermCalendar, StaticTermCalendar, TermCalendar, TermResolver};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "skipcost=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = db::connect(&config.database_url, 5).await?;
    info!("database connected: {}", config.database_url);

    let calendar: Arc<dyn TermCalendar> = match &config.term_calendar_url {
        Some(url) => {
            info!("using term calendar at {}", url);
            Arc::new(HttpTermCalendar::new(
                url.clone(),
                config.term_calendar_api_key.clone(),
                config.term_api_timeout,
            )?)
        }
        None => Arc::new(StaticTermCalendar::default()),
    };
    let terms = Arc::new(TermResolver::new(calendar, config.term_api_timeout));
    // A failed first load is not fatal; requests fall back to the month guess.
    let _ = terms.refresh().await;

    if config.term_refresh_secs > 0 {
        let refresher = TermCalendarRefresher::new(terms.clone(), config.term_refresh_secs);
        tokio::spawn(refresher.start());
    }

    let state = AppState::new(pool.clone(), terms, config.db_query_timeout);
    let app = router(state);

    info!("listening on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
