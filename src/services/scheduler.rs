use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::terms::TermResolver;

/// Periodically reloads the term calendar into the resolver's cache.
pub struct TermCalendarRefresher {
    terms: Arc<TermResolver>,
    interval: Duration,
}

impl TermCalendarRefresher {
    pub fn new(terms: Arc<TermResolver>, interval_secs: u64) -> Self {
        Self {
            terms,
            interval: Duration::from_secs(interval_secs),
        }
    }

    /// Refreshes forever; failures are logged and the previous table is kept.
    pub async fn start(self) {
        info!("Starting term calendar refresher (interval: {:?})", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;

            match self.terms.refresh().await {
                Ok(terms) => info!("Term calendar refreshed ({} terms)", terms.len()),
                Err(e) => warn!("Term calendar refresh failed: {}", e),
            }
        }
    }
}
