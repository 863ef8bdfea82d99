use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::handlers::{
    refresh_classes_dataset, refresh_page_caches, refresh_wikiprojects_dataset,
};
use crate::state::AppState;

pub(crate) async fn run_dataset_cache_updater(state: Arc<AppState>) {
    let base_interval = state.config.dataset_refresh;
    let mut backoff = base_interval.min(Duration::from_secs(5));
    let max_backoff = Duration::from_secs(30);

    loop {
        match refresh_datasets(&state).await {
            Ok(()) => {
                backoff = base_interval.min(Duration::from_secs(5));
                refresh_page_caches(&state).await;
                tokio::time::sleep(base_interval).await;
            }
            Err(err) => {
                warn!(?err, "dataset refresh failed; retrying");
                tokio::time::sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, max_backoff);
            }
        }
    }
}

async fn refresh_datasets(state: &Arc<AppState>) -> Result<()> {
    let language = state.config.default_language.clone();
    let classes = refresh_classes_dataset(state, &language).await?;
    let wikiprojects = refresh_wikiprojects_dataset(state).await?;
    info!(
        classes = classes.total,
        wikiprojects = wikiprojects.total,
        language = %language,
        "dataset caches refreshed"
    );
    Ok(())
}
