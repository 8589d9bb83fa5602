mod assets;
mod logging;
mod persistence;
mod price;
mod tasks;
mod web;

use crate::assets::AssetRegistry;
use crate::logging::*;
use crate::price::PriceHistorian;
use crate::tasks::TaskManager;
use crate::web::AppState;
use std::sync::Arc;

type Result<T> = anyhow::Result<T>;

#[tokio::main]
async fn main() {
    let log = DEFAULT.new(o!("function" => "main"));
    info!(log, "Starting up");

    let state = match build_state().await {
        Ok(state) => state,
        Err(err) => {
            crit!(log, "failed to initialize"; "error" => %err);
            return;
        }
    };

    match web::run(state).await {
        Ok(_) => info!(log, "shutting down"),
        Err(err) => error!(log, "server stopped"; "error" => %err),
    }
}

async fn build_state() -> Result<Arc<AppState>> {
    let log = DEFAULT.new(o!("function" => "build_state"));

    let registry = Arc::new(AssetRegistry::from_config());
    let store = persistence::new_store()?;
    persistence::seed::load_from_config(store.as_ref(), &registry).await?;
    let historian = Arc::new(PriceHistorian::from_config(registry, store));
    info!(log, "price historian ready";
        "max_seconds_distance" => historian.max_seconds_distance(),
    );

    Ok(Arc::new(AppState {
        historian,
        tasks: Arc::new(TaskManager::from_config()),
    }))
}
