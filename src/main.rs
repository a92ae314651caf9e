use log::info;
use std::sync::Arc;

use moviehub::{MovieStore, Router, ServerConfig, WebServer};

fn main() -> anyhow::Result<()> {
    let config = ServerConfig::default();

    env_logger::Builder::new()
        .filter_level(config.log_level)
        .init();

    let store = if config.seed_catalog {
        MovieStore::seeded()
    } else {
        MovieStore::new()
    };
    info!("loaded {} movies", store.len());

    let router = Router::movies(Arc::new(store))?;
    let server = WebServer::bind(&config, router)?;

    server.run()
}
