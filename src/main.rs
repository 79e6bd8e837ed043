#![warn(unused_crate_dependencies)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Extension;
use log::{error, info};
use tokio::net::TcpListener;

use crate::channels::Channels;
use crate::collaborators::{Collaborators, ScriptedBot};
use crate::config::Config;
use crate::state::AppState;

mod background;
mod bridge;
mod channels;
mod chat;
mod codec;
mod collaborators;
mod config;
mod country;
mod env;
mod error;
mod hashing;
mod http;
mod hwid;
mod logging;
mod login;
mod middleware;
mod multiplayer;
mod presence;
mod privileges;
mod router;
mod session;
mod spectator;
mod state;
mod streams;
mod types;

#[tokio::main]
async fn main() {
    let config = Arc::new(Config::from_env());
    logging::setup();
    log_panics::init();

    info!("starting {} (v{})", config.branding.name, env::VERSION);

    let db = match collaborators::db::connect(&config.mysql).await {
        Ok(connection) => connection,
        Err(err) => {
            error!("failed to connect to MySQL: {err}");
            return;
        }
    };

    let cache_bus = match collaborators::CacheBus::connect(&config.redis).await {
        Ok(bus) => Arc::new(bus),
        Err(err) => {
            error!("failed to connect to Redis: {err}");
            return;
        }
    };

    let db_store = collaborators::SeaOrmStore::new(db);
    let channels = match Channels::load(&db_store).await {
        Ok(channels) => channels,
        Err(err) => {
            error!("failed to load chat channels: {err}");
            return;
        }
    };

    let collaborators = Collaborators {
        db: Arc::new(db_store),
        cache: cache_bus.clone(),
        geo: Arc::new(collaborators::geo::Ip2LocationLookup::new(config.geo_api_key.clone())),
        pp: Arc::new(collaborators::pp::RemotePerformanceService::new(config.performance_service_url.clone())),
        bot: Arc::new(ScriptedBot),
    };

    let state = Arc::new(AppState::new(config.clone(), channels, collaborators));

    background::spawn_tickers(state.clone());
    tokio::spawn(bridge::run(state.clone(), cache_bus));

    let app = http::router(state.clone())
        .layer(axum::middleware::from_fn(middleware::cors::cors_layer))
        .layer(Extension(config.clone()))
        .into_make_service_with_connect_info::<SocketAddr>();

    let addr = SocketAddr::new(config.http.address, config.http.port);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {addr}: {err}");
            return;
        }
    };

    info!("listening on {addr}");

    let countdown = Duration::from_secs(config.restart.countdown_seconds);
    let shutdown_state = state.clone();
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            background::run_restart_on_signal(shutdown_state, countdown).await;
        })
        .await
    {
        error!("HTTP server error: {err}");
    }
}
