//! Backend of the Pelagica species explorer.
//!
//! Serves a read-only species bank built by the `process` crate, plus a small append-only
//! favourites log that decides the species of the week.
//!
//!
//!
//! # Views
//! - **Panel**: facts for one species, length and depth in metric and imperial
//! - **Tree**: seven-rank taxonomy around a focal species with a few sampled relatives
//! - **Dive**: every species placed at a seeded depth, walked shallow to deep
//! - **Favourites**: per-session toggles, with a weekly winner that decays for repeat winners
//!
//!
//!
//! # Notes
//!
//! ## Depth sampling
//! A species with a depth range gets one depth per seed. The draw is skewed by where the range starts
//! and depends only on `(seed, name)`, so the same seed always produces the same dive.
//! Air-breathing species are pinned to the surface band regardless of their recorded range.
//!
//! ## Favourites storage
//! Three files under `DATA_DIR`:
//! - `fav_events.jsonl` append-only toggle log, the source of truth for scoring
//! - `fav_state.json` last state per `(sid, species)`, rewritten atomically
//! - `weekly_winners.jsonl` one line per scored week, never rewritten
//!
//!
//!
//! # Setup
//!
//! Build the bank first.
//! ```sh
//! cargo run -p process -- species.csv --output bank.bin
//! ```
//!
//! Then start the server.
//! ```sh
//! BANK_PATH=bank.bin RUST_LOG=info cargo run --bin pelagica
//! ```
//!
//! Seed the last hour with fake favourites and check the debug winner.
//! ```sh
//! cargo run -p tester -- --data-dir data/processed
//! FAV_DEBUG_WINDOW=true cargo run --bin pelagica
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod depth;
pub mod error;
pub mod favourites;
pub mod routes;
pub mod scoring;
pub mod search;
pub mod state;
pub mod taxonomy;
pub mod utils;
pub mod window;

use error::AppError;
use routes::{
    dive_handler, favourites_handler, genera_handler, panel_handler, random_handler,
    search_handler, species_handler, step_handler, toggle_handler, tree_handler, weekly_handler,
};
use state::State;

pub fn router(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/genera", get(genera_handler))
        .route("/species", get(species_handler))
        .route("/search", get(search_handler))
        .route("/random", get(random_handler))
        .route("/panel", get(panel_handler))
        .route("/tree", get(tree_handler))
        .route("/dive", get(dive_handler))
        .route("/dive/step", get(step_handler))
        .route("/fav", get(favourites_handler))
        .route("/fav/toggle", post(toggle_handler))
        .route("/fav/weekly", get(weekly_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> Result<(), AppError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await?;

    #[cfg(feature = "verbose")]
    info!(
        "Scoring: {:?} over {:?}, cooldown {}s",
        state.config.scoring.aggregation,
        state.config.scoring.window,
        state.config.fav_cooldown.num_seconds()
    );

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    let app = router(state);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("Server shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
