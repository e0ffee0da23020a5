// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use axum::Router;
use axum::routing::get;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::signal;

use crate::cmd::serve::cards::delete_card;
use crate::cmd::serve::cards::get_card;
use crate::cmd::serve::cards::review_card;
use crate::cmd::serve::cards::update_card;
use crate::cmd::serve::decks::create_card;
use crate::cmd::serve::decks::create_deck;
use crate::cmd::serve::decks::delete_deck;
use crate::cmd::serve::decks::get_deck;
use crate::cmd::serve::decks::list_decks;
use crate::cmd::serve::decks::study;
use crate::cmd::serve::decks::update_deck;
use crate::cmd::serve::error::ApiError;
use crate::cmd::serve::query::search;
use crate::cmd::serve::query::stats;
use crate::cmd::serve::query::tags;
use crate::cmd::serve::state::Clock;
use crate::cmd::serve::state::ServerState;
use crate::db::Database;
use crate::error::Fallible;

pub struct ServerConfig {
    pub database: PathBuf,
    pub host: String,
    pub port: u16,
    pub due_limit: usize,
    pub clock: Clock,
}

pub async fn start_server(config: ServerConfig) -> Fallible<()> {
    let db = Database::open(&config.database)?;
    let state = ServerState::new(db, config.clock, config.due_limit);
    let app = router(state);
    let bind = format!("{}:{}", config.host, config.port);

    // Start the server with graceful shutdown on Ctrl+C.
    log::info!("Starting server on {bind}");
    let listener = TcpListener::bind(bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped");
    Ok(())
}

pub fn router(state: ServerState) -> Router {
    let app = Router::new();
    let app = app.route("/decks", get(list_decks).post(create_deck));
    let app = app.route(
        "/decks/{id}",
        get(get_deck).put(update_deck).delete(delete_deck),
    );
    let app = app.route("/decks/{id}/cards", post(create_card));
    let app = app.route("/decks/{id}/study", get(study));
    let app = app.route(
        "/cards/{id}",
        get(get_card).put(update_card).delete(delete_card),
    );
    let app = app.route("/cards/{id}/review", post(review_card));
    let app = app.route("/search", get(search));
    let app = app.route("/tags", get(tags));
    let app = app.route("/stats", get(stats));
    let app = app.fallback(not_found_handler);
    app.with_state(state)
}

async fn not_found_handler() -> ApiError {
    ApiError::not_found("not found")
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => log::debug!("Received Ctrl+C, shutting down gracefully"),
        Err(e) => {
            log::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await
        }
    }
}
