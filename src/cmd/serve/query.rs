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

use axum::Json;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::QueryRejection;
use serde::Deserialize;

use crate::cmd::serve::error::ApiError;
use crate::cmd::serve::state::ServerState;
use crate::types::SearchHit;
use crate::types::Stats;

#[derive(Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    tag: Option<String>,
}

pub async fn search(
    State(state): State<ServerState>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    let Query(params) = query?;
    let q = params.q.unwrap_or_default();
    let tag = params.tag.unwrap_or_default();
    let db = state.db()?;
    Ok(Json(db.search_cards(q.trim(), tag.trim())?))
}

pub async fn tags(State(state): State<ServerState>) -> Result<Json<Vec<String>>, ApiError> {
    let db = state.db()?;
    Ok(Json(db.all_tags()?))
}

pub async fn stats(State(state): State<ServerState>) -> Result<Json<Stats>, ApiError> {
    let today = state.clock.now().date();
    let db = state.db()?;
    Ok(Json(db.stats(today)?))
}
