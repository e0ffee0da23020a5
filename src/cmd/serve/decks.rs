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
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::PathRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::cmd::serve::error::ApiError;
use crate::cmd::serve::state::ServerState;
use crate::types::Card;
use crate::types::Deck;
use crate::types::DeckId;

#[derive(Deserialize)]
pub struct CreateDeck {
    name: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateDeck {
    name: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateCard {
    front: Option<String>,
    back: Option<String>,
    tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct StudyParams {
    limit: Option<usize>,
}

#[derive(Serialize)]
pub struct DeckWithCards {
    #[serde(flatten)]
    deck: Deck,
    cards: Vec<Card>,
}

/// A required text field: present and not blank.
pub(super) fn required(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

pub async fn list_decks(State(state): State<ServerState>) -> Result<Json<Vec<Deck>>, ApiError> {
    let db = state.db()?;
    Ok(Json(db.list_decks()?))
}

pub async fn create_deck(
    State(state): State<ServerState>,
    payload: Result<Json<CreateDeck>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(CreateDeck { name, description }) = payload?;
    let name = required(name).ok_or_else(|| ApiError::validation("name required"))?;
    let description = description.unwrap_or_default();
    let db = state.db()?;
    let id = db.create_deck(&name, &description, state.clock.now())?;
    log::debug!("Created deck {id}");
    Ok((StatusCode::CREATED, Json(json!({ "id": id, "name": name }))))
}

pub async fn get_deck(
    State(state): State<ServerState>,
    path: Result<Path<DeckId>, PathRejection>,
) -> Result<Json<DeckWithCards>, ApiError> {
    let Path(deck_id) = path?;
    let db = state.db()?;
    let deck = db
        .get_deck(deck_id)?
        .ok_or_else(|| ApiError::not_found("deck not found"))?;
    let cards = db.cards_in_deck(deck_id)?;
    Ok(Json(DeckWithCards { deck, cards }))
}

pub async fn update_deck(
    State(state): State<ServerState>,
    path: Result<Path<DeckId>, PathRejection>,
    payload: Result<Json<UpdateDeck>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(deck_id) = path?;
    let Json(UpdateDeck { name, description }) = payload?;
    if name.is_none() && description.is_none() {
        return Err(ApiError::validation("no fields to update"));
    }
    if name.is_some() && required(name.clone()).is_none() {
        return Err(ApiError::validation("name required"));
    }
    let db = state.db()?;
    let updated = db.update_deck(
        deck_id,
        name.as_deref(),
        description.as_deref(),
        state.clock.now(),
    )?;
    if !updated {
        return Err(ApiError::not_found("deck not found"));
    }
    Ok(Json(json!({ "id": deck_id, "updated": true })))
}

pub async fn delete_deck(
    State(state): State<ServerState>,
    path: Result<Path<DeckId>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(deck_id) = path?;
    let db = state.db()?;
    if !db.delete_deck(deck_id)? {
        return Err(ApiError::not_found("deck not found"));
    }
    log::debug!("Deleted deck {deck_id}");
    Ok(Json(json!({ "deleted": true })))
}

pub async fn create_card(
    State(state): State<ServerState>,
    path: Result<Path<DeckId>, PathRejection>,
    payload: Result<Json<CreateCard>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Path(deck_id) = path?;
    let Json(CreateCard { front, back, tags }) = payload?;
    let (Some(front), Some(back)) = (required(front), required(back)) else {
        return Err(ApiError::validation("front and back required"));
    };
    let tags = tags.unwrap_or_default();
    let db = state.db()?;
    let id = db
        .create_card(deck_id, &front, &back, &tags, state.clock.now())?
        .ok_or_else(|| ApiError::not_found("deck not found"))?;
    log::debug!("Created card {id} in deck {deck_id}");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "deck_id": deck_id })),
    ))
}

/// The cards of a deck that are due today, earliest first.
pub async fn study(
    State(state): State<ServerState>,
    path: Result<Path<DeckId>, PathRejection>,
    query: Result<Query<StudyParams>, QueryRejection>,
) -> Result<Json<Vec<Card>>, ApiError> {
    let Path(deck_id) = path?;
    let Query(params) = query?;
    let limit = params.limit.unwrap_or(state.due_limit);
    let today = state.clock.now().date();
    let db = state.db()?;
    if db.get_deck(deck_id)?.is_none() {
        return Err(ApiError::not_found("deck not found"));
    }
    Ok(Json(db.due_cards(deck_id, today, limit)?))
}
