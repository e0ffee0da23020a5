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
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::PathRejection;
use flashdeck_core::CardState;
use flashdeck_core::Quality;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::cmd::serve::decks::required;
use crate::cmd::serve::error::ApiError;
use crate::cmd::serve::state::ServerState;
use crate::types::Card;
use crate::types::CardId;

#[derive(Deserialize)]
pub struct UpdateCard {
    front: Option<String>,
    back: Option<String>,
    tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct SubmitReview {
    quality: Option<Value>,
}

pub async fn get_card(
    State(state): State<ServerState>,
    path: Result<Path<CardId>, PathRejection>,
) -> Result<Json<Card>, ApiError> {
    let Path(card_id) = path?;
    let db = state.db()?;
    let card = db
        .get_card(card_id)?
        .ok_or_else(|| ApiError::not_found("card not found"))?;
    Ok(Json(card))
}

pub async fn update_card(
    State(state): State<ServerState>,
    path: Result<Path<CardId>, PathRejection>,
    payload: Result<Json<UpdateCard>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(card_id) = path?;
    let Json(UpdateCard { front, back, tags }) = payload?;
    if front.is_none() && back.is_none() && tags.is_none() {
        return Err(ApiError::validation("no fields to update"));
    }
    if (front.is_some() && required(front.clone()).is_none())
        || (back.is_some() && required(back.clone()).is_none())
    {
        return Err(ApiError::validation("front and back must not be empty"));
    }
    let db = state.db()?;
    let updated = db.update_card(
        card_id,
        front.as_deref(),
        back.as_deref(),
        tags.as_deref(),
        state.clock.now(),
    )?;
    if !updated {
        return Err(ApiError::not_found("card not found"));
    }
    Ok(Json(json!({ "id": card_id, "updated": true })))
}

pub async fn delete_card(
    State(state): State<ServerState>,
    path: Result<Path<CardId>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(card_id) = path?;
    let db = state.db()?;
    if !db.delete_card(card_id)? {
        return Err(ApiError::not_found("card not found"));
    }
    log::debug!("Deleted card {card_id}");
    Ok(Json(json!({ "deleted": true })))
}

/// Validate the `quality` field of a review submission. Whole floats such as
/// `3.0` are accepted as integers.
fn parse_quality(quality: Option<Value>) -> Result<Quality, ApiError> {
    let number = match quality {
        None | Some(Value::Null) => return Err(ApiError::validation("quality required")),
        Some(Value::Number(n)) => n,
        Some(_) => return Err(ApiError::validation("quality must be an integer")),
    };
    let out_of_range = || ApiError::validation("quality must be 0-5");
    let quality: i64 = match (number.as_i64(), number.as_f64()) {
        (Some(q), _) => q,
        // Integers beyond i64 are still integers.
        _ if number.is_u64() => return Err(out_of_range()),
        (None, Some(f)) if f.fract() == 0.0 => {
            if !(0.0..=5.0).contains(&f) {
                return Err(out_of_range());
            }
            f as i64
        }
        _ => return Err(ApiError::validation("quality must be an integer")),
    };
    Quality::try_from(quality).map_err(|_| out_of_range())
}

/// Grade a card and reschedule it.
///
/// The new schedule is saved before the review is logged. Logging is best
/// effort: if it fails the client still gets the saved schedule.
pub async fn review_card(
    State(state): State<ServerState>,
    path: Result<Path<CardId>, PathRejection>,
    payload: Result<Json<SubmitReview>, JsonRejection>,
) -> Result<Json<CardState>, ApiError> {
    let Path(card_id) = path?;
    let Json(SubmitReview { quality }) = payload?;
    let quality: Quality = parse_quality(quality)?;
    let now = state.clock.now();
    let mut db = state.db()?;
    let next: CardState = match db.review_card(card_id, quality, now) {
        Ok(Some(next)) => next,
        Ok(None) => return Err(ApiError::not_found("card not found")),
        Err(e) => {
            log::error!("Failed to save review of card {card_id}: {e}");
            return Err(ApiError::persistence("failed to save review"));
        }
    };
    if let Err(e) = db.record_review(card_id, quality, now) {
        log::warn!("Failed to log review of card {card_id}: {e}");
    }
    log::info!(
        "Reviewed card {card_id} with quality {}: next due {} (interval {})",
        quality.value(),
        next.due_date,
        next.interval
    );
    Ok(Json(next))
}
