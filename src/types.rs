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

//! Records returned by the store.

use flashdeck_core::CardState;
use flashdeck_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;

pub type DeckId = i64;
pub type CardId = i64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub deck_id: DeckId,
    pub front: String,
    pub back: String,
    pub tags: Vec<String>,
    /// Scheduling fields are serialized inline with the card.
    #[serde(flatten)]
    pub state: CardState,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A card matched by a text or tag search, with the name of its deck.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: CardId,
    pub deck_id: DeckId,
    pub deck_name: String,
    pub front: String,
    pub back: String,
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_cards: i64,
    pub total_decks: i64,
    /// Cards due on or before today.
    pub due_today: i64,
    /// Reviews recorded on or after the date seven days before today.
    pub reviews_last_week: i64,
    /// Mean quality over every review, rounded to two decimals. Zero when
    /// nothing has been reviewed.
    pub avg_quality: f64,
}
